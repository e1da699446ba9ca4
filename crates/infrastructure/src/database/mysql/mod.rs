mod data_source_repository;
mod execution_log_repository;
mod task_flow_repository;
mod task_repository;

pub use data_source_repository::MySqlDataSourceRepository;
pub use execution_log_repository::MySqlExecutionLogRepository;
pub use task_flow_repository::MySqlTaskFlowRepository;
pub use task_repository::MySqlTaskRepository;
