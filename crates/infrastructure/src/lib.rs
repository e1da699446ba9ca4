//! 基础设施层：MySQL 仓储实现

pub mod database;

pub use database::mysql::{
    MySqlDataSourceRepository, MySqlExecutionLogRepository, MySqlTaskFlowRepository,
    MySqlTaskRepository,
};
pub use database::create_pool;
