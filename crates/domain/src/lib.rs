//! 领域模型与仓储抽象
//!
//! 调度核心可见的实体与数据访问接口。CRUD 管理界面持有更宽的列集，
//! 这里只建模调度器实际读写的部分。

pub mod entities;
pub mod repositories;

pub use entities::{
    DataSource, DataSourceKind, ExecutionStatus, ExecutionType, FlowExecution, Task, TaskFlow,
    TaskFlowStep, TaskLog, TaskLogStatus,
};
pub use repositories::{
    DataSourceRepository, ExecutionLogRepository, TaskFlowRepository, TaskRepository,
};
