//! 仓储抽象
//!
//! 调度器依赖的窄接口。实现位于 infrastructure crate。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dataxweb_errors::SchedulerResult;

use crate::entities::{
    DataSource, ExecutionStatus, ExecutionType, Task, TaskFlow, TaskFlowStep, TaskLog,
};

/// 任务仓储
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<Task>>;
}

/// 任务流仓储
#[async_trait]
pub trait TaskFlowRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<TaskFlow>>;

    /// 启用的任务流，启动时用于注册 cron
    async fn list_enabled(&self) -> SchedulerResult<Vec<TaskFlow>>;

    /// 按 step_order 升序返回步骤
    async fn list_steps(&self, flow_id: i64) -> SchedulerResult<Vec<TaskFlowStep>>;
}

/// 数据源仓储
#[async_trait]
pub trait DataSourceRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<DataSource>>;
}

/// 执行记录与任务日志仓储
#[async_trait]
pub trait ExecutionLogRepository: Send + Sync {
    /// 创建 running 状态的执行记录，返回新行 id
    async fn create_flow_execution(
        &self,
        flow_id: i64,
        execution_type: ExecutionType,
        start_time: DateTime<Utc>,
    ) -> SchedulerResult<i64>;

    /// 写入执行记录终态
    async fn finish_flow_execution(
        &self,
        execution_id: i64,
        status: ExecutionStatus,
        end_time: DateTime<Utc>,
    ) -> SchedulerResult<()>;

    /// 追加一行任务日志，返回新行 id。id 字段在插入时被忽略
    async fn append_task_log(&self, log: &TaskLog) -> SchedulerResult<i64>;

    /// 启动回收：把孤儿 running 执行记录翻转为 failed，返回影响行数
    async fn fail_orphaned_executions(&self, end_time: DateTime<Utc>) -> SchedulerResult<u64>;
}
