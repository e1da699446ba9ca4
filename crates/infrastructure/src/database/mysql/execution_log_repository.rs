use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use tracing::{instrument, warn};

use dataxweb_domain::{ExecutionLogRepository, ExecutionStatus, ExecutionType, TaskLog};
use dataxweb_errors::SchedulerResult;

pub struct MySqlExecutionLogRepository {
    pool: MySqlPool,
}

impl MySqlExecutionLogRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionLogRepository for MySqlExecutionLogRepository {
    #[instrument(skip(self), fields(flow_id = %flow_id))]
    async fn create_flow_execution(
        &self,
        flow_id: i64,
        execution_type: ExecutionType,
        start_time: DateTime<Utc>,
    ) -> SchedulerResult<i64> {
        let result = sqlx::query(
            "INSERT INTO task_flow_executions (flow_id, status, execution_type, start_time) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(flow_id)
        .bind(ExecutionStatus::Running.as_str())
        .bind(execution_type.as_str())
        .bind(start_time)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id() as i64)
    }

    #[instrument(skip(self), fields(execution_id = %execution_id))]
    async fn finish_flow_execution(
        &self,
        execution_id: i64,
        status: ExecutionStatus,
        end_time: DateTime<Utc>,
    ) -> SchedulerResult<()> {
        sqlx::query("UPDATE task_flow_executions SET status = ?, end_time = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(end_time)
            .bind(execution_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self, log), fields(task_id = %log.task_id))]
    async fn append_task_log(&self, log: &TaskLog) -> SchedulerResult<i64> {
        let result = sqlx::query(
            "INSERT INTO task_logs (task_id, flow_execution_id, step_id, step_order, \
             execution_type, status, start_time, end_time, log) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(log.task_id)
        .bind(log.flow_execution_id)
        .bind(log.step_id)
        .bind(log.step_order)
        .bind(log.execution_type.as_str())
        .bind(log.status.as_str())
        .bind(log.start_time)
        .bind(log.end_time)
        .bind(&log.log)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id() as i64)
    }

    #[instrument(skip(self))]
    async fn fail_orphaned_executions(&self, end_time: DateTime<Utc>) -> SchedulerResult<u64> {
        let result =
            sqlx::query("UPDATE task_flow_executions SET status = ?, end_time = ? WHERE status = ?")
                .bind(ExecutionStatus::Failed.as_str())
                .bind(end_time)
                .bind(ExecutionStatus::Running.as_str())
                .execute(&self.pool)
                .await?;

        let affected = result.rows_affected();
        if affected > 0 {
            warn!("启动回收: {} 条 running 执行记录被置为 failed", affected);
        }
        Ok(affected)
    }
}
