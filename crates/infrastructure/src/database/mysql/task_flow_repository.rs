use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use tracing::instrument;

use dataxweb_domain::{TaskFlow, TaskFlowRepository, TaskFlowStep};
use dataxweb_errors::SchedulerResult;

pub struct MySqlTaskFlowRepository {
    pool: MySqlPool,
}

impl MySqlTaskFlowRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_flow(row: &sqlx::mysql::MySqlRow) -> SchedulerResult<TaskFlow> {
        Ok(TaskFlow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            cron_expr: row.try_get("cron_expr")?,
            enabled: row.try_get("enabled")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_step(row: &sqlx::mysql::MySqlRow) -> SchedulerResult<TaskFlowStep> {
        Ok(TaskFlowStep {
            id: row.try_get("id")?,
            flow_id: row.try_get("flow_id")?,
            task_id: row.try_get("task_id")?,
            step_order: row.try_get("step_order")?,
            timeout_minutes: row.try_get("timeout_minutes")?,
        })
    }
}

const FLOW_COLUMNS: &str = "id, name, COALESCE(description, '') AS description, \
                            COALESCE(cron_expr, '') AS cron_expr, enabled, created_at, updated_at";

#[async_trait]
impl TaskFlowRepository for MySqlTaskFlowRepository {
    #[instrument(skip(self), fields(flow_id = %id))]
    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<TaskFlow>> {
        let row = sqlx::query(&format!(
            "SELECT {FLOW_COLUMNS} FROM task_flows WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_flow).transpose()
    }

    #[instrument(skip(self))]
    async fn list_enabled(&self) -> SchedulerResult<Vec<TaskFlow>> {
        let rows = sqlx::query(&format!(
            "SELECT {FLOW_COLUMNS} FROM task_flows WHERE enabled = 1"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_flow).collect()
    }

    #[instrument(skip(self), fields(flow_id = %flow_id))]
    async fn list_steps(&self, flow_id: i64) -> SchedulerResult<Vec<TaskFlowStep>> {
        let rows = sqlx::query(
            "SELECT id, flow_id, task_id, step_order, timeout_minutes \
             FROM task_flow_steps WHERE flow_id = ? ORDER BY step_order ASC",
        )
        .bind(flow_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_step).collect()
    }
}
