use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use tracing::instrument;

use dataxweb_domain::{Task, TaskRepository};
use dataxweb_errors::SchedulerResult;

pub struct MySqlTaskRepository {
    pool: MySqlPool,
}

impl MySqlTaskRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_task(row: &sqlx::mysql::MySqlRow) -> SchedulerResult<Task> {
        Ok(Task {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            source_id: row.try_get("source_id")?,
            target_id: row.try_get("target_id")?,
            json_config: row.try_get("json_config")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl TaskRepository for MySqlTaskRepository {
    #[instrument(skip(self), fields(task_id = %id))]
    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<Task>> {
        let row = sqlx::query(
            "SELECT id, name, source_id, target_id, COALESCE(json_config, '') AS json_config, \
             created_at, updated_at FROM tasks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_task).transpose()
    }
}
