use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use tracing::instrument;

use dataxweb_domain::{DataSource, DataSourceKind, DataSourceRepository};
use dataxweb_errors::{SchedulerError, SchedulerResult};

pub struct MySqlDataSourceRepository {
    pool: MySqlPool,
}

impl MySqlDataSourceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_data_source(row: &sqlx::mysql::MySqlRow) -> SchedulerResult<DataSource> {
        let kind_raw: String = row.try_get("type")?;
        let kind = DataSourceKind::parse(&kind_raw)
            .ok_or_else(|| SchedulerError::validation(format!("未知的数据源类型: {kind_raw}")))?;

        Ok(DataSource {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            kind,
            db_url: row.try_get("db_url")?,
            db_user: row.try_get("db_user")?,
            db_password: row.try_get("db_password")?,
            db_database: row.try_get("db_database")?,
            defaultfs: row.try_get("defaultfs")?,
            hadoopconfig: row.try_get("hadoopconfig")?,
        })
    }
}

#[async_trait]
impl DataSourceRepository for MySqlDataSourceRepository {
    #[instrument(skip(self), fields(data_source_id = %id))]
    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<DataSource>> {
        let row = sqlx::query(
            "SELECT id, name, type, db_url, db_user, db_password, db_database, \
             defaultfs, hadoopconfig FROM data_sources WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_data_source).transpose()
    }
}
