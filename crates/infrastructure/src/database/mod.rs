pub mod mysql;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::info;

use dataxweb_errors::SchedulerResult;

/// 创建有界连接池
pub async fn create_pool(
    options: MySqlConnectOptions,
    max_connections: u32,
) -> SchedulerResult<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    info!("数据库连接池已创建, 上限 {} 个连接", max_connections);
    Ok(pool)
}
