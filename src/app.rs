use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use dataxweb_config::AppConfig;
use dataxweb_infrastructure::{
    create_pool, MySqlExecutionLogRepository, MySqlTaskFlowRepository, MySqlTaskRepository,
};
use dataxweb_scheduler::Scheduler;

/// 主应用：数据库连接、仓储与调度器的装配
pub struct Application {
    scheduler: Arc<Scheduler>,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = create_pool(
            config.mysql_connect_options(),
            config.database.max_connections,
        )
        .await
        .context("创建数据库连接池失败")?;

        let tasks = Arc::new(MySqlTaskRepository::new(pool.clone()));
        let flows = Arc::new(MySqlTaskFlowRepository::new(pool.clone()));
        let logs = Arc::new(MySqlExecutionLogRepository::new(pool));

        let scheduler = Arc::new(Scheduler::new(
            tasks,
            flows,
            logs,
            &config.datax.home,
            &config.datax.temp_dir,
        ));

        Ok(Self { scheduler })
    }

    /// 注册启用的任务流并启动 cron 调度
    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .load_and_start()
            .await
            .context("启动调度器失败")?;
        info!("调度服务已就绪");
        Ok(())
    }

    /// CRUD 协作方调用调度器的入口
    pub fn scheduler(&self) -> Arc<Scheduler> {
        Arc::clone(&self.scheduler)
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}
