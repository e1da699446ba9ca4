//! 调度器门面
//!
//! 任务只能手动执行或作为任务流步骤执行；任务流按 cron 表达式调度。

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{error, info, warn};

use dataxweb_domain::{ExecutionLogRepository, ExecutionType, TaskFlowRepository, TaskRepository};
use dataxweb_errors::{SchedulerError, SchedulerResult};

use crate::cron_registry::CronRegistry;
use crate::path_preparer::PathPreparer;
use crate::placeholders::shanghai;
use crate::run_registry::RunRegistry;

pub struct Scheduler {
    pub(crate) tasks: Arc<dyn TaskRepository>,
    pub(crate) flows: Arc<dyn TaskFlowRepository>,
    pub(crate) logs: Arc<dyn ExecutionLogRepository>,
    pub(crate) registry: RunRegistry,
    pub(crate) cron: CronRegistry,
    pub(crate) path_preparer: PathPreparer,
    pub(crate) datax_home: PathBuf,
    pub(crate) temp_dir: PathBuf,
    pub(crate) python_bin: String,
}

impl Scheduler {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        flows: Arc<dyn TaskFlowRepository>,
        logs: Arc<dyn ExecutionLogRepository>,
        datax_home: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        let scheduler = Self {
            tasks,
            flows,
            logs,
            registry: RunRegistry::new(),
            cron: CronRegistry::new(),
            path_preparer: PathPreparer::new(),
            datax_home: datax_home.into(),
            temp_dir: temp_dir.into(),
            python_bin: "python".to_string(),
        };
        scheduler.init_temp_dir();
        scheduler
    }

    /// 替换 python 解释器（部署环境差异）
    pub fn with_python_bin(mut self, bin: impl Into<String>) -> Self {
        self.python_bin = bin.into();
        self
    }

    /// 替换 hadoop 命令路径
    pub fn with_hadoop_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.path_preparer = PathPreparer::with_command(cmd);
        self
    }

    fn init_temp_dir(&self) {
        if self.temp_dir.is_dir() {
            info!("使用已有临时目录: {}", self.temp_dir.display());
            return;
        }

        match std::fs::create_dir_all(&self.temp_dir) {
            Ok(()) => info!("已创建临时目录: {}", self.temp_dir.display()),
            Err(e) => error!("创建临时目录 {} 失败: {}", self.temp_dir.display(), e),
        }
    }

    /// 启动调度：回收孤儿执行记录，为所有启用且表达式有效的任务流注册 cron。
    /// 单条任务流注册失败只记日志，不阻塞其余任务流
    pub async fn load_and_start(self: &Arc<Self>) -> SchedulerResult<()> {
        match self.logs.fail_orphaned_executions(Utc::now()).await {
            Ok(0) => {}
            Ok(n) => info!("已回收 {} 条中断的执行记录", n),
            Err(e) => warn!("回收孤儿执行记录失败: {}", e),
        }

        let flows = self.flows.list_enabled().await?;
        for flow in flows {
            if flow.cron_expr.is_empty() {
                continue;
            }
            if let Err(e) = self.schedule_flow(flow.id, &flow.cron_expr).await {
                warn!("注册任务流 {} 的调度失败: {}", flow.id, e);
            }
        }

        info!("任务流调度器已启动");
        Ok(())
    }

    /// 从数据库重读任务流并更新其 cron 条目。
    /// 先删后加：旧表达式的触发循环在新条目生效前已经终止
    pub async fn reload_task_flow(self: &Arc<Self>, flow_id: i64) -> SchedulerResult<()> {
        if self.cron.remove(flow_id).await {
            info!("已从 cron 调度中移除任务流 {}", flow_id);
        }

        let flow = self
            .flows
            .find_by_id(flow_id)
            .await?
            .ok_or(SchedulerError::FlowNotFound { id: flow_id })?;

        if flow.enabled && !flow.cron_expr.is_empty() {
            self.schedule_flow(flow_id, &flow.cron_expr).await?;
            info!("已重载任务流 {}, cron 表达式: {}", flow_id, flow.cron_expr);
        }

        Ok(())
    }

    /// 把任务流移出 cron 调度（不影响在途执行）
    pub async fn remove_task_flow_from_cron(&self, flow_id: i64) -> SchedulerResult<()> {
        if self.cron.remove(flow_id).await {
            info!("已从 cron 调度中移除任务流 {}", flow_id);
        } else {
            info!("任务流 {} 不在 cron 调度中", flow_id);
        }
        Ok(())
    }

    async fn schedule_flow(self: &Arc<Self>, flow_id: i64, expr: &str) -> SchedulerResult<()> {
        let scheduler = Arc::clone(self);
        self.cron
            .register(flow_id, expr, move || {
                let scheduler = Arc::clone(&scheduler);
                tokio::spawn(async move {
                    if let Err(e) = scheduler
                        .run_task_flow(flow_id, ExecutionType::Scheduled)
                        .await
                    {
                        warn!("任务流 {} 调度执行出错: {}", flow_id, e);
                    }
                });
            })
            .await
    }

    /// 终止正在运行的任务。未运行时报错，对活跃执行幂等
    pub async fn kill_task(&self, task_id: i64) -> SchedulerResult<()> {
        if self.registry.cancel_task(task_id).await {
            Ok(())
        } else {
            Err(SchedulerError::TaskNotRunning { id: task_id })
        }
    }

    /// 终止正在运行的任务流。当前步骤的任务随之被终止，后续步骤不再开始
    pub async fn kill_task_flow(&self, flow_id: i64) -> SchedulerResult<()> {
        if self.registry.cancel_flow(flow_id).await {
            Ok(())
        } else {
            Err(SchedulerError::FlowNotRunning { id: flow_id })
        }
    }

    pub async fn is_task_running(&self, task_id: i64) -> bool {
        self.registry.is_task_running(task_id).await
    }

    pub async fn is_task_flow_running(&self, flow_id: i64) -> bool {
        self.registry.is_flow_running(flow_id).await
    }

    /// 任务流是否持有 cron 条目
    pub async fn is_flow_scheduled(&self, flow_id: i64) -> bool {
        self.cron.contains(flow_id).await
    }

    /// 任务流接下来 count 个触发时刻
    pub async fn next_fire_times(
        &self,
        flow_id: i64,
        count: usize,
    ) -> Option<Vec<DateTime<FixedOffset>>> {
        let from = Utc::now().with_timezone(&shanghai());
        self.cron.upcoming_times(flow_id, from, count).await
    }

    /// 停止全部 cron 触发循环
    pub async fn shutdown(&self) {
        self.cron.shutdown().await;
        info!("cron 调度已停止");
    }
}
