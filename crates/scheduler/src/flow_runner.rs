//! 任务流执行
//!
//! 一次调用：占槽、创建执行记录、按 step_order 依次执行步骤、
//! 聚合终态。执行记录的终态更新总是尝试，即使步骤出错。

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use dataxweb_domain::{ExecutionStatus, ExecutionType};
use dataxweb_errors::{SchedulerError, SchedulerResult};

use crate::scheduler::Scheduler;
use crate::task_runner::StepTag;

impl Scheduler {
    /// 立即执行任务流
    pub async fn run_task_flow(
        &self,
        flow_id: i64,
        execution_type: ExecutionType,
    ) -> SchedulerResult<()> {
        let token = CancellationToken::new();
        // 冲突时快速失败：不创建执行记录
        self.registry.claim_flow(flow_id, token.clone()).await?;

        let start = Utc::now();
        let exec_id = match self
            .logs
            .create_flow_execution(flow_id, execution_type, start)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                self.registry.release_flow(flow_id).await;
                return Err(e);
            }
        };

        info!(
            "任务流 {} 开始执行, 执行记录 {}, 触发方式 {}",
            flow_id,
            exec_id,
            execution_type.as_str()
        );

        let result = self
            .execute_flow_steps(&token, flow_id, exec_id, execution_type)
            .await;

        // killed 只看任务流自身的令牌：步骤内部的任务级 kill 算步骤失败
        let status = match &result {
            Ok(()) => ExecutionStatus::Success,
            Err(_) if token.is_cancelled() => ExecutionStatus::Killed,
            Err(_) => ExecutionStatus::Failed,
        };

        // 终态更新总是尝试，失败不向上传播
        if let Err(e) = self
            .logs
            .finish_flow_execution(exec_id, status, Utc::now())
            .await
        {
            error!("更新执行记录 {} 终态失败: {}", exec_id, e);
        }

        self.registry.release_flow(flow_id).await;

        info!(
            "任务流 {} 执行结束, 状态 {}",
            flow_id,
            status.as_str()
        );
        result
    }

    /// 按 step_order 升序执行全部步骤，首个失败立即停止。
    /// 步骤超时只包住该步骤；超时记 failed，显式 kill 记 killed
    async fn execute_flow_steps(
        &self,
        token: &CancellationToken,
        flow_id: i64,
        exec_id: i64,
        execution_type: ExecutionType,
    ) -> SchedulerResult<()> {
        let steps = self.flows.list_steps(flow_id).await?;

        for step in steps {
            // kill 到达后不再开始后续步骤
            if token.is_cancelled() {
                return Err(SchedulerError::Cancelled);
            }

            let timeout = step
                .timeout_minutes
                .filter(|m| *m > 0)
                .map(|m| Duration::from_secs(m as u64 * 60));

            let tag = StepTag {
                flow_execution_id: exec_id,
                step_id: step.id,
                step_order: step.step_order,
            };

            info!(
                "任务流 {} 步骤 {} (任务 {}) 开始",
                flow_id, step.step_order, step.task_id
            );

            self.execute_task(token, step.task_id, None, Some(tag), execution_type, timeout)
                .await
                .map_err(|e| {
                    error!(
                        "任务流 {} 步骤 {} 失败: {}",
                        flow_id, step.step_order, e
                    );
                    e
                })?;
        }

        Ok(())
    }
}
