//! 运行注册表
//!
//! 两张独立读写锁保护的表，保证每个任务/任务流同一时刻至多一个活跃执行，
//! 并通过句柄里的取消令牌支持 kill。取消走读锁：它只触发令牌本身，不改表。

use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use dataxweb_errors::{SchedulerError, SchedulerResult};

/// 活跃执行的句柄
struct RunHandle {
    cancel: CancellationToken,
}

/// 单飞保护注册表
#[derive(Default)]
pub struct RunRegistry {
    tasks: RwLock<HashMap<i64, RunHandle>>,
    flows: RwLock<HashMap<i64, RunHandle>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 占用任务槽位。已有活跃执行时报冲突，不产生任何副作用
    pub async fn claim_task(&self, task_id: i64, cancel: CancellationToken) -> SchedulerResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task_id) {
            return Err(SchedulerError::TaskAlreadyRunning { id: task_id });
        }
        tasks.insert(task_id, RunHandle { cancel });
        Ok(())
    }

    pub async fn release_task(&self, task_id: i64) {
        self.tasks.write().await.remove(&task_id);
    }

    /// 触发任务的取消令牌。返回是否存在活跃执行；重复触发无害
    pub async fn cancel_task(&self, task_id: i64) -> bool {
        let tasks = self.tasks.read().await;
        match tasks.get(&task_id) {
            Some(handle) => {
                handle.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn is_task_running(&self, task_id: i64) -> bool {
        self.tasks.read().await.contains_key(&task_id)
    }

    /// 占用任务流槽位
    pub async fn claim_flow(&self, flow_id: i64, cancel: CancellationToken) -> SchedulerResult<()> {
        let mut flows = self.flows.write().await;
        if flows.contains_key(&flow_id) {
            return Err(SchedulerError::FlowAlreadyRunning { id: flow_id });
        }
        flows.insert(flow_id, RunHandle { cancel });
        Ok(())
    }

    pub async fn release_flow(&self, flow_id: i64) {
        self.flows.write().await.remove(&flow_id);
    }

    pub async fn cancel_flow(&self, flow_id: i64) -> bool {
        let flows = self.flows.read().await;
        match flows.get(&flow_id) {
            Some(handle) => {
                handle.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn is_flow_running(&self, flow_id: i64) -> bool {
        self.flows.read().await.contains_key(&flow_id)
    }
}
