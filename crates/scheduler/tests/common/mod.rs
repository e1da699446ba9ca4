//! 测试支撑：内存仓储与桩 DataX 环境

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;

use dataxweb_domain::{
    DataSourceRepository, ExecutionLogRepository, ExecutionStatus, ExecutionType, FlowExecution,
    Task, TaskFlow, TaskFlowRepository, TaskFlowStep, TaskLog, TaskRepository,
};
use dataxweb_errors::SchedulerResult;
use dataxweb_scheduler::Scheduler;

/// 内存仓储，执行记录与任务日志开放给断言
#[derive(Default)]
pub struct MemoryStore {
    pub tasks: Mutex<HashMap<i64, Task>>,
    pub flows: Mutex<HashMap<i64, TaskFlow>>,
    pub steps: Mutex<Vec<TaskFlowStep>>,
    pub executions: Mutex<Vec<FlowExecution>>,
    pub task_logs: Mutex<Vec<TaskLog>>,
    next_exec_id: AtomicI64,
    next_log_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_exec_id: AtomicI64::new(1),
            next_log_id: AtomicI64::new(1),
            ..Default::default()
        })
    }

    pub fn put_task(&self, task: Task) {
        self.tasks.lock().unwrap().insert(task.id, task);
    }

    pub fn put_flow(&self, flow: TaskFlow) {
        self.flows.lock().unwrap().insert(flow.id, flow);
    }

    pub fn put_step(&self, step: TaskFlowStep) {
        self.steps.lock().unwrap().push(step);
    }

    pub fn executions(&self) -> Vec<FlowExecution> {
        self.executions.lock().unwrap().clone()
    }

    pub fn task_logs(&self) -> Vec<TaskLog> {
        self.task_logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<Task>> {
        Ok(self.tasks.lock().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl TaskFlowRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> SchedulerResult<Option<TaskFlow>> {
        Ok(self.flows.lock().unwrap().get(&id).cloned())
    }

    async fn list_enabled(&self) -> SchedulerResult<Vec<TaskFlow>> {
        Ok(self
            .flows
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.enabled)
            .cloned()
            .collect())
    }

    async fn list_steps(&self, flow_id: i64) -> SchedulerResult<Vec<TaskFlowStep>> {
        let mut steps: Vec<TaskFlowStep> = self
            .steps
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.flow_id == flow_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.step_order);
        Ok(steps)
    }
}

#[async_trait]
impl DataSourceRepository for MemoryStore {
    async fn find_by_id(&self, _id: i64) -> SchedulerResult<Option<dataxweb_domain::DataSource>> {
        Ok(None)
    }
}

#[async_trait]
impl ExecutionLogRepository for MemoryStore {
    async fn create_flow_execution(
        &self,
        flow_id: i64,
        execution_type: ExecutionType,
        start_time: DateTime<Utc>,
    ) -> SchedulerResult<i64> {
        let id = self.next_exec_id.fetch_add(1, Ordering::SeqCst);
        self.executions.lock().unwrap().push(FlowExecution {
            id,
            flow_id,
            status: ExecutionStatus::Running,
            execution_type,
            start_time,
            end_time: None,
        });
        Ok(id)
    }

    async fn finish_flow_execution(
        &self,
        execution_id: i64,
        status: ExecutionStatus,
        end_time: DateTime<Utc>,
    ) -> SchedulerResult<()> {
        let mut executions = self.executions.lock().unwrap();
        if let Some(row) = executions.iter_mut().find(|e| e.id == execution_id) {
            row.status = status;
            row.end_time = Some(end_time);
        }
        Ok(())
    }

    async fn append_task_log(&self, log: &TaskLog) -> SchedulerResult<i64> {
        let id = self.next_log_id.fetch_add(1, Ordering::SeqCst);
        let mut row = log.clone();
        row.id = id;
        self.task_logs.lock().unwrap().push(row);
        Ok(id)
    }

    async fn fail_orphaned_executions(&self, end_time: DateTime<Utc>) -> SchedulerResult<u64> {
        let mut executions = self.executions.lock().unwrap();
        let mut affected = 0;
        for row in executions.iter_mut() {
            if row.status == ExecutionStatus::Running {
                row.status = ExecutionStatus::Failed;
                row.end_time = Some(end_time);
                affected += 1;
            }
        }
        Ok(affected)
    }
}

pub fn make_task(id: i64, name: &str, json_config: &str) -> Task {
    Task {
        id,
        name: name.to_string(),
        source_id: 1,
        target_id: 2,
        json_config: json_config.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn make_flow(id: i64, cron_expr: &str, enabled: bool) -> TaskFlow {
    TaskFlow {
        id,
        name: format!("flow-{id}"),
        description: String::new(),
        cron_expr: cron_expr.to_string(),
        enabled,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn make_step(id: i64, flow_id: i64, task_id: i64, step_order: i32) -> TaskFlowStep {
    TaskFlowStep {
        id,
        flow_id,
        task_id,
        step_order,
        timeout_minutes: None,
    }
}

/// 桩 DataX 作业配置：普通成功作业
pub const OK_CONFIG: &str = r#"{"job": {"content": []}}"#;
/// 让桩脚本以非零码退出
pub const FAIL_CONFIG: &str = r#"{"job": {"content": []}, "marker": "MARKER_FAIL"}"#;
/// 让桩脚本长时间休眠
pub const SLEEP_CONFIG: &str = r#"{"job": {"content": []}, "marker": "MARKER_SLEEP"}"#;

/// 测试环境：内存仓储 + 以 sh 桩脚本冒充 DataX 的调度器
pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub scheduler: Arc<Scheduler>,
    _datax_home: TempDir,
    _temp_dir: TempDir,
}

impl TestEnv {
    pub fn temp_dir_path(&self) -> &std::path::Path {
        self._temp_dir.path()
    }

    /// 桩脚本路径，个别测试用来替换脚本行为
    pub fn datax_script_path(&self) -> std::path::PathBuf {
        self._datax_home.path().join("bin").join("datax.py")
    }
}

/// 搭建测试环境。桩脚本按配置文件里的标记决定行为：
/// MARKER_FAIL 退出码 1，MARKER_SLEEP 休眠 30 秒，否则输出 OK
pub fn build_env() -> TestEnv {
    let datax_home = TempDir::new().unwrap();
    let temp_dir = TempDir::new().unwrap();

    let bin = datax_home.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::write(
        bin.join("datax.py"),
        "if grep -q MARKER_FAIL \"$1\"; then echo BOOM; exit 1; fi\n\
         if grep -q MARKER_SLEEP \"$1\"; then sleep 30; fi\n\
         printf 'OK\\n'\n",
    )
    .unwrap();

    let store = MemoryStore::new();
    let scheduler = Arc::new(
        Scheduler::new(
            store.clone(),
            store.clone(),
            store.clone(),
            datax_home.path(),
            temp_dir.path(),
        )
        .with_python_bin("sh"),
    );

    TestEnv {
        store,
        scheduler,
        _datax_home: datax_home,
        _temp_dir: temp_dir,
    }
}

/// 轮询等待任务进入运行注册表
pub async fn wait_until_task_running(scheduler: &Scheduler, task_id: i64) {
    for _ in 0..500 {
        if scheduler.is_task_running(task_id).await {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("任务 {task_id} 未在预期时间内进入运行状态");
}
