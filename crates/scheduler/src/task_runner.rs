//! 任务执行
//!
//! 单次任务调用：占槽、渲染配置、路径预检、落临时文件、拉起 DataX、
//! 捕获输出、判定终态、写一行任务日志。任何终态分支都恰好写一行日志，
//! 冲突与任务不存在除外。

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use dataxweb_domain::{ExecutionType, TaskLog, TaskLogStatus};
use dataxweb_errors::{SchedulerError, SchedulerResult};

use crate::placeholders::{default_target_date, render_date_placeholders};
use crate::scheduler::Scheduler;

/// 任务流步骤上下文，写入任务日志行
#[derive(Debug, Clone, Copy)]
pub struct StepTag {
    pub flow_execution_id: i64,
    pub step_id: i64,
    pub step_order: i32,
}

/// 进程运行的失败形态
enum RunFailure {
    /// 显式 kill
    Killed { output: String },
    /// 步骤超时计时器触发
    TimedOut { output: String },
    /// 进程无法启动
    Spawn(std::io::Error),
    /// 非零退出码
    NonZero { output: String, code: i32 },
    /// 等待进程时的 IO 错误
    Wait(std::io::Error),
}

impl Scheduler {
    /// 立即执行任务，占位符按默认日期（昨天）替换。
    /// 返回捕获的进程输出；终止时命令被杀死，日志状态记 killed
    pub async fn run_task(
        &self,
        task_id: i64,
        execution_type: ExecutionType,
    ) -> SchedulerResult<String> {
        self.run_task_with_date(task_id, None, execution_type).await
    }

    /// 执行任务并指定占位符替换日期，用于补数
    pub async fn run_task_with_date(
        &self,
        task_id: i64,
        target_date: Option<NaiveDateTime>,
        execution_type: ExecutionType,
    ) -> SchedulerResult<String> {
        self.execute_task(
            &CancellationToken::new(),
            task_id,
            target_date,
            None,
            execution_type,
            None,
        )
        .await
    }

    /// 任务执行的完整路径。parent 是调用方（任务流）的取消令牌，
    /// 句柄里存它的子令牌，kill_task 只取消本任务，任务流 kill 级联下来
    pub(crate) async fn execute_task(
        &self,
        parent: &CancellationToken,
        task_id: i64,
        target_date: Option<NaiveDateTime>,
        step: Option<StepTag>,
        execution_type: ExecutionType,
        timeout: Option<Duration>,
    ) -> SchedulerResult<String> {
        let token = parent.child_token();
        // 冲突时快速失败：没有文件、没有进程、没有日志行
        self.registry.claim_task(task_id, token.clone()).await?;

        let start = Utc::now();

        let task = match self.tasks.find_by_id(task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                self.registry.release_task(task_id).await;
                return Err(SchedulerError::TaskNotFound { id: task_id });
            }
            Err(e) => {
                self.registry.release_task(task_id).await;
                return Err(e);
            }
        };

        if task.json_config.is_empty() {
            let err = SchedulerError::EmptyTaskConfig;
            self.write_task_log(
                task_id,
                step,
                execution_type,
                TaskLogStatus::Failed,
                start,
                err.to_string(),
            )
            .await;
            self.registry.release_task(task_id).await;
            return Err(err);
        }

        let rendered = render_date_placeholders(
            &task.json_config,
            target_date.unwrap_or_else(default_target_date),
        );

        if let Err(e) = self.path_preparer.prepare_config_paths(&rendered).await {
            self.write_task_log(
                task_id,
                step,
                execution_type,
                TaskLogStatus::Failed,
                start,
                e.to_string(),
            )
            .await;
            self.registry.release_task(task_id).await;
            return Err(e);
        }

        let tmp_path = self.temp_dir.join(format!(
            "job_{}_{}.json",
            task_id,
            unix_nanos()
        ));
        if let Err(e) = write_job_file(&tmp_path, &rendered).await {
            let msg = format!("写入配置文件失败: {e}");
            self.write_task_log(
                task_id,
                step,
                execution_type,
                TaskLogStatus::Failed,
                start,
                msg.clone(),
            )
            .await;
            self.registry.release_task(task_id).await;
            return Err(SchedulerError::execution(msg));
        }

        info!("任务 {} ({}) 开始执行", task_id, task.name);
        let run = self.spawn_and_wait(&token, &tmp_path, timeout).await;

        let (status, log_text, result) = match run {
            Ok(output) => (TaskLogStatus::Success, output.clone(), Ok(output)),
            Err(RunFailure::Killed { output }) => {
                (TaskLogStatus::Killed, output, Err(SchedulerError::Cancelled))
            }
            Err(RunFailure::TimedOut { output }) => (
                TaskLogStatus::Failed,
                output,
                Err(SchedulerError::StepTimeout),
            ),
            Err(RunFailure::Spawn(e)) => {
                let msg = format!("启动 DataX 进程失败: {e}");
                (
                    TaskLogStatus::Failed,
                    msg.clone(),
                    Err(SchedulerError::execution(msg)),
                )
            }
            Err(RunFailure::NonZero { output, code }) => (
                TaskLogStatus::Failed,
                output,
                Err(SchedulerError::execution(format!(
                    "DataX 进程退出码 {code}"
                ))),
            ),
            Err(RunFailure::Wait(e)) => {
                let msg = format!("等待进程结束失败: {e}");
                (
                    TaskLogStatus::Failed,
                    msg.clone(),
                    Err(SchedulerError::execution(msg)),
                )
            }
        };

        self.write_task_log(task_id, step, execution_type, status, start, log_text)
            .await;
        self.registry.release_task(task_id).await;

        if let Err(e) = tokio::fs::remove_file(&tmp_path).await {
            warn!("清理临时文件 {} 失败: {}", tmp_path.display(), e);
        }

        info!(
            "任务 {} 执行结束, 状态 {}",
            task_id,
            status.as_str()
        );
        result
    }

    /// 拉起 `python <datax_home>/bin/datax.py <config>`，捕获合并输出直到进程退出。
    /// 取消与超时都会杀死进程，但在终态上是两种不同的结局
    async fn spawn_and_wait(
        &self,
        token: &CancellationToken,
        config_path: &Path,
        timeout: Option<Duration>,
    ) -> Result<String, RunFailure> {
        let datax_py = self.datax_home.join("bin").join("datax.py");

        let mut cmd = Command::new(&self.python_bin);
        cmd.arg(&datax_py)
            .arg(config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(RunFailure::Spawn)?;

        // 输出读取拿走管道句柄，不借用 child 本身
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collector = tokio::spawn(collect_output(stdout, stderr));

        enum WaitOutcome {
            Exited(std::io::Result<std::process::ExitStatus>),
            Cancelled,
            TimedOut,
        }

        let outcome = match timeout {
            Some(dur) => tokio::select! {
                status = child.wait() => WaitOutcome::Exited(status),
                _ = token.cancelled() => WaitOutcome::Cancelled,
                _ = tokio::time::sleep(dur) => WaitOutcome::TimedOut,
            },
            None => tokio::select! {
                status = child.wait() => WaitOutcome::Exited(status),
                _ = token.cancelled() => WaitOutcome::Cancelled,
            },
        };

        if matches!(&outcome, WaitOutcome::Cancelled | WaitOutcome::TimedOut) {
            if let Err(e) = child.start_kill() {
                warn!("终止 DataX 进程失败: {}", e);
            }
            let _ = child.wait().await;
        }

        let output = collector.await.unwrap_or_default();

        match outcome {
            WaitOutcome::Exited(Ok(status)) if status.success() => Ok(output),
            WaitOutcome::Exited(Ok(status)) => Err(RunFailure::NonZero {
                output,
                code: status.code().unwrap_or(-1),
            }),
            WaitOutcome::Exited(Err(e)) => Err(RunFailure::Wait(e)),
            WaitOutcome::Cancelled => Err(RunFailure::Killed { output }),
            WaitOutcome::TimedOut => Err(RunFailure::TimedOut { output }),
        }
    }

    /// 写任务日志行。持久化失败只记日志，不吞掉执行结果
    async fn write_task_log(
        &self,
        task_id: i64,
        step: Option<StepTag>,
        execution_type: ExecutionType,
        status: TaskLogStatus,
        start_time: chrono::DateTime<Utc>,
        log_text: String,
    ) {
        let row = TaskLog {
            id: 0,
            task_id,
            flow_execution_id: step.map(|s| s.flow_execution_id),
            step_id: step.map(|s| s.step_id),
            step_order: step.map(|s| s.step_order),
            execution_type,
            status,
            start_time,
            end_time: Utc::now(),
            log: log_text,
        };

        if let Err(e) = self.logs.append_task_log(&row).await {
            error!("写入任务 {} 的日志行失败: {}", task_id, e);
        }
    }
}

fn unix_nanos() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}

/// 渲染后的作业 JSON 落盘，0644
async fn write_job_file(path: &Path, content: &str) -> std::io::Result<()> {
    tokio::fs::write(path, content).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o644);
        tokio::fs::set_permissions(path, perms).await?;
    }

    Ok(())
}

/// 合并捕获 stdout 与 stderr，stdout 在前
async fn collect_output(
    stdout: Option<tokio::process::ChildStdout>,
    stderr: Option<tokio::process::ChildStderr>,
) -> String {
    let read_out = async {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stdout {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    };
    let read_err = async {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    };

    let (out, err) = tokio::join!(read_out, read_err);

    let mut combined = String::from_utf8_lossy(&out).into_owned();
    if !err.is_empty() {
        combined.push_str(&String::from_utf8_lossy(&err));
    }
    combined
}
