//! 调度核心
//!
//! 持有 cron 注册表与运行注册表，驱动任务流的顺序步骤执行，
//! 以取消与超时控制拉起外部 DataX 进程，并原子地落执行历史。

pub mod cron_registry;
pub mod path_preparer;
pub mod placeholders;
pub mod run_registry;
pub mod scheduler;

mod flow_runner;
mod task_runner;

pub use cron_registry::{validate_cron_expression, CronRegistry};
pub use path_preparer::PathPreparer;
pub use placeholders::{default_target_date, render_date_placeholders};
pub use run_registry::RunRegistry;
pub use scheduler::Scheduler;
pub use task_runner::StepTag;
