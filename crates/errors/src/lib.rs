use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("任务未找到: {id}")]
    TaskNotFound { id: i64 },
    #[error("任务流未找到: {id}")]
    FlowNotFound { id: i64 },
    #[error("数据源未找到: {id}")]
    DataSourceNotFound { id: i64 },
    #[error("无效的CRON表达式: {expr} - {message}")]
    InvalidCron { expr: String, message: String },
    #[error("任务 {id} 正在运行中")]
    TaskAlreadyRunning { id: i64 },
    #[error("任务流 {id} 正在运行中")]
    FlowAlreadyRunning { id: i64 },
    #[error("任务 {id} 未在运行")]
    TaskNotRunning { id: i64 },
    #[error("任务流 {id} 未在运行")]
    FlowNotRunning { id: i64 },
    #[error("执行已被终止")]
    Cancelled,
    #[error("步骤执行超时")]
    StepTimeout,
    #[error("任务配置为空，无法执行")]
    EmptyTaskConfig,
    #[error("路径预检失败: {0}")]
    PathPreflight(String),
    #[error("任务执行错误: {0}")]
    TaskExecution(String),
    #[error("数据验证失败: {0}")]
    Validation(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

impl SchedulerError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::TaskExecution(msg.into())
    }

    /// 冲突类错误（单飞保护拒绝的第二次触发）
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::TaskAlreadyRunning { .. } | Self::FlowAlreadyRunning { .. }
        )
    }

    /// 终止类错误。超时不计入：超时由计时器触发，日志记录为 failed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}
