use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 任务：一份保存下来的 DataX JSON 作业
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub source_id: i64,
    pub target_id: i64,
    /// 规范的 DataX JSON，可包含日期占位符；为空表示尚未配置
    pub json_config: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 任务流：按 step_order 排序的任务序列，可绑定 cron 表达式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskFlow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cron_expr: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 任务流中的一个步骤
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskFlowStep {
    pub id: i64,
    pub flow_id: i64,
    pub task_id: i64,
    /// 从 1 开始；调度器按升序执行，容忍编号空洞
    pub step_order: i32,
    pub timeout_minutes: Option<i32>,
}

/// 数据源类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    MySql,
    Ofs,
    Hdfs,
    Cosn,
}

impl DataSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Ofs => "ofs",
            Self::Hdfs => "hdfs",
            Self::Cosn => "cosn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mysql" => Some(Self::MySql),
            "ofs" => Some(Self::Ofs),
            "hdfs" => Some(Self::Hdfs),
            "cosn" => Some(Self::Cosn),
            _ => None,
        }
    }

    /// OFS/HDFS/COSN 都走 Hadoop 兼容文件系统
    pub fn is_filesystem(&self) -> bool {
        !matches!(self, Self::MySql)
    }
}

impl std::fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 数据源连接记录。MySQL 行填 db_* 列，文件系统行填 defaultfs/hadoopconfig
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSource {
    pub id: i64,
    pub name: String,
    pub kind: DataSourceKind,
    pub db_url: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_database: Option<String>,
    pub defaultfs: Option<String>,
    /// JSON 对象或逗号分隔的 k=v 串
    pub hadoopconfig: Option<String>,
}

/// 任务流执行状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
    Killed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Killed => "killed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "killed" => Some(Self::Killed),
            _ => None,
        }
    }
}

/// 触发方式：手动或 cron 调度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    Manual,
    Scheduled,
}

impl ExecutionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "scheduled" => Some(Self::Scheduled),
            _ => None,
        }
    }
}

/// 一次任务流调用对应一行执行记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowExecution {
    pub id: i64,
    pub flow_id: i64,
    pub status: ExecutionStatus,
    pub execution_type: ExecutionType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// 任务日志的终态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskLogStatus {
    Success,
    Failed,
    Killed,
}

impl TaskLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Killed => "killed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "killed" => Some(Self::Killed),
            _ => None,
        }
    }
}

/// 一次任务调用写入一行日志。
/// flow_execution_id 区分独立执行与任务流步骤执行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskLog {
    pub id: i64,
    pub task_id: i64,
    pub flow_execution_id: Option<i64>,
    pub step_id: Option<i64>,
    pub step_order: Option<i32>,
    pub execution_type: ExecutionType,
    pub status: TaskLogStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub log: String,
}
