use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dataxweb_domain::DataSourceKind;

/// 支持的文件格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Orc,
    Parquet,
    Text,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orc => "orc",
            Self::Parquet => "parquet",
            Self::Text => "text",
        }
    }
}

/// 基准列定义
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
}

/// MySQL 端配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MySqlSection {
    #[serde(default)]
    pub source_id: i64,
    #[serde(default)]
    pub target_id: i64,
    #[serde(default)]
    pub table: String,
}

/// 文件系统端配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FsSection {
    #[serde(default)]
    pub fs_id: i64,
    #[serde(rename = "fileType", default)]
    pub file_type: Option<FileFormat>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub indexes: Vec<usize>,
    #[serde(rename = "fieldDelimiter", default)]
    pub field_delimiter: Option<String>,
    #[serde(rename = "writeMode", default)]
    pub write_mode: Option<String>,
    #[serde(rename = "fileName", default)]
    pub filename: Option<String>,
}

/// 一端的嵌套配置，与声明的类型对应的字段必须齐全
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SideConfig {
    #[serde(default)]
    pub mysql: Option<MySqlSection>,
    #[serde(default)]
    pub fs: Option<FsSection>,
}

/// DataX 配置生成请求
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigRequest {
    #[serde(rename = "inType")]
    pub input_type: DataSourceKind,
    #[serde(rename = "outType")]
    pub output_type: DataSourceKind,
    #[serde(rename = "mysqlWhere", default)]
    pub mysql_where: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(rename = "speedChannel", default)]
    pub speed_channel: i64,
    #[serde(rename = "in", default)]
    pub input: SideConfig,
    #[serde(rename = "out", default)]
    pub output: SideConfig,
}

/// MySQL 连接参数（从 data_sources 行解析）
#[derive(Debug, Clone, PartialEq)]
pub struct MySqlConnection {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub db: String,
}

/// 文件系统连接参数（从 data_sources 行解析）。
/// BTreeMap 保证组装出的 hadoopConfig 键序稳定
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FsConnection {
    pub defaultfs: String,
    pub hadoop_config: BTreeMap<String, String>,
}

/// 解析完成的一端连接
#[derive(Debug, Clone, PartialEq)]
pub enum SideConnection {
    MySql(MySqlConnection),
    Fs(FsConnection),
}
