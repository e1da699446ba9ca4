//! DataX 作业配置生成
//!
//! 把类型化的请求与存储的数据源行翻译成 DataX JSON。
//! 组装本身是纯函数，数据源解析只发生在入口处。

pub mod builder;
pub mod data_source;
pub mod types;
pub mod validator;

pub use builder::{compose_job, map_mysql_type, ConfigBuilder};
pub use data_source::{fs_connection, mysql_connection, parse_hadoop_config};
pub use types::{
    Column, ConfigRequest, FileFormat, FsConnection, FsSection, MySqlConnection, MySqlSection,
    SideConfig, SideConnection,
};
pub use validator::validate_config_request;
