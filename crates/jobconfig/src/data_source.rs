//! 数据源行到连接参数的解析

use std::collections::BTreeMap;

use dataxweb_domain::{DataSource, DataSourceKind};
use dataxweb_errors::{SchedulerError, SchedulerResult};

use crate::types::{FsConnection, MySqlConnection};

/// 从数据源行取 MySQL 连接参数
pub fn mysql_connection(ds: &DataSource) -> SchedulerResult<MySqlConnection> {
    if !matches!(ds.kind, DataSourceKind::MySql) {
        return Err(SchedulerError::validation("数据源类型不是MySQL"));
    }

    Ok(MySqlConnection {
        host: ds.db_url.clone().unwrap_or_default(),
        user: ds.db_user.clone().unwrap_or_default(),
        pass: ds.db_password.clone().unwrap_or_default(),
        db: ds.db_database.clone().unwrap_or_default(),
    })
}

/// 从数据源行取文件系统连接参数
pub fn fs_connection(ds: &DataSource) -> SchedulerResult<FsConnection> {
    if !ds.kind.is_filesystem() {
        return Err(SchedulerError::validation("数据源类型不是文件系统类型"));
    }

    let hadoop_config = ds
        .hadoopconfig
        .as_deref()
        .map(parse_hadoop_config)
        .unwrap_or_default();

    Ok(FsConnection {
        defaultfs: ds.defaultfs.clone().unwrap_or_default(),
        hadoop_config,
    })
}

/// 解析 hadoopconfig 列：优先按 JSON 对象，失败则按逗号分隔的 k=v 串
pub fn parse_hadoop_config(raw: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    if raw.is_empty() {
        return out;
    }

    if let Ok(map) = serde_json::from_str::<BTreeMap<String, String>>(raw) {
        return map;
    }

    for pair in raw.split(',') {
        if let Some((k, v)) = pair.split_once('=') {
            out.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    out
}
