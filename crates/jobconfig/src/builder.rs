//! DataX 作业 JSON 组装
//!
//! `compose_job` 是纯函数：同样的请求与连接参数总是产出同样的 JSON。
//! `ConfigBuilder` 负责把数据源行解析为连接参数后调用它。

use std::sync::Arc;

use serde_json::{json, Value};

use dataxweb_domain::{DataSourceKind, DataSourceRepository};
use dataxweb_errors::{SchedulerError, SchedulerResult};

use crate::data_source::{fs_connection, mysql_connection};
use crate::types::{
    Column, ConfigRequest, FileFormat, FsConnection, FsSection, MySqlConnection, SideConnection,
};
use crate::validator::validate_config_request;

/// MySQL 类型映射到 DataX 类型
pub fn map_mysql_type(data_type: &str) -> &'static str {
    let data_type = data_type.to_lowercase();
    if data_type.contains("int") {
        "long"
    } else if data_type.contains("double")
        || data_type.contains("float")
        || data_type.contains("decimal")
    {
        "double"
    } else if data_type.contains("bool") || data_type.contains("bit") {
        "boolean"
    } else if data_type == "date" {
        "date"
    } else if data_type.contains("time") {
        // datetime/timestamp
        "timestamp"
    } else {
        "string"
    }
}

/// DataX 配置构建器
pub struct ConfigBuilder {
    sources: Arc<dyn DataSourceRepository>,
}

impl ConfigBuilder {
    pub fn new(sources: Arc<dyn DataSourceRepository>) -> Self {
        Self { sources }
    }

    /// 验证请求、解析两端数据源并组装 DataX 作业
    pub async fn build_config(&self, req: &ConfigRequest) -> SchedulerResult<Value> {
        validate_config_request(req)?;

        let input = self.resolve_side(req, true).await?;
        let output = self.resolve_side(req, false).await?;

        compose_job(req, &input, &output)
    }

    async fn resolve_side(&self, req: &ConfigRequest, is_input: bool) -> SchedulerResult<SideConnection> {
        let (kind, side) = if is_input {
            (req.input_type, &req.input)
        } else {
            (req.output_type, &req.output)
        };

        let id = match kind {
            DataSourceKind::MySql => {
                let mysql = side.mysql.as_ref().ok_or_else(|| {
                    SchedulerError::validation("缺少 MySQL 端配置")
                })?;
                if is_input {
                    mysql.source_id
                } else {
                    mysql.target_id
                }
            }
            _ => {
                side.fs
                    .as_ref()
                    .ok_or_else(|| SchedulerError::validation("缺少文件系统端配置"))?
                    .fs_id
            }
        };

        let ds = self
            .sources
            .find_by_id(id)
            .await?
            .ok_or(SchedulerError::DataSourceNotFound { id })?;

        Ok(match kind {
            DataSourceKind::MySql => SideConnection::MySql(mysql_connection(&ds)?),
            _ => SideConnection::Fs(fs_connection(&ds)?),
        })
    }
}

/// 组装完整的 DataX Job（纯函数）
pub fn compose_job(
    req: &ConfigRequest,
    input: &SideConnection,
    output: &SideConnection,
) -> SchedulerResult<Value> {
    if req.columns.is_empty() {
        return Err(SchedulerError::validation("缺少基准列定义"));
    }

    let channel = if req.speed_channel <= 0 {
        1
    } else {
        req.speed_channel
    };

    let column_names: Vec<&str> = req.columns.iter().map(|c| c.name.as_str()).collect();

    let reader = match input {
        SideConnection::MySql(conn) => build_mysql_reader(req, conn, &column_names)?,
        SideConnection::Fs(conn) => build_fs_reader(req, conn)?,
    };

    let writer = match output {
        SideConnection::MySql(conn) => build_mysql_writer(req, conn, &column_names)?,
        SideConnection::Fs(conn) => build_fs_writer(req, conn)?,
    };

    Ok(json!({
        "job": {
            "content": [{"reader": reader, "writer": writer}],
            "setting": {"speed": {"channel": channel}},
        }
    }))
}

fn jdbc_url(conn: &MySqlConnection) -> String {
    format!(
        "jdbc:mysql://{}/{}?useUnicode=true&characterEncoding=utf8",
        conn.host, conn.db
    )
}

fn build_mysql_reader(
    req: &ConfigRequest,
    conn: &MySqlConnection,
    column_names: &[&str],
) -> SchedulerResult<Value> {
    let mysql = req
        .input
        .mysql
        .as_ref()
        .ok_or_else(|| SchedulerError::validation("缺少输入 MySQL 配置"))?;

    let mut param = json!({
        "username": conn.user,
        "password": conn.pass,
        "column": column_names,
        "connection": [{
            "table": [mysql.table],
            "jdbcUrl": [jdbc_url(conn)],
        }],
    });

    if !req.mysql_where.trim().is_empty() {
        param["where"] = json!(req.mysql_where);
    }

    Ok(json!({"name": "mysqlreader", "parameter": param}))
}

fn build_mysql_writer(
    req: &ConfigRequest,
    conn: &MySqlConnection,
    column_names: &[&str],
) -> SchedulerResult<Value> {
    let mysql = req
        .output
        .mysql
        .as_ref()
        .ok_or_else(|| SchedulerError::validation("缺少输出 MySQL 配置"))?;

    // writer 的 connection 用单元素数组、标量 jdbcUrl，与 reader 不同
    let param = json!({
        "username": conn.user,
        "password": conn.pass,
        "column": column_names,
        "writeMode": "insert",
        "connection": [{
            "table": [mysql.table],
            "jdbcUrl": jdbc_url(conn),
        }],
    });

    Ok(json!({"name": "mysqlwriter", "parameter": param}))
}

fn build_fs_reader(req: &ConfigRequest, conn: &FsConnection) -> SchedulerResult<Value> {
    let fs = req
        .input
        .fs
        .as_ref()
        .ok_or_else(|| SchedulerError::validation("缺少输入文件系统配置"))?;

    let file_type = fs.file_type.unwrap_or(FileFormat::Orc);

    let mut param = json!({
        "defaultFS": conn.defaultfs,
        "path": fs.path,
        "fileType": file_type.as_str(),
    });

    attach_fs_extras(&mut param, conn, fs);

    match file_type {
        FileFormat::Text => {
            param["fieldDelimiter"] = json!(required_delimiter(fs)?);
            param["column"] = build_text_columns(&fs.indexes, &req.columns)?;
        }
        FileFormat::Orc | FileFormat::Parquet => {
            param["column"] = build_index_columns(&fs.indexes, &req.columns);
        }
    }

    Ok(json!({"name": "hdfsreader", "parameter": param}))
}

fn build_fs_writer(req: &ConfigRequest, conn: &FsConnection) -> SchedulerResult<Value> {
    let fs = req
        .output
        .fs
        .as_ref()
        .ok_or_else(|| SchedulerError::validation("缺少输出文件系统配置"))?;

    let file_type = fs.file_type.unwrap_or(FileFormat::Orc);
    let write_mode = fs
        .write_mode
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "nonConflict".to_string());

    let columns: Vec<Value> = req
        .columns
        .iter()
        .map(|col| json!({"name": col.name, "type": map_mysql_type(&col.data_type)}))
        .collect();

    let mut param = json!({
        "defaultFS": conn.defaultfs,
        "path": fs.path,
        "fileType": file_type.as_str(),
        "writeMode": write_mode,
        "column": columns,
    });

    attach_fs_extras(&mut param, conn, fs);

    // 写端所有文件类型都要求分隔符
    param["fieldDelimiter"] = json!(required_delimiter(fs)?);

    Ok(json!({"name": "hdfswriter", "parameter": param}))
}

/// hadoopConfig 仅在非空时附加，fileName 仅在指定时附加
fn attach_fs_extras(param: &mut Value, conn: &FsConnection, fs: &FsSection) {
    if !conn.hadoop_config.is_empty() {
        param["hadoopConfig"] = json!(conn.hadoop_config);
    }
    if let Some(name) = fs.filename.as_deref().filter(|n| !n.is_empty()) {
        param["fileName"] = json!(name);
    }
}

fn required_delimiter(fs: &FsSection) -> SchedulerResult<&str> {
    fs.field_delimiter
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| SchedulerError::validation("fieldDelimiter is required for file system"))
}

fn build_text_columns(indexes: &[usize], columns: &[Column]) -> SchedulerResult<Value> {
    let generated: Vec<usize>;
    let indexes = if indexes.is_empty() {
        generated = (0..columns.len()).collect();
        &generated
    } else {
        indexes
    };

    if indexes.len() != columns.len() {
        return Err(SchedulerError::validation("索引数量与基准列数量不一致"));
    }

    let cols: Vec<Value> = columns
        .iter()
        .zip(indexes)
        .map(|(col, idx)| json!({"index": idx, "type": map_mysql_type(&col.data_type)}))
        .collect();

    Ok(json!(cols))
}

fn build_index_columns(indexes: &[usize], columns: &[Column]) -> Value {
    let generated: Vec<usize>;
    let indexes = if indexes.is_empty() {
        generated = (0..columns.len()).collect();
        &generated
    } else {
        indexes
    };

    let cols: Vec<Value> = indexes.iter().map(|idx| json!({"index": idx})).collect();
    json!(cols)
}
