//! 文件系统路径预检
//!
//! 作业引用的 HDFS/OFS/COSN 路径在拉起 DataX 之前探测，
//! 不存在则用 hadoop CLI 创建。失败对任务是致命的。

use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use dataxweb_errors::{SchedulerError, SchedulerResult};

/// 路径预检器，封装 hadoop 命令调用
pub struct PathPreparer {
    hadoop_cmd: String,
}

impl Default for PathPreparer {
    fn default() -> Self {
        Self::new()
    }
}

impl PathPreparer {
    pub fn new() -> Self {
        Self {
            hadoop_cmd: "hadoop".to_string(),
        }
    }

    pub fn with_command(cmd: impl Into<String>) -> Self {
        Self {
            hadoop_cmd: cmd.into(),
        }
    }

    /// 验证渲染后作业里的全部文件系统路径，缺失的逐个创建
    pub async fn prepare_config_paths(&self, config_json: &str) -> SchedulerResult<()> {
        let config: Value = serde_json::from_str(config_json)
            .map_err(|e| SchedulerError::PathPreflight(format!("解析JSON配置失败: {e}")))?;

        for path in Self::extract_paths(&config) {
            self.ensure_path(&path).await?;
        }
        Ok(())
    }

    /// 提取 content 中非 MySQL reader/writer 的 parameter.path
    pub fn extract_paths(config: &Value) -> Vec<String> {
        let mut paths = Vec::new();

        let Some(content) = config["job"]["content"].as_array() else {
            return paths;
        };

        for item in content {
            for (role, mysql_name) in [("reader", "mysqlreader"), ("writer", "mysqlwriter")] {
                let plugin = &item[role];
                let is_fs = plugin["name"].as_str().is_some_and(|n| n != mysql_name);
                if !is_fs {
                    continue;
                }
                if let Some(path) = plugin["parameter"]["path"].as_str() {
                    if !path.is_empty() {
                        paths.push(path.to_string());
                    }
                }
            }
        }

        paths
    }

    async fn ensure_path(&self, path: &str) -> SchedulerResult<()> {
        let exists = self
            .path_exists(path)
            .await
            .map_err(|e| SchedulerError::PathPreflight(format!("检查路径失败 {path}: {e}")))?;

        if !exists {
            self.create_path(path)
                .await
                .map_err(|e| SchedulerError::PathPreflight(format!("创建路径失败 {path}: {e}")))?;
            info!("已创建缺失的作业路径: {}", path);
        } else {
            debug!("作业路径已存在: {}", path);
        }

        Ok(())
    }

    /// hadoop fs -test -e：退出码 0 存在，1 不存在，其余视为错误
    async fn path_exists(&self, path: &str) -> Result<bool, String> {
        let output = Command::new(&self.hadoop_cmd)
            .args(["fs", "-test", "-e", path])
            .output()
            .await
            .map_err(|e| e.to_string())?;

        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(format!(
                "hadoop命令执行失败: {}",
                String::from_utf8_lossy(&output.stderr)
            )),
        }
    }

    async fn create_path(&self, path: &str) -> Result<(), String> {
        let output = Command::new(&self.hadoop_cmd)
            .args(["fs", "-mkdir", "-p", path])
            .output()
            .await
            .map_err(|e| e.to_string())?;

        if !output.status.success() {
            return Err(format!(
                "hadoop命令执行失败, 输出: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_extract_fs_paths() {
        let config = json!({
            "job": {
                "content": [{
                    "reader": {
                        "name": "mysqlreader",
                        "parameter": {"username": "u"},
                    },
                    "writer": {
                        "name": "hdfswriter",
                        "parameter": {"path": "/warehouse/out"},
                    },
                }],
            }
        });

        assert_eq!(PathPreparer::extract_paths(&config), vec!["/warehouse/out"]);
    }

    #[test]
    fn test_extract_both_sides() {
        let config = json!({
            "job": {
                "content": [{
                    "reader": {
                        "name": "hdfsreader",
                        "parameter": {"path": "/u/in"},
                    },
                    "writer": {
                        "name": "hdfswriter",
                        "parameter": {"path": "/u/out"},
                    },
                }],
            }
        });

        assert_eq!(
            PathPreparer::extract_paths(&config),
            vec!["/u/in", "/u/out"]
        );
    }

    #[test]
    fn test_mysql_only_job_has_no_paths() {
        let config = json!({
            "job": {
                "content": [{
                    "reader": {"name": "mysqlreader", "parameter": {}},
                    "writer": {"name": "mysqlwriter", "parameter": {}},
                }],
            }
        });
        assert!(PathPreparer::extract_paths(&config).is_empty());
    }

    #[test]
    fn test_malformed_job_has_no_paths() {
        assert!(PathPreparer::extract_paths(&json!({})).is_empty());
        assert!(PathPreparer::extract_paths(&json!({"job": {"content": 3}})).is_empty());
    }
}
