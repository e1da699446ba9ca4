//! 应用配置
//!
//! YAML 配置文件加载，缺省值与原始部署保持一致。

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub datax: DataxConfig,
    pub session: SessionConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// 连接池上限
    pub max_connections: u32,
}

/// DataX 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataxConfig {
    /// DataX 安装目录，作业通过 <home>/bin/datax.py 启动
    pub home: String,
    /// 渲染后作业 JSON 的落盘目录
    pub temp_dir: String,
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub key: String,
}

impl AppConfig {
    /// 加载配置文件。文件可整体缺省，缺失的键回落到默认值
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.host", "127.0.0.1")?
            .set_default("database.port", 3306)?
            .set_default("database.user", "root")?
            .set_default("database.password", "")?
            .set_default("database.name", "datax_web")?
            .set_default("database.max_connections", 10)?
            .set_default("datax.home", "/opt/datax")?
            .set_default("datax.temp_dir", "/tmp/datax-web")?
            .set_default("session.key", "default-session-key-change-in-production")?;

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {path}"));
            }
            builder = builder.add_source(File::new(path, FileFormat::Yaml));
        }

        builder = builder.add_source(
            Environment::with_prefix("DATAX_WEB")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .context("读取配置失败")?
            .try_deserialize::<AppConfig>()
            .context("解析配置失败")?;

        Ok(config)
    }

    /// 监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// MySQL 连接参数。会话时区随库走 Asia/Shanghai 部署约定
    pub fn mysql_connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.database.host)
            .port(self.database.port)
            .username(&self.database.user)
            .password(&self.database.password)
            .database(&self.database.name)
            .charset("utf8mb4")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = AppConfig::load(None).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.database.name, "datax_web");
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.datax.home, "/opt/datax");
        assert_eq!(cfg.datax.temp_dir, "/tmp/datax-web");
        assert_eq!(cfg.server_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            f,
            "server:\n  port: 9001\ndatabase:\n  host: db.internal\n  user: etl\ndatax:\n  home: /data/datax"
        )
        .unwrap();

        let cfg = AppConfig::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(cfg.server.port, 9001);
        assert_eq!(cfg.database.host, "db.internal");
        assert_eq!(cfg.database.user, "etl");
        assert_eq!(cfg.datax.home, "/data/datax");
        // 未覆盖的键仍是默认值
        assert_eq!(cfg.database.port, 3306);
        assert_eq!(cfg.datax.temp_dir, "/tmp/datax-web");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::load(Some("/no/such/config.yaml")).is_err());
    }
}
