//! 配置请求验证

use dataxweb_domain::DataSourceKind;
use dataxweb_errors::{SchedulerError, SchedulerResult};

use crate::types::ConfigRequest;

/// 验证配置生成请求：基础业务规则加两端各自的必填项
pub fn validate_config_request(req: &ConfigRequest) -> SchedulerResult<()> {
    validate_basic_rules(req)?;
    validate_input(req)?;
    validate_output(req)?;
    Ok(())
}

fn validate_basic_rules(req: &ConfigRequest) -> SchedulerResult<()> {
    // 至少一端必须为 MySQL
    if req.input_type != DataSourceKind::MySql && req.output_type != DataSourceKind::MySql {
        return Err(SchedulerError::validation("输入/输出至少一端必须为 MySQL"));
    }

    if req.columns.is_empty() {
        return Err(SchedulerError::validation("请先加载并勾选基准 MySQL 列"));
    }

    Ok(())
}

fn validate_input(req: &ConfigRequest) -> SchedulerResult<()> {
    match req.input_type {
        DataSourceKind::MySql => {
            let ok = req
                .input
                .mysql
                .as_ref()
                .is_some_and(|m| m.source_id != 0 && !m.table.is_empty());
            if !ok {
                return Err(SchedulerError::validation("缺少输入 MySQL 的 source_id/table"));
            }
        }
        DataSourceKind::Ofs | DataSourceKind::Hdfs | DataSourceKind::Cosn => {
            let ok = req
                .input
                .fs
                .as_ref()
                .is_some_and(|f| f.fs_id != 0 && !f.path.is_empty());
            if !ok {
                return Err(SchedulerError::validation("缺少输入 FS 的 fs_id/path"));
            }
        }
    }
    Ok(())
}

fn validate_output(req: &ConfigRequest) -> SchedulerResult<()> {
    match req.output_type {
        DataSourceKind::MySql => {
            let ok = req
                .output
                .mysql
                .as_ref()
                .is_some_and(|m| m.target_id != 0 && !m.table.is_empty());
            if !ok {
                return Err(SchedulerError::validation("缺少输出 MySQL 的 target_id/table"));
            }
        }
        DataSourceKind::Ofs | DataSourceKind::Hdfs | DataSourceKind::Cosn => {
            let ok = req
                .output
                .fs
                .as_ref()
                .is_some_and(|f| f.fs_id != 0 && !f.path.is_empty());
            if !ok {
                return Err(SchedulerError::validation("缺少输出 FS 的 fs_id/path"));
            }
        }
    }
    Ok(())
}
