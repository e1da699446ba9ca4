//! cron 注册表
//!
//! 每个启用的任务流对应一个注册条目：解析好的表达式加一个按下次
//! 触发时刻休眠的 tokio 循环。重载先删后加，删除不影响在途执行。

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use dataxweb_errors::{SchedulerError, SchedulerResult};

use crate::placeholders::shanghai;

/// 验证 CRON 表达式（秒在内的 6 字段，或 @hourly 等描述符），空串无效
pub fn validate_cron_expression(expr: &str) -> SchedulerResult<Schedule> {
    if expr.trim().is_empty() {
        return Err(SchedulerError::InvalidCron {
            expr: expr.to_string(),
            message: "表达式为空".to_string(),
        });
    }

    Schedule::from_str(expr).map_err(|e| SchedulerError::InvalidCron {
        expr: expr.to_string(),
        message: e.to_string(),
    })
}

struct CronEntry {
    expr: String,
    schedule: Schedule,
    handle: JoinHandle<()>,
}

impl Drop for CronEntry {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// flow_id -> 调度条目
#[derive(Default)]
pub struct CronRegistry {
    entries: RwLock<HashMap<i64, CronEntry>>,
}

impl CronRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册任务流的调度条目。已存在的条目先被移除，
    /// 所以旧表达式的触发循环不可能与新表达式并存
    pub async fn register<F>(&self, flow_id: i64, expr: &str, trigger: F) -> SchedulerResult<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let schedule = validate_cron_expression(expr)?;

        let loop_schedule = schedule.clone();
        let handle = tokio::spawn(async move {
            loop {
                let now = Utc::now().with_timezone(&shanghai());
                let Some(next) = loop_schedule.after(&now).next() else {
                    warn!("表达式不再有下次触发时刻，调度循环退出");
                    break;
                };
                let wait = (next - now).to_std().unwrap_or_default();
                debug!("下次触发 {}, 休眠 {:?}", next, wait);
                tokio::time::sleep(wait).await;
                trigger();
            }
        });

        let mut entries = self.entries.write().await;
        entries.insert(
            flow_id,
            CronEntry {
                expr: expr.to_string(),
                schedule,
                handle,
            },
        );
        Ok(())
    }

    /// 移除条目并终止其触发循环。条目不存在时返回 false
    pub async fn remove(&self, flow_id: i64) -> bool {
        self.entries.write().await.remove(&flow_id).is_some()
    }

    pub async fn contains(&self, flow_id: i64) -> bool {
        self.entries.read().await.contains_key(&flow_id)
    }

    /// 条目登记的表达式
    pub async fn expression(&self, flow_id: i64) -> Option<String> {
        self.entries
            .read()
            .await
            .get(&flow_id)
            .map(|e| e.expr.clone())
    }

    /// 自 from 起接下来 count 个触发时刻
    pub async fn upcoming_times(
        &self,
        flow_id: i64,
        from: DateTime<FixedOffset>,
        count: usize,
    ) -> Option<Vec<DateTime<FixedOffset>>> {
        self.entries
            .read()
            .await
            .get(&flow_id)
            .map(|e| e.schedule.after(&from).take(count).collect())
    }

    /// 终止全部调度循环
    pub async fn shutdown(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn test_validate_cron_expression() {
        assert!(validate_cron_expression("0 0 0 * * *").is_ok());
        assert!(validate_cron_expression("0 */5 * * * *").is_ok());
        assert!(validate_cron_expression("0 0 9-17 * * 1-5").is_ok());
        assert!(validate_cron_expression("@hourly").is_ok());
        assert!(validate_cron_expression("invalid").is_err());
        assert!(validate_cron_expression("0 0 0 32 * *").is_err());
        assert!(validate_cron_expression("").is_err());
        assert!(validate_cron_expression("   ").is_err());
    }

    #[tokio::test]
    async fn test_register_and_query_upcoming() {
        let registry = CronRegistry::new();
        registry.register(7, "0 0 * * * *", || {}).await.unwrap();

        assert!(registry.contains(7).await);
        assert_eq!(registry.expression(7).await.unwrap(), "0 0 * * * *");

        let from = Utc::now().with_timezone(&shanghai());
        let times = registry.upcoming_times(7, from, 3).await.unwrap();
        assert_eq!(times.len(), 3);
        for t in times {
            assert_eq!(t.minute(), 0);
            assert_eq!(t.second(), 0);
        }
    }

    #[tokio::test]
    async fn test_register_replaces_existing_entry() {
        let registry = CronRegistry::new();
        registry.register(7, "0 0 * * * *", || {}).await.unwrap();
        registry.register(7, "0 */5 * * * *", || {}).await.unwrap();

        assert_eq!(registry.expression(7).await.unwrap(), "0 */5 * * * *");

        let from = Utc::now().with_timezone(&shanghai());
        let times = registry.upcoming_times(7, from, 2).await.unwrap();
        for t in times {
            assert_eq!(t.minute() % 5, 0);
        }
    }

    #[tokio::test]
    async fn test_remove_entry() {
        let registry = CronRegistry::new();
        registry.register(7, "@daily", || {}).await.unwrap();

        assert!(registry.remove(7).await);
        assert!(!registry.contains(7).await);
        // 再删是 no-op
        assert!(!registry.remove(7).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_fires_on_schedule() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let registry = CronRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        // 每秒触发
        registry
            .register(1, "* * * * * *", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        assert!(fired.load(Ordering::SeqCst) >= 1);

        registry.remove(1).await;
        let count = fired.load(Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        // 移除后不再触发
        assert_eq!(fired.load(Ordering::SeqCst), count);
    }
}
