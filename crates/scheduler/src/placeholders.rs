//! 配置中的日期占位符替换
//!
//! 占位符是字面量替换，默认目标日期为执行日前一天（Asia/Shanghai）。

use chrono::{Duration, FixedOffset, NaiveDateTime, Utc};

/// Asia/Shanghai 固定偏移 +08:00
pub fn shanghai() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("合法的时区偏移")
}

/// 默认目标日期：当前上海时间的前一天
pub fn default_target_date() -> NaiveDateTime {
    (Utc::now().with_timezone(&shanghai()) - Duration::days(1)).naive_local()
}

/// 替换配置串中的全部日期占位符。
/// 纯函数：输出不再含占位符，重复应用结果不变
pub fn render_date_placeholders(config: &str, target_date: NaiveDateTime) -> String {
    let replacements = [
        ("${yyyy-mm-dd}", target_date.format("%Y-%m-%d").to_string()),
        ("${yyyy_mm_dd}", target_date.format("%Y_%m_%d").to_string()),
        ("${yyyy}", target_date.format("%Y").to_string()),
        ("${mm}", target_date.format("%m").to_string()),
        ("${dd}", target_date.format("%d").to_string()),
        ("${HH}", target_date.format("%H").to_string()),
        ("${MM}", target_date.format("%M").to_string()),
        ("${SS}", target_date.format("%S").to_string()),
    ];

    let mut result = config.to_string();
    for (placeholder, value) in replacements {
        result = result.replace(placeholder, &value);
    }
    result
}
