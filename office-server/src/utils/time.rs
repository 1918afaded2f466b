//! 时间工具函数
//!
//! 所有日期→时间戳转换统一在 API handler 层完成，
//! repository 层只接收 `i64` Unix millis。

use chrono::{Datelike, NaiveDate, TimeZone, Utc};

use super::{AppError, AppResult};

/// Current time as Unix millis.
pub fn now_ms() -> i64 {
    shared::now_ms()
}

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {date}")))
}

/// 日期开始 (00:00:00 UTC) → Unix millis
pub fn day_start_millis(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
        .timestamp_millis()
}

/// 日期结束 → 次日 00:00:00 UTC 的 Unix millis（调用方使用 `< end` 语义）
pub fn day_end_millis(date: NaiveDate) -> i64 {
    let next = date.succ_opt().unwrap_or(date);
    day_start_millis(next)
}

/// 账单到期日：次月 15 号 00:00 UTC 的 Unix millis
///
/// `year`/`month` 是账期本身；12 月滚动到次年 1 月。
pub fn due_date_millis(year: i32, month: u32) -> AppResult<i64> {
    let (due_year, due_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let date = NaiveDate::from_ymd_opt(due_year, due_month, 15)
        .ok_or_else(|| AppError::validation(format!("Invalid period: {year}-{month:02}")))?;
    Ok(day_start_millis(date))
}

/// 当前年月 (用于单张发票的编号)
pub fn current_year_month() -> (i32, u32) {
    let now = Utc::now();
    (now.year(), now.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_is_fifteenth_of_next_month() {
        let ms = due_date_millis(2026, 8).unwrap();
        let date = chrono::DateTime::from_timestamp_millis(ms).unwrap().date_naive();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 9, 15).unwrap());
    }

    #[test]
    fn december_rolls_into_january() {
        let ms = due_date_millis(2026, 12).unwrap();
        let date = chrono::DateTime::from_timestamp_millis(ms).unwrap().date_naive();
        assert_eq!(date, NaiveDate::from_ymd_opt(2027, 1, 15).unwrap());
    }

    #[test]
    fn day_bounds_are_half_open() {
        let d = parse_date("2026-08-24").unwrap();
        assert_eq!(day_end_millis(d) - day_start_millis(d), 86_400_000);
    }
}
