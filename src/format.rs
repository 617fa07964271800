use chrono::{DateTime, Local, TimeZone, Utc};

/// 日毎の参加者を判定するときの日付の書式。
pub const DAY_MONTH_YEAR_FORMAT: &str = "%d/%m/%Y";

/// 秒を`HH:MM:SS`形式の文字列にする。
///
/// 24時間を超えても日には繰り上げない。負の値は`00:00:00`とする。
pub fn format_duration_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

/// Localタイムゾーンでの日付を`DD/MM/YYYY`形式にする。
pub fn format_day_month_year(datetime: &DateTime<Utc>) -> String {
    format_day_month_year_in(datetime, &Local)
}

/// 指定したタイムゾーンでの日付を`DD/MM/YYYY`形式にする。
pub fn format_day_month_year_in<Tz: TimeZone>(datetime: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    datetime
        .with_timezone(tz)
        .format(DAY_MONTH_YEAR_FORMAT)
        .to_string()
}
