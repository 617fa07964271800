//! タイムエントリーとレポートの集計処理。
//!
//! ここにある関数は引数のみから結果を計算し、状態を持たない。

use std::collections::HashMap;

use crate::duration::parse_duration;
use crate::error::ReportError;
use crate::format::{format_day_month_year, format_duration_clock};
use crate::ordered_set::OrderedSet;
use crate::time_entry::{EstimateRecord, Report, ReportEntry, TimeEntry};

/// 参加者名の区切り文字。
pub const USER_NAME_SEPARATOR: &str = ", ";

/// ユーザーごとの合計時間。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserDuration {
    pub user: String,
    /// 合計時間(秒)
    pub duration: i64,
}

/// タイムエントリーのdurationを合計した秒数を返す。
pub fn sum_durations(entries: &[TimeEntry]) -> Result<i64, ReportError> {
    sum_entry_durations(entries)
}

/// durationを合計する。合計が`i64`に収まらない場合はエラーを返す。
fn sum_entry_durations<'a>(
    entries: impl IntoIterator<Item = &'a TimeEntry>,
) -> Result<i64, ReportError> {
    entries.into_iter().try_fold(0i64, |total, entry| {
        add_seconds(total, parse_duration(&entry.duration)?, &entry.duration)
    })
}

fn add_seconds(total: i64, seconds: i64, value: &str) -> Result<i64, ReportError> {
    total
        .checked_add(seconds)
        .ok_or_else(|| ReportError::overflow(value))
}

/// ユーザーごとに合計時間を計算し、合計時間の降順に並べる。
///
/// 合計時間が同じ場合は、ユーザーが最初に現れた順序を保つ。
pub fn sort_user_durations(entries: &[TimeEntry]) -> Result<Vec<UserDuration>, ReportError> {
    let mut user_durations: Vec<UserDuration> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let seconds = parse_duration(&entry.duration)?;
        let position = *positions.entry(entry.user.as_str()).or_insert_with(|| {
            user_durations.push(UserDuration {
                user: entry.user.clone(),
                duration: 0,
            });
            user_durations.len() - 1
        });
        let user_duration = &mut user_durations[position];
        user_duration.duration = add_seconds(user_duration.duration, seconds, &entry.duration)?;
    }

    user_durations.sort_by(|a, b| b.duration.cmp(&a.duration));
    Ok(user_durations)
}

/// 参加時間の多い順にユーザー名を`, `で連結する。
pub fn format_user_names_sorted_by_participation(
    entries: &[TimeEntry],
) -> Result<String, ReportError> {
    let names: Vec<String> = sort_user_durations(entries)?
        .into_iter()
        .map(|user_duration| user_duration.user)
        .collect();

    Ok(names.join(USER_NAME_SEPARATOR))
}

/// タイムエントリーに現れるユーザー名を最初に現れた順序で返す。
pub fn user_names(entries: &[TimeEntry]) -> OrderedSet<String> {
    entries.iter().map(|entry| entry.user.clone()).collect()
}

/// 指定した日(`DD/MM/YYYY`)に開始したタイムエントリーのユーザー名を返す。
///
/// 日付はLocalタイムゾーンで判定する。
pub fn format_user_names_daily_participation(entries: &[TimeEntry], date: &str) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| format_day_month_year(&entry.start) == date)
        .map(|entry| entry.user.clone())
        .collect::<OrderedSet<_>>()
        .into_vec()
}

/// 指定したユーザーの合計時間を`HH:MM:SS`形式で返す。
///
/// ユーザー名は前後の空白を除いてから完全一致で比較する。
pub fn get_user_participation(entries: &[TimeEntry], username: &str) -> Result<String, ReportError> {
    let username = username.trim();
    let total = sum_entry_durations(entries.iter().filter(|entry| entry.user == username))?;

    Ok(format_duration_clock(total))
}

/// 最も参加時間の多いユーザーの合計時間(秒)を返す。
pub fn get_main_group_of_durations(entries: &[TimeEntry]) -> Result<i64, ReportError> {
    Ok(sort_user_durations(entries)?
        .first()
        .map(|user_duration| user_duration.duration)
        .unwrap_or(0))
}

/// 比率の計算に使える最後の見積もりを返す。見積もりが無い、または0の場合は`None`。
pub fn usable_estimate(entry: &ReportEntry) -> Option<&EstimateRecord> {
    entry
        .task
        .as_ref()
        .and_then(|task| task.last_estimate())
        .filter(|estimate| estimate.estimate != 0)
}

/// 最後の見積もりに対する実績の比率を返す。
///
/// 見積もりが無い、または0の場合は`None`を返す。
pub fn estimation_error(entry: &ReportEntry) -> Result<Option<f64>, ReportError> {
    let estimate_seconds = usable_estimate(entry).map(|estimate| estimate.estimate as f64 / 1000.0);

    match estimate_seconds {
        Some(seconds) => {
            let main_group = get_main_group_of_durations(&entry.time_entries)? as f64;
            Ok(Some(round_to_hundredths(main_group / seconds)))
        }
        None => Ok(None),
    }
}

/// 最後の見積もりに対する実績の比率を返す。見積もりが使えない場合は`0`。
pub fn calculate_estimation_error(entry: &ReportEntry) -> Result<f64, ReportError> {
    Ok(estimation_error(entry)?.unwrap_or(0.0))
}

/// レポート全体の参加者数を返す。
pub fn count_user_names(report: &Report) -> usize {
    report
        .values()
        .flat_map(|entry| user_names(&entry.time_entries))
        .collect::<OrderedSet<_>>()
        .len()
}

/// レポート全体の合計時間を`HH:MM:SS`形式で返す。
pub fn sum_time_tracked(report: &Report) -> Result<String, ReportError> {
    let total = report
        .iter()
        .try_fold(0i64, |total, (key, entry)| {
            add_seconds(total, sum_durations(&entry.time_entries)?, key)
        })?;

    Ok(format_duration_clock(total))
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
