use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

/// Clockifyのタイムエントリー。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub id: String,
    pub description: String,
    /// 集計時のキーとして使うユーザー名。
    pub user: String,
    /// ISO-8601形式のduration。
    pub duration: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub running: bool,
    pub task_id: Option<String>,
}

/// タスクに記録された見積もり。
#[derive(Clone, Debug, PartialEq)]
pub struct EstimateRecord {
    /// 見積もり時間(ミリ秒)
    pub estimate: i64,
    pub recorded_at: DateTime<Utc>,
}

/// ClickUpのタスク。
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub estimates: Vec<EstimateRecord>,
}

impl Task {
    /// 最後に記録された見積もりを返す。
    pub fn last_estimate(&self) -> Option<&EstimateRecord> {
        last_estimate(&self.estimates)
    }
}

/// レポートの1項目。タスクとそのタスクに紐づくタイムエントリーを持つ。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportEntry {
    pub task: Option<Task>,
    pub time_entries: Vec<TimeEntry>,
}

/// キーごとのレポート項目。
pub type Report = BTreeMap<String, ReportEntry>;

/// 記録日時が最も新しい見積もりを返す。
///
/// 記録日時が同じ場合は先に現れたものを返す。
pub fn last_estimate(estimates: &[EstimateRecord]) -> Option<&EstimateRecord> {
    estimates.iter().fold(None, |latest, estimate| match latest {
        Some(current) if current.recorded_at >= estimate.recorded_at => Some(current),
        _ => Some(estimate),
    })
}

/// タイムエントリーからレポートを作成する。
///
/// タスクIDを持つエントリーはタスクIDごとに、持たないエントリーは説明ごとにまとめる。
/// 取得できなかったタスクは`None`のままにする。
///
/// # Arguments
///
/// * `time_entries` - 集計対象のタイムエントリー
/// * `tasks` - タイムエントリーに紐づくタスク
pub fn build_report(time_entries: Vec<TimeEntry>, tasks: Vec<Task>) -> Report {
    let mut tasks_map: HashMap<String, Task> = tasks
        .into_iter()
        .map(|task| (task.id.clone(), task))
        .collect();

    time_entries
        .into_iter()
        .fold(Report::new(), |mut report, entry| {
            let key = report_key(&entry);
            let report_entry = report.entry(key).or_insert_with(|| ReportEntry {
                task: entry
                    .task_id
                    .as_ref()
                    .and_then(|task_id| tasks_map.remove(task_id)),
                time_entries: vec![],
            });
            report_entry.time_entries.push(entry);
            report
        })
}

/// レポートのキーを返す。
fn report_key(entry: &TimeEntry) -> String {
    entry
        .task_id
        .clone()
        .unwrap_or_else(|| entry.description.clone())
}
