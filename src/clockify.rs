use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::datetime::local_day_start;
use crate::time_entry::{EstimateRecord, Task, TimeEntry};

const TIME_ENTRIES_QUERY: &str = r#"query ClockifyTimeEntries($where: ClockifyTimeEntryWhereInput) {
  clockifyTimeEntries(where: $where) {
    id
    description
    currentlyRunning
    taskId
    user { name }
    timeInterval { start end duration }
  }
}"#;

const TASKS_QUERY: &str = r#"query ClickupTasks($where: ClickupTaskWhereInput) {
  clickupTasks(where: $where) {
    id
    name
    clickupTasksTimeEstimates { estimate createdAt }
  }
}"#;

/// タイムエントリーとタスクを取得するためのリポジトリ。
#[cfg_attr(test, automock)]
#[allow(async_fn_in_trait)]
pub trait ClockifyRepository {
    /// 期間内に終了したタイムエントリーを取得する。実行中のものは含まない。
    ///
    /// # Arguments
    ///
    /// * `start_at` - この日時以降に開始したエントリーを対象とする
    /// * `end_at` - この日時以前に終了したエントリーを対象とする
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>>;

    /// 指定したIDのタスクと見積もりを取得する。
    async fn read_tasks(&self, task_ids: &[String]) -> Result<Vec<Task>>;
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeEntriesData {
    clockify_time_entries: Option<Vec<ClockifyTimeEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClockifyTimeEntry {
    id: String,
    description: Option<String>,
    currently_running: bool,
    task_id: Option<String>,
    user: ClockifyUser,
    time_interval: ClockifyTimeInterval,
}

#[derive(Debug, Deserialize)]
struct ClockifyUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ClockifyTimeInterval {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    duration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TasksData {
    clickup_tasks: Option<Vec<ClickupTask>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClickupTask {
    id: String,
    name: String,
    clickup_tasks_time_estimates: Option<Vec<ClickupTaskTimeEstimate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClickupTaskTimeEstimate {
    estimate: i64,
    created_at: DateTime<Utc>,
}

impl From<ClockifyTimeEntry> for TimeEntry {
    fn from(entry: ClockifyTimeEntry) -> Self {
        Self {
            id: entry.id,
            description: entry.description.unwrap_or_default(),
            user: entry.user.name,
            duration: entry.time_interval.duration,
            start: entry.time_interval.start,
            end: entry.time_interval.end,
            running: entry.currently_running,
            task_id: entry.task_id,
        }
    }
}

impl From<ClickupTask> for Task {
    fn from(task: ClickupTask) -> Self {
        Self {
            id: task.id,
            name: task.name,
            estimates: task
                .clickup_tasks_time_estimates
                .unwrap_or_default()
                .into_iter()
                .map(|estimate| EstimateRecord {
                    estimate: estimate.estimate,
                    recorded_at: estimate.created_at,
                })
                .collect(),
        }
    }
}

/// GraphQL APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = ClockifyClient::new(&config).unwrap();
/// let time_entries = client.read_time_entries(&start_at, &end_at).await.unwrap();
/// ```
pub struct ClockifyClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl ClockifyClient {
    /// 新しい`ClockifyClient`を返す。
    ///
    /// トークンが設定されていない場合はエラーを返す。
    pub fn new(config: &Config) -> Result<Self> {
        let api_token = config
            .api_token
            .clone()
            .context("API token must be set in the config file or CLOCKIFY_REPORT_API_TOKEN")?;

        Ok(Self {
            client: Client::new(),
            api_url: config.api_url.clone(),
            api_token,
        })
    }

    /// GraphQLのクエリを送信し、`data`をデシリアライズして返す。
    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        debug!("GraphQL variables: {}", variables);
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .with_context(|| format!("Failed to send request to GraphQL API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<GraphqlResponse<T>>()
            .await
            .context("Failed to deserialize response")?;

        if !response.errors.is_empty() {
            let messages: Vec<String> = response
                .errors
                .into_iter()
                .map(|error| error.message)
                .collect();
            bail!("GraphQL API returned errors: {}", messages.join("; "));
        }

        response.data.context("GraphQL response has no data")
    }
}

impl ClockifyRepository for ClockifyClient {
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>> {
        let variables = json!({
            "where": {
                "timeInterval": {
                    "is": {
                        "start": { "gte": to_iso_string(start_at) },
                        "end": { "lte": to_iso_string(end_at) },
                    }
                },
                "currentlyRunning": { "equals": false },
            }
        });
        let data: TimeEntriesData = self
            .query(TIME_ENTRIES_QUERY, variables)
            .await
            .context("Failed to get time entries")?;

        let time_entries: Vec<TimeEntry> = data
            .clockify_time_entries
            .unwrap_or_default()
            .into_iter()
            .map(TimeEntry::from)
            .collect();
        info!("length of time entries: {}", time_entries.len());

        Ok(time_entries)
    }

    async fn read_tasks(&self, task_ids: &[String]) -> Result<Vec<Task>> {
        if task_ids.is_empty() {
            return Ok(vec![]);
        }

        let variables = json!({ "where": { "id": { "in": task_ids } } });
        let data: TasksData = self
            .query(TASKS_QUERY, variables)
            .await
            .context("Failed to get tasks")?;

        let tasks: Vec<Task> = data
            .clickup_tasks
            .unwrap_or_default()
            .into_iter()
            .map(Task::from)
            .collect();
        info!("length of tasks: {}", tasks.len());

        Ok(tasks)
    }
}

/// JavaScriptの`toISOString`と同じ形式(ミリ秒、`Z`付き)にする。
fn to_iso_string(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Clockifyの詳細レポートへのURLを作成する。
///
/// # Arguments
///
/// * `start_at` - レポートの開始日時
/// * `end_at` - レポートの終了日時
/// * `description` - 絞り込むタイムエントリーの説明
pub fn clockify_url(start_at: &DateTime<Utc>, end_at: &DateTime<Utc>, description: &str) -> String {
    format!(
        "https://app.clockify.me/reports/detailed?start={}&end={}&description={}&page=1&pageSize=1000",
        to_iso_string(start_at),
        to_iso_string(end_at),
        urlencoding::encode(description)
    )
}

/// Localタイムゾーンの日付の範囲をUTCの日時の範囲にする。
///
/// 終了日は含む。終了日時は終了日の最後のミリ秒とする。
pub fn date_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if end_date < start_date {
        bail!("End date {} is before start date {}", end_date, start_date);
    }

    let start_at = local_day_start(start_date)?;
    let next_day = end_date
        .succ_opt()
        .with_context(|| format!("Failed to get the day after {}", end_date))?;
    let end_at = local_day_start(next_day)? - chrono::Duration::milliseconds(1);

    Ok((start_at, end_at))
}
