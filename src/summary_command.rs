use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use log::{info, warn};

use crate::aggregator::{
    calculate_estimation_error, count_user_names, format_user_names_sorted_by_participation,
    get_main_group_of_durations, sum_durations, sum_time_tracked, usable_estimate,
};
use crate::clockify::{clockify_url, date_range, ClockifyRepository};
use crate::console::{ReportItemView, ReportView};
use crate::datetime::{parse_date, today};
use crate::duration::duration_round_up_by_half_hour;
use crate::format::{format_duration_clock, DAY_MONTH_YEAR_FORMAT};
use crate::ordered_set::OrderedSet;
use crate::time_entry::build_report;

/// 期間内のレポートを出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct SummaryArgs {
    #[clap(
        short = 'f',
        long = "from",
        help = "Sets the first day of the report in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    from: Option<NaiveDate>,

    #[clap(
        short = 't',
        long = "to",
        help = "Sets the last day (inclusive) of the report in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    to: Option<NaiveDate>,
}

pub struct SummaryCommand<'a, T: ClockifyRepository> {
    repository: &'a T,
}

impl<'a, T: ClockifyRepository> SummaryCommand<'a, T> {
    /// 新しい`SummaryCommand`を返す。
    ///
    /// # Arguments
    /// * `repository` - タイムエントリーとタスクを取得するためのリポジトリ
    pub fn new(repository: &'a T) -> Self {
        Self { repository }
    }

    /// `summary`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された期間のタイムエントリーをタスクごとにまとめ、
    /// 参加者数、合計時間、タスクごとの見積もりとの比率を集計する。
    /// 期間が指定されていない場合は、今月の1日から今日までとする。
    ///
    /// # Arguments
    ///
    /// * `args` - `summary`サブコマンドの引数
    pub async fn run(&self, args: SummaryArgs) -> Result<ReportView> {
        let end_date = args.to.unwrap_or_else(today);
        let start_date = match args.from {
            Some(from) => from,
            None => end_date
                .with_day(1)
                .context("Failed to set the first day of month")?,
        };
        let (start_at, end_at) = date_range(start_date, end_date)?;
        info!("Start at: {}, End at: {}", start_at, end_at);

        let time_entries = self
            .repository
            .read_time_entries(&start_at, &end_at)
            .await
            .context("Failed to retrieve time entries")?;
        let task_ids = time_entries
            .iter()
            .filter_map(|entry| entry.task_id.clone())
            .collect::<OrderedSet<_>>()
            .into_vec();
        let tasks = self
            .repository
            .read_tasks(&task_ids)
            .await
            .context("Failed to retrieve tasks")?;
        info!("Time entries and tasks retrieved successfully.");
        if tasks.len() < task_ids.len() {
            warn!(
                "{} of {} tasks were not found, their estimates are skipped",
                task_ids.len() - tasks.len(),
                task_ids.len()
            );
        }

        let report = build_report(time_entries, tasks);
        let items = report
            .iter()
            .map(|(key, entry)| -> Result<ReportItemView> {
                let title = entry
                    .task
                    .as_ref()
                    .map(|task| task.name.clone())
                    .unwrap_or_else(|| key.clone());
                let description = entry
                    .time_entries
                    .first()
                    .map(|time_entry| time_entry.description.as_str())
                    .unwrap_or(key.as_str());

                let time_tracked = sum_durations(&entry.time_entries)?;

                Ok(ReportItemView {
                    participants: format_user_names_sorted_by_participation(&entry.time_entries)?,
                    time_tracked: format_duration_clock(time_tracked),
                    rounded_time_tracked: format_duration_clock(duration_round_up_by_half_hour(
                        time_tracked,
                    )),
                    main_group: format_duration_clock(get_main_group_of_durations(
                        &entry.time_entries,
                    )?),
                    estimate: usable_estimate(entry)
                        .map(|estimate| format_duration_clock(estimate.estimate / 1000)),
                    estimation_error: calculate_estimation_error(entry)?,
                    url: clockify_url(&start_at, &end_at, description),
                    title,
                })
            })
            .collect::<Result<Vec<_>>>()
            .context("Failed to summarize report entries")?;

        Ok(ReportView {
            period: format!(
                "{} ~ {}",
                start_date.format(DAY_MONTH_YEAR_FORMAT),
                end_date.format(DAY_MONTH_YEAR_FORMAT)
            ),
            participant_count: count_user_names(&report),
            time_tracked: sum_time_tracked(&report).context("Failed to sum time tracked")?,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{SummaryArgs, SummaryCommand};
    use crate::clockify::MockClockifyRepository;
    use crate::datetime::mock_datetime;
    use crate::time_entry::fixtures::{entry, estimate};
    use crate::time_entry::{Task, TimeEntry};

    fn task_entry(user: &str, duration: &str, task_id: &str) -> TimeEntry {
        let mut entry = entry(user, duration);
        entry.task_id = Some(task_id.to_string());
        entry.description = "login".to_string();
        entry
    }

    fn login_task() -> Task {
        Task {
            id: "t1".to_string(),
            name: "Login page".to_string(),
            estimates: vec![estimate(3_600_000, 1)],
        }
    }

    #[tokio::test]
    async fn test_summary_command() {
        let args = SummaryArgs {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        let entries = vec![
            task_entry("A", "PT1H", "t1"),
            task_entry("B", "PT2H", "t1"),
            task_entry("A", "PT30M", "t1"),
            entry("C", "PT15M"),
        ];
        let mut repository = MockClockifyRepository::new();
        repository
            .expect_read_time_entries()
            .times(1)
            .returning(move |_, _| Ok(entries.clone()));
        repository
            .expect_read_tasks()
            .withf(|task_ids| *task_ids == ["t1".to_string()])
            .times(1)
            .returning(|_| Ok(vec![login_task()]));

        let command = SummaryCommand::new(&repository);
        let view = command.run(args).await.unwrap();

        assert_eq!(view.period, "01/01/2024 ~ 31/01/2024");
        assert_eq!(view.participant_count, 3);
        assert_eq!(view.time_tracked, "03:45:00");
        assert_eq!(view.items.len(), 2);

        let login = view.items.iter().find(|item| item.title == "Login page").unwrap();
        assert_eq!(login.participants, "B, A");
        assert_eq!(login.time_tracked, "03:30:00");
        assert_eq!(login.main_group, "02:00:00");
        assert_eq!(login.estimate.as_deref(), Some("01:00:00"));
        assert_eq!(login.estimation_error, 2.0);
        assert!(login.url.contains("description=login"));

        let work = view.items.iter().find(|item| item.title == "work").unwrap();
        assert_eq!(work.participants, "C");
        assert_eq!(work.time_tracked, "00:15:00");
        assert_eq!(work.rounded_time_tracked, "00:30:00");
        assert_eq!(work.estimate, None);
        assert_eq!(work.estimation_error, 0.0);
    }

    /// 期間が指定されていない場合は今月の1日から今日までとする。
    #[tokio::test]
    async fn test_summary_command_no_date() {
        mock_datetime::set_mock_time(Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap());
        let args = SummaryArgs {
            from: None,
            to: None,
        };
        let mut repository = MockClockifyRepository::new();
        repository
            .expect_read_time_entries()
            .times(1)
            .returning(|_, _| Ok(vec![]));
        repository
            .expect_read_tasks()
            .times(1)
            .returning(|_| Ok(vec![]));

        let command = SummaryCommand::new(&repository);
        let view = command.run(args).await.unwrap();
        mock_datetime::clear_mock_time();

        assert!(view.period.starts_with("01/"));
        assert!(view.period.ends_with("/2024"));
        assert_eq!(view.participant_count, 0);
        assert_eq!(view.time_tracked, "00:00:00");
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn test_summary_command_malformed_duration() {
        let args = SummaryArgs {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        let mut repository = MockClockifyRepository::new();
        repository
            .expect_read_time_entries()
            .returning(|_, _| Ok(vec![entry("A", "one hour")]));
        repository.expect_read_tasks().returning(|_| Ok(vec![]));

        let command = SummaryCommand::new(&repository);

        assert!(command.run(args).await.is_err());
    }

    #[tokio::test]
    async fn test_summary_command_repository_error() {
        let args = SummaryArgs {
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        let mut repository = MockClockifyRepository::new();
        repository
            .expect_read_time_entries()
            .returning(|_, _| Err(anyhow::anyhow!("connection refused")));
        repository.expect_read_tasks().times(0);

        let command = SummaryCommand::new(&repository);

        assert!(command.run(args).await.is_err());
    }
}
