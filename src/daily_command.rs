use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::aggregator::{format_user_names_daily_participation, get_user_participation};
use crate::clockify::{date_range, ClockifyRepository};
use crate::console::DailyView;
use crate::datetime::{parse_date, today};
use crate::format::DAY_MONTH_YEAR_FORMAT;

/// 日毎の参加状況を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DailyArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(short = 'u', long = "user", help = "Shows only the participation of this user")]
    user: Option<String>,
}

pub struct DailyCommand<'a, T: ClockifyRepository> {
    repository: &'a T,
}

impl<'a, T: ClockifyRepository> DailyCommand<'a, T> {
    /// 新しい`DailyCommand`を返す。
    ///
    /// # Arguments
    /// * `repository` - タイムエントリーを取得するためのリポジトリ
    pub fn new(repository: &'a T) -> Self {
        Self { repository }
    }

    /// `daily`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された日付の00:00:00から始まる1日のタイムエントリーを取得し、
    /// その日に参加したユーザーごとの合計時間を返す。
    /// 日付が指定されていない場合は、Localタイムゾーンで現在の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `daily` - `daily`サブコマンドの引数
    pub async fn run(&self, daily: DailyArgs) -> Result<DailyView> {
        let date = daily.date.unwrap_or_else(today);
        let (start_at, end_at) = date_range(date, date)?;
        info!("Start at: {}, End at: {}", start_at, end_at);

        let time_entries = self
            .repository
            .read_time_entries(&start_at, &end_at)
            .await
            .context("Failed to retrieve time entries")?;
        info!("Time entries retrieved successfully.");

        let date_key = date.format(DAY_MONTH_YEAR_FORMAT).to_string();
        let users = match daily.user {
            Some(user) => vec![user.trim().to_string()],
            None => format_user_names_daily_participation(&time_entries, &date_key),
        };
        let participations = users
            .into_iter()
            .map(|user| -> Result<(String, String)> {
                let participation = get_user_participation(&time_entries, &user)
                    .with_context(|| format!("Failed to sum participation of {}", user))?;
                Ok((user, participation))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DailyView {
            date: date_key,
            participations,
        })
    }
}
