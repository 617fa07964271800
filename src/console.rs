use std::io::Write;

use anyhow::{Context, Result};

/// レポート1項目分の表示内容。
#[derive(Clone, Debug, PartialEq)]
pub struct ReportItemView {
    pub title: String,
    /// 参加時間の多い順に`, `で連結したユーザー名
    pub participants: String,
    pub time_tracked: String,
    /// 30分単位で切り上げた合計時間
    pub rounded_time_tracked: String,
    pub main_group: String,
    /// 最後の見積もり。見積もりが無い、または0の場合は`None`
    pub estimate: Option<String>,
    /// 見積もりに対する比率。見積もりが使えない場合は`0`
    pub estimation_error: f64,
    pub url: String,
}

/// レポート全体の表示内容。
#[derive(Clone, Debug, PartialEq)]
pub struct ReportView {
    pub period: String,
    pub participant_count: usize,
    pub time_tracked: String,
    pub items: Vec<ReportItemView>,
}

/// 1日分の参加状況の表示内容。
#[derive(Clone, Debug, PartialEq)]
pub struct DailyView {
    pub date: String,
    /// ユーザー名と参加時間
    pub participations: Vec<(String, String)>,
}

/// Consoleにレポートを表示するためのtrait。
pub trait ConsolePresenter {
    /// レポートを表示する。
    fn show_report(&mut self, report: &ReportView) -> Result<()>;

    /// 1日分の参加状況を表示する。
    fn show_daily(&mut self, daily: &DailyView) -> Result<()>;
}

/// レポートをMarkdown形式で表示する。
pub struct ConsoleMarkdown<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdown<'a, W> {
    /// 新しい`ConsoleMarkdown`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdown<'a, W> {
    fn show_report(&mut self, report: &ReportView) -> Result<()> {
        let header = [
            format!("# {}", report.period),
            format!("- participants: {}", report.participant_count),
            format!("- time tracked: {}", report.time_tracked),
        ];
        writeln!(self.writer, "{}", header.join("\n")).context("Failed to write report header")?;

        for item in &report.items {
            let lines = [
                String::new(),
                format!("## {}", item.title),
                format!("- participants: {}", item.participants),
                format!("- time tracked: {}", item.time_tracked),
                format!("- rounded: {}", item.rounded_time_tracked),
                format!("- main group: {}", item.main_group),
                format!("- estimate: {}", item.estimate.as_deref().unwrap_or("-")),
                format!("- estimation error: {:.2}", item.estimation_error),
                format!("- [clockify]({})", item.url),
            ];
            writeln!(self.writer, "{}", lines.join("\n"))
                .with_context(|| format!("Failed to write report item: {:?}", item))?;
        }

        Ok(())
    }

    fn show_daily(&mut self, daily: &DailyView) -> Result<()> {
        writeln!(self.writer, "## {}", daily.date).context("Failed to write date")?;
        for (user, participation) in &daily.participations {
            writeln!(self.writer, "- {}: {}", user, participation)
                .with_context(|| format!("Failed to write participation of {}", user))?;
        }

        Ok(())
    }
}
