use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

mod aggregator;
mod clockify;
mod config;
mod console;
mod daily_command;
mod datetime;
mod duration;
mod error;
mod format;
mod logger;
mod ordered_set;
mod summary_command;
mod time_entry;

use clockify::ClockifyClient;
use config::Config;
use console::{ConsoleMarkdown, ConsolePresenter};
use daily_command::{DailyArgs, DailyCommand};
use summary_command::{SummaryArgs, SummaryCommand};

/// Clockifyのタイムエントリーを集計するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- summary --from 2024-01-01 --to 2024-01-31
/// $ cargo run -- daily --date 2024-01-15
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(short = 'v', long = "verbose", global = true, help = "Shows debug logs")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    Summary(SummaryArgs),
    Daily(DailyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logger::setup_logger(args.verbose)?;
    debug!("Arguments: {:?}", args);

    let config = Config::load().context("Failed to load config")?;
    let client = ClockifyClient::new(&config).context("Failed to new clockify client")?;

    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdown::new(&mut stdout);
    match args.subcommand {
        SubCommands::Summary(summary) => {
            let report = SummaryCommand::new(&client).run(summary).await?;
            presenter.show_report(&report)?;
        }
        SubCommands::Daily(daily) => {
            let daily = DailyCommand::new(&client).run(daily).await?;
            presenter.show_daily(&daily)?;
        }
    }

    Ok(())
}
