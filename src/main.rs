mod commands;
mod render;
mod utils;

use anyhow::{Context, Result};
use calgrid_core::config::CalgridConfig;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calgrid")]
#[command(about = "Browse and edit a remote calendar as a month grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a month with event markers
    Month {
        /// Month to show (YYYY-MM), defaults to the current one
        #[arg(short, long)]
        month: Option<String>,

        /// Day to select and list events for (YYYY-MM-DD)
        #[arg(short, long)]
        select: Option<String>,
    },
    /// List a day's events in start order
    Day {
        /// Date (e.g. "2025-03-20", "tomorrow"), defaults to today
        date: Option<String>,
    },
    /// Scroll through months the way the grid view does
    Browse {
        /// Months to move forward
        #[arg(short, long, default_value_t = 3)]
        forward: usize,

        /// Months to move back afterwards
        #[arg(short, long, default_value_t = 0)]
        backward: usize,
    },
    New {
        title: Option<String>,

        /// Start date/time (e.g. "tomorrow 3pm", "2025-03-20 15:00")
        #[arg(short, long)]
        start: Option<String>,

        /// End date/time
        #[arg(short, long, conflicts_with = "duration")]
        end: Option<String>,

        /// Length instead of an end (e.g. "30m", "2h")
        #[arg(short, long)]
        duration: Option<String>,
    },
    Edit {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,
    },
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the config file location and effective settings
    Config {
        /// Change a setting and save it, e.g. --set week_start=monday
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CalgridConfig::load()?;

    match cli.command {
        Commands::Month { month, select } => {
            let month = month.as_deref().map(parse_month).transpose()?;
            let select = select.as_deref().map(parse_date).transpose()?;
            commands::month::run(&config, month, select).await
        }
        Commands::Day { date } => commands::day::run(&config, date.as_deref()).await,
        Commands::Browse { forward, backward } => {
            commands::browse::run(&config, forward, backward).await
        }
        Commands::New {
            title,
            start,
            end,
            duration,
        } => commands::new::run(&config, title, start, end, duration).await,
        Commands::Edit {
            id,
            title,
            start,
            end,
        } => commands::edit::run(&config, id, title, start, end).await,
        Commands::Delete { id, yes } => commands::delete::run(&config, id, yes).await,
        Commands::Config { set } => commands::config::run(&config, &set),
    }
}

fn parse_month(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{input}-01"), "%Y-%m-%d")
        .with_context(|| format!("Invalid month \"{input}\", expected YYYY-MM"))
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date \"{input}\", expected YYYY-MM-DD"))
}
