mod config;
mod error;
mod models;
mod output;
mod scrapers;

use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Fetcher, ScoutConfig};
use models::{parse_date, Region};
use scrapers::{
    collect_bookings, earliest_review, scrape_listings, ChromeSessions, HttpSessions, ScrapeContext,
    SessionSource,
};

/// Scrape restaurant ratings, daily booking counts and review history
#[derive(Debug, Parser)]
#[command(name = "table-scout", version)]
struct Cli {
    /// JSON settings file (timeouts, retry policy, site selectors)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where CSV files are written
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[arg(long, value_enum, global = true)]
    fetcher: Option<Fetcher>,

    /// Show the Chrome window
    #[arg(long, global = true)]
    headed: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the date of a restaurant's first review
    EarliestReview {
        /// Restaurant page URL
        url: String,
    },
    /// Write today's booking counts for a region
    Bookings {
        #[arg(long)]
        region: Region,
        /// Override today's date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Scrape every listed restaurant's details, one CSV per results page
    Listings {
        #[arg(long)]
        region: Region,
        /// Reservation date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        /// Results page to resume from
        #[arg(long, default_value_t = 1)]
        starting_page: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    info!("🍽️  Table Scout");

    let mut config = ScoutConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(fetcher) = cli.fetcher {
        config.fetcher = fetcher;
    }
    if cli.headed {
        config.headless = false;
    }

    let fetcher = config.fetcher;
    let headless = config.headless;
    let ctx = config.into_context()?;

    match fetcher {
        Fetcher::Browser => {
            let sessions = ChromeSessions::launch(headless).context("Failed to launch Chrome browser")?;
            run(&sessions, &ctx, cli.command).await
        }
        Fetcher::Http => {
            let sessions = HttpSessions::new().context("Failed to create HTTP client")?;
            run(&sessions, &ctx, cli.command).await
        }
    }
}

async fn run<S: SessionSource>(sessions: &S, ctx: &ScrapeContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::EarliestReview { url } => {
            let review = earliest_review(sessions, &url, &ctx.settings, &ctx.layout)
                .await
                .with_context(|| format!("Earliest-review lookup failed for {}", url))?;
            println!("{}", review);
        }
        Command::Bookings { region, today } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let path = collect_bookings(sessions, ctx, region, today)
                .await
                .with_context(|| format!("Booking collection failed for {}", region))?;
            println!("{}", path.display());
        }
        Command::Listings {
            region,
            date,
            starting_page,
        } => {
            let paths = scrape_listings(sessions, ctx, region, date, starting_page)
                .await
                .with_context(|| format!("Listing scrape failed for {} on {}", region, date))?;
            info!("✅ Wrote {} files", paths.len());
            for path in paths {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
