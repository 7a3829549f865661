use std::path::PathBuf;

use crate::demo::{run_demo, run_search, DemoArgs};
use crate::server;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use farmhand::error::AppError;
use farmhand::marketplace::SortKey;

#[derive(Parser, Debug)]
#[command(
    name = "Farmhand",
    about = "Search farm workers, run the booking demo, or serve the marketplace API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Search the worker roster from the command line
    Search(SearchArgs),
    /// Walk one booking from search to payment, then place a group booking
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Worker roster CSV to serve instead of the seed roster
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum SortArg {
    Rating,
    Price,
    Experience,
    Distance,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Rating => SortKey::Rating,
            SortArg::Price => SortKey::Price,
            SortArg::Experience => SortKey::Experience,
            SortArg::Distance => SortKey::Distance,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct SearchArgs {
    /// Free-text match against name, location, and skills
    #[arg(long, default_value = "")]
    pub(crate) query: String,
    /// Keep workers offering any of these skills (repeatable)
    #[arg(long = "skill")]
    pub(crate) skills: Vec<String>,
    /// Minimum worker rating
    #[arg(long)]
    pub(crate) min_rating: Option<f32>,
    /// Maximum daily rate
    #[arg(long)]
    pub(crate) max_price: Option<u32>,
    /// Maximum distance in kilometres
    #[arg(long)]
    pub(crate) max_distance: Option<f32>,
    /// Only list workers currently taking bookings
    #[arg(long)]
    pub(crate) available_only: bool,
    /// Sort key
    #[arg(long, value_enum, default_value = "rating")]
    pub(crate) sort_by: SortArg,
    /// Sort ascending instead of descending
    #[arg(long)]
    pub(crate) asc: bool,
    /// Worker roster CSV (defaults to the seed roster)
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Reference date for availability (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Search(args) => run_search(args),
        Command::Demo(args) => run_demo(args),
    }
}
