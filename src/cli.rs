use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ilw_core::params::{DateRange, Location, PageFilters};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ilw", version, about = "Issue List Watcher TUI")]
pub struct Cli {
    /// Base URL of the error tracker
    #[arg(long, env = "ILW_URL", default_value = "https://sentry.io/")]
    pub url: String,

    /// Organization slug
    #[arg(long, env = "ILW_ORG")]
    pub org: String,

    /// API auth token
    #[arg(long, env = "ILW_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Project id (repeatable)
    #[arg(short, long = "project")]
    pub projects: Vec<i64>,

    /// Environment name (repeatable)
    #[arg(short, long = "environment")]
    pub environments: Vec<String>,

    /// Relative period such as 24h or 14d
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub period: Option<String>,

    /// Absolute range start (RFC 3339)
    #[arg(long, requires = "end")]
    pub start: Option<DateTime<Utc>>,

    /// Absolute range end (RFC 3339)
    #[arg(long, requires = "start")]
    pub end: Option<DateTime<Utc>>,

    /// Search query (defaults to the pinned search, then is:unresolved)
    #[arg(short, long)]
    pub query: Option<String>,

    /// Sort: date, new, priority, freq, user, trend, inbox
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Period of the per-issue trend graph
    #[arg(long)]
    pub stats_period: Option<String>,

    /// Page cursor to start from
    #[arg(long)]
    pub cursor: Option<String>,

    /// Navigation state as a query string, e.g. `query=is:ignored&sort=freq`
    #[arg(long, conflicts_with_all = ["query", "sort", "stats_period", "cursor"])]
    pub location: Option<String>,

    /// Realtime poll interval in seconds
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Start with realtime updates off
    #[arg(long)]
    pub no_realtime: bool,

    /// Keep reviewed issues on the For Review tab until the next fetch
    #[arg(long)]
    pub legacy_review: bool,

    /// Write debug logs to the state directory
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a dashboard widget defined in a JSON file and print its data
    Widget {
        /// Widget definition (JSON)
        file: PathBuf,
    },
}

impl Cli {
    pub fn page_filters(&self) -> PageFilters {
        let range = match (&self.period, self.start, self.end) {
            (Some(period), _, _) => Some(DateRange::Relative(period.clone())),
            (None, Some(start), Some(end)) => Some(DateRange::absolute(&start, &end)),
            _ => None,
        };
        PageFilters {
            projects: self.projects.clone(),
            environments: self.environments.clone(),
            range,
        }
    }

    pub fn location(&self) -> Location {
        if let Some(qs) = &self.location {
            return Location::from_query_string(qs);
        }
        Location {
            query: self.query.clone(),
            sort: self.sort.clone(),
            cursor: self.cursor.clone(),
            group_stats_period: self.stats_period.clone(),
        }
    }
}
