use super::common::{CommonArgs, LogLevel};
use super::{Host, ProgressReporter};
use crate::Result;
use crate::facts::hosting::StoredCredential;
use crate::facts::{Collector, SearchQuery, Settings};
use crate::reports::{generate_console, generate_json};
use chrono::Local;
use clap::Args;
use core::num::NonZeroUsize;
use core::time::Duration;
use std::io::{IsTerminal, Write, stderr, stdout};
use std::sync::Arc;

/// Shortest query accepted on the command line.
const MIN_QUERY_LEN: usize = 4;

/// How long a search must run before the progress bar appears.
const PROGRESS_DELAY: Duration = Duration::from_millis(300);

/// Effectively never; keeps the progress bar out of the way of log output.
const PROGRESS_DELAY_WHEN_LOGGING: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Comma-separated phrases that must all appear in a package name
    #[arg(value_name = "QUERY", value_parser = parse_query)]
    pub query: String,

    /// Show only the first N packages of the ranking
    #[arg(long, value_name = "N")]
    pub limit: Option<NonZeroUsize>,

    /// Clear the response cache before searching
    #[arg(long)]
    pub no_cache: bool,

    /// Print one JSON object per package and line instead of a table
    #[arg(long)]
    pub json: bool,

    /// Number of packages looked up at the same time (default from configuration)
    #[arg(long, value_name = "N")]
    pub threads: Option<NonZeroUsize>,

    /// Also match whole words in the descriptions of popular packages
    #[arg(long)]
    pub descriptions: bool,

    /// GitHub token used to look up repository stars
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// API key for the download statistics service
    #[arg(long, value_name = "KEY", env = "PEPY_API_KEY", hide_env_values = true)]
    pub pepy_api_key: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

fn parse_query(value: &str) -> Result<String, String> {
    if value.chars().count() < MIN_QUERY_LEN {
        return Err(format!("query too short, the minimum length is {MIN_QUERY_LEN}"));
    }

    Ok(value.to_string())
}

pub async fn search<H: Host>(host: &mut H, args: &SearchArgs) -> Result<()> {
    let config = args.common.init()?;
    let query = SearchQuery::parse(&args.query)?;

    let cache = args.common.open_cache().await?;
    if args.no_cache {
        cache.clear()?;
    }

    let settings = Settings {
        concurrency: args.threads.map_or(config.concurrency, NonZeroUsize::get),
        recent_download_days: config.recent_download_days,
        popular_limit: config.popular_limit,
        today: Local::now().date_naive(),
    };

    let delay = if args.common.log_level == LogLevel::None {
        PROGRESS_DELAY
    } else {
        PROGRESS_DELAY_WHEN_LOGGING
    };
    let progress = ProgressReporter::new(delay, args.common.color.use_colors(stderr().is_terminal()));

    let credentials = Arc::new(StoredCredential::new(args.github_token.clone(), args.common.token_path()));
    let collector = Collector::new(
        &cache,
        &config.endpoints(args.pepy_api_key.clone()),
        credentials,
        settings,
        progress,
    )?;

    let mut records = collector.search(&query, args.descriptions).await?;
    if let Some(limit) = args.limit {
        records.truncate(limit.get());
    }

    let mut rendered = String::new();
    if args.json {
        generate_json(&records, &mut rendered)?;
    } else {
        generate_console(&records, args.common.color.use_colors(stdout().is_terminal()), &mut rendered)?;
    }

    let _ = write!(host.output(), "{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_minimum_length() {
        let _ = parse_query("abc").unwrap_err();
        assert_eq!(parse_query("abcd").unwrap(), "abcd");
    }

    #[test]
    fn test_query_length_counts_characters() {
        let _ = parse_query("äöü").unwrap_err();
        assert_eq!(parse_query("äöüß").unwrap(), "äöüß");
    }
}
