//! Command dispatch logic for pypi-rank

use super::{AuthArgs, ClearCacheArgs, SearchArgs, auth_github, clear_cache, search};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "pypi-rank", version, author, long_about = None)]
#[command(about = "Search PyPI and rank packages by popularity and release activity")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search packages by name and rank the matches
    Search(Box<SearchArgs>),
    /// Log into GitHub so repository stars can be looked up
    AuthGithub(AuthArgs),
    /// Remove every cached upstream response
    ClearCache(ClearCacheArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        Command::Search(search_args) => search(host, search_args).await,
        Command::AuthGithub(auth_args) => auth_github(host, auth_args).await,
        Command::ClearCache(clear_args) => clear_cache(host, clear_args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_flags() {
        let cli = Cli::try_parse_from([
            "pypi-rank",
            "search",
            "requests,oauth",
            "--limit",
            "5",
            "--json",
            "--threads",
            "4",
            "--descriptions",
            "--no-cache",
        ])
        .unwrap();

        let Command::Search(args) = cli.command else {
            panic!("expected the search command");
        };
        assert_eq!(args.query, "requests,oauth");
        assert_eq!(args.limit.map(core::num::NonZeroUsize::get), Some(5));
        assert_eq!(args.threads.map(core::num::NonZeroUsize::get), Some(4));
        assert!(args.json && args.descriptions && args.no_cache);
    }

    #[test]
    fn test_short_query_is_rejected() {
        let _ = Cli::try_parse_from(["pypi-rank", "search", "abc"]).unwrap_err();
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let _ = Cli::try_parse_from(["pypi-rank", "search", "requests", "--limit", "0"]).unwrap_err();
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let _ = Cli::try_parse_from(["pypi-rank", "clear-cache", "--log-level", "loud"]).unwrap_err();
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_clear_cache_command() {
        let tmp = tempfile::tempdir().unwrap();
        let cache_dir = tmp.path().join("cache");
        let stale = cache_dir.join("registry").join("requests.json");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "{}").unwrap();

        let mut host = TestHost::new();
        run(&mut host, ["pypi-rank", "clear-cache", "--cache-dir", cache_dir.to_str().unwrap()])
            .await
            .unwrap();

        assert!(!stale.exists());
        assert!(host.error_text().contains("Cleared cache"));
        assert!(host.output_text().is_empty());
    }
}
