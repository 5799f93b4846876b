//! Arguments and setup shared between commands.

use super::config::Config;
use crate::Result;
use crate::facts::Cache;
use crate::facts::hosting::default_token_path;
use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use directories::BaseDirs;
use ohno::IntoAppError;
use std::path::PathBuf;

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

impl ColorMode {
    /// Resolve the mode for a stream that is or is not a terminal.
    pub const fn use_colors(self, is_terminal: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => is_terminal,
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by every command
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Directory where upstream responses are cached
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Path to configuration file (default is `pypi-rank.toml` in the platform config directory)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// File holding the stored GitHub token (default is in the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

impl CommonArgs {
    /// Initialize logging and load the configuration.
    pub fn init(&self) -> Result<Config> {
        init_logging(self.log_level);
        Config::load(self.config.as_deref())
    }

    /// Open the response cache in the requested or default directory.
    pub async fn open_cache(&self) -> Result<Cache> {
        let cache_dir = if let Some(path) = &self.cache_dir {
            path.as_std_path().to_path_buf()
        } else {
            BaseDirs::new()
                .into_app_err("could not determine cache directory")?
                .cache_dir()
                .join("pypi-rank")
        };

        Cache::open(cache_dir).await
    }

    /// Where the GitHub token is read from and written to.
    pub fn token_path(&self) -> Option<PathBuf> {
        self.token_file
            .as_ref()
            .map(|path| path.as_std_path().to_path_buf())
            .or_else(default_token_path)
    }
}

/// Initialize logger based on log level
///
/// Calling this more than once keeps the first logger.
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode_resolution() {
        assert!(ColorMode::Always.use_colors(false));
        assert!(!ColorMode::Never.use_colors(true));
        assert!(ColorMode::Auto.use_colors(true));
        assert!(!ColorMode::Auto.use_colors(false));
    }

    #[test]
    fn test_explicit_token_file_wins() {
        let args = CommonArgs {
            cache_dir: None,
            config: None,
            token_file: Some(Utf8PathBuf::from("/tmp/token")),
            color: ColorMode::Never,
            log_level: LogLevel::None,
        };
        assert_eq!(args.token_path(), Some(PathBuf::from("/tmp/token")));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_open_cache_in_explicit_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().join("responses")).unwrap();
        let args = CommonArgs {
            cache_dir: Some(dir.clone()),
            config: None,
            token_file: None,
            color: ColorMode::Never,
            log_level: LogLevel::None,
        };

        let cache = args.open_cache().await.unwrap();
        assert_eq!(cache.dir(), dir.as_std_path());
    }
}
