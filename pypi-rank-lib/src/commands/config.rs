use crate::Result;
use crate::facts::Endpoints;
use camino::Utf8Path;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the platform config directory
const CONFIG_FILE_NAME: &str = "pypi-rank.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Number of packages looked up at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Length in days of the rolling download window
    #[serde(default = "default_recent_download_days")]
    pub recent_download_days: u32,

    /// Number of popular packages whose descriptions are searched
    #[serde(default = "default_popular_limit")]
    pub popular_limit: usize,

    #[serde(default = "default_index_url")]
    pub index_url: String,

    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    #[serde(default = "default_downloads_url")]
    pub downloads_url: String,

    #[serde(default = "default_hosting_url")]
    pub hosting_url: String,

    #[serde(default = "default_popular_url")]
    pub popular_url: String,

    /// Root of the OAuth endpoints used by the device flow
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// OAuth application the device flow authorizes against
    #[serde(default = "default_github_client_id")]
    pub github_client_id: String,
}

const fn default_concurrency() -> usize {
    10
}

const fn default_recent_download_days() -> u32 {
    90
}

const fn default_popular_limit() -> usize {
    500
}

fn default_index_url() -> String {
    Endpoints::default().index_url
}

fn default_registry_url() -> String {
    Endpoints::default().registry_url
}

fn default_downloads_url() -> String {
    Endpoints::default().downloads_url
}

fn default_hosting_url() -> String {
    Endpoints::default().hosting_url
}

fn default_popular_url() -> String {
    Endpoints::default().popular_url
}

fn default_auth_url() -> String {
    crate::facts::hosting::DEFAULT_AUTH_URL.to_string()
}

fn default_github_client_id() -> String {
    crate::facts::hosting::DEFAULT_CLIENT_ID.to_string()
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `pypi-rank.toml` in the platform config directory is used
    /// when it exists.
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading pypi-rank configuration file '{path}'"))?;
            return Self::parse(&text, path.as_std_path());
        }

        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text, &path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).into_app_err_with(|| format!("reading pypi-rank configuration file '{}'", path.display())),
        }
    }

    fn parse(text: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(text).into_app_err_with(|| format!("parsing configuration file '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(app_err!("concurrency must be at least 1"));
        }

        if self.recent_download_days == 0 {
            return Err(app_err!("recent_download_days must be at least 1"));
        }

        for (key, value) in [
            ("index_url", &self.index_url),
            ("registry_url", &self.registry_url),
            ("downloads_url", &self.downloads_url),
            ("hosting_url", &self.hosting_url),
            ("popular_url", &self.popular_url),
            ("auth_url", &self.auth_url),
        ] {
            let _ = url::Url::parse(value).into_app_err_with(|| format!("{key} is not a valid URL: '{value}'"))?;
        }

        if self.github_client_id.trim().is_empty() {
            return Err(app_err!("github_client_id must not be empty"));
        }

        Ok(())
    }

    /// The upstream services named by this configuration.
    pub fn endpoints(&self, downloads_api_key: Option<String>) -> Endpoints {
        Endpoints {
            index_url: self.index_url.clone(),
            registry_url: self.registry_url.clone(),
            downloads_url: self.downloads_url.clone(),
            downloads_api_key,
            hosting_url: self.hosting_url.clone(),
            popular_url: self.popular_url.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pypi-rank").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.recent_download_days, 90);
    }

    #[test]
    fn test_default_config_matches_default_endpoints() {
        assert_eq!(Config::default().endpoints(None), Endpoints::default());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let _ = toml::from_str::<Config>("threads = 4").unwrap_err();
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = Config { concurrency: 0, ..Config::default() };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_zero_download_window() {
        let config = Config { recent_download_days: 0, ..Config::default() };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_bad_url() {
        let config = Config { registry_url: "not a url".to_string(), ..Config::default() };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_endpoints_carry_api_key() {
        let endpoints = Config::default().endpoints(Some("secret".to_string()));
        assert_eq!(endpoints.downloads_api_key.as_deref(), Some("secret"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("pypi-rank.toml")).unwrap();
        fs::write(&path, "concurrency = 3\nregistry_url = \"http://127.0.0.1:9000\"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.registry_url, "http://127.0.0.1:9000");
        assert_eq!(config.index_url, Config::default().index_url);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_explicit_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("absent.toml")).unwrap();
        let _ = Config::load(Some(path.as_path())).unwrap_err();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_invalid_values_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("pypi-rank.toml")).unwrap();
        fs::write(&path, "concurrency = 0\n").unwrap();
        let _ = Config::load(Some(path.as_path())).unwrap_err();
    }

    #[test]
    fn test_default_config_toml_is_not_empty() {
        assert!(!DEFAULT_CONFIG_TOML.is_empty());
    }
}
