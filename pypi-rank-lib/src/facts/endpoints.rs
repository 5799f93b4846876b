/// Base URLs of the upstream services queried during a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Package index root; the listing is read from `{index_url}/simple/`.
    pub index_url: String,

    /// Registry JSON API root; entries are read from `{registry_url}/pypi/{name}/json`.
    pub registry_url: String,

    /// Download statistics API root; stats are read from `{downloads_url}/api/v2/projects/{name}`.
    pub downloads_url: String,

    /// Optional API key sent to the download statistics service.
    pub downloads_api_key: Option<String>,

    /// Repository hosting API root; metadata is read from `{hosting_url}/repos/{owner}/{repo}`.
    pub hosting_url: String,

    /// Full URL of the popular-packages list.
    pub popular_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            index_url: "https://pypi.org".to_string(),
            registry_url: "https://pypi.org".to_string(),
            downloads_url: "https://api.pepy.tech".to_string(),
            downloads_api_key: None,
            hosting_url: "https://api.github.com".to_string(),
            popular_url: "https://hugovk.github.io/top-pypi-packages/top-pypi-packages.min.json".to_string(),
        }
    }
}

/// Join a base URL and a path without doubling or dropping the separator.
pub(super) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
