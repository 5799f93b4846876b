use serde::{Deserialize, Serialize};

/// Repository facts reported by the hosting API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    #[serde(default, alias = "stars_count")]
    pub stargazers_count: Option<u64>,
}
