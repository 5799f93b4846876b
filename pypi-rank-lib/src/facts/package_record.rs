use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything known about one candidate package.
///
/// Only `name` is guaranteed. Every other field is filled independently by enrichment and may
/// remain unset when its source is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub summary: Option<String>,
    pub version: Option<String>,
    pub home_page: Option<String>,

    /// Downloads across all versions within the recent window.
    pub downloads: Option<u64>,
    pub stars: Option<u64>,
    pub releases: Option<u64>,
    pub last_release_date: Option<NaiveDate>,
    pub score: Option<i64>,
}

impl PackageRecord {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
