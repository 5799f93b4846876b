use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-day, per-version download counts for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadStats {
    #[serde(default)]
    pub downloads: BTreeMap<NaiveDate, BTreeMap<String, u64>>,
}

impl DownloadStats {
    /// Total downloads across all versions on days strictly after `today - window_days`.
    #[must_use]
    pub fn recent_total(&self, today: NaiveDate, window_days: u32) -> u64 {
        let cutoff = today.checked_sub_days(Days::new(u64::from(window_days))).unwrap_or(NaiveDate::MIN);

        self.downloads
            .range((core::ops::Bound::Excluded(cutoff), core::ops::Bound::Unbounded))
            .flat_map(|(_, per_version)| per_version.values())
            .sum()
    }
}
