//! Download statistics from pepy.tech.

mod download_stats;
mod provider;

pub use download_stats::DownloadStats;
pub use provider::Provider;
