use super::registry::RegistryEntry;
use super::{PackageRecord, ProviderResult, RepoSpec, downloads, hosting, registry};
use crate::Result;
use crate::scoring;
use chrono::NaiveDate;

const LOG_TARGET: &str = "  enricher";

/// Marker that a homepage is hosted on GitHub and can be looked up for stars.
const GITHUB_HOST: &str = "github.com";

/// Builds a complete [`PackageRecord`] for one package name.
///
/// Each data source is consulted in turn. A source that fails only leaves its own fields unset;
/// the one exception is a missing hosting credential, which is returned as an error.
#[derive(Debug, Clone)]
pub struct Enricher {
    registry: registry::Provider,
    downloads: downloads::Provider,
    hosting: hosting::Provider,
    today: NaiveDate,
    recent_download_days: u32,
}

impl Enricher {
    #[must_use]
    pub const fn new(
        registry: registry::Provider,
        downloads: downloads::Provider,
        hosting: hosting::Provider,
        today: NaiveDate,
        recent_download_days: u32,
    ) -> Self {
        Self {
            registry,
            downloads,
            hosting,
            today,
            recent_download_days,
        }
    }

    pub async fn enrich(&self, name: String) -> Result<PackageRecord> {
        let mut record = PackageRecord::new(name);

        match self.registry.fetch(&record.name).await {
            ProviderResult::Found(entry) => apply_registry_entry(&mut record, &entry),
            ProviderResult::NotFound => {
                log::debug!(target: LOG_TARGET, "Package '{}' is not in the registry", record.name);
            }
            ProviderResult::Error(e) => {
                log::warn!(target: LOG_TARGET, "Could not fetch registry entry for '{}': {e:#}", record.name);
            }
        }

        if record.last_release_date.is_some() {
            self.apply_downloads(&mut record).await;
        }

        if record.home_page.as_deref().is_some_and(|h| h.contains(GITHUB_HOST)) {
            self.apply_stars(&mut record).await?;
        }

        record.score = Some(scoring::score(&record, self.today));
        Ok(record)
    }

    async fn apply_downloads(&self, record: &mut PackageRecord) {
        match self.downloads.fetch(&record.name).await {
            ProviderResult::Found(stats) => {
                record.downloads = Some(stats.recent_total(self.today, self.recent_download_days));
            }
            ProviderResult::NotFound => {
                log::debug!(target: LOG_TARGET, "No download statistics for '{}'", record.name);
            }
            ProviderResult::Error(e) => {
                log::warn!(target: LOG_TARGET, "Could not fetch download statistics for '{}': {e:#}", record.name);
            }
        }
    }

    async fn apply_stars(&self, record: &mut PackageRecord) -> Result<()> {
        let Some(homepage) = record.home_page.as_deref() else {
            return Ok(());
        };

        let repo = match RepoSpec::parse(homepage) {
            Ok(repo) => repo,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Cannot derive a repository for '{}': {e:#}", record.name);
                return Ok(());
            }
        };

        match self.hosting.fetch(&repo).await? {
            ProviderResult::Found(metadata) => record.stars = metadata.stargazers_count,
            ProviderResult::NotFound => {
                log::debug!(target: LOG_TARGET, "Repository '{repo}' for '{}' does not exist", record.name);
            }
            ProviderResult::Error(e) => {
                log::warn!(target: LOG_TARGET, "Could not fetch repository metadata for '{}': {e:#}", record.name);
            }
        }

        Ok(())
    }
}

fn apply_registry_entry(record: &mut PackageRecord, entry: &RegistryEntry) {
    record.summary.clone_from(&entry.info.summary);
    record.version.clone_from(&entry.info.version);
    record.home_page = entry.homepage().map(str::to_string);

    if let Some(count) = entry.release_count() {
        record.releases = Some(count);
        record.last_release_date = entry.last_release_date();
    }
}
