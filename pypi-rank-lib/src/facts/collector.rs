use super::hosting::CredentialSource;
use super::progress::Progress;
use super::selector::union_candidates;
use super::{Cache, Endpoints, Enricher, PackageRecord, ProviderResult, SearchQuery, TaskPool};
use super::{downloads, hosting, index, popular, registry};
use crate::Result;
use crate::scoring;
use chrono::NaiveDate;
use ohno::bail;
use std::sync::Arc;

const LOG_TARGET: &str = " collector";

/// Tunables for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Number of packages processed at the same time.
    pub concurrency: usize,

    /// Length of the rolling download window in days.
    pub recent_download_days: u32,

    /// Number of popular packages whose descriptions are searched.
    pub popular_limit: usize,

    /// The date scores and download windows are computed against.
    pub today: NaiveDate,
}

/// Drives a search from query to ranked records.
pub struct Collector {
    index: index::Provider,
    popular: popular::Provider,
    registry: registry::Provider,
    enricher: Arc<Enricher>,
    pool: TaskPool,
    popular_limit: usize,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for Collector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collector")
            .field("index", &self.index)
            .field("popular", &self.popular)
            .field("registry", &self.registry)
            .field("enricher", &self.enricher)
            .field("pool", &self.pool)
            .field("popular_limit", &self.popular_limit)
            .field("progress", &"<dyn Progress>")
            .finish()
    }
}

impl Collector {
    pub fn new(
        cache: &Cache,
        endpoints: &Endpoints,
        credentials: Arc<dyn CredentialSource>,
        settings: Settings,
        progress: impl Progress + 'static,
    ) -> Result<Self> {
        let registry = registry::Provider::new(cache.clone(), &endpoints.registry_url)?;
        let enricher = Enricher::new(
            registry.clone(),
            downloads::Provider::new(cache.clone(), &endpoints.downloads_url, endpoints.downloads_api_key.as_deref())?,
            hosting::Provider::new(cache.clone(), &endpoints.hosting_url, credentials)?,
            settings.today,
            settings.recent_download_days,
        );

        Ok(Self {
            index: index::Provider::new(cache.clone(), &endpoints.index_url)?,
            popular: popular::Provider::new(cache.clone(), &endpoints.popular_url)?,
            registry,
            enricher: Arc::new(enricher),
            pool: TaskPool::new(settings.concurrency),
            popular_limit: settings.popular_limit,
            progress: Arc::new(progress),
        })
    }

    /// Find, enrich, score, and rank the packages matching `query`.
    pub async fn search(&self, query: &SearchQuery, include_descriptions: bool) -> Result<Vec<PackageRecord>> {
        let result = self.search_core(query, include_descriptions).await;
        self.progress.done();
        result
    }

    async fn search_core(&self, query: &SearchQuery, include_descriptions: bool) -> Result<Vec<PackageRecord>> {
        self.progress.set_phase("Indexing");
        self.progress.set_indeterminate(Box::new(|| "downloading the package index".to_string()));

        let names = match self.index.fetch().await {
            ProviderResult::Found(names) => names,
            ProviderResult::NotFound => bail!("the package index could not be found"),
            ProviderResult::Error(e) => bail!("the package index is unavailable: {e:#}"),
        };

        let name_matches = query.match_names(&names);
        drop(names);
        log::info!(target: LOG_TARGET, "{} package names match '{query}'", name_matches.len());

        // Over the limit already, so there is no point in fetching the popular list.
        let name_matches = union_candidates(name_matches, Vec::new())?;

        let summary_matches = if include_descriptions {
            self.match_summaries(query).await
        } else {
            Vec::new()
        };

        let candidates = union_candidates(name_matches, summary_matches)?;
        log::info!(target: LOG_TARGET, "Enriching {} candidate packages", candidates.len());

        self.progress.set_phase("Enriching");
        let enricher = Arc::clone(&self.enricher);
        let records = self
            .pool
            .run(candidates, "packages", self.progress.as_ref(), move |name| {
                let enricher = Arc::clone(&enricher);
                async move { enricher.enrich(name).await }
            })
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        Ok(scoring::rank(records))
    }

    /// Names of popular packages whose summary matches the query, most popular first.
    async fn match_summaries(&self, query: &SearchQuery) -> Vec<String> {
        self.progress.set_phase("Scanning");
        self.progress.set_indeterminate(Box::new(|| "downloading the popular package list".to_string()));

        let popular = match self.popular.fetch(self.popular_limit).await {
            ProviderResult::Found(names) => names,
            ProviderResult::NotFound => {
                log::warn!(target: LOG_TARGET, "The popular package list could not be found, skipping description search");
                return Vec::new();
            }
            ProviderResult::Error(e) => {
                log::warn!(target: LOG_TARGET, "Could not fetch the popular package list, skipping description search: {e:#}");
                return Vec::new();
            }
        };

        let registry = self.registry.clone();
        let task_query = query.clone();
        let mut matches: Vec<(usize, String)> = self
            .pool
            .run(popular.into_iter().enumerate().collect(), "descriptions", self.progress.as_ref(), move |(rank, name)| {
                let registry = registry.clone();
                let query = task_query.clone();
                async move {
                    let summary = match registry.fetch(&name).await {
                        ProviderResult::Found(entry) => entry.info.summary,
                        ProviderResult::NotFound => None,
                        ProviderResult::Error(e) => {
                            log::debug!(target: LOG_TARGET, "Could not read the description of '{name}': {e:#}");
                            None
                        }
                    };

                    summary.filter(|s| query.matches_summary(s)).map(|_| (rank, name))
                }
            })
            .await
            .into_iter()
            .flatten()
            .collect();

        matches.sort_unstable_by_key(|(rank, _)| *rank);
        log::info!(target: LOG_TARGET, "{} popular package descriptions match '{query}'", matches.len());

        matches.into_iter().map(|(_, name)| name).collect()
    }
}
