use super::RegistryEntry;
use crate::Result;
use crate::facts::ProviderResult;
use crate::facts::cache::{Cache, CacheKey};
use crate::facts::endpoints::join_url;
use crate::facts::http;
use reqwest::header::HeaderMap;

const LOG_TARGET: &str = "  registry";
const CACHE_SOURCE: &str = "registry";

/// Fetches package metadata from the registry JSON API.
#[derive(Debug, Clone)]
pub struct Provider {
    client: reqwest::Client,
    cache: Cache,
    base_url: String,
}

impl Provider {
    pub fn new(cache: Cache, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: http::build_client(HeaderMap::new())?,
            cache,
            base_url: base_url.to_string(),
        })
    }

    /// Fetch the registry entry for one package.
    pub async fn fetch(&self, name: &str) -> ProviderResult<RegistryEntry> {
        let key = CacheKey::new(CACHE_SOURCE, name.to_lowercase());
        self.cache
            .get_or_compute(&key, || async {
                let url = join_url(&self.base_url, &format!("pypi/{name}/json"));
                log::debug!(target: LOG_TARGET, "Fetching registry entry for '{name}'");
                http::get_json(self.client.get(url), &format!("registry entry for '{name}'")).await
            })
            .await
    }
}
