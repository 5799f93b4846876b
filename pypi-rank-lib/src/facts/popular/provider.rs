use crate::Result;
use crate::facts::ProviderResult;
use crate::facts::cache::{Cache, CacheKey};
use crate::facts::http;
use reqwest::header::HeaderMap;
use serde::Deserialize;

const LOG_TARGET: &str = "   popular";
const CACHE_SOURCE: &str = "popular";

#[derive(Debug, Deserialize)]
struct PopularList {
    rows: Vec<PopularRow>,
}

#[derive(Debug, Deserialize)]
struct PopularRow {
    project: String,
}

/// Fetches the top-packages list.
#[derive(Debug, Clone)]
pub struct Provider {
    client: reqwest::Client,
    cache: Cache,
    url: String,
}

impl Provider {
    pub fn new(cache: Cache, url: &str) -> Result<Self> {
        Ok(Self {
            client: http::build_client(HeaderMap::new())?,
            cache,
            url: url.to_string(),
        })
    }

    /// Fetch the names of the `limit` most popular packages, most popular first.
    pub async fn fetch(&self, limit: usize) -> ProviderResult<Vec<String>> {
        let key = CacheKey::new(CACHE_SOURCE, "top");
        let names = self
            .cache
            .get_or_compute(&key, || async {
                log::info!(target: LOG_TARGET, "Downloading popular package list from '{}'", self.url);
                http::get_json::<PopularList>(self.client.get(&self.url), "the popular package list")
                    .await
                    .map(|list| list.rows.into_iter().map(|row| row.project).collect::<Vec<_>>())
            })
            .await;

        names.map(|mut names| {
            names.truncate(limit);
            names
        })
    }
}
