use super::DownloadStats;
use crate::Result;
use crate::facts::ProviderResult;
use crate::facts::cache::{Cache, CacheKey};
use crate::facts::endpoints::join_url;
use crate::facts::http;
use reqwest::header::{HeaderMap, HeaderValue};

const LOG_TARGET: &str = " downloads";
const CACHE_SOURCE: &str = "downloads";
const API_KEY_HEADER: &str = "x-api-key";

/// Fetches download statistics from the pepy.tech API.
#[derive(Debug, Clone)]
pub struct Provider {
    client: reqwest::Client,
    cache: Cache,
    base_url: String,
}

impl Provider {
    pub fn new(cache: Cache, base_url: &str, api_key: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let mut value = HeaderValue::from_str(key)?;
            value.set_sensitive(true);
            let _ = headers.insert(API_KEY_HEADER, value);
        }

        Ok(Self {
            client: http::build_client(headers)?,
            cache,
            base_url: base_url.to_string(),
        })
    }

    /// Fetch the download statistics for one package.
    pub async fn fetch(&self, name: &str) -> ProviderResult<DownloadStats> {
        let key = CacheKey::new(CACHE_SOURCE, name.to_lowercase());
        self.cache
            .get_or_compute(&key, || async {
                let url = join_url(&self.base_url, &format!("api/v2/projects/{name}"));
                log::debug!(target: LOG_TARGET, "Fetching download statistics for '{name}'");
                http::get_json(self.client.get(url), &format!("download statistics for '{name}'")).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri does not support network operations")]
    async fn sends_api_key_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/rich"))
            .and(header(API_KEY_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "downloads": { "2024-05-01": { "13.7.1": 42 } }
            })))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let provider = Provider::new(Cache::open(tmp.path()).await.unwrap(), &server.uri(), Some("secret")).unwrap();

        let stats = provider.fetch("rich").await.ok().unwrap();
        assert_eq!(stats.downloads.len(), 1);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri does not support network operations")]
    async fn unauthorized_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/rich"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let provider = Provider::new(Cache::open(tmp.path()).await.unwrap(), &server.uri(), None).unwrap();

        assert!(matches!(provider.fetch("rich").await, ProviderResult::Error(_)));
    }
}
