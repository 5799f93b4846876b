use super::{CredentialSource, RepoMetadata};
use crate::Result;
use crate::facts::cache::{Cache, CacheKey};
use crate::facts::endpoints::join_url;
use crate::facts::{ProviderResult, RepoSpec, http};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use std::sync::Arc;
use tokio::sync::OnceCell;

const LOG_TARGET: &str = "   hosting";
const CACHE_SOURCE: &str = "hosting";

/// Fetches repository metadata from the hosting API.
///
/// The credential is requested from the [`CredentialSource`] at most once, and only when a
/// cache miss actually requires a request.
#[derive(Clone)]
pub struct Provider {
    client: reqwest::Client,
    cache: Cache,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
    token: Arc<OnceCell<HeaderValue>>,
}

impl core::fmt::Debug for Provider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Provider")
            .field("base_url", &self.base_url)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Provider {
    pub fn new(cache: Cache, base_url: &str, credentials: Arc<dyn CredentialSource>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        Ok(Self {
            client: http::build_client(headers)?,
            cache,
            base_url: base_url.to_string(),
            credentials,
            token: Arc::new(OnceCell::new()),
        })
    }

    /// Fetch metadata for one repository.
    ///
    /// Upstream failures are reported through the [`ProviderResult`]. The outer error is reserved
    /// for a missing credential, which aborts the whole search.
    pub async fn fetch(&self, repo: &RepoSpec) -> Result<ProviderResult<RepoMetadata>> {
        let key = CacheKey::new(CACHE_SOURCE, repo.to_string());
        if let Some(cached) = self.cache.lookup(&key) {
            return Ok(cached);
        }

        let token = self.authorization().await?;

        let url = join_url(&self.base_url, &format!("repos/{}/{}", repo.owner(), repo.repo()));
        log::debug!(target: LOG_TARGET, "Fetching repository metadata for '{repo}'");

        let request = self.client.get(url).header(AUTHORIZATION, token.clone());
        let result = http::get_json(request, &format!("repository metadata for '{repo}'")).await;

        self.cache.store(&key, &result);
        Ok(result)
    }

    async fn authorization(&self) -> Result<&HeaderValue> {
        self.token
            .get_or_try_init(|| async {
                let token = self.credentials.get_credential()?;
                let mut value = HeaderValue::from_str(&format!("token {token}"))?;
                value.set_sensitive(true);
                Ok::<_, ohno::AppError>(value)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use ohno::bail;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Default)]
    struct CountingCredential {
        calls: AtomicUsize,
        missing: bool,
    }

    impl CredentialSource for CountingCredential {
        fn get_credential(&self) -> Result<String> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.missing {
                bail!("no token");
            }
            Ok("secret".to_string())
        }
    }

    fn spec(s: &str) -> RepoSpec {
        RepoSpec::parse(s).unwrap()
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri does not support network operations")]
    async fn fetch_sends_token_once_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/psf/requests"))
            .and(header("authorization", "token secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "stargazers_count": 1000 })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/pallets/flask"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let credentials = Arc::new(CountingCredential::default());
        let provider = Provider::new(Cache::open(tmp.path()).await.unwrap(), &server.uri(), Arc::clone(&credentials) as Arc<dyn CredentialSource>).unwrap();

        let repo = spec("https://github.com/psf/requests");
        let found = provider.fetch(&repo).await.unwrap();
        assert_eq!(found.ok().and_then(|m| m.stargazers_count), Some(1000));

        let again = provider.fetch(&repo).await.unwrap();
        assert!(matches!(again, ProviderResult::Found(_)));

        let missing = provider.fetch(&spec("https://github.com/pallets/flask")).await.unwrap();
        assert!(matches!(missing, ProviderResult::NotFound));

        assert_eq!(credentials.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri does not support network operations")]
    async fn cached_answer_needs_no_credential() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let repo = spec("https://github.com/psf/requests");
        cache
            .save(&CacheKey::new(CACHE_SOURCE, repo.to_string()), &RepoMetadata { stargazers_count: Some(7) })
            .unwrap();

        let credentials = Arc::new(CountingCredential {
            missing: true,
            ..CountingCredential::default()
        });
        let provider = Provider::new(cache, "http://127.0.0.1:9", Arc::clone(&credentials) as Arc<dyn CredentialSource>).unwrap();

        let result = provider.fetch(&repo).await.unwrap();
        assert_eq!(result.ok().and_then(|m| m.stargazers_count), Some(7));
        assert_eq!(credentials.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri does not support network operations")]
    async fn missing_credential_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let credentials: Arc<dyn CredentialSource> = Arc::new(CountingCredential {
            missing: true,
            ..CountingCredential::default()
        });
        let provider = Provider::new(Cache::open(tmp.path()).await.unwrap(), "http://127.0.0.1:9", credentials).unwrap();

        let _ = provider.fetch(&spec("https://github.com/psf/requests")).await.unwrap_err();
    }
}
