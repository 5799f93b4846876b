use crate::Result;
use crate::facts::ProviderResult;
use crate::facts::cache::{Cache, CacheKey};
use crate::facts::endpoints::join_url;
use crate::facts::http::{self, HttpResult};
use ohno::EnrichableExt;
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::sync::{Arc, LazyLock};

const LOG_TARGET: &str = "     index";
const CACHE_SOURCE: &str = "index";
const SIMPLE_JSON: &str = "application/vnd.pypi.simple.v1+json";

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<a\b[^>]*>([^<]*)</a>").expect("anchor pattern is valid"));

/// The JSON form of the simple index.
#[derive(Debug, Deserialize)]
struct SimpleIndex {
    projects: Vec<SimpleProject>,
}

#[derive(Debug, Deserialize)]
struct SimpleProject {
    name: String,
}

/// Fetches the full list of package names from the simple index.
#[derive(Debug, Clone)]
pub struct Provider {
    client: reqwest::Client,
    cache: Cache,
    url: String,
}

impl Provider {
    pub fn new(cache: Cache, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_str(&format!("{SIMPLE_JSON}, text/html;q=0.1"))?);

        Ok(Self {
            client: http::build_client(headers)?,
            cache,
            url: join_url(base_url, "simple/"),
        })
    }

    /// Fetch every package name in the index.
    pub async fn fetch(&self) -> ProviderResult<Vec<String>> {
        let key = CacheKey::new(CACHE_SOURCE, "simple");
        self.cache.get_or_compute(&key, || self.fetch_core()).await
    }

    async fn fetch_core(&self) -> ProviderResult<Vec<String>> {
        log::info!(target: LOG_TARGET, "Downloading package index from '{}'", self.url);

        let resp = match http::send(self.client.get(&self.url)).await {
            HttpResult::Success(resp) => resp,
            HttpResult::NotFound => return ProviderResult::NotFound,
            HttpResult::Failed(e) => return ProviderResult::Error(Arc::new(e.enrich_with(|| "fetching the package index".to_string()))),
        };

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => return ProviderResult::Error(Arc::new(ohno::AppError::from(e).enrich_with(|| "reading the package index".to_string()))),
        };

        let names = if is_json {
            match serde_json::from_str::<SimpleIndex>(&body) {
                Ok(index) => index.projects.into_iter().map(|p| p.name).collect(),
                Err(e) => return ProviderResult::Error(Arc::new(ohno::AppError::from(e).enrich_with(|| "decoding the package index".to_string()))),
            }
        } else {
            parse_anchors(&body)
        };

        log::info!(target: LOG_TARGET, "Package index lists {} packages", names.len());
        ProviderResult::Found(names)
    }
}

/// Extract the text of every anchor in an HTML simple-index page.
fn parse_anchors(html: &str) -> Vec<String> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Expand the character references an HTML listing may use in a package name.
///
/// `&amp;` is expanded last so that `&amp;lt;` stays `&lt;`.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
