//! HTTP plumbing shared by the data-source adapters.
//!
//! Responses are classified the same way for every upstream service: 2xx is success,
//! 404 means the item does not exist, and anything else (including transport failures)
//! is an error for that one call.

use super::provider_result::ProviderResult;
use crate::Result;
use ohno::{EnrichableExt, app_err};
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const USER_AGENT: &str = concat!("pypi-rank/", env!("CARGO_PKG_VERSION"));

/// Outcome of a single HTTP request.
#[derive(Debug)]
pub enum HttpResult {
    Success(Response),
    NotFound,
    Failed(ohno::AppError),
}

/// Build an HTTP client with the tool's user agent and the given default headers.
pub fn build_client(headers: HeaderMap) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).default_headers(headers).build()?)
}

/// Send a request and classify the response.
pub async fn send(request: RequestBuilder) -> HttpResult {
    let resp = match request.send().await {
        Ok(resp) => resp,
        Err(e) => return HttpResult::Failed(e.into()),
    };

    let status = resp.status();
    if status.is_success() {
        HttpResult::Success(resp)
    } else if status == StatusCode::NOT_FOUND {
        HttpResult::NotFound
    } else {
        HttpResult::Failed(app_err!("unexpected HTTP status {status} from '{}'", resp.url()))
    }
}

/// Send a request and decode a JSON body into `T`.
pub async fn get_json<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> ProviderResult<T> {
    match send(request).await {
        HttpResult::Success(resp) => match resp.json::<T>().await {
            Ok(value) => ProviderResult::Found(value),
            Err(e) => ProviderResult::Error(Arc::new(ohno::AppError::from(e).enrich_with(|| format!("decoding {what}")))),
        },
        HttpResult::NotFound => ProviderResult::NotFound,
        HttpResult::Failed(e) => ProviderResult::Error(Arc::new(e.enrich_with(|| format!("fetching {what}")))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    fn client() -> reqwest::Client {
        build_client(HeaderMap::new()).unwrap()
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri does not support network operations")]
    async fn classifies_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": 7 })))
            .mount(&server)
            .await;

        let result: ProviderResult<Payload> = get_json(client().get(format!("{}/ok", server.uri())), "payload").await;
        assert_eq!(result.ok(), Some(Payload { value: 7 }));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri does not support network operations")]
    async fn classifies_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result: ProviderResult<Payload> = get_json(client().get(format!("{}/missing", server.uri())), "payload").await;
        assert!(matches!(result, ProviderResult::NotFound));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri does not support network operations")]
    async fn classifies_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result: ProviderResult<Payload> = get_json(client().get(format!("{}/broken", server.uri())), "payload").await;
        assert!(matches!(result, ProviderResult::Error(_)));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri does not support network operations")]
    async fn undecodable_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let result: ProviderResult<Payload> = get_json(client().get(format!("{}/garbage", server.uri())), "payload").await;
        assert!(matches!(result, ProviderResult::Error(_)));
    }
}
