//! The OAuth device authorization flow used to obtain a GitHub token.
//!
//! The user is shown a short code and a verification URL. While they approve the request in a
//! browser, the token endpoint is polled at the interval the server asks for until a token is
//! issued or the device code expires.

use crate::Result;
use crate::facts::endpoints::join_url;
use crate::facts::http;
use core::time::Duration;
use ohno::{IntoAppError, bail};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;

const LOG_TARGET: &str = "      auth";

/// Default root of the GitHub OAuth endpoints.
pub const DEFAULT_AUTH_URL: &str = "https://github.com";

/// Client identifier of the OAuth application the device flow authorizes against.
pub const DEFAULT_CLIENT_ID: &str = "da5e9528b63f1bd10fd8";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const SLOW_DOWN_STEP_SECS: u64 = 5;

/// Codes returned when a device flow is started.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerificationCodes {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

const fn default_interval() -> u64 {
    SLOW_DOWN_STEP_SECS
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    interval: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DeviceFlow {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
}

impl DeviceFlow {
    pub fn new(base_url: &str, client_id: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: http::build_client(headers)?,
            base_url: base_url.to_string(),
            client_id: client_id.to_string(),
        })
    }

    /// Start the flow and obtain the codes to show to the user.
    pub async fn request_codes(&self) -> Result<VerificationCodes> {
        let url = join_url(&self.base_url, "login/device/code");
        log::debug!(target: LOG_TARGET, "Requesting device code from '{url}'");

        let resp = self
            .client
            .post(&url)
            .form(&[("client_id", self.client_id.as_str())])
            .send()
            .await
            .into_app_err_with(|| format!("requesting a device code from '{url}'"))?
            .error_for_status()
            .into_app_err_with(|| format!("requesting a device code from '{url}'"))?;

        resp.json().await.into_app_err("decoding the device code response")
    }

    /// Poll until the user approves the request, returning the issued token.
    pub async fn wait_for_token(&self, codes: &VerificationCodes) -> Result<String> {
        let url = join_url(&self.base_url, "login/oauth/access_token");
        let deadline = tokio::time::Instant::now() + Duration::from_secs(codes.expires_in);
        let mut interval = codes.interval;

        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if tokio::time::Instant::now() >= deadline {
                bail!("the device code expired before authorization completed, please run `pypi-rank auth-github` again");
            }

            let response: TokenResponse = self
                .client
                .post(&url)
                .form(&[
                    ("client_id", self.client_id.as_str()),
                    ("device_code", codes.device_code.as_str()),
                    ("grant_type", GRANT_TYPE),
                ])
                .send()
                .await
                .into_app_err_with(|| format!("polling '{url}' for an access token"))?
                .json()
                .await
                .into_app_err("decoding the access token response")?;

            if let Some(token) = response.access_token.filter(|t| !t.is_empty()) {
                log::info!(target: LOG_TARGET, "Received GitHub access token");
                return Ok(token);
            }

            match response.error.as_deref() {
                None | Some("authorization_pending") => {
                    log::debug!(target: LOG_TARGET, "Authorization pending, polling again in {interval}s");
                }
                Some("slow_down") => {
                    interval = response.interval.unwrap_or(interval + SLOW_DOWN_STEP_SECS);
                    log::debug!(target: LOG_TARGET, "Asked to slow down, polling every {interval}s");
                }
                Some("expired_token") => {
                    bail!("the device code expired before authorization completed, please run `pypi-rank auth-github` again");
                }
                Some("access_denied") => bail!("authorization was denied"),
                Some(other) => {
                    let description = response.error_description.unwrap_or_default();
                    bail!("GitHub rejected the token request ({other}): {description}");
                }
            }
        }
    }
}
