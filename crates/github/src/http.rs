//! Pre-configured HTTP client for the GitHub REST API.
//!
//! Every request goes through [`GitHubHttpClient::send`], which inspects the
//! response before handing control back. A failed call is logged exactly once
//! here, with method, URL, status, response body and request payload, and is
//! then returned as a [`RelayError`]. Callers never log HTTP failures
//! themselves.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use settings::{keys, Settings};
use tracing::error;

use relay::RelayError;

/// Per-request timeout. There are no retries, so this bounds each call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(1000);

/// Media type for the v3 REST API.
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

const USER_AGENT: &str = concat!("codebuild-status/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one GitHub API base URL and token.
#[derive(Debug, Clone)]
pub struct GitHubHttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl GitHubHttpClient {
    /// Builds a client for `base_url` authenticating with `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self, RelayError> {
        let mut auth =
            HeaderValue::from_str(&format!("token {token}")).map_err(|_| {
                RelayError::Configuration {
                    message: format!("{} is not a valid header value", keys::GITHUB_TOKEN),
                }
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::Configuration {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// Builds a client from `github.url` and `github.token`.
    pub fn from_settings(settings: &Settings) -> Result<Self, RelayError> {
        let base_url = settings.get_str(keys::GITHUB_URL).map_err(configuration)?;
        let token = settings.get_str(keys::GITHUB_TOKEN).map_err(configuration)?;
        Self::new(base_url, token)
    }

    /// `GET {base_url}{path}`, returning the decoded JSON body.
    pub async fn get(&self, path: &str) -> Result<Value, RelayError> {
        self.send(Method::GET, path, None).await
    }

    /// `POST {base_url}{path}` with a JSON body, returning the decoded JSON body.
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Value, RelayError>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(body).map_err(|e| RelayError::RequestEncoding {
            path: path.to_owned(),
            message: e.to_string(),
        })?;
        self.send(Method::POST, path, Some(payload)).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
    ) -> Result<Value, RelayError> {
        let url = format!("{}{}", self.base_url, path);
        let request_payload = payload.as_ref().map(Value::to_string).unwrap_or_default();

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = &payload {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Err(transport_failure(&method, &url, &request_payload, &e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Err(transport_failure(&method, &url, &request_payload, &e)),
        };

        if !status.is_success() {
            error!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                response_body = %body,
                request_payload = %request_payload,
                "GitHub request failed"
            );
            return Err(RelayError::Upstream {
                method: method.to_string(),
                url,
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| RelayError::MalformedResponse {
            url,
            message: e.to_string(),
        })
    }
}

fn transport_failure(
    method: &Method,
    url: &str,
    request_payload: &str,
    err: &reqwest::Error,
) -> RelayError {
    error!(
        method = %method,
        url = %url,
        request_payload = %request_payload,
        error = %err,
        timeout = err.is_timeout(),
        "GitHub request failed without a response"
    );
    RelayError::Transport {
        method: method.to_string(),
        url: url.to_owned(),
        message: err.to_string(),
    }
}

fn configuration(err: settings::SettingsError) -> RelayError {
    RelayError::Configuration {
        message: err.to_string(),
    }
}
