//! HTTP client for the iconmark persistence service.
//!
//! Two calls: save the current icons (the server answers with a new session
//! id) and fetch the icons of a session. Failures are reported to the caller
//! and never retried.

use std::sync::Arc;

use iconmark_core::PersistedIconRecord;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Field names a save response may carry the session id under.
const SESSION_ID_FIELDS: [&str; 3] = ["SessionId", "sessionId", "session_id"];

/// Errors that can occur when talking to the persistence service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL provided is invalid.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// JSON parsing failed.
    #[error("failed to parse server payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The save response carried no session id.
    #[error("save response did not contain a session id")]
    MissingSessionId,
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client for `save-icons` / `get-icons`.
#[derive(Clone)]
pub struct IconClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base: Url,
}

#[derive(Serialize)]
struct SaveIconsBody<'a> {
    #[serde(rename = "placedIcons")]
    placed_icons: &'a [PersistedIconRecord],
}

impl IconClient {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed or cannot
    /// be a base. Returns [`ClientError::Http`] if the HTTP client fails to
    /// build.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("iconmark-desktop/", env!("CARGO_PKG_VERSION")))
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;
        Self::with_http(base_url, http)
    }

    /// Create a client that shares an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed or cannot
    /// be a base.
    pub fn with_http(base_url: &str, http: Client) -> ClientResult<Self> {
        let mut base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!("{base_url} cannot be a base URL")));
        }
        // Join relative paths under the base, not beside it.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            inner: Arc::new(InnerClient { http, base }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Save `records` as a new session and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with an
    /// error status, or the response carries no session id.
    pub async fn save(&self, records: &[PersistedIconRecord]) -> ClientResult<String> {
        let url = self.endpoint("save-icons")?;
        tracing::debug!("Saving {} icon(s) to {url}", records.len());

        let response = self
            .inner
            .http
            .post(url)
            .json(&SaveIconsBody {
                placed_icons: records,
            })
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;
        session_id_from(&body).ok_or(ClientError::MissingSessionId)
    }

    /// Fetch the icons saved under `session_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with an
    /// error status, or the body is not a list of icon records.
    pub async fn fetch(&self, session_id: &str) -> ClientResult<Vec<PersistedIconRecord>> {
        let mut url = self.endpoint("get-icons/")?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.inner.base.to_string()))?
            .pop_if_empty()
            .push(session_id);
        tracing::debug!("Fetching icons from {url}");

        let response = self.inner.http.get(url).send().await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.inner
            .base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Extract the session id from a save response.
fn session_id_from(body: &Value) -> Option<String> {
    SESSION_ID_FIELDS
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
