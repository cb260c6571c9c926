//! Outbound HTTP clients and the traits the pipeline consumes them through.
pub(crate) mod credentials;
pub(crate) mod gemini;
pub(crate) mod spotify;

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::model::{Collection, TrackRef};

pub use credentials::{AppToken, UserToken};
pub(crate) use gemini::{GeminiClient, GeminiConfig};
pub(crate) use spotify::{SpotifyAccountsClient, SpotifyClient, SpotifyConfig};

/// Failure of one outbound call, classified so callers can tell a rejected
/// credential apart from transport trouble.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} did not answer within {}ms", .limit.as_millis())]
    Timeout {
        service: &'static str,
        limit: Duration,
    },
    #[error("{service} rejected the credential ({status})")]
    Unauthorized {
        service: &'static str,
        status: StatusCode,
    },
    #[error("{service} returned error status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("failed to decode {service} response: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },
    #[error("failed to build {service} URL: {detail}")]
    Url {
        service: &'static str,
        detail: String,
    },
}

impl ClientError {
    /// Timeouts, connection failures, 5xx and 429 are worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Unauthorized { .. } | Self::Decode { .. } | Self::Url { .. } => false,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    #[must_use]
    pub fn service(&self) -> &'static str {
        match self {
            Self::Transport { service, .. }
            | Self::Timeout { service, .. }
            | Self::Unauthorized { service, .. }
            | Self::Status { service, .. }
            | Self::Decode { service, .. }
            | Self::Url { service, .. } => service,
        }
    }

    pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { service, source }
    }

    pub(crate) fn decode(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |error| Self::Decode {
            service,
            detail: error.to_string(),
        }
    }
}

const ERROR_BODY_LIMIT: usize = 512;

/// Passes successful responses through and classifies everything else; 401 is
/// the only status reported as a rejected credential.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized { service, status });
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        service,
        status,
        body: truncate_body(&body),
    })
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}... (truncated)", &body[..cut]),
        None => body.to_string(),
    }
}

/// Appends percent-encoded path segments to `base`, keeping any path prefix it
/// already carries. `None` when the URL cannot carry a path.
pub(crate) fn extend_path(base: &reqwest::Url, segments: &[&str]) -> Option<reqwest::Url> {
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
    Some(url)
}

/// Bounds an outbound call with a deadline; an elapsed deadline becomes
/// [`ClientError::Timeout`].
///
/// # Errors
/// Returns the call's own error, or a timeout error when `limit` elapses first.
pub async fn within<T, F>(service: &'static str, limit: Duration, call: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(ClientError::Timeout { service, limit }))
}

/// Free-text generation endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Submits `prompt` and returns the response text exactly as produced.
    async fn generate_text(&self, prompt: &str) -> Result<String, ClientError>;
}

/// Catalog search, answered with at most one best match.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Returns the catalog URI of the first match for `track`, if any.
    async fn search_track(
        &self,
        track: &TrackRef,
        credential: &AppToken,
    ) -> Result<Option<String>, ClientError>;
}

/// Fields of a collection about to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionDraft<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
}

/// Collection creation and population on behalf of a user.
#[async_trait]
pub trait CollectionService: Send + Sync {
    async fn create_collection(
        &self,
        owner_id: &str,
        draft: CollectionDraft<'_>,
        credential: &UserToken,
    ) -> Result<Collection, ClientError>;

    async fn append_tracks(
        &self,
        collection_id: &str,
        catalog_uris: &[String],
        credential: &UserToken,
    ) -> Result<(), ClientError>;
}

/// Source of the application-level credential used for catalog searches.
#[async_trait]
pub trait AppCredentialSource: Send + Sync {
    /// Returns a valid token, fetching a new one when none is cached.
    async fn app_token(&self) -> Result<AppToken, ClientError>;

    /// Drops any cached token so the next call fetches a fresh one.
    async fn invalidate(&self);
}
