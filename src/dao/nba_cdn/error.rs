//! Error types raised by the NBA CDN client.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::feed::FeedError;

/// Convenient result alias returning [`NbaCdnError`] failures.
pub type NbaCdnResult<T> = Result<T, NbaCdnError>;

/// Failures that can occur while talking to the CDN.
#[derive(Debug, Error)]
pub enum NbaCdnError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build NBA CDN client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or timed out.
    #[error("failed to send NBA CDN request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The CDN answered with an unexpected status code.
    #[error("unexpected NBA CDN response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode NBA CDN response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The document parsed but lacks the expected structure.
    #[error("NBA CDN document `{path}` has no `{field}`")]
    MissingField { path: String, field: &'static str },
}

impl From<NbaCdnError> for FeedError {
    fn from(err: NbaCdnError) -> Self {
        match err {
            NbaCdnError::RequestSend { ref source, .. } if source.is_timeout() => FeedError::Timeout,
            // The CDN answers 403 rather than 404 for documents that do not exist yet.
            NbaCdnError::RequestStatus { path, status }
                if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN =>
            {
                FeedError::NotFound(path)
            }
            other => FeedError::unavailable(other.to_string(), other),
        }
    }
}
