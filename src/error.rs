// src/error.rs
use serde::Deserialize;

/// Errors returned by the message operations and page navigation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport call failed. The cause is passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body did not have the expected shape.
    #[error("failed to decode {what} response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// `next()` was called on a page without a next-page link.
    #[error("no next page")]
    NoNextPage,

    /// `previous()` was called on a page without a previous-page link.
    #[error("no previous page")]
    NoPreviousPage,

    /// `first()` was called on a page whose metadata has no first-page link.
    #[error("no first page link")]
    NoFirstPage,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a single round trip through a [`Transport`](crate::client::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, TLS, timeout, I/O).
    #[error("{method} {path} failed: {source}")]
    Request {
        method: &'static str,
        path: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// The server answered with a non-2xx status.
    #[error("{path} returned HTTP {status}{}", .api.as_ref().map(|a| format!(": {}", a.message)).unwrap_or_default())]
    Status {
        status: u16,
        path: String,
        api: Option<ApiError>,
    },

    /// Failure reported by a transport other than the bundled HTTP client.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error body the API sends alongside non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<u32>,
    pub message: String,
    #[serde(default)]
    pub more_info: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

impl ApiError {
    /// Decode an error body, returning `None` for anything that is not one.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }
}
