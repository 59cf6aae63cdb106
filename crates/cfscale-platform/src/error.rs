//! Platform client error types.

use http::StatusCode;
use thiserror::Error;

/// Result type alias for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors talking to the platform API.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    #[error("unsupported API url scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("API token contains characters not allowed in a header")]
    InvalidToken,

    #[error("failed to build request for {url}: {source}")]
    Request { url: String, source: http::Error },

    #[error("connecting to {url} failed: {source}")]
    Connect { url: String, source: std::io::Error },

    #[error("TLS configuration failed: {0}")]
    TlsConfig(rustls::Error),

    #[error("TLS handshake with {url} failed: {source}")]
    Tls { url: String, source: std::io::Error },

    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: hyper::Error },

    #[error("reading response from {url} failed: {source}")]
    Body { url: String, source: hyper::Error },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: http::Method,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("get app {app_id} {what}: {source}")]
    App {
        app_id: String,
        what: &'static str,
        source: Box<PlatformError>,
    },
}

impl PlatformError {
    pub(crate) fn for_app(self, app_id: &str, what: &'static str) -> Self {
        PlatformError::App {
            app_id: app_id.to_string(),
            what,
            source: Box::new(self),
        }
    }
}
