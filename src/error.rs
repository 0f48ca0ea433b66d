//! Error types for the exporter.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("resource not available: {0}")]
    NotAvailable(String),

    #[error("response failed validation: {0}")]
    Validation(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Classify this error for retry/backoff and metric-label purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::RateLimited { .. } => ErrorCategory::RateLimit,
            Error::Upstream { status, .. } if (400..500).contains(status) => {
                ErrorCategory::ClientError
            }
            Error::Upstream { status, .. } if *status >= 500 => ErrorCategory::ServerError,
            Error::NotAvailable(_) => ErrorCategory::NotAvailable,
            Error::Timeout(_) => ErrorCategory::Timeout,
            Error::Transport(e) if e.is_timeout() => ErrorCategory::Timeout,
            Error::Transport(_) => ErrorCategory::ServerError,
            Error::Decode(_) | Error::Validation(_) => ErrorCategory::Validation,
            Error::Config(_) | Error::Server(_) | Error::Unknown(_) | Error::Upstream { .. } => {
                ErrorCategory::Unknown
            }
        }
    }

    /// Whether a retry is ever worth attempting for this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::ServerError | ErrorCategory::Timeout
        )
    }
}

/// Coarse classification of a failed request, used to pick a retry/backoff
/// policy and as the `category` label on error-counting metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    RateLimit,
    ClientError,
    NotAvailable,
    ServerError,
    Timeout,
    Validation,
    Unknown,
}

impl ErrorCategory {
    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::ClientError => "client_error",
            ErrorCategory::NotAvailable => "not_available",
            ErrorCategory::ServerError => "server_error",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_retryable() {
        let e = Error::RateLimited { retry_after: None };
        assert_eq!(e.category(), ErrorCategory::RateLimit);
        assert!(e.is_retryable());
    }

    #[test]
    fn client_error_is_not_retryable() {
        let e = Error::Upstream { status: 403, message: "forbidden".into() };
        assert_eq!(e.category(), ErrorCategory::ClientError);
        assert!(!e.is_retryable());
    }

    #[test]
    fn raw_404_on_a_required_endpoint_is_a_client_error() {
        // Only endpoints flagged `EndpointId::optional()` get translated to
        // `Error::NotAvailable` by the client (spec.md 4.1); a bare
        // `Error::Upstream{status: 404}` reaching here means a required
        // endpoint 404'd, which is "other 4xx" -> client_error, no retry.
        let e = Error::Upstream { status: 404, message: "no such sensor".into() };
        assert_eq!(e.category(), ErrorCategory::ClientError);
        assert!(!e.is_retryable());
    }

    #[test]
    fn not_available_variant_maps_to_not_available_category() {
        let e = Error::NotAvailable("sensor readings disabled for this org".into());
        assert_eq!(e.category(), ErrorCategory::NotAvailable);
        assert!(!e.is_retryable());
    }

    #[test]
    fn server_error_is_retryable() {
        let e = Error::Upstream { status: 503, message: "unavailable".into() };
        assert_eq!(e.category(), ErrorCategory::ServerError);
        assert!(e.is_retryable());
    }
}
