//! Error types for coupon-scout
//!
//! Per-source fetch failures are absorbed by the source lifecycle wrapper and
//! never surface as run-level errors; the only error class allowed to abort a
//! scrape run is [`Error::Config`], which is detected before any dispatch.

use thiserror::Error;

/// Result type alias for coupon-scout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for coupon-scout
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_pages")
        key: Option<String>,
    },

    /// Network or transport-level error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP request completed with a non-success status
    #[error("HTTP {status} from {url}")]
    Http {
        /// The URL that was requested
        url: String,
        /// The status code the server returned
        status: u16,
    },

    /// Invalid or unparseable URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Failed to extract expected content from a scraped page
    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Construct a configuration error for a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
