//! Error types for threadwatch operations.
//!
//! This module defines the main error type [`ThreadwatchError`] which covers
//! everything that can go wrong while polling a thread: fetching pages,
//! parsing markup, reading configuration, persisting the seen-message store
//! and delivering notifications.
//!
//! # Example
//!
//! ```rust
//! use threadwatch_core::{Result, ThreadwatchError};
//!
//! fn first_page(html: &str) -> Result<&str> {
//!     if html.is_empty() {
//!         return Err(ThreadwatchError::HtmlParseError("empty page".to_string()));
//!     }
//!     Ok(html)
//! }
//! ```

use thiserror::Error;

/// Main error type for thread monitoring operations.
///
/// Most variants are per-thread failures: the monitor records them against
/// the thread being processed and moves on to the next one.
#[derive(Error, Debug)]
pub enum ThreadwatchError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other transport problems.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a thread URL or a redirect target cannot be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with a non-success status after redirects were handled.
    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// The out-of-range page probe was not redirected, so the last page is unknown.
    #[error("Could not determine the last page of {url}")]
    LastPageUnresolved { url: String },

    /// HTML parsing errors.
    ///
    /// Returned for invalid CSS selectors in a site layout.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// Thread list configuration errors.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Seen-message store I/O errors.
    #[error("Seen-message store error: {0}")]
    StoreError(#[from] std::io::Error),

    /// A notification channel rejected a delivery.
    #[error("Notification failed: {0}")]
    NotifyError(String),
}

/// Result type alias for ThreadwatchError.
///
/// This is a convenience alias for `std::result::Result<T, ThreadwatchError>`.
pub type Result<T> = std::result::Result<T, ThreadwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ThreadwatchError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_http_status_error() {
        let err = ThreadwatchError::HttpStatus { url: "https://forum.example/threads/a.1/page-2".to_string(), status: 503 };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("page-2"));
    }

    #[test]
    fn test_last_page_unresolved() {
        let err = ThreadwatchError::LastPageUnresolved { url: "https://forum.example/threads/a.1".to_string() };
        assert!(err.to_string().contains("last page"));
    }

    #[test]
    fn test_timeout_error() {
        let err = ThreadwatchError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
