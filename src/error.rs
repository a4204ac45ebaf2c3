//! Error types for imgprobe
//!
//! Two layers of errors live here:
//! - [`Error`], the crate-level error that aborts a run (bad configuration,
//!   a broken report stream, I/O outside of a single target)
//! - [`FetchError`], the per-target download failure that is recorded in the
//!   report and never aborts the run
//!
//! Save failures are recorded as [`SaveFailure`](crate::types::SaveFailure)
//! values because they carry directory diagnostics alongside the message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for imgprobe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code used when every target was saved
pub const EXIT_OK: i32 = 0;
/// Exit code used when at least one target failed
pub const EXIT_TARGET_FAILED: i32 = 1;
/// Exit code used for configuration, CLI or output errors
pub const EXIT_USAGE: i32 = 2;

/// Main error type for imgprobe
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction or transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rendering the report failed
    #[error("report error: {0}")]
    Report(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Report(_) => "report_error",
        }
    }

    /// Process exit code for this error
    ///
    /// Every crate-level error aborts the run before a complete report could
    /// be produced, so they all map to [`EXIT_USAGE`].
    pub fn exit_code(&self) -> i32 {
        EXIT_USAGE
    }
}

/// Why a download failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Remote fetching is switched off in the configuration
    Disabled,
    /// The URL could not be parsed or uses an unsupported scheme
    InvalidUrl,
    /// The connection could not be established
    Connect,
    /// The request or the run-wide time budget expired
    Timeout,
    /// The server answered with a non-success status code
    Status(u16),
    /// The response body could not be read
    Body,
    /// The response body exceeded the configured size limit
    TooLarge,
    /// Any other request failure
    Request,
}

/// A failed download, as recorded in the report
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct FetchError {
    /// Failure classification
    pub kind: FetchErrorKind,
    /// Human-readable failure text (never empty)
    pub message: String,
}

impl FetchError {
    /// Create a new fetch error
    ///
    /// An empty message is replaced with a generic one so the report always
    /// has something to show.
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "unknown error".to_string();
        }
        Self { kind, message }
    }

    /// Classify a reqwest error for the given URL
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(
                FetchErrorKind::Timeout,
                format!("timeout fetching '{}': {}", url, err),
            )
        } else if err.is_connect() {
            Self::new(
                FetchErrorKind::Connect,
                format!("connection failed for '{}': {}", url, err),
            )
        } else if err.is_body() || err.is_decode() {
            Self::new(
                FetchErrorKind::Body,
                format!("failed to read response body from '{}': {}", url, err),
            )
        } else if let Some(status) = err.status() {
            Self::new(
                FetchErrorKind::Status(status.as_u16()),
                format!("HTTP error {} for '{}'", status, url),
            )
        } else {
            Self::new(
                FetchErrorKind::Request,
                format!("failed to fetch '{}': {}", url, err),
            )
        }
    }
}
