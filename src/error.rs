// src/error.rs

//! Unified error handling for the flash feed.

use std::fmt;

use thiserror::Error;

/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client failure outside the content source boundary
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request parameters rejected before any fetch
    #[error("{0}")]
    Validation(String),

    /// Segment out of range or unknown slug
    #[error("{0}")]
    NotFound(String),

    /// Content source unreachable or answered with a non-2xx status
    #[error("Content source error{}: {message}", fmt_status(.status))]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// CDN purge request failed
    #[error("Cache purge failed{}: {message}", fmt_status(.status))]
    Purge {
        status: Option<u16>,
        message: String,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an upstream error with an optional HTTP status.
    pub fn upstream(status: Option<u16>, message: impl fmt::Display) -> Self {
        Self::Upstream {
            status,
            message: message.to_string(),
        }
    }

    /// Create a purge error with an optional HTTP status.
    pub fn purge(status: Option<u16>, message: impl fmt::Display) -> Self {
        Self::Purge {
            status,
            message: message.to_string(),
        }
    }

    /// HTTP status class this error surfaces as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Whether a caller may reasonably retry the same request later.
    ///
    /// Content-source and CDN purge failures qualify; validation and
    /// not-found results are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Purge { .. })
    }
}
