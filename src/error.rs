//! Error types for radar-ingest.
//!
//! Engine-level operations return these typed errors; the CLI and TUI layers
//! wrap them with `anyhow` context.

use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the ingest service.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be sent or the connection dropped.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid URL {0}")]
    InvalidUrl(String),
}

/// Failure of the primary ingest request/response sequence.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The ingest response body was not JSON.
    #[error("ingest response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure of the audit-log fetch.
#[derive(Error, Debug)]
#[error("audit log fetch failed: {0}")]
pub struct AuditError(#[from] pub TransportError);

/// Failure handing a download route to a navigator.
#[derive(Error, Debug)]
pub enum NavigationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to write download to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration loading or validation failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),

    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}
