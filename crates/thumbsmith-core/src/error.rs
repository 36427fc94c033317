//! Error types for the Thumbsmith pipeline.
//!
//! The taxonomy separates recoverable per-item failures (one bad URL, one
//! undecodable image) from fatal setup failures. Per-item errors are handled
//! inside the worker that hit them and never cross the worker boundary; only
//! setup errors (directories, HTTP client, worker pools) reach the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Thumbsmith operations.
#[derive(Error, Debug)]
pub enum ThumbsmithError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Fetcher construction errors (per-source fetch failures stay inside the stage)
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Per-source fetch failures.
///
/// Always recoverable: the fetch stage logs the error, counts it, and moves
/// on to the next descriptor. A timeout surfaces here as `Request`.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP request itself failed (connect, timeout, TLS, body read)
    #[error("Request failed for {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The body could not be staged on local storage
    #[error("Cannot stage {url} at {path}: {source}")]
    Stage {
        url: String,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Artifact could not be decoded (recoverable; the artifact is skipped)
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// A variant could not be produced or persisted (recoverable; the
    /// artifact is skipped and its partial variants removed)
    #[error("Resize error for {path} at width {width}: {message}")]
    Resize {
        path: PathBuf,
        width: u32,
        message: String,
    },

    /// A required directory could not be created (fatal at setup)
    #[error("Storage error for {path}: {source}")]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A worker task panicked or was cancelled (fatal)
    #[error("{stage} worker failed: {message}")]
    Worker {
        stage: &'static str,
        message: String,
    },
}

/// Convenience type alias for Thumbsmith results.
pub type Result<T> = std::result::Result<T, ThumbsmithError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
