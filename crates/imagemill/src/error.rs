//! Error types for the imagemill derivative pipeline.
//!
//! Errors are organized by stage: upload rejection (the caller's fault,
//! reported before anything is written), pipeline failures (transform or
//! I/O trouble mid-invocation), and configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for imagemill operations.
#[derive(Error, Debug)]
pub enum ImagemillError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

/// Why an upload was refused before any transform ran.
///
/// These are synchronous, caller's-fault rejections; the pipeline never
/// retries them and never writes a file for a rejected upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// Declared MIME type is not on the raster allow-list
    #[error("Unsupported format: {mime}")]
    UnsupportedFormat { mime: String },

    /// Declared size exceeds the policy ceiling
    #[error("Upload too large: {len} bytes > {max} bytes")]
    TooLarge { len: u64, max: u64 },

    /// The bytes do not decode as an image
    #[error("Not a decodable image: {message}")]
    Undecodable { message: String },
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Upload refused by validation
    #[error("Upload rejected: {0}")]
    Rejected(#[from] RejectionReason),

    /// A variant transform failed (encoder/decoder trouble)
    #[error("Transform failed for variant {variant}: {message}")]
    Transform { variant: String, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// Decoded image exceeds the dimension limit
    #[error("Image too large: {width}x{height} > {max_dim}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Writing a variant file failed
    #[error("Write failed for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The intake temp file could not be read
    #[error("Cannot read upload {path}: {source}")]
    TempFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Internal task failure (join error on a worker)
    #[error("Worker task failed: {0}")]
    Task(String),
}

/// Errors from building delivery descriptors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Only committed assets have a complete variant set to describe
    #[error("Asset {id} is not committed (status: {status})")]
    NotCommitted { id: String, status: String },

    /// The asset lacks a variant the descriptor needs
    #[error("Asset {id} has no {variant} variant")]
    MissingVariant { id: String, variant: String },
}

/// Convenience type alias for imagemill results.
pub type Result<T> = std::result::Result<T, ImagemillError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
