//! Error type shared by the library modules.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    /// A required source file is absent.
    #[error("source not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// An optional external tool is missing or failed; callers fall back.
    #[error("{tool} unavailable: {reason}")]
    UnsupportedEnvironment { tool: &'static str, reason: String },

    /// A file on disk is not a byte-valid PNG.
    #[error("malformed PNG {}: {reason}", path.display())]
    MalformedOutput { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssetError>;
