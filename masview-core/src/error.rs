//! Error types for masview-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the masview-core library
///
/// Timeline reconstruction itself never fails; these variants only come
/// from loading reports, configuration, discovery and logging setup.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Report discovery error
    #[error("discovery error in {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    /// Logging setup error
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type alias for masview-core
pub type Result<T> = std::result::Result<T, Error>;
