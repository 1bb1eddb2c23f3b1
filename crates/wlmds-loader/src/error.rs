//! Error types for the WLMDS loader

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Loader errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No candidate source could be discovered
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// Remote fetch failed or returned a non-success status
    #[error("Failed to retrieve '{location}': {message}")]
    Retrieval { location: String, message: String },

    /// Local source path does not exist
    #[error("Local file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Explicitly requested worksheet is absent
    #[error("Worksheet '{requested}' not found. Available: {available:?}")]
    SheetNotFound {
        requested: String,
        available: Vec<String>,
    },

    /// A logical column could not be matched to any known header
    #[error("No column found for {field}. Tried: {tried:?}. Actual: {actual:?}")]
    Schema {
        field: String,
        tried: Vec<String>,
        actual: Vec<String>,
    },

    /// Workbook could not be opened or read
    #[error("Failed to read workbook '{}': {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery(message.into())
    }

    /// Create a retrieval error
    pub fn retrieval(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Retrieval {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a workbook error
    pub fn workbook(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Workbook {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}
