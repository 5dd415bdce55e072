//! Error types for castdepth.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for castdepth core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The mesh file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The file extension does not name a supported mesh format.
    #[error("unsupported mesh format: '{0}'")]
    UnsupportedFormat(String),

    /// The file could not be parsed as the format its extension claims.
    #[error("invalid mesh content in {}: {message}", path.display())]
    InvalidContent { path: PathBuf, message: String },

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfBounds {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create an `InvalidContent` error for the given file.
    pub fn invalid_content(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A specialized Result type for castdepth core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
