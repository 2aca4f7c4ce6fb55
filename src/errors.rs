// ABOUTME: Error types for the present-tex renderer
// ABOUTME: Separates image failures from walk failures so callers can report the offending path

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TexError {
    #[error("error opening image file [{}]: {source}", path.display())]
    ImageOpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error decoding image file [{}]: {source}", path.display())]
    ImageDecodeFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not render document: {0}")]
    MarkdownWalkFailed(#[source] Box<TexError>),

    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl TexError {
    /// Path of the image that caused the failure, looking through walk wrappers.
    pub fn image_path(&self) -> Option<&std::path::Path> {
        match self {
            TexError::ImageOpenFailed { path, .. } | TexError::ImageDecodeFailed { path, .. } => {
                Some(path)
            }
            TexError::MarkdownWalkFailed(inner) => inner.image_path(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TexError>;
