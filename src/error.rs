use std::path::PathBuf;
use thiserror::Error;

/// Scrub's custom error types for better error handling and user experience.
#[derive(Debug, Error)]
pub enum ScrubError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {message}")]
    Archive { message: String },

    #[error("image codec error: {message}")]
    Image { message: String },

    #[error("PDF error: {message}")]
    Pdf { message: String },

    #[error("OOXML package error: {message}")]
    Office { message: String },

    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("output write failed: {message}")]
    OutputWrite { message: String },
}

pub type Result<T> = std::result::Result<T, ScrubError>;

impl ScrubError {
    pub fn archive<S: Into<String>>(message: S) -> Self {
        Self::Archive { message: message.into() }
    }

    pub fn image<S: Into<String>>(message: S) -> Self {
        Self::Image { message: message.into() }
    }

    pub fn pdf<S: Into<String>>(message: S) -> Self {
        Self::Pdf { message: message.into() }
    }

    pub fn office<S: Into<String>>(message: S) -> Self {
        Self::Office { message: message.into() }
    }

    pub fn path_not_found<P: Into<PathBuf>>(path: P) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn output_write<S: Into<String>>(message: S) -> Self {
        Self::OutputWrite { message: message.into() }
    }

    /// Returns true if the error is local to one input and the batch can continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Image { .. }
                | Self::Pdf { .. }
                | Self::Office { .. }
                | Self::Archive { .. }
                | Self::PathNotFound { .. }
        )
    }
}
