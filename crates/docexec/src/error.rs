//! Error types for the docexec directive layer.

use thiserror::Error;

/// Result type for docexec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while turning directive blocks into nodes.
#[derive(Debug, Error)]
pub enum Error {
    /// A directive option is unknown, duplicated or malformed.
    #[error("invalid option '{option}': {message}")]
    InvalidOption {
        /// Option name as written in the document.
        option: String,
        /// What is wrong with it.
        message: String,
    },

    /// No directive with this name is registered.
    #[error("unknown directive: {0}")]
    UnknownDirective(String),

    /// Executing a snippet failed.
    #[error(transparent)]
    Execute(#[from] docexec_core::Error),

    /// Host data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_option(option: &str, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.to_string(),
            message: message.into(),
        }
    }
}
