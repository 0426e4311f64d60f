//! Error types for the editor core.

use thiserror::Error;

/// Errors surfaced while building or configuring an editor.
///
/// Ordinary editing never fails: commands that cannot apply report `false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditorError {
    /// A command needs an extension that the configuration turned off.
    #[error("extension `{0}` is not enabled")]
    MissingExtension(&'static str),

    #[error("heading level {0} is not enabled")]
    InvalidHeadingLevel(u8),

    #[error("invalid editor configuration: {0}")]
    InvalidConfig(String),

    /// Host failure while mounting (no container, detached node, ...).
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Error type for platform operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Why a file could not be turned into an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("file `{0}` is not an image")]
    NotAnImage(String),

    #[error("failed to read `{name}`: {reason}")]
    Read { name: String, reason: String },
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
