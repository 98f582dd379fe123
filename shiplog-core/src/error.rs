//! Error types for shiplog core.

use std::path::PathBuf;
use std::{error::Error, fmt, io};

/// Error type for shiplog core operations.
#[derive(Debug)]
pub enum ShipLogError {
    /// An underlying I/O error.
    Io(io::Error),
    /// A JSON document could not be parsed or serialized.
    Json(serde_json::Error),
    /// A required input document does not exist.
    MissingInput(PathBuf),
    /// The site catalog is invalid.
    Config(String),
    /// Site generation failed; nothing was published.
    Generation(String),
    /// Committing or pushing generated output failed.
    Publish(String),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for ShipLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::MissingInput(path) => write!(f, "input not found: {}", path.display()),
            Self::Config(message) => write!(f, "invalid catalog: {message}"),
            Self::Generation(message) => write!(f, "generation failed: {message}"),
            Self::Publish(message) => write!(f, "publish failed: {message}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ShipLogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ShipLogError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ShipLogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Convenience result type for shiplog core.
pub type Result<T> = std::result::Result<T, ShipLogError>;
