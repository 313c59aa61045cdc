//! Error types for kindgen-sync.

use std::path::PathBuf;

use thiserror::Error;

use kindgen_core::{ManifestError, TemplateName};
use kindgen_expander::RegistryError;

/// All errors that can arise from a generation run.
#[derive(Debug, Error)]
pub enum GenError {
    /// Planning or expanding a template failed.
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// The manifest could not be loaded or is invalid.
    #[error("{0}")]
    Manifest(#[from] ManifestError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (digest cache).
    #[error("digest cache JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The digest cache is unreadable or corrupt and strict mode is on.
    #[error("digest cache at {path} is unusable: {message}")]
    CacheIo { path: PathBuf, message: String },

    /// Two templates would write the same output file.
    #[error("templates '{first}' and '{second}' both write {path}")]
    OutputCollision {
        path: PathBuf,
        first: TemplateName,
        second: TemplateName,
    },

    /// `clean` would delete something it must not.
    #[error("refusing to clean {path}: {reason}")]
    CleanRefused { path: PathBuf, reason: &'static str },

    /// No template with this name is registered.
    #[error("unknown template '{0}'")]
    UnknownTemplate(TemplateName),
}

/// Convenience constructor for [`GenError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GenError {
    GenError::Io {
        path: path.into(),
        source,
    }
}
