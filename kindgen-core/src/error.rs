//! Error types for kindgen-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::TemplateName;

/// All errors that can arise from loading or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file did not exist at the expected path.
    #[error("manifest not found at {path}")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure, with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A structurally valid manifest with an unusable template declaration.
    #[error("invalid declaration for template '{template}': {message}")]
    InvalidTemplate {
        template: TemplateName,
        message: String,
    },

    /// A manifest-level setting that cannot be honoured.
    #[error("invalid manifest: {0}")]
    Invalid(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn invalid_template(template: &TemplateName, message: impl Into<String>) -> ManifestError {
    ManifestError::InvalidTemplate {
        template: template.clone(),
        message: message.into(),
    }
}
