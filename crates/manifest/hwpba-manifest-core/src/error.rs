//! Error type for manifest parsing, validation and asset lookup.

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ManifestError {
    /// The manifest text is not valid JSON or does not match the schema.
    #[error("manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The manifest parsed but breaks a structural rule.
    #[error("invalid manifest: {reason}")]
    Invalid { reason: String },

    /// A clip name was requested that the manifest does not contain.
    #[error("clip not found: {name}")]
    ClipNotFound { name: String },

    /// No library entry or local script file matched the requested asset name.
    #[error("asset '{name}' not found in {searched}")]
    AssetNotFound { name: String, searched: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ManifestError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}
