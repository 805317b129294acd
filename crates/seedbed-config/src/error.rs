use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while resolving the configuration snapshot.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Missing {
        /// Location that was read.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The file was read but is not a JSON document.
    #[error("configuration '{path}' is not valid JSON: {source}")]
    Malformed {
        /// Location that was read.
        path: Utf8PathBuf,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
    /// A required key is absent.
    #[error("configuration key '{key}' is required")]
    MissingKey {
        /// Dotted path of the key.
        key: String,
    },
    /// A key is present but its value cannot be used.
    #[error("configuration key '{key}' is invalid: {reason}")]
    InvalidKey {
        /// Dotted path of the key.
        key: String,
        /// Description of the problem.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    pub(crate) fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when the source itself could not be read, as opposed to
    /// being readable but incomplete or malformed.
    #[must_use]
    pub fn is_missing_source(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}
