//! Configuration errors.

use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Structured errors emitted while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable contained an invalid value.
    #[error("invalid value for '{field}': {message}")]
    InvalidField {
        /// Environment variable name.
        field: &'static str,
        /// Offending raw value.
        value: String,
        /// Human-readable error description.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, value: &str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
            message: message.into(),
        }
    }
}
