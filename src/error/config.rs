// Configuration error types and constants

use crate::error::ErrorCode;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 4001-4002
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// A field is outside its valid range
    pub const INVALID_RANGE: i32 = 4001;

    /// The configuration document could not be parsed
    pub const PARSE: i32 = 4002;
}

/// Configuration errors
///
/// These are fatal at construction time: a session refuses to start with an
/// invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field violates its range or an inter-field invariant
    InvalidRange { field: String, reason: String },

    /// JSON document could not be deserialized
    Parse { reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidRange {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidRange { .. } => ConfigErrorCodes::INVALID_RANGE,
            ConfigError::Parse { .. } => ConfigErrorCodes::PARSE,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidRange { field, reason } => {
                format!("Invalid configuration for {}: {}", field, reason)
            }
            ConfigError::Parse { reason } => format!("Failed to parse configuration: {}", reason),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for ConfigError {}
