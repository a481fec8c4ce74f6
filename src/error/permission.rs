// Sensor permission error types and constants

use crate::error::ErrorCode;
use std::fmt;

/// Permission error code constants
///
/// Error code range: 5001-5002
pub struct PermissionErrorCodes {}

impl PermissionErrorCodes {
    /// User or platform denied access to the orientation sensor
    pub const DENIED: i32 = 5001;

    /// No orientation sensor is available on this device
    pub const UNAVAILABLE: i32 = 5002;
}

/// Sensor access errors
///
/// Surfaced to the caller as-is; the core never retries a permission
/// request on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    Denied { reason: String },
    Unavailable,
}

impl ErrorCode for PermissionError {
    fn code(&self) -> i32 {
        match self {
            PermissionError::Denied { .. } => PermissionErrorCodes::DENIED,
            PermissionError::Unavailable => PermissionErrorCodes::UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            PermissionError::Denied { reason } => {
                format!("Sensor permission denied: {}", reason)
            }
            PermissionError::Unavailable => "Orientation sensor unavailable".to_string(),
        }
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PermissionError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PermissionError {}
