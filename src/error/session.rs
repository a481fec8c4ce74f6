// Session lifecycle error types and constants

use crate::error::{CalibrationError, ConfigError, ErrorCode, PermissionError};
use crate::session::SessionPhase;
use log::error;
use std::fmt;

/// Session error code constants
///
/// Error code range: 6001-6003. Wrapped errors report the code of the
/// inner error.
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// Operation not allowed in the current lifecycle phase
    pub const INVALID_STATE: i32 = 6001;

    /// Training requested before a baseline was committed
    pub const MISSING_BASELINE: i32 = 6002;

    /// Session state mutex was poisoned
    pub const STATE_POISONED: i32 = 6003;
}

/// Log a session error with structured context
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=SessionController, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors returned by the session controller
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// `operation` is not valid while the session is in `phase`
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },

    /// `start_training` without a committed baseline
    MissingBaseline,

    /// Session state lock was poisoned by a panicking holder
    StatePoisoned,

    Config(ConfigError),
    Permission(PermissionError),
    Calibration(CalibrationError),
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::InvalidState { .. } => SessionErrorCodes::INVALID_STATE,
            SessionError::MissingBaseline => SessionErrorCodes::MISSING_BASELINE,
            SessionError::StatePoisoned => SessionErrorCodes::STATE_POISONED,
            SessionError::Config(err) => err.code(),
            SessionError::Permission(err) => err.code(),
            SessionError::Calibration(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::InvalidState { operation, phase } => {
                format!("Cannot {} while session is {:?}", operation, phase)
            }
            SessionError::MissingBaseline => {
                "No baseline available. Calibrate or choose a preset first.".to_string()
            }
            SessionError::StatePoisoned => "Session state lock poisoned".to_string(),
            SessionError::Config(err) => err.message(),
            SessionError::Permission(err) => err.message(),
            SessionError::Calibration(err) => err.message(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Config(err) => Some(err),
            SessionError::Permission(err) => Some(err),
            SessionError::Calibration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err)
    }
}

impl From<PermissionError> for SessionError {
    fn from(err: PermissionError) -> Self {
        SessionError::Permission(err)
    }
}

impl From<CalibrationError> for SessionError {
    fn from(err: CalibrationError) -> Self {
        SessionError::Calibration(err)
    }
}
