// Error types for the curl trainer core
//
// This module defines custom error types for calibration, analysis,
// configuration, sensor permission and session lifecycle operations,
// providing structured error handling with numeric codes that a
// presentation layer can map to user-facing messages.

mod analysis;
mod calibration;
mod config;
mod permission;
mod session;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use config::{ConfigError, ConfigErrorCodes};
pub use permission::{PermissionError, PermissionErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the boundary to the presentation layer.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
