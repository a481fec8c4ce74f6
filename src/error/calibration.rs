// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Error code range: 2001
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// Too few valid samples survived the calibration window
    pub const INSUFFICIENT_DATA: i32 = 2001;
}

/// Log a calibration error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=BaselineCalibrator, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// A failed calibration never produces a baseline, so callers cannot end up
/// holding a NaN or otherwise garbage reference angle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    /// Fewer than `required` samples survived outlier filtering
    InsufficientData {
        required: usize,
        collected: usize,
        rejected: usize,
    },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::InsufficientData { .. } => CalibrationErrorCodes::INSUFFICIENT_DATA,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::InsufficientData {
                required,
                collected,
                rejected,
            } => format!(
                "Insufficient calibration data: need {}, got {} ({} rejected). Hold the device still and retry.",
                required, collected, rejected
            ),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_code_and_message() {
        let err = CalibrationError::InsufficientData {
            required: 10,
            collected: 3,
            rejected: 2,
        };
        assert_eq!(err.code(), CalibrationErrorCodes::INSUFFICIENT_DATA);
        assert!(err.message().contains("need 10, got 3"));
        assert!(err.message().contains("2 rejected"));
    }

    #[test]
    fn test_calibration_error_display() {
        let err = CalibrationError::InsufficientData {
            required: 1,
            collected: 0,
            rejected: 0,
        };
        let display = format!("{}", err);
        assert!(display.contains("CalibrationError"));
        assert!(display.contains("2001"));
    }
}
