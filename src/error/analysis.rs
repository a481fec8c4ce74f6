// Analysis error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Analysis error code constants
///
/// Error code range: 3001
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Motion trace too short to analyze
    pub const INSUFFICIENT_SAMPLES: i32 = 3001;
}

/// Log an analysis error
///
/// Logged at warn level: a missing report is an expected outcome for very
/// fast repetitions, not a fault.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    warn!(
        "Analysis error in {}: code={}, component=PerformanceAnalyzer, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors produced by the performance analyzer
///
/// Callers treat these as "no report available", never as a zero-quality
/// report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The motion trace holds fewer samples than the analyzer needs
    InsufficientSamples { required: usize, actual: usize },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InsufficientSamples { .. } => AnalysisErrorCodes::INSUFFICIENT_SAMPLES,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InsufficientSamples { required, actual } => format!(
                "Insufficient motion samples: need {}, got {}",
                required, actual
            ),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnalysisError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for AnalysisError {}
