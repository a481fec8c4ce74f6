//! Signal-to-repetition pipeline stages.
//!
//! Raw angle -> [`normalizer`] -> [`repetition`] state machine, with every
//! processed sample appended by the [`recorder`] and each completed
//! repetition scored by the [`performance`] analyzer.

pub mod normalizer;
pub mod performance;
pub mod recorder;
pub mod repetition;

pub use normalizer::{normalize, Normalizer};
pub use performance::{generate_tips, AnalysisReport, PerformanceAnalyzer, Tip};
pub use recorder::{MotionRecorder, MotionTrace, ProgressSample};
pub use repetition::{Phase, RepetitionEvent, RepetitionStateMachine};

#[cfg(test)]
mod tests;
