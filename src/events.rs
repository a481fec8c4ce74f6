//! Events published by the session controller for the presentation layer.
//!
//! Each event carries what the UI needs to render progress, counters and
//! the analysis card without re-deriving anything from the sample stream.

use serde::Serialize;

use crate::analysis::{AnalysisReport, Phase, Tip};
use crate::calibration::Baseline;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TrainingEvent {
    /// Every processed training sample
    Progress {
        raw_angle: f64,
        progress: f64,
        /// `progress` rounded to a whole percentage
        percentage: u8,
        phase: Phase,
        timestamp_ms: u64,
    },
    Peak {
        timestamp_ms: u64,
    },
    RepComplete {
        count: u32,
        total: u32,
    },
    SessionComplete {
        reps: u32,
    },
    CalibrationDone {
        baseline: Baseline,
    },
    CalibrationFailed {
        reason: String,
        code: i32,
    },
    /// Quality report for the final repetition
    AnalysisReady {
        rep: u32,
        report: AnalysisReport,
        tips: Vec<Tip>,
    },
    /// The final repetition was too short to analyze
    AnalysisUnavailable {
        reason: String,
    },
}

impl TrainingEvent {
    pub fn progress(
        raw_angle: f64,
        progress: f64,
        phase: Phase,
        timestamp_ms: u64,
    ) -> TrainingEvent {
        TrainingEvent::Progress {
            raw_angle,
            progress,
            percentage: (progress.clamp(0.0, 1.0) * 100.0).round() as u8,
            phase,
            timestamp_ms,
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            TrainingEvent::Progress { .. } => "progress",
            TrainingEvent::Peak { .. } => "peak",
            TrainingEvent::RepComplete { .. } => "rep_complete",
            TrainingEvent::SessionComplete { .. } => "session_complete",
            TrainingEvent::CalibrationDone { .. } => "calibration_done",
            TrainingEvent::CalibrationFailed { .. } => "calibration_failed",
            TrainingEvent::AnalysisReady { .. } => "analysis_ready",
            TrainingEvent::AnalysisUnavailable { .. } => "analysis_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        match TrainingEvent::progress(75.0, 0.504, Phase::Down, 10) {
            TrainingEvent::Progress { percentage, .. } => assert_eq!(percentage, 50),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let json = serde_json::to_value(TrainingEvent::RepComplete { count: 2, total: 3 }).unwrap();
        assert_eq!(json["type"], "rep_complete");
        assert_eq!(json["payload"]["count"], 2);

        let json = serde_json::to_value(TrainingEvent::CalibrationDone {
            baseline: Baseline::fixed(12.5).unwrap(),
        })
        .unwrap();
        assert_eq!(json["payload"]["baseline"]["angle"], 12.5);
    }
}
