// Session state - lifecycle phase and everything guarded by the session lock

use std::time::Instant;

use serde::Serialize;

use crate::analysis::{
    AnalysisReport, MotionRecorder, Normalizer, PerformanceAnalyzer, ProgressSample,
    RepetitionStateMachine,
};
use crate::calibration::{Baseline, BaselineCalibrator};
use crate::config::AppConfig;
use crate::error::{CalibrationError, ConfigError};

/// Lifecycle phase of a training session
///
/// `Idle -> Calibrating -> Ready -> Training -> Complete`; `reset` returns to
/// `Idle` from anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Calibrating,
    Ready,
    Training,
    Complete,
}

/// Analysis of one accepted repetition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepReport {
    /// 1-based repetition number
    pub rep: u32,
    /// `None` when the repetition had too few recorded samples
    pub report: Option<AnalysisReport>,
}

/// What the controller did with one sample
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    /// Not consumed in the current phase (or not a finite angle)
    Ignored,
    /// Calibration window still open
    Collected { accepted: usize, rejected: usize },
    /// Calibration window closed with a baseline; session is `Ready`
    Calibrated(Baseline),
    /// Calibration window closed without a baseline; session is `Idle`
    CalibrationFailed(CalibrationError),
    /// Training sample ran through the pipeline
    Processed { sample: ProgressSample, count: u32 },
}

/// In-flight calibration
pub(crate) struct CalibrationRun {
    pub calibrator: BaselineCalibrator,
    pub started_at: Instant,
}

/// Mutable session data, only touched under the controller's mutex
pub(crate) struct SessionState {
    /// Validated configuration the session was created with
    pub base_config: AppConfig,
    /// Effective configuration; a preset overrides range and axis
    pub config: AppConfig,
    pub phase: SessionPhase,
    pub baseline: Option<Baseline>,
    pub calibration: Option<CalibrationRun>,
    pub normalizer: Normalizer,
    pub machine: RepetitionStateMachine,
    pub recorder: MotionRecorder,
    pub analyzer: PerformanceAnalyzer,
    pub rep_reports: Vec<RepReport>,
    /// Report of the final repetition, set on completion
    pub report: Option<AnalysisReport>,
}

impl SessionState {
    /// `config` must already be validated
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let normalizer = Normalizer::from_config(&config.training, &config.normalizer)?;
        let analyzer =
            PerformanceAnalyzer::new(config.analysis.clone(), config.training.angle_range)?;
        Ok(Self {
            machine: RepetitionStateMachine::new(&config.training),
            recorder: MotionRecorder::new(&config.recorder),
            base_config: config.clone(),
            config,
            phase: SessionPhase::Idle,
            baseline: None,
            calibration: None,
            normalizer,
            analyzer,
            rep_reports: Vec::new(),
            report: None,
        })
    }

    /// Swap the angle range used by normalization and range analysis
    pub fn set_angle_range(&mut self, angle_range: f64) -> Result<(), ConfigError> {
        let normalizer = Normalizer::new(angle_range, &self.config.normalizer)?;
        let analyzer = PerformanceAnalyzer::new(self.config.analysis.clone(), angle_range)?;
        self.normalizer = normalizer;
        self.analyzer = analyzer;
        self.config.training.angle_range = angle_range;
        Ok(())
    }

    /// Drop any preset override: range and axis go back to the configured ones
    pub fn restore_configured(&mut self) -> Result<(), ConfigError> {
        let angle_range = self.base_config.training.angle_range;
        self.set_angle_range(angle_range)?;
        self.config.sensor.axis = self.base_config.sensor.axis;
        Ok(())
    }

    /// Forget counter, phase, trace and reports; baseline is kept
    pub fn clear_training(&mut self) {
        self.machine.reset();
        self.recorder.clear();
        self.rep_reports.clear();
        self.report = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Phase;

    #[test]
    fn test_new_state_is_idle() {
        let state = SessionState::new(AppConfig::default()).unwrap();
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(state.baseline.is_none());
        assert_eq!(state.normalizer.angle_range(), 120.0);
    }

    #[test]
    fn test_set_angle_range_rejects_invalid() {
        let mut state = SessionState::new(AppConfig::default()).unwrap();
        assert!(state.set_angle_range(0.0).is_err());
        assert_eq!(state.config.training.angle_range, 120.0);

        state.set_angle_range(90.0).unwrap();
        assert_eq!(state.analyzer.angle_range(), 90.0);
        assert_eq!(state.config.training.angle_range, 90.0);
    }

    #[test]
    fn test_restore_configured_undoes_override() {
        let mut config = AppConfig::default();
        config.training.angle_range = 90.0;
        let mut state = SessionState::new(config).unwrap();
        state.set_angle_range(120.0).unwrap();
        state.config.sensor.axis = crate::sensor::SensorAxis::Beta;

        state.restore_configured().unwrap();
        assert_eq!(state.normalizer.angle_range(), 90.0);
        assert_eq!(state.analyzer.angle_range(), 90.0);
        assert_eq!(state.config, state.base_config);
    }

    #[test]
    fn test_clear_training_keeps_baseline() {
        let mut state = SessionState::new(AppConfig::default()).unwrap();
        state.baseline = Baseline::fixed(10.0);
        state.machine.process(1.0, 0);
        state.clear_training();
        assert_eq!(state.machine.phase(), Phase::Down);
        assert!(state.baseline.is_some());
    }
}
