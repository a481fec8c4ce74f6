// SessionController: explicit training session object
//
// Owns calibration, the signal pipeline (normalize -> record -> state
// machine -> analysis) and the lifecycle. Every mutation happens under one
// mutex, so overlapping sample callbacks are processed one after another,
// and events are published while the lock is held so subscribers see them
// in processing order.

pub mod runner;
pub mod state;

pub use runner::{run_sample_loop, sample_channel, SampleFeed, SampleInbox, SensorMessage};
pub use state::{RepReport, SampleOutcome, SessionPhase};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::analysis::{generate_tips, AnalysisReport, ProgressSample, RepetitionEvent};
use crate::calibration::{Baseline, BaselineCalibrator, CalibrationStatus};
use crate::config::AppConfig;
use crate::debug::pipeline_tracer::PipelineStage;
use crate::error::{
    log_analysis_error, log_calibration_error, log_session_error, AnalysisError, CalibrationError,
    ConfigError, ErrorCode, SessionError,
};
use crate::events::TrainingEvent;
use crate::managers::EventBroadcaster;
use crate::sensor::{
    AxisPreset, OrientationReading, RawSample, SensorPermission, SystemTimeSource, TimeSource,
};
use crate::trace_pipeline;
use state::{CalibrationRun, SessionState};

/// Curl training session
///
/// Thread-safe: all operations take `&self`, so the controller can be
/// shared behind an `Arc` between the sensor callback and the UI.
///
/// # Example
/// ```ignore
/// let session = SessionController::new(AppConfig::load())?;
/// let mut events = session.subscribe();
/// session.start_calibration(&StaticPermission::granted())?;
/// for sample in sensor {
///     session.handle_sample(sample)?;
/// }
/// ```
pub struct SessionController {
    state: Mutex<SessionState>,
    events: EventBroadcaster,
    clock: Arc<dyn TimeSource>,
}

impl SessionController {
    /// Create a session in `Idle`
    ///
    /// # Errors
    /// `ConfigError` when any configuration invariant is violated.
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        Self::with_time_source(config, Arc::new(SystemTimeSource::default()))
    }

    /// Create a session reading wall-clock time from `clock`
    pub fn with_time_source(
        config: AppConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "[SessionController] Created: range={} reps={} cooldown={}ms",
            config.training.angle_range,
            config.training.total_reps,
            config.training.cooldown_ms
        );
        Ok(Self {
            state: Mutex::new(SessionState::new(config)?),
            events: EventBroadcaster::default(),
            clock,
        })
    }

    /// Subscribe to training events
    pub fn subscribe(&self) -> broadcast::Receiver<TrainingEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, SessionState>, SessionError> {
        self.state.lock().map_err(|_| {
            let err = SessionError::StatePoisoned;
            log_session_error(&err, "lock_state");
            err
        })
    }

    fn publish(&self, event: TrainingEvent) {
        trace_pipeline!(PipelineStage::EventSent, "{}", event.kind());
        self.events.publish(event);
    }

    // ---- Calibration ------------------------------------------------------

    /// Begin baseline calibration
    ///
    /// Allowed from `Idle` or `Ready`. Sensor permission is requested first;
    /// a denial is returned as-is and the session stays where it was.
    /// Entering `Calibrating` drops any previous baseline.
    pub fn start_calibration(&self, permission: &dyn SensorPermission) -> Result<(), SessionError> {
        let mut state = self.lock_state()?;
        if !matches!(state.phase, SessionPhase::Idle | SessionPhase::Ready) {
            return Err(invalid_state("start calibration", state.phase));
        }

        permission.request().map_err(|err| {
            let err = SessionError::from(err);
            log_session_error(&err, "start_calibration");
            err
        })?;

        state.restore_configured()?;
        let run = CalibrationRun {
            calibrator: BaselineCalibrator::new(state.config.calibration.clone()),
            started_at: self.clock.now(),
        };
        state.baseline = None;
        state.clear_training();
        state.calibration = Some(run);
        state.phase = SessionPhase::Calibrating;

        log::info!(
            "[SessionController] Calibration started ({}ms window, {} samples required)",
            state.config.calibration.duration_ms,
            state.config.calibration.min_samples
        );
        Ok(())
    }

    /// Close the calibration window now and commit whatever was collected
    ///
    /// # Errors
    /// * `SessionError::InvalidState` - not calibrating
    /// * `SessionError::Calibration` - too few samples; session is back in `Idle`
    pub fn cancel_calibration(&self) -> Result<Baseline, SessionError> {
        let mut state = self.lock_state()?;
        let Some(mut run) = state.calibration.take() else {
            return Err(invalid_state("cancel calibration", state.phase));
        };
        let result = run.calibrator.cancel();
        self.conclude_calibration(&mut state, result)
            .map_err(SessionError::from)
    }

    /// Enforce the wall-clock bound on calibration
    ///
    /// When the sample stream stalls, the timestamp-driven window never
    /// closes on its own. Once `duration_ms` of wall-clock time has passed
    /// since `start_calibration`, the window is closed as if cancelled.
    ///
    /// # Returns
    /// `true` if the window was closed by this call.
    pub fn expire_calibration(&self) -> Result<bool, SessionError> {
        let mut state = self.lock_state()?;
        let limit = Duration::from_millis(state.config.calibration.duration_ms);
        let expired = state
            .calibration
            .as_ref()
            .is_some_and(|run| self.clock.now().saturating_duration_since(run.started_at) >= limit);
        if !expired {
            return Ok(false);
        }

        let Some(mut run) = state.calibration.take() else {
            return Ok(false);
        };
        log::warn!(
            "[SessionController] Calibration timed out after {}ms with {} samples",
            limit.as_millis(),
            run.calibrator.accepted_count()
        );
        let result = run.calibrator.cancel();
        // Failure already reported through CalibrationFailed
        let _ = self.conclude_calibration(&mut state, result);
        Ok(true)
    }

    fn conclude_calibration(
        &self,
        state: &mut SessionState,
        result: Result<Baseline, CalibrationError>,
    ) -> Result<Baseline, CalibrationError> {
        state.calibration = None;
        match result {
            Ok(baseline) => {
                state.baseline = Some(baseline);
                state.phase = SessionPhase::Ready;
                self.publish(TrainingEvent::CalibrationDone { baseline });
                Ok(baseline)
            }
            Err(err) => {
                log_calibration_error(&err, "conclude_calibration");
                state.phase = SessionPhase::Idle;
                self.publish(TrainingEvent::CalibrationFailed {
                    reason: err.message(),
                    code: err.code(),
                });
                Err(err)
            }
        }
    }

    /// Commit a known baseline without calibrating (`Idle|Ready -> Ready`)
    pub fn use_baseline(&self, baseline: Baseline) -> Result<(), SessionError> {
        let mut state = self.lock_state()?;
        if !matches!(state.phase, SessionPhase::Idle | SessionPhase::Ready) {
            return Err(invalid_state("use a fixed baseline", state.phase));
        }
        state.baseline = Some(baseline);
        state.clear_training();
        state.phase = SessionPhase::Ready;
        log::info!(
            "[SessionController] Fixed baseline {:.2} deg committed",
            baseline.angle()
        );
        Ok(())
    }

    /// Commit a fixed-range device orientation preset
    ///
    /// Sets the baseline, the angle range and the sensor axis in one step.
    pub fn use_preset(&self, preset: AxisPreset) -> Result<(), SessionError> {
        let mut state = self.lock_state()?;
        if !matches!(state.phase, SessionPhase::Idle | SessionPhase::Ready) {
            return Err(invalid_state("use a preset", state.phase));
        }
        state.set_angle_range(preset.angle_range())?;
        state.config.sensor.axis = preset.axis();
        state.baseline = Some(Baseline::from_preset(preset));
        state.clear_training();
        state.phase = SessionPhase::Ready;
        log::info!(
            "[SessionController] Preset {:?}: {:.0}..{:.0} deg on {:?}",
            preset,
            preset.start_angle(),
            preset.end_angle(),
            preset.axis()
        );
        Ok(())
    }

    // ---- Training ---------------------------------------------------------

    /// `Ready -> Training`
    ///
    /// # Errors
    /// * `SessionError::MissingBaseline` - no baseline committed
    /// * `SessionError::InvalidState` - calibrating, training or complete
    pub fn start_training(&self) -> Result<(), SessionError> {
        let mut state = self.lock_state()?;
        match state.phase {
            SessionPhase::Ready => {}
            SessionPhase::Idle => return Err(SessionError::MissingBaseline),
            phase => return Err(invalid_state("start training", phase)),
        }
        if state.baseline.is_none() {
            return Err(SessionError::MissingBaseline);
        }

        state.clear_training();
        state.phase = SessionPhase::Training;
        log::info!(
            "[SessionController] Training started: {} reps",
            state.config.training.total_reps
        );
        Ok(())
    }

    /// Leave training early (`Training|Complete -> Ready`)
    ///
    /// The baseline is kept; counter, phase, trace and reports are cleared.
    pub fn stop_training(&self) -> Result<(), SessionError> {
        let mut state = self.lock_state()?;
        if !matches!(state.phase, SessionPhase::Training | SessionPhase::Complete) {
            return Err(invalid_state("stop training", state.phase));
        }
        log::info!(
            "[SessionController] Training stopped at {} reps",
            state.machine.count()
        );
        state.clear_training();
        state.phase = SessionPhase::Ready;
        Ok(())
    }

    /// Back to `Idle`: baseline, counter, phase, trace and reports cleared
    ///
    /// A preset's range and axis are dropped in favour of the configured ones.
    pub fn reset(&self) -> Result<(), SessionError> {
        let mut state = self.lock_state()?;
        state.restore_configured()?;
        state.calibration = None;
        state.baseline = None;
        state.clear_training();
        state.phase = SessionPhase::Idle;
        log::info!("[SessionController] Session reset");
        Ok(())
    }

    // ---- Samples ----------------------------------------------------------

    /// Feed one raw angle sample
    ///
    /// Consumed while `Calibrating` or `Training`, ignored otherwise.
    /// Calibration and analysis failures are reported through events and the
    /// returned outcome; only lock poisoning is an error.
    pub fn handle_sample(&self, sample: RawSample) -> Result<SampleOutcome, SessionError> {
        let mut state = self.lock_state()?;
        Ok(self.dispatch(&mut state, sample))
    }

    /// Feed a device orientation reading, using the configured axis
    pub fn handle_orientation(
        &self,
        reading: OrientationReading,
    ) -> Result<SampleOutcome, SessionError> {
        let mut state = self.lock_state()?;
        let sample = state.config.sensor.axis.select(&reading);
        Ok(self.dispatch(&mut state, sample))
    }

    fn dispatch(&self, state: &mut SessionState, sample: RawSample) -> SampleOutcome {
        if !sample.angle.is_finite() {
            log::warn!(
                "[SessionController] Skipping non-finite angle at {}ms",
                sample.timestamp_ms
            );
            return SampleOutcome::Ignored;
        }

        match state.phase {
            SessionPhase::Calibrating => self.calibration_sample(state, sample),
            SessionPhase::Training => self.training_sample(state, sample),
            _ => SampleOutcome::Ignored,
        }
    }

    fn calibration_sample(&self, state: &mut SessionState, sample: RawSample) -> SampleOutcome {
        let Some(run) = state.calibration.as_mut() else {
            return SampleOutcome::Ignored;
        };

        match run.calibrator.add_sample(sample) {
            CalibrationStatus::Collecting { accepted, rejected } => {
                SampleOutcome::Collected { accepted, rejected }
            }
            CalibrationStatus::WindowElapsed => {
                let result = run.calibrator.finalize();
                match self.conclude_calibration(state, result) {
                    Ok(baseline) => SampleOutcome::Calibrated(baseline),
                    Err(err) => SampleOutcome::CalibrationFailed(err),
                }
            }
        }
    }

    fn training_sample(&self, state: &mut SessionState, sample: RawSample) -> SampleOutcome {
        let Some(baseline) = state.baseline else {
            return SampleOutcome::Ignored;
        };

        let progress = state.normalizer.normalize(sample.angle, &baseline);
        trace_pipeline!(
            PipelineStage::Normalized,
            "angle={:.2} progress={:.3}",
            sample.angle,
            progress
        );

        // Recorded with the phase in effect before this sample is evaluated
        let recorded = ProgressSample {
            raw_angle: sample.angle,
            progress,
            phase: state.machine.phase(),
            timestamp_ms: sample.timestamp_ms,
        };
        if state.recorder.record(recorded) {
            trace_pipeline!(PipelineStage::Recorded, "len={}", state.recorder.len());
        }

        let transitions = state.machine.process(progress, sample.timestamp_ms);
        self.publish(TrainingEvent::progress(
            sample.angle,
            progress,
            state.machine.phase(),
            sample.timestamp_ms,
        ));

        let mut last_analysis = None;
        for event in transitions {
            match event {
                RepetitionEvent::Peak { timestamp_ms } => {
                    trace_pipeline!(
                        PipelineStage::PhaseTransition,
                        "down -> up at {}ms",
                        timestamp_ms
                    );
                    self.publish(TrainingEvent::Peak { timestamp_ms });
                }
                RepetitionEvent::RepComplete {
                    count,
                    timestamp_ms,
                } => {
                    trace_pipeline!(
                        PipelineStage::PhaseTransition,
                        "up -> down at {}ms",
                        timestamp_ms
                    );
                    let result = state.analyzer.analyze(state.recorder.trace());
                    trace_pipeline!(
                        PipelineStage::Analysis,
                        "rep={} samples={} ok={}",
                        count,
                        state.recorder.len(),
                        result.is_ok()
                    );
                    if let Err(err) = &result {
                        log_analysis_error(err, "rep_complete");
                    }
                    state.rep_reports.push(RepReport {
                        rep: count,
                        report: result.as_ref().ok().copied(),
                    });
                    state.recorder.clear();

                    log::info!(
                        "[SessionController] Repetition {}/{} at {}ms",
                        count,
                        state.machine.total_reps(),
                        timestamp_ms
                    );
                    self.publish(TrainingEvent::RepComplete {
                        count,
                        total: state.machine.total_reps(),
                    });
                    last_analysis = Some((count, result));
                }
                RepetitionEvent::RepDebounced {
                    timestamp_ms,
                    since_last_ms,
                } => {
                    trace_pipeline!(
                        PipelineStage::Debounced,
                        "completion at {}ms only {}ms after last",
                        timestamp_ms,
                        since_last_ms
                    );
                    log::debug!(
                        "[SessionController] Completion at {}ms inside cooldown ({}ms)",
                        timestamp_ms,
                        since_last_ms
                    );
                }
                RepetitionEvent::SessionComplete { count } => {
                    state.phase = SessionPhase::Complete;
                    log::info!("[SessionController] Session complete: {} reps", count);
                    self.publish(TrainingEvent::SessionComplete { reps: count });
                    self.publish_final_analysis(state, last_analysis.take());
                }
            }
        }

        SampleOutcome::Processed {
            sample: recorded,
            count: state.machine.count(),
        }
    }

    fn publish_final_analysis(
        &self,
        state: &mut SessionState,
        analysis: Option<(u32, Result<AnalysisReport, AnalysisError>)>,
    ) {
        match analysis {
            Some((rep, Ok(report))) => {
                state.report = Some(report);
                self.publish(TrainingEvent::AnalysisReady {
                    rep,
                    report,
                    tips: generate_tips(&report),
                });
            }
            Some((_, Err(err))) => {
                self.publish(TrainingEvent::AnalysisUnavailable {
                    reason: err.message(),
                });
            }
            None => {
                self.publish(TrainingEvent::AnalysisUnavailable {
                    reason: "No repetition recorded".to_string(),
                });
            }
        }
    }

    // ---- Accessors --------------------------------------------------------

    pub fn phase(&self) -> Result<SessionPhase, SessionError> {
        Ok(self.lock_state()?.phase)
    }

    /// Accepted repetitions in the current session
    pub fn count(&self) -> Result<u32, SessionError> {
        Ok(self.lock_state()?.machine.count())
    }

    pub fn baseline(&self) -> Result<Option<Baseline>, SessionError> {
        Ok(self.lock_state()?.baseline)
    }

    /// Report of the final repetition, available once `Complete`
    pub fn report(&self) -> Result<Option<AnalysisReport>, SessionError> {
        Ok(self.lock_state()?.report)
    }

    /// Per-repetition reports in completion order
    pub fn rep_reports(&self) -> Result<Vec<RepReport>, SessionError> {
        Ok(self.lock_state()?.rep_reports.clone())
    }

    /// Samples recorded since the last accepted repetition
    pub fn trace(&self) -> Result<Vec<ProgressSample>, SessionError> {
        Ok(self.lock_state()?.recorder.trace().to_vec())
    }

    /// Effective configuration, including any preset currently applied
    pub fn config(&self) -> Result<AppConfig, SessionError> {
        Ok(self.lock_state()?.config.clone())
    }
}

fn invalid_state(operation: &'static str, phase: SessionPhase) -> SessionError {
    let err = SessionError::InvalidState { operation, phase };
    log_session_error(&err, operation);
    err
}
