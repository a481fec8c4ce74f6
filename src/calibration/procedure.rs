// BaselineCalibrator - stationary sample collection window
//
// The calibrator collects raw angles for a bounded window while the user
// holds the device at full extension, rejects samples that look like
// accidental movement, and averages the survivors into a Baseline.
//
// The window opens at the first sample's timestamp and closes at the first
// sample at or beyond `duration_ms`. Closing the window early (cancel) still
// produces a baseline when enough samples survived.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::calibration::state::Baseline;
use crate::config::CalibrationConfig;
use crate::error::CalibrationError;
use crate::sensor::RawSample;
use crate::trace_pipeline;
use crate::debug::pipeline_tracer::PipelineStage;

/// Result of feeding one sample to the calibrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    /// Window still open
    Collecting { accepted: usize, rejected: usize },
    /// Window closed; call `finalize`
    WindowElapsed,
}

/// Incremental baseline calibration procedure
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    config: CalibrationConfig,
    /// Timestamp of the first sample seen
    window_start_ms: Option<u64>,
    /// Angles that passed the outlier filter
    accepted: Vec<f64>,
    rejected: usize,
    closed: bool,
}

impl BaselineCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            accepted: Vec::with_capacity(config.min_samples),
            config,
            window_start_ms: None,
            rejected: 0,
            closed: false,
        }
    }

    /// Add a sample to the window
    ///
    /// # Returns
    /// * `CalibrationStatus::Collecting` - sample consumed (accepted or rejected)
    /// * `CalibrationStatus::WindowElapsed` - window closed, sample ignored
    pub fn add_sample(&mut self, sample: RawSample) -> CalibrationStatus {
        if self.closed {
            return CalibrationStatus::WindowElapsed;
        }

        let start = *self.window_start_ms.get_or_insert(sample.timestamp_ms);
        if sample.timestamp_ms.saturating_sub(start) >= self.config.duration_ms {
            self.closed = true;
            return CalibrationStatus::WindowElapsed;
        }

        if self.is_outlier(sample.angle) {
            self.rejected += 1;
            log::debug!(
                "[Calibration] Rejected sample angle={:.2} at {}ms",
                sample.angle,
                sample.timestamp_ms
            );
        } else {
            self.accepted.push(sample.angle);
        }

        trace_pipeline!(
            PipelineStage::CalibrationSample,
            "angle={:.2} accepted={} rejected={}",
            sample.angle,
            self.accepted.len(),
            self.rejected
        );

        CalibrationStatus::Collecting {
            accepted: self.accepted.len(),
            rejected: self.rejected,
        }
    }

    fn is_outlier(&self, angle: f64) -> bool {
        !angle.is_finite() || angle.abs() >= self.config.outlier_bound_deg
    }

    /// Compute the baseline from the collected samples
    ///
    /// # Errors
    /// `CalibrationError::InsufficientData` when fewer than `min_samples`
    /// samples survived filtering.
    pub fn finalize(&self) -> Result<Baseline, CalibrationError> {
        let insufficient = || CalibrationError::InsufficientData {
            required: self.config.min_samples,
            collected: self.accepted.len(),
            rejected: self.rejected,
        };

        if self.accepted.len() < self.config.min_samples {
            return Err(insufficient());
        }

        let baseline = Baseline::from_mean(&self.accepted).ok_or_else(insufficient)?;
        log::info!(
            "[Calibration] Baseline {:.2} deg from {} samples ({} rejected)",
            baseline.angle(),
            self.accepted.len(),
            self.rejected
        );
        Ok(baseline)
    }

    /// Close the window early and finalize
    pub fn cancel(&mut self) -> Result<Baseline, CalibrationError> {
        self.closed = true;
        log::info!(
            "[Calibration] Window closed early with {} accepted samples",
            self.accepted.len()
        );
        self.finalize()
    }

    pub fn is_window_elapsed(&self) -> bool {
        self.closed
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }
}

/// Calibrate from a finite or infinite sample stream
///
/// Consumes samples until the window closes or the stream ends.
pub fn calibrate<I>(samples: I, config: &CalibrationConfig) -> Result<Baseline, CalibrationError>
where
    I: IntoIterator<Item = RawSample>,
{
    let mut calibrator = BaselineCalibrator::new(config.clone());
    for sample in samples {
        if calibrator.add_sample(sample) == CalibrationStatus::WindowElapsed {
            break;
        }
    }
    calibrator.finalize()
}

/// Calibrate from an async channel with a wall-clock bound
///
/// Stops at whichever comes first: the sample-timestamp window closes,
/// `duration_ms` of wall-clock time passes, or the sender side is dropped
/// (treated as cancellation).
pub async fn calibrate_stream(
    rx: &mut mpsc::Receiver<RawSample>,
    config: &CalibrationConfig,
) -> Result<Baseline, CalibrationError> {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(config.duration_ms);
    let mut calibrator = BaselineCalibrator::new(config.clone());

    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(sample)) => {
                if calibrator.add_sample(sample) == CalibrationStatus::WindowElapsed {
                    break;
                }
            }
            Ok(None) => return calibrator.cancel(),
            Err(_) => {
                log::debug!(
                    "[Calibration] Wall-clock window of {}ms elapsed",
                    config.duration_ms
                );
                break;
            }
        }
    }

    calibrator.finalize()
}
