//! Motion trace recording.
//!
//! The trace covers one repetition cycle: the session controller clears it
//! after every accepted completion, once that repetition has been analyzed.
//! Recording is throttled to `min_interval_ms` and capped at `max_samples`.

use serde::{Deserialize, Serialize};

use crate::analysis::repetition::Phase;
use crate::config::RecorderConfig;

/// One processed sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub raw_angle: f64,
    /// Normalized position in `[0, 1]`
    pub progress: f64,
    /// Phase in effect when the sample arrived
    pub phase: Phase,
    pub timestamp_ms: u64,
}

/// Ordered samples of the current repetition cycle
pub type MotionTrace = Vec<ProgressSample>;

#[derive(Debug, Clone)]
pub struct MotionRecorder {
    trace: MotionTrace,
    min_interval_ms: u64,
    max_samples: usize,
    dropped: usize,
}

impl MotionRecorder {
    pub fn new(config: &RecorderConfig) -> Self {
        Self {
            trace: Vec::new(),
            min_interval_ms: config.min_interval_ms,
            max_samples: config.max_samples.max(1),
            dropped: 0,
        }
    }

    /// Append a sample
    ///
    /// # Returns
    /// `false` when the sample arrived less than `min_interval_ms` after the
    /// last recorded one and was skipped. A gap of exactly `min_interval_ms`
    /// is recorded.
    pub fn record(&mut self, sample: ProgressSample) -> bool {
        if let Some(last) = self.trace.last() {
            if sample.timestamp_ms.saturating_sub(last.timestamp_ms) < self.min_interval_ms {
                return false;
            }
        }

        if self.trace.len() >= self.max_samples {
            let overflow = self.trace.len() + 1 - self.max_samples;
            self.trace.drain(..overflow);
            self.dropped += overflow;
            if self.dropped == overflow {
                log::warn!(
                    "[Recorder] Trace reached {} samples, dropping oldest",
                    self.max_samples
                );
            }
        }

        self.trace.push(sample);
        true
    }

    pub fn clear(&mut self) {
        self.trace.clear();
        self.dropped = 0;
    }

    pub fn trace(&self) -> &[ProgressSample] {
        &self.trace
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    /// Samples discarded by the length cap since the last clear
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: u64) -> ProgressSample {
        ProgressSample {
            raw_angle: t as f64,
            progress: 0.0,
            phase: Phase::Down,
            timestamp_ms: t,
        }
    }

    fn recorder(min_interval_ms: u64, max_samples: usize) -> MotionRecorder {
        MotionRecorder::new(&RecorderConfig {
            min_interval_ms,
            max_samples,
        })
    }

    #[test]
    fn test_appends_in_order() {
        let mut r = recorder(0, 100);
        for t in [0, 10, 20] {
            assert!(r.record(sample(t)));
        }
        let times: Vec<u64> = r.trace().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(times, vec![0, 10, 20]);
    }

    #[test]
    fn test_throttle_boundary_is_inclusive() {
        let mut r = recorder(50, 100);
        assert!(r.record(sample(1000)));
        assert!(!r.record(sample(1020)));
        assert!(!r.record(sample(1049)));
        assert!(r.record(sample(1050)));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_caps_length_dropping_oldest() {
        let mut r = recorder(0, 3);
        for t in 0..5 {
            r.record(sample(t));
        }
        assert_eq!(r.len(), 3);
        assert_eq!(r.trace()[0].timestamp_ms, 2);
        assert_eq!(r.dropped(), 2);
    }

    #[test]
    fn test_clear() {
        let mut r = recorder(0, 10);
        r.record(sample(0));
        r.clear();
        assert!(r.is_empty());
        // Throttle restarts after a clear
        assert!(r.record(sample(1)));
    }
}
