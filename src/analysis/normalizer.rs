//! Angle-to-progress normalization.
//!
//! Maps a raw angle onto `[0, 1]` relative to the baseline:
//! `clamp((angle - baseline) / angle_range, 0, 1)`. The optional dead zone
//! pins progress to 0 near the resting position so sensor jitter cannot
//! creep toward the bottom threshold.

use crate::calibration::Baseline;
use crate::config::{NormalizerConfig, TrainingConfig};
use crate::error::ConfigError;

/// Validated normalization parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    angle_range: f64,
    /// `Some(noise_floor_deg)` when the dead zone is enabled
    dead_zone: Option<f64>,
}

impl Normalizer {
    /// # Errors
    /// `ConfigError::InvalidRange` for a non-positive or non-finite range.
    pub fn new(angle_range: f64, policy: &NormalizerConfig) -> Result<Self, ConfigError> {
        if !angle_range.is_finite() || angle_range <= 0.0 {
            return Err(ConfigError::invalid(
                "training.angle_range",
                format!("must be a finite value > 0 (got {})", angle_range),
            ));
        }
        Ok(Self {
            angle_range,
            dead_zone: policy
                .dead_zone_enabled
                .then_some(policy.noise_floor_deg.max(0.0)),
        })
    }

    pub fn from_config(
        training: &TrainingConfig,
        policy: &NormalizerConfig,
    ) -> Result<Self, ConfigError> {
        Self::new(training.angle_range, policy)
    }

    pub fn angle_range(&self) -> f64 {
        self.angle_range
    }

    pub fn normalize(&self, raw_angle: f64, baseline: &Baseline) -> f64 {
        let offset = raw_angle - baseline.angle();
        if let Some(floor) = self.dead_zone {
            if offset.abs() < floor {
                return 0.0;
            }
        }
        (offset / self.angle_range).clamp(0.0, 1.0)
    }
}

/// One-shot normalization without the dead zone
///
/// # Errors
/// `ConfigError::InvalidRange` when `config.angle_range` is not a finite
/// value > 0.
pub fn normalize(
    raw_angle: f64,
    baseline: &Baseline,
    config: &TrainingConfig,
) -> Result<f64, ConfigError> {
    let normalizer = Normalizer::new(config.angle_range, &NormalizerConfig::default())?;
    Ok(normalizer.normalize(raw_angle, baseline))
}
