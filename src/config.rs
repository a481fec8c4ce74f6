//! Configuration management for the repetition pipeline
//!
//! Every threshold the pipeline uses lives here, loaded from JSON so
//! different devices and users can be tuned without recompilation. Observed
//! setups disagree on the angular range (80-150 degrees) and on the quality
//! thresholds, so nothing below is hard-coded at the call sites.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::sensor::SensorAxis;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub training: TrainingConfig,
    pub normalizer: NormalizerConfig,
    pub calibration: CalibrationConfig,
    pub recorder: RecorderConfig,
    pub analysis: AnalysisConfig,
    pub sensor: SensorConfig,
}

/// Repetition detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Degrees between fully extended (progress 0) and fully flexed (progress 1)
    pub angle_range: f64,
    /// Progress at or above which the peak is reached
    pub peak_threshold: f64,
    /// Progress at or below which the arm is back at the bottom
    pub bottom_threshold: f64,
    /// Repetitions per session
    pub total_reps: u32,
    /// Minimum time between two accepted repetition completions
    pub cooldown_ms: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            angle_range: 120.0,
            peak_threshold: 0.95,
            bottom_threshold: 0.05,
            total_reps: 3,
            cooldown_ms: 500,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.angle_range.is_finite() || self.angle_range <= 0.0 {
            return Err(ConfigError::invalid(
                "training.angle_range",
                format!("must be a finite value > 0 (got {})", self.angle_range),
            ));
        }
        check_open_unit("training.peak_threshold", self.peak_threshold)?;
        check_open_unit("training.bottom_threshold", self.bottom_threshold)?;
        if self.bottom_threshold >= self.peak_threshold {
            return Err(ConfigError::invalid(
                "training.bottom_threshold",
                format!(
                    "must be below peak_threshold ({} >= {})",
                    self.bottom_threshold, self.peak_threshold
                ),
            ));
        }
        if self.total_reps == 0 {
            return Err(ConfigError::invalid("training.total_reps", "must be > 0"));
        }
        Ok(())
    }
}

/// Progress normalization policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Force progress to 0 while the angle stays within the noise floor
    pub dead_zone_enabled: bool,
    /// Dead-zone half width in degrees around the baseline
    pub noise_floor_deg: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            dead_zone_enabled: false,
            noise_floor_deg: 5.0,
        }
    }
}

/// Baseline calibration window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Length of the stationary collection window
    pub duration_ms: u64,
    /// Valid samples required for a baseline
    pub min_samples: usize,
    /// Samples with |angle| at or above this bound are treated as movement
    pub outlier_bound_deg: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            min_samples: 10,
            outlier_bound_deg: 45.0,
        }
    }
}

/// Motion trace recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Minimum spacing between recorded samples (0 records every sample)
    pub min_interval_ms: u64,
    /// Upper bound on trace length; oldest samples are dropped beyond it
    pub max_samples: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 50,
            max_samples: 4096,
        }
    }
}

/// Motion quality heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Shortest trace the analyzer accepts
    pub min_samples: usize,
    /// Maximum speed spread (progress units per ms) still considered smooth
    pub smoothness_threshold: f64,
    /// Minimum share of the trace spent in the Down phase
    pub eccentric_threshold: f64,
    /// Minimum covered share of the configured angle range
    pub range_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            smoothness_threshold: 0.15,
            eccentric_threshold: 0.4,
            range_threshold: 0.85,
        }
    }
}

/// Which orientation axis feeds the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub axis: SensorAxis,
}

impl AppConfig {
    /// Validate every section
    ///
    /// # Errors
    /// `ConfigError::InvalidRange` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.training.validate()?;

        if !self.normalizer.noise_floor_deg.is_finite() || self.normalizer.noise_floor_deg < 0.0 {
            return Err(ConfigError::invalid(
                "normalizer.noise_floor_deg",
                "must be a finite value >= 0",
            ));
        }

        if self.calibration.duration_ms == 0 {
            return Err(ConfigError::invalid("calibration.duration_ms", "must be > 0"));
        }
        if self.calibration.min_samples == 0 {
            return Err(ConfigError::invalid("calibration.min_samples", "must be > 0"));
        }
        if !self.calibration.outlier_bound_deg.is_finite()
            || self.calibration.outlier_bound_deg <= 0.0
        {
            return Err(ConfigError::invalid(
                "calibration.outlier_bound_deg",
                "must be a finite value > 0",
            ));
        }

        if self.recorder.max_samples < self.analysis.min_samples {
            return Err(ConfigError::invalid(
                "recorder.max_samples",
                format!(
                    "must be at least analysis.min_samples ({})",
                    self.analysis.min_samples
                ),
            ));
        }

        if self.analysis.min_samples < 2 {
            return Err(ConfigError::invalid("analysis.min_samples", "must be >= 2"));
        }
        if !self.analysis.smoothness_threshold.is_finite()
            || self.analysis.smoothness_threshold <= 0.0
        {
            return Err(ConfigError::invalid(
                "analysis.smoothness_threshold",
                "must be a finite value > 0",
            ));
        }
        check_closed_unit("analysis.eccentric_threshold", self.analysis.eccentric_threshold)?;
        if !self.analysis.range_threshold.is_finite() || self.analysis.range_threshold <= 0.0 {
            return Err(ConfigError::invalid(
                "analysis.range_threshold",
                "must be a finite value > 0",
            ));
        }

        Ok(())
    }

    /// Parse and validate a JSON document
    ///
    /// Missing sections and fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults when the file is missing,
    /// unparseable or invalid (a warning is logged in each case).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Rejected configuration from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load the bundled configuration
    pub fn load() -> Self {
        Self::load_from_file("assets/curl_config.json")
    }
}

fn check_open_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must lie in (0, 1) (got {})", value),
        ))
    }
}

fn check_closed_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must lie in [0, 1] (got {})", value),
        ))
    }
}
