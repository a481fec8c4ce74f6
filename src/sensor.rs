//! Sensor-side abstractions.
//!
//! The core never talks to a concrete orientation API. It receives
//! [`RawSample`]s (or [`OrientationReading`]s plus an axis choice), asks a
//! [`SensorPermission`] implementation for access, and reads time through a
//! [`TimeSource`] so tests can drive the calibration deadline by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::PermissionError;

/// One scalar angle reading in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub angle: f64,
    pub timestamp_ms: u64,
}

impl RawSample {
    pub fn new(angle: f64, timestamp_ms: u64) -> Self {
        Self {
            angle,
            timestamp_ms,
        }
    }
}

/// Device tilt angles as reported by an orientation sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationReading {
    /// Front/back tilt in degrees
    pub beta: f64,
    /// Left/right tilt in degrees
    pub gamma: f64,
    pub timestamp_ms: u64,
}

/// Orientation axis that carries the curl motion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorAxis {
    /// Front/back tilt, device held in portrait
    Beta,
    /// Left/right tilt, device held in landscape
    #[default]
    Gamma,
}

impl SensorAxis {
    pub fn select(&self, reading: &OrientationReading) -> RawSample {
        let angle = match self {
            SensorAxis::Beta => reading.beta,
            SensorAxis::Gamma => reading.gamma,
        };
        RawSample::new(angle, reading.timestamp_ms)
    }
}

/// Fixed-range presets for users who skip calibration
///
/// The start angle doubles as the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisPreset {
    Portrait,
    Landscape,
}

impl AxisPreset {
    pub fn axis(&self) -> SensorAxis {
        match self {
            AxisPreset::Portrait => SensorAxis::Beta,
            AxisPreset::Landscape => SensorAxis::Gamma,
        }
    }

    /// Angle at full extension
    pub fn start_angle(&self) -> f64 {
        match self {
            AxisPreset::Portrait => 30.0,
            AxisPreset::Landscape => -60.0,
        }
    }

    /// Angle at full flexion
    pub fn end_angle(&self) -> f64 {
        match self {
            AxisPreset::Portrait => 150.0,
            AxisPreset::Landscape => 60.0,
        }
    }

    pub fn angle_range(&self) -> f64 {
        self.end_angle() - self.start_angle()
    }
}

/// Gate in front of the orientation sensor
///
/// Implemented by the presentation layer (e.g. a platform permission
/// prompt). A denial is reported once and never retried by the core.
pub trait SensorPermission: Send + Sync {
    fn request(&self) -> Result<(), PermissionError>;
}

/// Permission answer fixed at construction
#[derive(Debug, Clone)]
pub struct StaticPermission {
    outcome: Result<(), PermissionError>,
}

impl StaticPermission {
    pub fn granted() -> Self {
        Self { outcome: Ok(()) }
    }

    pub fn denied(reason: &str) -> Self {
        Self {
            outcome: Err(PermissionError::Denied {
                reason: reason.to_string(),
            }),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            outcome: Err(PermissionError::Unavailable),
        }
    }
}

impl SensorPermission for StaticPermission {
    fn request(&self) -> Result<(), PermissionError> {
        self.outcome.clone()
    }
}

/// Trait representing a monotonic time source used for wall-clock deadlines.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic tests and replays
pub struct ManualTimeSource {
    origin: Instant,
    offset_ms: AtomicU64,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}
