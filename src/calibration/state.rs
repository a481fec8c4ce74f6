// Baseline - calibrated zero-reference angle
//
// A Baseline is immutable once created and is always finite. It is only
// replaced by running calibration again or by committing a fixed preset.

use serde::Serialize;

use crate::sensor::AxisPreset;

/// Reference angle representing the resting (fully extended) position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baseline {
    angle: f64,
}

impl Baseline {
    /// Create a baseline from a known angle
    ///
    /// # Returns
    /// * `Some(Baseline)` - angle is finite
    /// * `None` - angle is NaN or infinite
    pub fn fixed(angle: f64) -> Option<Self> {
        angle.is_finite().then_some(Self { angle })
    }

    /// Baseline implied by a fixed-range preset
    pub fn from_preset(preset: AxisPreset) -> Self {
        Self {
            angle: preset.start_angle(),
        }
    }

    /// Mean of the given angles
    ///
    /// Returns `None` for an empty slice or a non-finite mean, so a baseline
    /// can never be NaN.
    pub(crate) fn from_mean(angles: &[f64]) -> Option<Self> {
        if angles.is_empty() {
            return None;
        }
        let mean = angles.iter().sum::<f64>() / angles.len() as f64;
        Self::fixed(mean)
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }
}
