// Calibration module - baseline angle collection
//
// This module provides two main components:
// 1. Baseline: The calibrated zero-reference angle
// 2. BaselineCalibrator: Manages the stationary sample collection window
//
// The calibration workflow:
// 1. Create BaselineCalibrator from CalibrationConfig
// 2. Feed raw samples while the device rests at full extension
// 3. Finalize (window elapsed or cancelled) to obtain a Baseline

pub mod procedure;
pub mod state;

pub use procedure::{calibrate, calibrate_stream, BaselineCalibrator, CalibrationStatus};
pub use state::Baseline;
