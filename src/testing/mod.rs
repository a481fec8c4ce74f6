//! Testability helpers.
//!
//! Deterministic sample sources used by unit tests, integration tests and
//! the `curl_cli synth` command, so the pipeline can be exercised without a
//! physical orientation sensor.

pub mod synthetic;

pub use synthetic::{curl_reps, curl_session, CurlTraceSpec};
