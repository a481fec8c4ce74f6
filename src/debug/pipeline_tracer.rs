// Pipeline Tracer - Diagnostic logging for the sample-to-repetition pipeline
//
// Provides structured trace points throughout the pipeline to help debug
// why a repetition was or was not counted. Each stage logs its state when
// tracing is enabled.
//
// Usage:
//   - Enable with CURL_TRACE=1 environment variable
//   - Traces appear in logs with [TRACE] prefix
//   - Each trace includes stage name, timestamp, and relevant values

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::OnceCell;

/// Global flag to enable/disable pipeline tracing
static TRACING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Counter for trace events (helps correlate related traces)
static TRACE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Global start time for relative timestamps
static START_TIME: OnceCell<Instant> = OnceCell::new();

/// Initialize pipeline tracing based on environment variable
pub fn init() {
    let enabled = std::env::var("CURL_TRACE")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);
    TRACING_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled {
        log::info!("[TRACE] Pipeline tracing ENABLED - set CURL_TRACE=0 to disable");
    }
}

/// Check if tracing is enabled
#[inline]
pub fn is_enabled() -> bool {
    TRACING_ENABLED.load(Ordering::Relaxed)
}

/// Enable tracing at runtime
pub fn enable() {
    TRACING_ENABLED.store(true, Ordering::SeqCst);
    log::info!("[TRACE] Pipeline tracing enabled at runtime");
}

/// Disable tracing at runtime
pub fn disable() {
    TRACING_ENABLED.store(false, Ordering::SeqCst);
    log::info!("[TRACE] Pipeline tracing disabled at runtime");
}

/// Pipeline stages for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Calibration window consumed a sample
    CalibrationSample,
    /// Raw angle mapped to progress
    Normalized,
    /// Sample appended to the motion trace
    Recorded,
    /// Down/Up transition
    PhaseTransition,
    /// Completion suppressed by the cooldown
    Debounced,
    /// Repetition trace analyzed
    Analysis,
    /// Event handed to the broadcaster
    EventSent,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::CalibrationSample => "CAL_SAMPLE",
            PipelineStage::Normalized => "NORMALIZE",
            PipelineStage::Recorded => "RECORD",
            PipelineStage::PhaseTransition => "PHASE",
            PipelineStage::Debounced => "DEBOUNCE",
            PipelineStage::Analysis => "ANALYZE",
            PipelineStage::EventSent => "EVENT_TX",
        }
    }
}

fn get_timestamp_us() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}

/// Log a trace event at a pipeline stage
///
/// Only logs if tracing is enabled.
#[inline]
pub fn trace(stage: PipelineStage, message: &str) {
    if !is_enabled() {
        return;
    }

    let id = TRACE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = get_timestamp_us();

    log::info!(
        "[TRACE] {:>10} #{:06} @{:>10}us | {}",
        stage.as_str(),
        id,
        ts,
        message
    );
}

/// Log a trace event with formatted arguments
///
/// The message is only formatted when tracing is enabled.
#[macro_export]
macro_rules! trace_pipeline {
    ($stage:expr, $($arg:tt)*) => {
        if $crate::debug::pipeline_tracer::is_enabled() {
            $crate::debug::pipeline_tracer::trace($stage, &format!($($arg)*));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_disable() {
        enable();
        assert!(is_enabled());
        trace(PipelineStage::Normalized, "progress=0.50");
        disable();
        assert!(!is_enabled());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::Normalized.as_str(), "NORMALIZE");
        assert_eq!(PipelineStage::Debounced.as_str(), "DEBOUNCE");
    }
}
