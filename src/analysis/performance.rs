//! Performance analyzer - motion quality heuristics over one repetition trace.
//!
//! Three fixed-threshold checks:
//! - Smoothness: spread between the fastest and slowest instantaneous speed
//! - Eccentric control: share of the trace duration spent in `Phase::Down`
//! - Range of motion: covered angle relative to the configured range
//!
//! The report always carries every field; a trace that is too short yields
//! `AnalysisError::InsufficientSamples` instead of a degenerate report.

use serde::{Deserialize, Serialize};

use crate::analysis::recorder::ProgressSample;
use crate::analysis::repetition::Phase;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, ConfigError};

/// Motion quality verdict for one trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub is_smooth: bool,
    /// max(speed) - min(speed), progress units per ms
    pub speed_variation: f64,
    pub has_good_eccentric: bool,
    /// Down-phase duration over total duration, in `[0, 1]`
    pub eccentric_ratio: f64,
    pub is_full_range: bool,
    /// (max angle - min angle) / angle range
    pub range_ratio: f64,
}

impl AnalysisReport {
    pub fn eccentric_percent(&self) -> u32 {
        (self.eccentric_ratio * 100.0).round() as u32
    }

    pub fn range_percent(&self) -> u32 {
        (self.range_ratio * 100.0).round().max(0.0) as u32
    }

    pub fn all_passed(&self) -> bool {
        self.is_smooth && self.has_good_eccentric && self.is_full_range
    }
}

/// Coaching advice derived from a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tip {
    /// Speed was uneven
    Tempo,
    /// Lowering was rushed
    SlowEccentric,
    /// Arm never fully extended/flexed
    FullExtension,
    /// Every check passed
    Perfect,
}

impl Tip {
    pub fn message(&self) -> &'static str {
        match self {
            Tip::Tempo => "Try a steady rhythm: two seconds up, two seconds down.",
            Tip::SlowEccentric => "Lower the weight for at least three seconds.",
            Tip::FullExtension => "Fully extend the arm at the bottom of each rep.",
            Tip::Perfect => "Perfect form!",
        }
    }
}

/// Tips for every failed check, or `[Tip::Perfect]` when all passed
pub fn generate_tips(report: &AnalysisReport) -> Vec<Tip> {
    let mut tips = Vec::new();
    if !report.is_smooth {
        tips.push(Tip::Tempo);
    }
    if !report.has_good_eccentric {
        tips.push(Tip::SlowEccentric);
    }
    if !report.is_full_range {
        tips.push(Tip::FullExtension);
    }
    if tips.is_empty() {
        tips.push(Tip::Perfect);
    }
    tips
}

#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    config: AnalysisConfig,
    angle_range: f64,
}

impl PerformanceAnalyzer {
    /// # Errors
    /// `ConfigError::InvalidRange` for a non-positive angle range.
    pub fn new(config: AnalysisConfig, angle_range: f64) -> Result<Self, ConfigError> {
        if !angle_range.is_finite() || angle_range <= 0.0 {
            return Err(ConfigError::invalid(
                "training.angle_range",
                format!("must be a finite value > 0 (got {})", angle_range),
            ));
        }
        Ok(Self {
            config,
            angle_range,
        })
    }

    pub fn angle_range(&self) -> f64 {
        self.angle_range
    }

    pub fn analyze(&self, trace: &[ProgressSample]) -> Result<AnalysisReport, AnalysisError> {
        let required = self.config.min_samples.max(2);
        if trace.len() < required {
            return Err(AnalysisError::InsufficientSamples {
                required,
                actual: trace.len(),
            });
        }

        let speed_variation = speed_variation(trace);
        let eccentric_ratio = eccentric_ratio(trace);
        let range_ratio = angle_span(trace) / self.angle_range;

        let report = AnalysisReport {
            is_smooth: speed_variation < self.config.smoothness_threshold,
            speed_variation,
            has_good_eccentric: eccentric_ratio >= self.config.eccentric_threshold,
            eccentric_ratio,
            is_full_range: range_ratio >= self.config.range_threshold,
            range_ratio,
        };

        log::debug!(
            "[Analyzer] samples={} speed_var={:.4} ecc={:.2} range={:.2}",
            trace.len(),
            report.speed_variation,
            report.eccentric_ratio,
            report.range_ratio
        );

        Ok(report)
    }
}

/// Spread of instantaneous speeds; pairs without forward time are skipped
fn speed_variation(trace: &[ProgressSample]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for pair in trace.windows(2) {
        let dt = pair[1].timestamp_ms.saturating_sub(pair[0].timestamp_ms);
        if dt == 0 {
            continue;
        }
        let speed = (pair[1].progress - pair[0].progress).abs() / dt as f64;
        min = min.min(speed);
        max = max.max(speed);
    }

    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

fn eccentric_ratio(trace: &[ProgressSample]) -> f64 {
    let total = span_ms(trace.iter());
    if total == 0 {
        return 0.0;
    }
    let down = span_ms(trace.iter().filter(|s| s.phase == Phase::Down));
    (down as f64 / total as f64).clamp(0.0, 1.0)
}

/// Time between the first and last sample, 0 for fewer than two
fn span_ms<'a>(mut samples: impl Iterator<Item = &'a ProgressSample>) -> u64 {
    let Some(first) = samples.next() else {
        return 0;
    };
    match samples.last() {
        Some(last) => last.timestamp_ms.saturating_sub(first.timestamp_ms),
        None => 0,
    }
}

fn angle_span(trace: &[ProgressSample]) -> f64 {
    let (min, max) = trace
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.raw_angle), hi.max(s.raw_angle))
        });
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer(angle_range: f64) -> PerformanceAnalyzer {
        PerformanceAnalyzer::new(AnalysisConfig::default(), angle_range).unwrap()
    }

    fn sample(progress: f64, phase: Phase, t: u64, range: f64) -> ProgressSample {
        ProgressSample {
            raw_angle: progress * range,
            progress,
            phase,
            timestamp_ms: t,
        }
    }

    /// Linear 0 -> 1 -> 0 sweep over `n` evenly spaced samples per half
    fn sweep(n: usize, step_ms: u64, range: f64) -> Vec<ProgressSample> {
        let mut trace = Vec::new();
        let mut t = 0;
        for i in 0..=n {
            trace.push(sample(i as f64 / n as f64, Phase::Down, t, range));
            t += step_ms;
        }
        for i in (0..n).rev() {
            trace.push(sample(i as f64 / n as f64, Phase::Up, t, range));
            t += step_ms;
        }
        trace
    }

    #[test]
    fn test_too_short_trace_fails() {
        let trace = sweep(1, 100, 90.0); // 3 samples
        assert_eq!(trace.len(), 3);
        assert_eq!(
            analyzer(90.0).analyze(&trace),
            Err(AnalysisError::InsufficientSamples {
                required: 5,
                actual: 3
            })
        );
    }

    #[test]
    fn test_linear_sweep_is_smooth_and_full_range() {
        let trace = sweep(20, 50, 90.0);
        let report = analyzer(90.0).analyze(&trace).unwrap();
        assert!(report.is_smooth);
        assert!(report.speed_variation < 1e-9);
        assert!(report.is_full_range);
        assert!((report.range_ratio - 1.0).abs() < 1e-9);
        assert!(report.has_good_eccentric);
        assert!((report.eccentric_ratio - 0.5).abs() < 1e-9);
        assert_eq!(generate_tips(&report), vec![Tip::Perfect]);
    }

    #[test]
    fn test_jerky_motion_is_not_smooth() {
        let range = 90.0;
        let trace = vec![
            sample(0.0, Phase::Down, 0, range),
            sample(0.01, Phase::Down, 100, range),
            sample(1.0, Phase::Down, 101, range), // jump
            sample(0.99, Phase::Up, 200, range),
            sample(0.0, Phase::Up, 300, range),
        ];
        let report = analyzer(range).analyze(&trace).unwrap();
        assert!(!report.is_smooth);
        assert!(report.speed_variation > 0.15);
        assert!(generate_tips(&report).contains(&Tip::Tempo));
    }

    #[test]
    fn test_duplicate_timestamps_excluded_from_speed() {
        let range = 90.0;
        let trace = vec![
            sample(0.0, Phase::Down, 0, range),
            sample(0.1, Phase::Down, 100, range),
            sample(0.9, Phase::Down, 100, range), // simultaneous duplicate
            sample(1.0, Phase::Up, 200, range),
            sample(1.0, Phase::Up, 300, range),
        ];
        let report = analyzer(range).analyze(&trace).unwrap();
        assert!(report.speed_variation.is_finite());
        assert!((report.speed_variation - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_zero_duration_trace_has_zero_ratios() {
        let range = 90.0;
        let trace: Vec<_> = (0..6).map(|_| sample(0.5, Phase::Down, 42, range)).collect();
        let report = analyzer(range).analyze(&trace).unwrap();
        assert_eq!(report.eccentric_ratio, 0.0);
        assert_eq!(report.speed_variation, 0.0);
        assert!(!report.eccentric_ratio.is_nan());
        assert!(!report.has_good_eccentric);
    }

    #[test]
    fn test_fast_lowering_flags_eccentric() {
        let range = 90.0;
        // Ascent (Down) takes 100ms, the rest of the trace 900ms
        let mut trace = vec![
            sample(0.0, Phase::Down, 0, range),
            sample(1.0, Phase::Down, 100, range),
        ];
        for i in 1..=9 {
            trace.push(sample(1.0 - i as f64 * 0.1, Phase::Up, 100 + i * 100, range));
        }
        let report = analyzer(range).analyze(&trace).unwrap();
        assert!((report.eccentric_ratio - 0.1).abs() < 1e-9);
        assert!(!report.has_good_eccentric);
        assert!(generate_tips(&report).contains(&Tip::SlowEccentric));
    }

    #[test]
    fn test_single_down_sample_gives_zero_down_duration() {
        let range = 90.0;
        let mut trace = vec![sample(0.0, Phase::Down, 0, range)];
        for i in 1..6 {
            trace.push(sample(0.5, Phase::Up, i * 100, range));
        }
        let report = analyzer(range).analyze(&trace).unwrap();
        assert_eq!(report.eccentric_ratio, 0.0);
    }

    #[test]
    fn test_partial_range() {
        let trace = sweep(10, 50, 60.0); // covers 60 of 120 degrees
        let report = analyzer(120.0).analyze(&trace).unwrap();
        assert!((report.range_ratio - 0.5).abs() < 1e-9);
        assert!(!report.is_full_range);
        assert_eq!(report.range_percent(), 50);
        assert_eq!(generate_tips(&report), vec![Tip::FullExtension]);
    }

    #[test]
    fn test_tips_for_every_failure() {
        let report = AnalysisReport {
            is_smooth: false,
            speed_variation: 0.3,
            has_good_eccentric: false,
            eccentric_ratio: 0.1,
            is_full_range: false,
            range_ratio: 0.4,
        };
        assert_eq!(
            generate_tips(&report),
            vec![Tip::Tempo, Tip::SlowEccentric, Tip::FullExtension]
        );
        assert!(!report.all_passed());
        assert_eq!(report.eccentric_percent(), 10);
    }

    #[test]
    fn test_rejects_invalid_range() {
        assert!(PerformanceAnalyzer::new(AnalysisConfig::default(), 0.0).is_err());
    }
}
