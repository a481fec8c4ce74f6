//! Stage-to-stage tests: normalizer, state machine, recorder and analyzer
//! wired by hand the way the session controller wires them.

use super::*;
use crate::calibration::Baseline;
use crate::config::{AnalysisConfig, NormalizerConfig, RecorderConfig, TrainingConfig};

fn training() -> TrainingConfig {
    TrainingConfig {
        angle_range: 90.0,
        peak_threshold: 0.95,
        bottom_threshold: 0.05,
        total_reps: 3,
        cooldown_ms: 500,
    }
}

/// 30 -> 120 -> 30 degrees in 10-degree steps
fn curl_angles() -> Vec<f64> {
    let mut angles: Vec<f64> = (0..=9).map(|i| 30.0 + i as f64 * 10.0).collect();
    angles.extend((0..9).rev().map(|i| 30.0 + i as f64 * 10.0));
    angles
}

#[test]
fn test_one_curl_through_all_stages() {
    let config = training();
    let baseline = Baseline::fixed(30.0).unwrap();
    let normalizer = Normalizer::from_config(&config, &NormalizerConfig::default()).unwrap();
    let mut machine = RepetitionStateMachine::new(&config);
    let mut recorder = MotionRecorder::new(&RecorderConfig::default());
    let analyzer = PerformanceAnalyzer::new(AnalysisConfig::default(), config.angle_range).unwrap();

    let mut events = Vec::new();
    let mut report = None;
    for (i, angle) in curl_angles().into_iter().enumerate() {
        let t = i as u64 * 100;
        let progress = normalizer.normalize(angle, &baseline);
        recorder.record(ProgressSample {
            raw_angle: angle,
            progress,
            phase: machine.phase(),
            timestamp_ms: t,
        });
        for event in machine.process(progress, t) {
            if let RepetitionEvent::RepComplete { .. } = event {
                report = Some(analyzer.analyze(recorder.trace()).unwrap());
                recorder.clear();
            }
            events.push(event);
        }
    }

    assert!(matches!(
        events[..],
        [
            RepetitionEvent::Peak { timestamp_ms: 900 },
            RepetitionEvent::RepComplete {
                count: 1,
                timestamp_ms: 1800
            }
        ]
    ));
    let report = report.unwrap();
    assert!(report.is_smooth);
    assert!(report.is_full_range);
    assert!(report.has_good_eccentric);
    assert!(recorder.is_empty());
}

#[test]
fn test_jitter_near_bottom_is_not_a_repetition() {
    let config = training();
    let baseline = Baseline::fixed(30.0).unwrap();
    let normalizer = Normalizer::from_config(
        &config,
        &NormalizerConfig {
            dead_zone_enabled: true,
            noise_floor_deg: 5.0,
        },
    )
    .unwrap();
    let mut machine = RepetitionStateMachine::new(&config);

    for (i, angle) in [29.0, 33.0, 27.5, 34.9, 30.0].iter().enumerate() {
        let progress = normalizer.normalize(*angle, &baseline);
        assert_eq!(progress, 0.0);
        assert!(machine.process(progress, i as u64 * 20).is_empty());
    }
}
