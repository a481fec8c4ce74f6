use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_curl_cli"))
}

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("curl_cli_{}_{}.json", std::process::id(), name))
}

fn synth_to(path: &PathBuf, extra: &[&str]) {
    let output = cli()
        .args(["synth", "--output"])
        .arg(path)
        .args(extra)
        .output()
        .expect("failed to run curl_cli synth");
    assert!(
        output.status.success(),
        "synth exited with {:?}",
        output.status.code()
    );
}

#[test]
fn synth_prints_sample_array() {
    let output = cli()
        .args(["synth", "--reps", "1", "--sample-ms", "50"])
        .output()
        .expect("failed to run curl_cli synth");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("sample array JSON");
    let samples = json.as_array().expect("array");
    assert!(!samples.is_empty());
    assert!(samples[0]["angle"].is_number());
    assert_eq!(samples[0]["timestamp_ms"], 0);
}

#[test]
fn replay_calibrates_and_completes_session() {
    let path = temp_file("complete");
    synth_to(&path, &["--reps", "3", "--jitter-deg", "1.0", "--seed", "11"]);

    let output = cli()
        .args(["replay", "--input"])
        .arg(&path)
        .output()
        .expect("failed to run curl_cli replay");
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let summary: Value = serde_json::from_str(stdout.trim()).expect("summary JSON");
    assert_eq!(summary["phase"], "complete");
    assert_eq!(summary["reps"], 3);
    assert!(summary["baseline"]["angle"].is_number());
    assert!(summary["report"]["is_full_range"].as_bool().unwrap_or(false));
    assert!(!summary["tips"].as_array().expect("tips").is_empty());
    assert_eq!(summary["rep_reports"].as_array().map(Vec::len), Some(3));
}

#[test]
fn replay_streams_events_before_summary() {
    let path = temp_file("events");
    synth_to(&path, &["--reps", "3"]);

    let output = cli()
        .args(["replay", "--events", "--input"])
        .arg(&path)
        .output()
        .expect("failed to run curl_cli replay --events");
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let first: Value =
        serde_json::from_str(stdout.lines().next().expect("event line")).expect("event JSON");
    assert_eq!(first["type"], "calibration_done");
    assert!(stdout.contains("\"type\":\"session_complete\""));
    assert!(stdout.contains("\"type\":\"analysis_ready\""));
}

#[test]
fn replay_with_fixed_baseline_and_too_few_reps_exits_2() {
    let path = temp_file("incomplete");
    synth_to(&path, &["--reps", "1"]);

    let output = cli()
        .args(["replay", "--baseline", "30", "--input"])
        .arg(&path)
        .output()
        .expect("failed to run curl_cli replay");
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let summary: Value = serde_json::from_str(stdout.trim()).expect("summary JSON");
    assert_eq!(summary["phase"], "training");
    assert_eq!(summary["reps"], 1);
    assert!(summary["report"].is_null());
}

#[test]
fn replay_rejects_invalid_config() {
    let samples = temp_file("cfg_samples");
    synth_to(&samples, &["--reps", "1"]);
    let config = temp_file("cfg");
    std::fs::write(&config, r#"{"training": {"total_reps": 0}}"#).expect("write config");

    let output = cli()
        .args(["replay", "--input"])
        .arg(&samples)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("failed to run curl_cli replay");
    let _ = std::fs::remove_file(&samples);
    let _ = std::fs::remove_file(&config);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("total_reps"), "stderr: {stderr}");
}
