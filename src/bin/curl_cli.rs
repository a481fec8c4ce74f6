use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use curl_trainer::analysis::{generate_tips, AnalysisReport, Tip};
use curl_trainer::calibration::Baseline;
use curl_trainer::config::AppConfig;
use curl_trainer::events::TrainingEvent;
use curl_trainer::sensor::{RawSample, StaticPermission};
use curl_trainer::session::{RepReport, SampleOutcome, SessionController, SessionPhase};
use curl_trainer::testing::{curl_session, CurlTraceSpec};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Parser, Debug)]
#[command(
    name = "curl_cli",
    about = "Synthetic trace generator and offline replay for the curl trainer"
)]
struct Cli {
    /// Log verbosely to stderr
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a JSON array of raw samples: calibration hold followed by curls
    Synth {
        #[arg(long, default_value_t = 3)]
        reps: u32,
        #[arg(long, default_value_t = 2000)]
        rep_ms: u64,
        #[arg(long, default_value_t = 20)]
        sample_ms: u64,
        #[arg(long, default_value_t = 0.0)]
        jitter_deg: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a sample file through a session and print a JSON summary
    Replay {
        #[arg(long)]
        input: PathBuf,
        /// JSON config file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip calibration and use this baseline angle
        #[arg(long)]
        baseline: Option<f64>,
        /// Print every event as a JSON line before the summary
        #[arg(long)]
        events: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    curl_trainer::init_logging(level);

    match cli.command {
        Commands::Synth {
            reps,
            rep_ms,
            sample_ms,
            jitter_deg,
            seed,
            output,
        } => run_synth(
            CurlTraceSpec {
                reps,
                rep_ms,
                sample_ms,
                jitter_deg,
                seed,
                ..CurlTraceSpec::default()
            },
            output,
        ),
        Commands::Replay {
            input,
            config,
            baseline,
            events,
        } => run_replay(input, config, baseline, events),
    }
}

fn run_synth(spec: CurlTraceSpec, output_path: Option<PathBuf>) -> Result<ExitCode> {
    if spec.sample_ms == 0 {
        bail!("--sample-ms must be > 0");
    }
    let samples = curl_session(&spec);
    let json = serde_json::to_string_pretty(&samples)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        eprintln!("{} samples written to {}", samples.len(), path.display());
    } else {
        println!("{json}");
    }
    Ok(ExitCode::from(0))
}

fn run_replay(
    input: PathBuf,
    config_path: Option<PathBuf>,
    baseline: Option<f64>,
    print_events: bool,
) -> Result<ExitCode> {
    let config = match config_path {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            AppConfig::from_json_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => AppConfig::default(),
    };

    let text =
        fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
    let samples: Vec<RawSample> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", input.display()))?;

    let session = SessionController::new(config).context("invalid configuration")?;
    let mut rx = session.subscribe();

    match baseline {
        Some(angle) => {
            let baseline =
                Baseline::fixed(angle).ok_or_else(|| anyhow!("baseline must be finite"))?;
            session.use_baseline(baseline)?;
            session.start_training()?;
        }
        None => session.start_calibration(&StaticPermission::granted())?,
    }

    for sample in samples {
        let outcome = session.handle_sample(sample)?;
        if let SampleOutcome::Calibrated(_) = outcome {
            session.start_training()?;
        }
        drain_events(&mut rx, print_events)?;
        if session.phase()? == SessionPhase::Complete {
            break;
        }
    }

    // Short recordings never close the window on their own
    if session.phase()? == SessionPhase::Calibrating {
        if session.cancel_calibration().is_ok() {
            session.start_training()?;
        }
        drain_events(&mut rx, print_events)?;
    }

    let phase = session.phase()?;
    let report = session.report()?;
    let summary = ReplaySummary {
        phase,
        reps: session.count()?,
        baseline: session.baseline()?,
        tips: report.as_ref().map(generate_tips).unwrap_or_default(),
        report,
        rep_reports: session.rep_reports()?,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if phase == SessionPhase::Complete {
        Ok(ExitCode::from(0))
    } else {
        Ok(ExitCode::from(2))
    }
}

fn drain_events(rx: &mut broadcast::Receiver<TrainingEvent>, print: bool) -> Result<()> {
    loop {
        match rx.try_recv() {
            Ok(event) => {
                if print {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                eprintln!("warning: {skipped} events dropped");
            }
            Err(_) => return Ok(()),
        }
    }
}

#[derive(Serialize)]
struct ReplaySummary {
    phase: SessionPhase,
    reps: u32,
    baseline: Option<Baseline>,
    report: Option<AnalysisReport>,
    tips: Vec<Tip>,
    rep_reports: Vec<RepReport>,
}
