// Curl Trainer Core - bicep curl repetition counter
// Orientation samples -> baseline calibration -> progress -> repetition
// state machine -> per-repetition motion quality analysis

// Module declarations
pub mod analysis;
pub mod calibration;
pub mod config;
pub mod debug;
pub mod error;
pub mod events;
pub mod managers;
pub mod sensor;
pub mod session;
pub mod testing;

// Re-exports for convenience
pub use analysis::{AnalysisReport, Phase, ProgressSample, Tip};
pub use calibration::Baseline;
pub use config::AppConfig;
pub use events::TrainingEvent;
pub use sensor::{AxisPreset, OrientationReading, RawSample, SensorAxis};
pub use session::{RepReport, SampleOutcome, SessionController, SessionPhase};

use once_cell::sync::OnceCell;

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install the fmt subscriber used by binaries and tests
///
/// Records emitted through the `log` facade are forwarded as well. Safe to
/// call more than once; only the first call has an effect. Also picks up
/// `CURL_TRACE` for the pipeline tracer.
pub fn init_logging(level: tracing::Level) {
    LOGGING.get_or_init(|| {
        if let Err(err) = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
        {
            eprintln!("logging already initialized: {err}");
        }
        debug::pipeline_tracer::init();
    });
}
