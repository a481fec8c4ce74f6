// Sample queue - decouples sensor callbacks from session processing
//
// Sensor callbacks push into an unbounded channel without blocking; a
// single consumer task drains it in arrival order. While the stream is
// quiet the consumer polls the calibration wall-clock bound.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::SessionError;
use crate::sensor::{OrientationReading, RawSample};
use crate::session::SessionController;

/// How long the consumer waits for a sample before checking calibration expiry
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Input accepted by the sample queue
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorMessage {
    Angle(RawSample),
    Orientation(OrientationReading),
}

/// Producer half, cheap to clone into sensor callbacks
#[derive(Clone)]
pub struct SampleFeed {
    tx: mpsc::UnboundedSender<SensorMessage>,
}

impl SampleFeed {
    /// Queue a raw angle sample
    ///
    /// Returns `false` once the consumer has shut down.
    pub fn push(&self, sample: RawSample) -> bool {
        self.tx.send(SensorMessage::Angle(sample)).is_ok()
    }

    /// Queue a device orientation reading; the session picks the axis
    pub fn push_orientation(&self, reading: OrientationReading) -> bool {
        self.tx.send(SensorMessage::Orientation(reading)).is_ok()
    }
}

/// Consumer half, handed to [`run_sample_loop`]
pub struct SampleInbox {
    rx: mpsc::UnboundedReceiver<SensorMessage>,
    poll_interval: Duration,
}

impl SampleInbox {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }
}

/// Create a connected feed/inbox pair
pub fn sample_channel() -> (SampleFeed, SampleInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        SampleFeed { tx },
        SampleInbox {
            rx,
            poll_interval: DEFAULT_POLL_INTERVAL,
        },
    )
}

/// Drain the inbox into the session until every feed is dropped
///
/// # Returns
/// Number of messages handed to the session.
///
/// # Errors
/// `SessionError::StatePoisoned` if the session lock is poisoned; the loop
/// stops on the first such error.
pub async fn run_sample_loop(
    session: Arc<SessionController>,
    mut inbox: SampleInbox,
) -> Result<u64, SessionError> {
    let mut handled = 0u64;
    tracing::debug!(
        poll_ms = inbox.poll_interval.as_millis() as u64,
        "sample loop started"
    );

    loop {
        match tokio::time::timeout(inbox.poll_interval, inbox.rx.recv()).await {
            Ok(Some(message)) => {
                match message {
                    SensorMessage::Angle(sample) => session.handle_sample(sample)?,
                    SensorMessage::Orientation(reading) => session.handle_orientation(reading)?,
                };
                handled += 1;
            }
            Ok(None) => break,
            Err(_) => {
                if session.expire_calibration()? {
                    tracing::warn!("calibration closed by wall-clock timeout");
                }
            }
        }
    }

    tracing::info!(handled, "sample loop finished");
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::events::TrainingEvent;
    use crate::sensor::{ManualTimeSource, StaticPermission};
    use crate::session::SessionPhase;

    #[test]
    fn test_push_after_consumer_dropped() {
        let (feed, inbox) = sample_channel();
        drop(inbox);
        assert!(!feed.push(RawSample::new(0.0, 0)));
    }

    #[tokio::test]
    async fn test_loop_processes_in_order_and_stops() {
        let mut config = AppConfig::default();
        config.calibration.min_samples = 3;
        config.calibration.duration_ms = 100;
        let session = Arc::new(SessionController::new(config).unwrap());
        session
            .start_calibration(&StaticPermission::granted())
            .unwrap();

        let (feed, inbox) = sample_channel();
        for (i, angle) in [10.0, 11.0, 12.0, 11.0].iter().enumerate() {
            assert!(feed.push(RawSample::new(*angle, i as u64 * 20)));
        }
        // Closes the window
        feed.push(RawSample::new(11.0, 200));
        drop(feed);

        let handled = run_sample_loop(Arc::clone(&session), inbox).await.unwrap();
        assert_eq!(handled, 5);
        assert_eq!(session.phase().unwrap(), SessionPhase::Ready);
        assert_eq!(session.baseline().unwrap().map(|b| b.angle()), Some(11.0));
    }

    #[tokio::test]
    async fn test_idle_loop_expires_stalled_calibration() {
        let clock = Arc::new(ManualTimeSource::new());
        let session = Arc::new(
            SessionController::with_time_source(AppConfig::default(), clock.clone()).unwrap(),
        );
        let mut events = session.subscribe();
        session
            .start_calibration(&StaticPermission::granted())
            .unwrap();

        let (feed, inbox) = sample_channel();
        let task = tokio::spawn(run_sample_loop(
            Arc::clone(&session),
            inbox.with_poll_interval(Duration::from_millis(5)),
        ));

        feed.push(RawSample::new(5.0, 0));
        clock.advance(Duration::from_millis(3_000));

        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, TrainingEvent::CalibrationFailed { code: 2001, .. }));
        assert_eq!(session.phase().unwrap(), SessionPhase::Idle);

        drop(feed);
        assert_eq!(task.await.unwrap().unwrap(), 1);
    }
}
