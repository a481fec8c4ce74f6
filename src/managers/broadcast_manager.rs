// EventBroadcaster: tokio broadcast channel for training events
// Single Responsibility: event fan-out to any number of subscribers

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::events::TrainingEvent;

/// Default buffer: a few seconds of per-sample progress at 60 Hz
const DEFAULT_CAPACITY: usize = 256;

/// Fans training events out to subscribers
///
/// Publishing never blocks and never fails: with no subscriber the event is
/// dropped, and a subscriber that falls more than `capacity` events behind
/// skips the oldest ones (lagged receiver). The sample path therefore never
/// waits on UI or haptic consumers.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<TrainingEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: TrainingEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("[Broadcast] No subscribers for training event");
        }
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TrainingEvent> {
        self.tx.subscribe()
    }

    /// Subscribe as an async stream, skipping over lag gaps
    pub fn stream(&self) -> impl Stream<Item = TrainingEvent> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(err) => {
                log::warn!("[Broadcast] Event subscriber lagged: {}", err);
                None
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
