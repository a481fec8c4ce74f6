//! Two-threshold repetition state machine with completion cooldown.
//!
//! `peak_threshold` and `bottom_threshold` form a hysteresis band: the arm
//! must travel nearly the full range before a repetition counts, so partial
//! oscillations never register. The cooldown suppresses double counts when
//! sensor noise dithers around the bottom threshold.

use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;

/// Position within a repetition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Ascending, peak not reached yet
    #[default]
    Down,
    /// Peak reached, waiting for the return to the bottom
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepetitionEvent {
    /// Rising crossing of the peak threshold
    Peak { timestamp_ms: u64 },
    /// Accepted completion; `count` is the new total
    RepComplete { count: u32, timestamp_ms: u64 },
    /// Completion inside the cooldown: phase reset to Down, count unchanged
    RepDebounced { timestamp_ms: u64, since_last_ms: u64 },
    /// Target reached; no further samples are processed until reset
    SessionComplete { count: u32 },
}

#[derive(Debug, Clone)]
pub struct RepetitionStateMachine {
    peak_threshold: f64,
    bottom_threshold: f64,
    total_reps: u32,
    cooldown_ms: u64,
    phase: Phase,
    count: u32,
    last_accepted_ms: Option<u64>,
    finished: bool,
}

impl RepetitionStateMachine {
    /// `config` is expected to be validated.
    pub fn new(config: &TrainingConfig) -> Self {
        Self {
            peak_threshold: config.peak_threshold,
            bottom_threshold: config.bottom_threshold,
            total_reps: config.total_reps,
            cooldown_ms: config.cooldown_ms,
            phase: Phase::Down,
            count: 0,
            last_accepted_ms: None,
            finished: false,
        }
    }

    /// Reset internal state (new session)
    pub fn reset(&mut self) {
        self.phase = Phase::Down;
        self.count = 0;
        self.last_accepted_ms = None;
        self.finished = false;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn total_reps(&self) -> u32 {
        self.total_reps
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Process one progress value
    ///
    /// Returns the events raised by this sample in emission order. The final
    /// repetition yields `RepComplete` followed by `SessionComplete`.
    pub fn process(&mut self, progress: f64, timestamp_ms: u64) -> Vec<RepetitionEvent> {
        if self.finished {
            return Vec::new();
        }

        match self.phase {
            Phase::Down if progress >= self.peak_threshold => {
                self.phase = Phase::Up;
                vec![RepetitionEvent::Peak { timestamp_ms }]
            }
            Phase::Up if progress <= self.bottom_threshold => {
                self.phase = Phase::Down;
                self.complete(timestamp_ms)
            }
            _ => Vec::new(),
        }
    }

    fn complete(&mut self, timestamp_ms: u64) -> Vec<RepetitionEvent> {
        if let Some(last) = self.last_accepted_ms {
            // Timestamps running backwards land inside the cooldown
            let since_last_ms = timestamp_ms.saturating_sub(last);
            if since_last_ms < self.cooldown_ms {
                return vec![RepetitionEvent::RepDebounced {
                    timestamp_ms,
                    since_last_ms,
                }];
            }
        }

        self.count += 1;
        self.last_accepted_ms = Some(timestamp_ms);
        let mut events = vec![RepetitionEvent::RepComplete {
            count: self.count,
            timestamp_ms,
        }];

        if self.count >= self.total_reps {
            self.finished = true;
            events.push(RepetitionEvent::SessionComplete { count: self.count });
        }
        events
    }
}
