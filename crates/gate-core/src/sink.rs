//! Diagnostic hooks for the release gate.
//!
//! The inhibitor never performs I/O itself. Whoever owns it injects a sink
//! that decides where inhibition events go: the `log` facade, an audit
//! trail, metrics, or nowhere at all.

use crate::inhibitor::RoundDuration;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Why the cooldown was (re)armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    /// Consecutive round durations differed by more than the threshold.
    SpeedChange,
    /// The fine sensor reported a zero-length round.
    ZeroDuration,
}

/// Emitted every time a fine observation arms the cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InhibitionEvent {
    pub previous: RoundDuration,
    pub current: RoundDuration,
    /// `None` when the relative change is undefined (zero-length round).
    pub relative_change: Option<f64>,
    pub cooldown_rounds: u16,
    pub cause: Cause,
}

pub trait InhibitionSink {
    fn on_armed(&mut self, event: &InhibitionEvent);

    /// Called when the last cooldown round elapses.
    fn on_cleared(&mut self, _last_round_duration: RoundDuration) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl InhibitionSink for NoopSink {
    fn on_armed(&mut self, _event: &InhibitionEvent) {}
}

/// Routes inhibition events through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl InhibitionSink for LogSink {
    fn on_armed(&mut self, event: &InhibitionEvent) {
        match event.cause {
            Cause::SpeedChange => log::warn!(
                "inhibition armed: last round {} us, this round {} us, change {:.4}, cooldown {} rounds",
                event.previous,
                event.current,
                event.relative_change.unwrap_or(f64::NAN),
                event.cooldown_rounds
            ),
            Cause::ZeroDuration => log::warn!(
                "inhibition armed: zero-length round after {} us, cooldown {} rounds",
                event.previous,
                event.cooldown_rounds
            ),
        }
    }

    fn on_cleared(&mut self, last_round_duration: RoundDuration) {
        log::info!("inhibition cleared at round duration {} us", last_round_duration);
    }
}

/// Collects events in memory. Clones share the same buffer, so a test can
/// keep one handle while the inhibitor owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    armed: Arc<Mutex<Vec<InhibitionEvent>>>,
    cleared: Arc<Mutex<Vec<RoundDuration>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed(&self) -> Vec<InhibitionEvent> {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cleared(&self) -> Vec<RoundDuration> {
        self.cleared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl InhibitionSink for RecordingSink {
    fn on_armed(&mut self, event: &InhibitionEvent) {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
    }

    fn on_cleared(&mut self, last_round_duration: RoundDuration) {
        self.cleared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(last_round_duration);
    }
}
