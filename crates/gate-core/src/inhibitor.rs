//! Ball-release inhibition on unstable turntable speed.
//!
//! Two sensors drive the gate. The fine (light) sensor reports often enough
//! to notice a speed change quickly, so it decides *when* to inhibit. The
//! coarse (hall) sensor reports once per round and is what the release-time
//! calculation is tied to, so it decides *how long* inhibition lasts: a
//! fixed number of coarse rounds after the most recent disturbance.

use crate::config::{ConfigError, InhibitorConfig};
use crate::sink::{Cause, InhibitionEvent, InhibitionSink, NoopSink};
use serde::{Deserialize, Serialize};

/// Time between two consecutive transitions of a sensor, in microseconds.
pub type RoundDuration = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InhibitorState {
    pub last_round_duration: RoundDuration,
    pub remaining_cooldown_rounds: u16,
}

impl InhibitorState {
    pub fn is_inhibited(&self) -> bool {
        self.remaining_cooldown_rounds != 0
    }

    pub fn phase(&self) -> GatePhase {
        match self.remaining_cooldown_rounds {
            0 => GatePhase::Uninhibited,
            remaining => GatePhase::Inhibited { remaining },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum GatePhase {
    #[default]
    Uninhibited,
    Inhibited {
        remaining: u16,
    },
}

/// Verdict on a single fine observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Stable,
    /// The cooldown was (re)armed by this observation.
    Disturbed,
}

/// Relative change of `current` against `previous`, measured against the
/// new observation. `None` for a zero-length round.
pub fn relative_change(previous: RoundDuration, current: RoundDuration) -> Option<f64> {
    if current == 0 {
        return None;
    }
    Some(previous.abs_diff(current) as f64 / current as f64)
}

#[derive(Debug)]
pub struct Inhibitor<S = NoopSink> {
    config: InhibitorConfig,
    state: InhibitorState,
    sink: S,
}

impl Inhibitor<NoopSink> {
    pub fn new(config: InhibitorConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, NoopSink)
    }
}

impl Default for Inhibitor<NoopSink> {
    fn default() -> Self {
        Self {
            config: InhibitorConfig::default(),
            state: InhibitorState::default(),
            sink: NoopSink,
        }
    }
}

impl<S: InhibitionSink> Inhibitor<S> {
    pub fn with_sink(config: InhibitorConfig, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: InhibitorState::default(),
            sink,
        })
    }

    /// Feed the duration of the round just completed by the fine sensor.
    ///
    /// A zero-length round cannot be compared against anything; it is
    /// treated as a sensor glitch and always arms the cooldown. It is still
    /// recorded as the last duration, so the next real round (relative
    /// change 1.0) arms it again.
    pub fn feed_fine(&mut self, duration: RoundDuration) -> Stability {
        let previous = self.state.last_round_duration;
        let change = relative_change(previous, duration);

        let cause = match change {
            None => Some(Cause::ZeroDuration),
            Some(change) if change > self.config.relative_threshold => Some(Cause::SpeedChange),
            Some(_) => None,
        };

        let verdict = match cause {
            Some(cause) => {
                // A fresh disturbance restarts the full window; it never stacks.
                self.state.remaining_cooldown_rounds = self.config.cooldown_rounds;
                self.sink.on_armed(&InhibitionEvent {
                    previous,
                    current: duration,
                    relative_change: change,
                    cooldown_rounds: self.config.cooldown_rounds,
                    cause,
                });
                Stability::Disturbed
            }
            None => Stability::Stable,
        };

        self.state.last_round_duration = duration;
        verdict
    }

    /// Count down one cooldown round. Only the event matters, the measured
    /// duration is not used.
    pub fn feed_coarse(&mut self, _duration: RoundDuration) {
        if self.state.remaining_cooldown_rounds > 0 {
            self.state.remaining_cooldown_rounds -= 1;
            if self.state.remaining_cooldown_rounds == 0 {
                self.sink.on_cleared(self.state.last_round_duration);
            }
        }
    }

    pub fn is_inhibited(&self) -> bool {
        self.state.is_inhibited()
    }

    pub fn state(&self) -> InhibitorState {
        self.state
    }

    pub fn phase(&self) -> GatePhase {
        self.state.phase()
    }

    pub fn remaining_cooldown_rounds(&self) -> u16 {
        self.state.remaining_cooldown_rounds
    }

    pub fn last_round_duration(&self) -> RoundDuration {
        self.state.last_round_duration
    }

    pub fn config(&self) -> &InhibitorConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
