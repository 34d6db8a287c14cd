//! Speed-stability gate for a turntable ball-release mechanism.
//!
//! The [`Inhibitor`] withholds ball release for a fixed number of coarse
//! sensor rounds whenever the fine sensor sees the rotation period change
//! too abruptly. The rest of the crate wires sensors into it: a turntable
//! I/O abstraction, a simulated turntable, and a single-threaded gate loop
//! that publishes snapshots for telemetry.

pub mod config;
pub mod control_loop;
pub mod hal;
#[cfg(feature = "simulation")]
pub mod hal_sim;
pub mod inhibitor;
mod inhibitor_proptest;
pub mod shared;
pub mod sink;
pub mod sync;
pub mod tags;

pub use config::{ConfigError, InhibitorConfig};
pub use control_loop::{DisturbanceSchedule, GateConfig, GateLoop, GateStats};
pub use hal::{SensorEvent, TurntableIO};
#[cfg(feature = "simulation")]
pub use hal_sim::SimulatedTurntable;
pub use inhibitor::{GatePhase, Inhibitor, InhibitorState, RoundDuration, Stability};
pub use shared::SharedInhibitor;
pub use sink::{Cause, InhibitionEvent, InhibitionSink, LogSink, NoopSink, RecordingSink};
pub use sync::{GateSnapshot, StateExchange};
