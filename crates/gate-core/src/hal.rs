use crate::inhibitor::RoundDuration;

/// A completed measurement from one of the two rotation sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    /// Light sensor: round duration derived from the latest mark interval.
    Fine(RoundDuration),
    /// Hall sensor: one full mechanical round.
    Coarse(RoundDuration),
}

pub trait TurntableIO: Send {
    fn step(&mut self, dt_s: f64);
    /// Next pending sensor event, in the order the transitions happened.
    fn poll_event(&mut self) -> Option<SensorEvent>;
    fn set_target_period(&mut self, period_s: f64);
    fn target_period(&self) -> f64;
    fn period(&self) -> f64;
    fn is_healthy(&self) -> bool;
}
