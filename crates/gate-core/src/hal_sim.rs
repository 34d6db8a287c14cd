use crate::hal::{SensorEvent, TurntableIO};
use crate::inhibitor::RoundDuration;
use std::collections::VecDeque;

const MIN_PERIOD_S: f64 = 0.001;

/// Simulated turntable with a first-order drive and two rotation sensors.
#[derive(Debug, Clone)]
pub struct SimulatedTurntable {
    period_s: f64,
    target_period_s: f64,
    response_time_s: f64,

    marks_per_round: u32,
    time_s: f64,
    angle_revs: f64,
    last_mark_s: Option<f64>,
    last_round_s: Option<f64>,

    events: VecDeque<SensorEvent>,
}

impl SimulatedTurntable {
    pub fn new(period_s: f64, marks_per_round: u32) -> Self {
        let period_s = period_s.max(MIN_PERIOD_S);
        Self {
            period_s,
            target_period_s: period_s,
            response_time_s: 0.05,
            marks_per_round: marks_per_round.max(1),
            time_s: 0.0,
            angle_revs: 0.0,
            last_mark_s: None,
            last_round_s: None,
            events: VecDeque::new(),
        }
    }

    pub fn with_response_time(mut self, response_time_s: f64) -> Self {
        self.response_time_s = response_time_s.max(0.0);
        self
    }

    pub fn marks_per_round(&self) -> u32 {
        self.marks_per_round
    }

    fn to_duration(seconds: f64) -> RoundDuration {
        (seconds * 1_000_000.0).round() as RoundDuration
    }

    fn on_mark(&mut self, mark: u64, at_s: f64) {
        if let Some(prev) = self.last_mark_s {
            let round_s = (at_s - prev) * f64::from(self.marks_per_round);
            self.events
                .push_back(SensorEvent::Fine(Self::to_duration(round_s)));
        }
        self.last_mark_s = Some(at_s);

        if mark % u64::from(self.marks_per_round) == 0 {
            if let Some(prev) = self.last_round_s {
                self.events
                    .push_back(SensorEvent::Coarse(Self::to_duration(at_s - prev)));
            }
            self.last_round_s = Some(at_s);
        }
    }
}

impl Default for SimulatedTurntable {
    fn default() -> Self {
        Self::new(0.5, 8)
    }
}

impl TurntableIO for SimulatedTurntable {
    fn step(&mut self, dt_s: f64) {
        // Drive response.
        if self.response_time_s > 0.0 {
            let error = self.target_period_s - self.period_s;
            self.period_s += error * (1.0 - (-dt_s / self.response_time_s).exp());
        } else {
            self.period_s = self.target_period_s;
        }

        // Mark crossings, interpolated inside the step.
        let marks = f64::from(self.marks_per_round);
        let rate = 1.0 / self.period_s;
        let next_angle = self.angle_revs + rate * dt_s;
        let first = (self.angle_revs * marks).floor() as u64 + 1;
        let last = (next_angle * marks).floor() as u64;
        for mark in first..=last {
            let at_s = self.time_s + (mark as f64 / marks - self.angle_revs) / rate;
            self.on_mark(mark, at_s);
        }

        self.angle_revs = next_angle;
        self.time_s += dt_s;
    }

    fn poll_event(&mut self) -> Option<SensorEvent> {
        self.events.pop_front()
    }

    fn set_target_period(&mut self, period_s: f64) {
        self.target_period_s = period_s.max(MIN_PERIOD_S);
    }

    fn target_period(&self) -> f64 {
        self.target_period_s
    }

    fn period(&self) -> f64 {
        self.period_s
    }

    fn is_healthy(&self) -> bool {
        self.period_s.is_finite() && self.period_s >= MIN_PERIOD_S
    }
}
