use crate::config::{ConfigError, InhibitorConfig};
use crate::hal::{SensorEvent, TurntableIO};
use crate::inhibitor::{Inhibitor, Stability};
use crate::sink::InhibitionSink;
use crate::sync::{GateSnapshot, StateExchange};
use std::sync::{atomic::AtomicBool, Arc};
use std::time::{Duration, Instant};

/// Periodic change of the drive target, used to exercise the gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisturbanceSchedule {
    pub every: Duration,
    /// Fractional change of the target period. Alternates between slowing
    /// down and speeding back up so the period stays bounded.
    pub step: f64,
}

#[derive(Clone, Debug)]
pub struct GateConfig {
    pub cycle_time: Duration,
    pub watchdog_timeout: Duration,
    pub inhibitor: InhibitorConfig,
    pub disturbance: Option<DisturbanceSchedule>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cycle_time: Duration::from_millis(1),
            watchdog_timeout: Duration::from_millis(100),
            inhibitor: InhibitorConfig::default(),
            disturbance: None,
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct GateStats {
    pub cycles_executed: u64,
    pub cycles_missed: u64,
    pub watchdog_resyncs: u64,
    pub max_jitter_us: u64,
    pub fine_observations: u64,
    pub coarse_observations: u64,
    pub inhibitions_armed: u64,
    /// Cycles in which release would have been withheld.
    pub inhibited_cycles: u64,
    pub disturbances_applied: u64,
}

/// Polls both rotation sensors from a single loop and gates release.
pub struct GateLoop<IO: TurntableIO, S: InhibitionSink> {
    io: IO,
    config: GateConfig,
    inhibitor: Inhibitor<S>,
    exchange: Arc<StateExchange>,
    stats: GateStats,
    sim_time: Duration,
    next_disturbance: Option<Duration>,
    slowing_down: bool,
}

impl<IO: TurntableIO, S: InhibitionSink> GateLoop<IO, S> {
    pub fn new(
        io: IO,
        config: GateConfig,
        sink: S,
        exchange: Arc<StateExchange>,
    ) -> Result<Self, ConfigError> {
        let inhibitor = Inhibitor::with_sink(config.inhibitor, sink)?;
        let next_disturbance = config.disturbance.map(|d| d.every);
        Ok(Self {
            io,
            config,
            inhibitor,
            exchange,
            stats: GateStats::default(),
            sim_time: Duration::ZERO,
            next_disturbance,
            slowing_down: true,
        })
    }

    pub fn run(&mut self, stop: &AtomicBool) {
        let mut next_cycle = Instant::now();

        while !stop.load(std::sync::atomic::Ordering::Relaxed) {
            let now = Instant::now();
            if now < next_cycle {
                std::thread::sleep(next_cycle - now);
            } else if now > next_cycle {
                self.stats.cycles_missed += 1;
                let overrun = now.duration_since(next_cycle);
                if overrun > self.config.watchdog_timeout {
                    log::warn!(
                        "gate loop overran by {} us, resynchronising",
                        overrun.as_micros()
                    );
                    self.stats.watchdog_resyncs += 1;
                    next_cycle = now;
                }
            }

            if !self.io.is_healthy() {
                log::error!("turntable reports unhealthy, stopping gate loop");
                break;
            }

            let cycle_start = Instant::now();
            self.cycle();

            let cycle_duration = cycle_start.elapsed();
            let jitter_us = cycle_duration
                .saturating_sub(self.config.cycle_time)
                .as_micros() as u64;
            self.stats.max_jitter_us = self.stats.max_jitter_us.max(jitter_us);

            next_cycle += self.config.cycle_time;
        }
    }

    /// Execute `cycles` cycles back to back, without pacing.
    pub fn run_cycles(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.cycle();
        }
    }

    fn cycle(&mut self) {
        self.io.step(self.config.cycle_time.as_secs_f64());
        self.sim_time += self.config.cycle_time;

        while let Some(event) = self.io.poll_event() {
            match event {
                SensorEvent::Fine(duration) => {
                    self.stats.fine_observations += 1;
                    if self.inhibitor.feed_fine(duration) == Stability::Disturbed {
                        self.stats.inhibitions_armed += 1;
                    }
                }
                SensorEvent::Coarse(duration) => {
                    self.stats.coarse_observations += 1;
                    self.inhibitor.feed_coarse(duration);
                }
            }
        }

        if self.inhibitor.is_inhibited() {
            self.stats.inhibited_cycles += 1;
        }
        // Takes effect on the drive from the next step.
        self.apply_disturbance();
        self.stats.cycles_executed += 1;

        let state = self.inhibitor.state();
        self.exchange.publish(GateSnapshot {
            timestamp_us: self.sim_time.as_micros() as u64,
            cycle_count: self.stats.cycles_executed,
            period_s: self.io.period(),
            target_period_s: self.io.target_period(),
            last_round_duration: state.last_round_duration,
            remaining_cooldown_rounds: state.remaining_cooldown_rounds,
            inhibited: state.is_inhibited(),
            fine_observations: self.stats.fine_observations,
            coarse_observations: self.stats.coarse_observations,
            inhibitions_armed: self.stats.inhibitions_armed,
        });
    }

    fn apply_disturbance(&mut self) {
        let (Some(schedule), Some(due)) = (self.config.disturbance, self.next_disturbance) else {
            return;
        };
        if self.sim_time < due {
            return;
        }

        let current = self.io.target_period();
        let target = if self.slowing_down {
            current * (1.0 + schedule.step)
        } else {
            current / (1.0 + schedule.step)
        };
        log::debug!(
            "disturbance: target period {:.4} s -> {:.4} s",
            current,
            target
        );
        self.io.set_target_period(target);
        self.slowing_down = !self.slowing_down;
        self.stats.disturbances_applied += 1;
        self.next_disturbance = Some(due + schedule.every);
    }

    pub fn is_inhibited(&self) -> bool {
        self.inhibitor.is_inhibited()
    }

    pub fn inhibitor(&self) -> &Inhibitor<S> {
        &self.inhibitor
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn stats(&self) -> &GateStats {
        &self.stats
    }
}
