use crate::inhibitor::{GatePhase, InhibitorState, RoundDuration};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Gate state published by the control loop once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GateSnapshot {
    pub timestamp_us: u64,
    pub cycle_count: u64,
    pub period_s: f64,
    pub target_period_s: f64,
    pub last_round_duration: RoundDuration,
    pub remaining_cooldown_rounds: u16,
    pub inhibited: bool,
    pub fine_observations: u64,
    pub coarse_observations: u64,
    pub inhibitions_armed: u64,
}

impl GateSnapshot {
    pub fn phase(&self) -> GatePhase {
        InhibitorState {
            last_round_duration: self.last_round_duration,
            remaining_cooldown_rounds: self.remaining_cooldown_rounds,
        }
        .phase()
    }
}

/// Single-writer buffer of three slots. Readers pin the slot they copy from
/// and the writer only fills slots that are neither published nor pinned.
struct TripleBuffer<T: Copy + Default> {
    slots: [UnsafeCell<T>; 3],
    readers: [AtomicUsize; 3],
    index: AtomicUsize,
}

unsafe impl<T: Copy + Default + Send> Send for TripleBuffer<T> {}
unsafe impl<T: Copy + Default + Send> Sync for TripleBuffer<T> {}

impl<T: Copy + Default> TripleBuffer<T> {
    fn new() -> Self {
        let slots = std::array::from_fn(|_| UnsafeCell::new(T::default()));
        Self {
            slots,
            readers: std::array::from_fn(|_| AtomicUsize::new(0)),
            index: AtomicUsize::new(0),
        }
    }

    /// Returns `false` when both spare slots are pinned and the value was
    /// dropped. Must only be called from one thread.
    fn write(&self, value: T) -> bool {
        let current = self.index.load(Ordering::SeqCst);
        for offset in 1..3 {
            let slot = (current + offset) % 3;
            if self.readers[slot].load(Ordering::SeqCst) == 0 {
                // SAFETY: the slot is not published and no reader has it
                // pinned; a reader that pins it later sees a different index
                // and retries.
                unsafe {
                    *self.slots[slot].get() = value;
                }
                self.index.store(slot, Ordering::SeqCst);
                return true;
            }
        }
        false
    }

    fn read(&self) -> T {
        loop {
            let idx = self.index.load(Ordering::SeqCst);
            self.readers[idx].fetch_add(1, Ordering::SeqCst);
            if self.index.load(Ordering::SeqCst) == idx {
                // SAFETY: the slot is pinned and was published, so the
                // writer will not touch it until the pin is released.
                let value = unsafe { *self.slots[idx].get() };
                self.readers[idx].fetch_sub(1, Ordering::SeqCst);
                return value;
            }
            self.readers[idx].fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Lock-free hand-off of the latest gate snapshot from the control loop to
/// telemetry readers.
pub struct StateExchange {
    gate_state: TripleBuffer<GateSnapshot>,
}

impl StateExchange {
    pub fn new() -> Self {
        Self {
            gate_state: TripleBuffer::new(),
        }
    }

    /// Called by the control loop every cycle (non-blocking). Only one
    /// thread may publish. Returns `false` if the snapshot was skipped
    /// because readers held both spare slots.
    pub fn publish(&self, snapshot: GateSnapshot) -> bool {
        self.gate_state.write(snapshot)
    }

    /// Called by telemetry threads
    pub fn read(&self) -> GateSnapshot {
        self.gate_state.read()
    }
}

impl Default for StateExchange {
    fn default() -> Self {
        Self::new()
    }
}
