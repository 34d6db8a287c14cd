use crate::config::{ConfigError, InhibitorConfig};
use crate::inhibitor::{Inhibitor, InhibitorState, RoundDuration, Stability};
use crate::sink::{InhibitionSink, NoopSink};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Inhibitor shared between contexts that feed it concurrently, e.g. two
/// independent sensor interrupt handlers. Every operation runs under one
/// lock so transitions apply strictly in sequence.
pub struct SharedInhibitor<S = NoopSink> {
    inner: Mutex<Inhibitor<S>>,
}

impl SharedInhibitor<NoopSink> {
    pub fn new(config: InhibitorConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_inhibitor(Inhibitor::new(config)?))
    }
}

impl<S: InhibitionSink> SharedInhibitor<S> {
    pub fn from_inhibitor(inhibitor: Inhibitor<S>) -> Self {
        Self {
            inner: Mutex::new(inhibitor),
        }
    }

    // State is plain data and each transition is a single store, so a
    // panic in another holder cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, Inhibitor<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn feed_fine(&self, duration: RoundDuration) -> Stability {
        self.lock().feed_fine(duration)
    }

    pub fn feed_coarse(&self, duration: RoundDuration) {
        self.lock().feed_coarse(duration);
    }

    pub fn is_inhibited(&self) -> bool {
        self.lock().is_inhibited()
    }

    pub fn snapshot(&self) -> InhibitorState {
        self.lock().state()
    }

    pub fn into_inner(self) -> Inhibitor<S> {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_feeds_keep_invariants() {
        let shared = Arc::new(SharedInhibitor::new(InhibitorConfig::default()).unwrap());

        let fine = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..1000u64 {
                    // Alternate between two speeds far enough apart to arm.
                    let duration = if i % 2 == 0 { 1000 } else { 1500 };
                    shared.feed_fine(duration);
                    assert!(shared.snapshot().remaining_cooldown_rounds <= 2);
                }
            })
        };
        let coarse = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..1000 {
                    shared.feed_coarse(1000);
                    assert!(shared.snapshot().remaining_cooldown_rounds <= 2);
                }
            })
        };

        fine.join().unwrap();
        coarse.join().unwrap();

        shared.feed_coarse(1500);
        shared.feed_coarse(1500);
        assert!(!shared.is_inhibited());
        assert_eq!(shared.snapshot().last_round_duration, 1500);
    }

    #[test]
    fn into_inner_returns_current_state() {
        let shared = SharedInhibitor::new(InhibitorConfig::default()).unwrap();
        shared.feed_fine(900);
        let inhibitor = shared.into_inner();
        assert_eq!(inhibitor.last_round_duration(), 900);
        assert!(inhibitor.is_inhibited());
    }
}
