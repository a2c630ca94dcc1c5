//! Shared block of atomic cells backing one logical circuit

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::types::{CircuitSnapshot, CircuitState};

/// Fixed-size block of atomic cells holding the observable circuit state.
///
/// One block exists per protected resource. Every execution context that
/// should cooperate on the same circuit holds an `Arc<SharedState>` handle
/// to the same block; all access goes through atomic loads, stores and
/// read-modify-write operations, never a lock.
///
/// Only per-cell atomicity is guaranteed. A reader may observe the state
/// cell together with a failure count updated by a race that happened
/// afterward; callers must base each decision on a single cell.
#[derive(Debug)]
pub struct SharedState {
    /// Consecutive failures since the last recorded success
    failure_count: AtomicU32,
    /// Milliseconds since `epoch` of the most recent failure, 0 = none yet
    last_failure_ms: AtomicU64,
    /// Encoded [`CircuitState`] tag
    state: AtomicU8,
    /// Anchor for the monotonic millisecond clock
    epoch: Instant,
}

impl SharedState {
    /// Allocate a fresh block: closed, zero failures, no failure recorded.
    pub fn new() -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            last_failure_ms: AtomicU64::new(0),
            state: AtomicU8::new(CircuitState::Closed.tag()),
            epoch: Instant::now(),
        }
    }

    /// Current state decoded from the tag cell.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_tag(self.state.load(Ordering::Acquire))
    }

    /// Consecutive failures since the last recorded success.
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Acquire)
    }

    /// Time of the most recent recorded failure, if any.
    pub fn last_failure(&self) -> Option<Instant> {
        let ms = self.last_failure_ms.load(Ordering::Acquire);
        if ms == 0 {
            return None;
        }
        self.epoch.checked_add(Duration::from_millis(ms))
    }

    /// Independent per-cell reads of the whole block.
    pub fn snapshot(&self) -> CircuitSnapshot {
        CircuitSnapshot {
            state: self.state(),
            failure_count: self.failure_count(),
            last_failure: self.last_failure(),
        }
    }

    pub(crate) fn set_state(&self, next: CircuitState) {
        self.state.store(next.tag(), Ordering::Release);
    }

    /// Store `next` and report what was there before.
    pub(crate) fn swap_state(&self, next: CircuitState) -> CircuitState {
        CircuitState::from_tag(self.state.swap(next.tag(), Ordering::AcqRel))
    }

    /// Move `from` to `to`; false if another context got there first.
    pub(crate) fn try_transition(&self, from: CircuitState, to: CircuitState) -> bool {
        self.state
            .compare_exchange(from.tag(), to.tag(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Record one failure and return the post-increment count.
    pub(crate) fn record_failure(&self) -> u32 {
        let failures = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;
        // 0 is reserved for "no failure yet"
        self.last_failure_ms
            .store(self.now_ms().max(1), Ordering::Release);
        failures
    }

    pub(crate) fn reset_failures(&self) {
        self.failure_count.store(0, Ordering::Release);
    }

    /// Milliseconds elapsed since the most recent failure, if any.
    pub(crate) fn millis_since_last_failure(&self) -> Option<u64> {
        let ms = self.last_failure_ms.load(Ordering::Acquire);
        if ms == 0 {
            None
        } else {
            Some(self.now_ms().saturating_sub(ms))
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
