//! Navigation lock.
//!
//! # Responsibilities
//! - Reject public API navigations while another attempt is in flight
//! - Hand each attempt a ticket that releases the lock exactly once
//!
//! # Design Decisions
//! - The lock is advisory: direct host calls still reach the interceptor and
//!   take the lock over with a fresh generation
//! - Release is generation-scoped, so a stale ticket never clears a newer
//!   holder
//! - Tickets release on `Drop`; ownership is the exactly-once guarantee

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

const FREE: u64 = 0;

#[derive(Debug, Default)]
struct LockState {
    /// Generation of the current holder, `FREE` when nobody holds the lock.
    holder: AtomicU64,
    generations: AtomicU64,
}

/// One-per-router navigation lock.
#[derive(Debug, Clone, Default)]
pub struct NavigationLock {
    state: Arc<LockState>,
}

impl NavigationLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.state.holder.load(Ordering::Acquire) != FREE
    }

    /// Take the lock for a new attempt.
    ///
    /// Never fails: a holder that is still in flight is superseded.
    pub fn acquire(&self) -> LockTicket {
        let generation = self.state.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = self.state.holder.swap(generation, Ordering::AcqRel);
        if previous != FREE {
            tracing::debug!(previous, generation, "navigation lock superseded by a direct host call");
        }
        metrics::set_lock_held(true);
        LockTicket {
            state: self.state.clone(),
            generation,
        }
    }
}

/// Proof of holding the lock for one attempt. Dropping it releases.
pub struct LockTicket {
    state: Arc<LockState>,
    generation: u64,
}

impl LockTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Release explicitly. Equivalent to dropping the ticket.
    pub fn release(self) {}
}

impl Drop for LockTicket {
    fn drop(&mut self) {
        let released = self
            .state
            .holder
            .compare_exchange(self.generation, FREE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if released {
            metrics::set_lock_held(false);
        } else {
            tracing::trace!(generation = self.generation, "stale lock ticket dropped");
        }
    }
}

impl fmt::Debug for LockTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockTicket")
            .field("generation", &self.generation)
            .finish()
    }
}
