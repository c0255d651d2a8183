//! Single-flight lock with a scoped guard.
//!
//! The lock is taken once both gates pass and released when the guard
//! drops — on every return path, and also when the caller drops the
//! `analyze` future mid-flight.

use super::state::StatusCell;
use crate::cooldown::Clock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub(crate) struct SingleFlight {
    held: AtomicBool,
}

impl SingleFlight {
    pub(crate) fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Take the lock, or `None` if another analysis holds it.
    pub(crate) fn try_acquire<'a>(
        &'a self,
        status: &'a StatusCell,
        clock: &'a dyn Clock,
    ) -> Option<FlightGuard<'a>> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                flight: self,
                status,
                clock,
            })
    }
}

pub(crate) struct FlightGuard<'a> {
    flight: &'a SingleFlight,
    status: &'a StatusCell,
    clock: &'a dyn Clock,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        // Normal exits have already moved the phase to Idle; this only
        // fires for an abandoned future.
        self.status.abandon_if_running(self.clock.now_ms());
        self.flight.held.store(false, Ordering::Release);
        log::debug!("[ANALYZE] Single-flight lock released");
    }
}
