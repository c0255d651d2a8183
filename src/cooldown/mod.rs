//! Cooldown throttling — storage port, clock port, and the gate check.
//!
//! One timestamp is persisted: when the last accepted analysis *started*.
//! Storage is best-effort. A store that cannot read reports "no prior
//! timestamp" and a store that cannot write does nothing, so a broken
//! backend degrades to "always allowed" instead of blocking the user.

mod file_store;

pub use file_store::{FileCooldownStore, StoreError};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Key under which the last-initiation timestamp is stored.
pub const COOLDOWN_KEY: &str = "hairline_last_analysis_at";

/// Durable single-key timestamp record.
pub trait CooldownStore: Send + Sync {
    /// Last initiation time in ms since epoch, or `None` if unknown/unreadable.
    fn read(&self) -> Option<u64>;
    /// Record an initiation time. Failures are swallowed.
    fn write(&self, timestamp_ms: u64);
}

/// Wall clock in ms since epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Non-durable store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryCooldownStore {
    last: Mutex<Option<u64>>,
}

impl MemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp(ms: u64) -> Self {
        Self {
            last: Mutex::new(Some(ms)),
        }
    }
}

impl CooldownStore for MemoryCooldownStore {
    fn read(&self) -> Option<u64> {
        self.last.lock().ok().and_then(|guard| *guard)
    }

    fn write(&self, timestamp_ms: u64) {
        if let Ok(mut guard) = self.last.lock() {
            *guard = Some(timestamp_ms);
        }
    }
}

/// Time left before a new analysis may start, or `None` if allowed now.
///
/// A timestamp in the future (clock moved backwards) is treated as
/// "just started" so the wait never exceeds one full interval.
pub fn remaining(last_ms: Option<u64>, now_ms: u64, interval: Duration) -> Option<Duration> {
    let last = last_ms?;
    let elapsed = now_ms.saturating_sub(last);
    let interval_ms = interval.as_millis() as u64;
    (elapsed < interval_ms).then(|| Duration::from_millis(interval_ms - elapsed))
}

/// `now_ms + wait`, saturating instead of overflowing on absurd waits.
pub fn deadline_ms(now_ms: u64, wait: Duration) -> u64 {
    now_ms.saturating_add(u64::try_from(wait.as_millis()).unwrap_or(u64::MAX))
}

/// Whole seconds for display, rounded up so "0" only appears when allowed.
pub fn ceil_secs(d: Duration) -> u64 {
    let ms = d.as_millis() as u64;
    ms.div_ceil(1000)
}
