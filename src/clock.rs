use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the `dt` capture timestamp stamped on every event.
pub trait Clock: Send + Sync {
    /// Current time as milliseconds since the UNIX epoch.
    fn now_millis(&self) -> u64;
}

/// Wall-clock time.
///
/// ```
/// # use cloudpelican::clock::{Clock, SystemClock};
/// let clock = SystemClock;
/// // Any time after 2020-01-01.
/// assert!(clock.now_millis() > 1_577_836_800_000);
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        epoch_millis()
    }
}

/// A clock that only moves when told to.
///
/// Useful for hosts that replay events and for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub const fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Milliseconds since the UNIX epoch, or 0 if the system clock is set
/// before it.
#[inline]
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
