use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of "now" for the cache, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self
            .offset
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self
            .offset
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.start + offset
    }
}

/// Single-entry cache that forgets its value once `ttl` has elapsed.
///
/// Holds no lock of its own; the owner decides how access is serialized.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    entry: Option<(T, Instant)>,
}

impl<T> TtlCache<T> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// The cached value if it was stored less than `ttl` before `now`.
    #[must_use]
    pub fn get(&self, now: Instant) -> Option<&T> {
        let (value, stored_at) = self.entry.as_ref()?;
        (now.saturating_duration_since(*stored_at) < self.ttl).then_some(value)
    }

    pub fn put(&mut self, value: T, now: Instant) {
        self.entry = Some((value, now));
    }
}
