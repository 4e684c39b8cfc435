//! Wall and monotonic time sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now_utc(&self) -> DateTime<Utc>;
    /// Current monotonic instant; only differences are meaningful.
    fn monotonic(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic(&self) -> Instant {
        Instant::now()
    }
}

/// Frozen clock that only moves when told to. Both readings advance together.
#[derive(Debug)]
pub struct ManualClock {
    wall_base: DateTime<Utc>,
    mono_base: Instant,
    offset_nanos: AtomicU64,
}

impl ManualClock {
    pub fn new(wall_base: DateTime<Utc>) -> Self {
        Self {
            wall_base,
            mono_base: Instant::now(),
            offset_nanos: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn offset(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::Relaxed))
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        let offset = chrono::Duration::from_std(self.offset()).unwrap_or(chrono::Duration::zero());
        self.wall_base + offset
    }

    fn monotonic(&self) -> Instant {
        self.mono_base + self.offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_is_frozen_until_advanced() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(base);
        let m0 = clock.monotonic();

        assert_eq!(clock.now_utc(), base);
        assert_eq!(clock.monotonic(), m0);

        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.monotonic() - m0, Duration::from_millis(1500));
        assert_eq!(clock.now_utc(), base + chrono::Duration::milliseconds(1500));
    }
}
