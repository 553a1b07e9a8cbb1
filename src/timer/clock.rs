use std::time::Instant;

use chrono::{DateTime, Utc};

/// Non-decreasing millisecond counter used for pause/resume bookkeeping.
/// Immune to wall-clock adjustments; only deltas between samples are
/// meaningful.
pub trait MonotonicClock {
    fn sample_ms(&self) -> u64;
}

/// Wall-clock reading used to resolve until-mode targets. Kept separate from
/// the monotonic source so tests can pin the current instant.
pub trait WallClock {
    fn now_utc(&self) -> DateTime<Utc>;
}

pub struct SystemMonotonicClock {
    anchor: Instant,
}

impl SystemMonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemMonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemMonotonicClock {
    fn sample_ms(&self) -> u64 {
        u64::try_from(self.anchor.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed-instant wall clock for deterministic tests.
#[cfg(test)]
pub struct FixedWallClock(pub DateTime<Utc>);

#[cfg(test)]
impl WallClock for FixedWallClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}
