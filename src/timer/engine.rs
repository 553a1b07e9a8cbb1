use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::config::{Config, Mode};
use crate::duration::parse_duration_ms;
use crate::timer::clock::WallClock;

const DAY_MS: u64 = 86_400_000;
const HOUR_MS: u64 = 3_600_000;
const MINUTE_MS: u64 = 60_000;

/// Running/paused bookkeeping for one timer session, separate from the
/// target-time configuration. Together with a target total and a monotonic
/// sample this fully determines remaining time.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RunState {
    pub running: bool,
    pub start_mark_ms: Option<u64>,
    pub paused_accum_ms: u64,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or continue the current run segment. Always sets the start
    /// mark, which keeps the read path free of hidden mutation.
    pub fn resume(&mut self, sample_ms: u64) {
        if self.running {
            return;
        }
        self.start_mark_ms = Some(sample_ms);
        self.running = true;
    }

    /// Close the current run segment, folding its elapsed time into the
    /// accumulator. Uses the sample in effect at the moment of the toggle.
    pub fn pause(&mut self, sample_ms: u64) {
        if !self.running {
            return;
        }
        if let Some(start) = self.start_mark_ms.take() {
            self.paused_accum_ms += sample_ms.saturating_sub(start);
        }
        self.running = false;
    }

    pub fn toggle(&mut self, sample_ms: u64) {
        if self.running {
            self.pause(sample_ms);
        } else {
            self.resume(sample_ms);
        }
    }

    /// Reverts to the full target: not running, no start mark, nothing
    /// accumulated.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Pure projection of `(target, run-state, monotonic sample)` onto remaining
/// milliseconds, clamped to zero at every branch.
pub fn remaining_ms(target_total_ms: u64, state: &RunState, sample_ms: u64) -> u64 {
    let base = target_total_ms.saturating_sub(state.paused_accum_ms);
    if !state.running {
        return base;
    }
    match state.start_mark_ms {
        // Running with no mark yet: the segment effectively begins at this
        // sample, so nothing has elapsed from it.
        None => base,
        Some(start) => base.saturating_sub(sample_ms.saturating_sub(start)),
    }
}

/// Full span being counted down, before pause accounting. Until-mode targets
/// are resolved against a fresh wall reading on every call, since wall time
/// moves independently of the monotonic sample.
pub fn target_total_ms(config: &Config, wall: &dyn WallClock) -> u64 {
    match config.mode {
        Mode::Duration => parse_duration_ms(config.d.as_deref().unwrap_or("")),
        Mode::Until => until_target_ms(
            config.date.as_deref(),
            config.time.as_deref(),
            config.tz.as_deref(),
            wall,
        ),
    }
}

/// Milliseconds from the current wall instant to the civil `date`+`time` in
/// the given IANA zone. Missing or unresolvable inputs yield 0; the zone
/// falls back to the host's local zone when unset or unrecognized.
pub fn until_target_ms(
    date: Option<&str>,
    time: Option<&str>,
    tz: Option<&str>,
    wall: &dyn WallClock,
) -> u64 {
    let Some(naive) = parse_civil_target(date, time) else {
        return 0;
    };
    let now = wall.now_utc();
    match tz.and_then(|name| name.parse::<chrono_tz::Tz>().ok()) {
        Some(zone) => civil_delta_ms(naive, now, &zone),
        None => civil_delta_ms(naive, now, &Local),
    }
}

fn parse_civil_target(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date?, "%Y-%m-%d").ok()?;
    let time = time?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .ok()?;
    Some(date.and_time(time))
}

fn civil_delta_ms<Tz>(naive: NaiveDateTime, now_utc: DateTime<Utc>, timezone: &Tz) -> u64
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    let Some(target) = resolve_local_datetime(timezone, naive) else {
        return 0;
    };
    let now = now_utc.with_timezone(timezone);
    let delta = target.timestamp_millis() - now.timestamp_millis();
    u64::try_from(delta).unwrap_or(0)
}

fn resolve_local_datetime<Tz>(timezone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(first, _second) => Some(first),
        LocalResult::None => None,
    }
}

/// Display decomposition of a remaining-time value.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Breakdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

pub fn breakdown(remaining_ms: u64) -> Breakdown {
    let days = remaining_ms / DAY_MS;
    let sub_day = remaining_ms % DAY_MS;
    Breakdown {
        days,
        hours: sub_day / HOUR_MS,
        minutes: (sub_day % HOUR_MS) / MINUTE_MS,
        seconds: (sub_day % MINUTE_MS) / 1_000,
    }
}

/// `HH:MM:SS` whenever the hour component or day count is nonzero, or when
/// the caller forces hours (compact previews always show the highest unit);
/// otherwise `MM:SS`.
pub fn format_clock(remaining_ms: u64, force_hours: bool) -> String {
    let parts = breakdown(remaining_ms);
    if parts.hours > 0 || parts.days > 0 || force_hours {
        format!("{:02}:{:02}:{:02}", parts.hours, parts.minutes, parts.seconds)
    } else {
        format!("{:02}:{:02}", parts.minutes, parts.seconds)
    }
}

/// Elapsed fraction of the target as a percentage in `[0, 100]`. Zero when
/// the target itself is zero.
pub fn progress_percent(remaining_ms: u64, total_ms: u64) -> f64 {
    if total_ms == 0 {
        return 0.0;
    }
    let elapsed = 100.0 - (remaining_ms as f64 / total_ms as f64) * 100.0;
    elapsed.clamp(0.0, 100.0)
}
