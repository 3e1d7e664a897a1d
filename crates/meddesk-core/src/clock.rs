//! Regional (IST) wall-clock provider.
//!
//! Registration dates, times, and UHID month prefixes are always taken in
//! Indian Standard Time, regardless of the host timezone. IST has no DST,
//! so a fixed +05:30 offset is sufficient.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

/// Seconds east of UTC for IST (+05:30).
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is in range")
}

/// Source of regional wall-clock time.
pub trait Clock {
    /// Current IST date/time.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Registration date as `YYYY-MM-DD`.
    fn date_string(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }

    /// Registration time in 12-hour `HH:MM:SS AM/PM` form.
    fn time_string(&self) -> String {
        self.now().format("%I:%M:%S %p").to_string()
    }

    /// Two-digit year + two-digit month prefix used by UHIDs (`YYMM`).
    fn uhid_prefix(&self) -> String {
        self.now().format("%y%m").to_string()
    }
}

/// System clock converted to IST.
#[derive(Debug, Clone, Copy, Default)]
pub struct IstClock;

impl Clock for IstClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&ist())
    }
}

/// Clock pinned to a single IST instant, for month-rollover tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<FixedOffset>);

impl FixedClock {
    /// Pin the clock to an IST date/time. Panics on an invalid timestamp,
    /// which is acceptable for test setup.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        let instant = ist()
            .with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .expect("valid IST timestamp");
        FixedClock(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uhid_prefix_format() {
        let clock = FixedClock::at(2025, 6, 15, 10, 30, 0);
        assert_eq!(clock.uhid_prefix(), "2506");
        assert_eq!(clock.date_string(), "2025-06-15");
    }

    #[test]
    fn test_time_string_is_twelve_hour() {
        let clock = FixedClock::at(2025, 6, 15, 15, 30, 5);
        assert_eq!(clock.time_string(), "03:30:05 PM");

        let morning = FixedClock::at(2025, 6, 15, 0, 5, 0);
        assert_eq!(morning.time_string(), "12:05:00 AM");
    }

    #[test]
    fn test_ist_clock_is_offset_from_utc() {
        let now = IstClock.now();
        assert_eq!(now.offset().local_minus_utc(), IST_OFFSET_SECS);
    }
}
