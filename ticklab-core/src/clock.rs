//! Session clock — composes a session timestamp from the runtime's discrete
//! date / time-of-day / sub-second fields.
//!
//! Decision logic only ever looks at minute-of-hour and second-of-minute, but
//! the millisecond component is kept so that timeouts and cooldowns can be
//! measured in fractional seconds.
//!
//! The clock never reads the host machine's time. Under replay the host clock
//! is unrelated to simulated time, so every timestamp must come from the
//! latest runtime event.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from composing a session timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("invalid trading date {0} (expected YYYYMMDD)")]
    InvalidDate(u32),

    #[error("invalid time of day {0} (expected HHMM)")]
    InvalidTime(u32),

    #[error("invalid sub-second field {0} (expected SSmmm below 60000)")]
    InvalidMillis(u32),
}

/// A point in session time, at millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionTime(NaiveDateTime);

/// Compose a session timestamp.
///
/// - `date`: trading date as `YYYYMMDD` (e.g. `20211008`)
/// - `time_of_day`: hour and minute as `HHMM` (e.g. `935` for 09:35)
/// - `millis`: seconds within the minute in milliseconds, `SSmmm` (e.g. `37500` for 37.5s)
pub fn now(date: u32, time_of_day: u32, millis: u32) -> Result<SessionTime, ClockError> {
    let day = NaiveDate::from_ymd_opt((date / 10_000) as i32, (date % 10_000) / 100, date % 100)
        .ok_or(ClockError::InvalidDate(date))?;
    if millis >= 60_000 {
        return Err(ClockError::InvalidMillis(millis));
    }
    let time = NaiveTime::from_hms_milli_opt(
        time_of_day / 100,
        time_of_day % 100,
        millis / 1_000,
        millis % 1_000,
    )
    .ok_or(ClockError::InvalidTime(time_of_day))?;
    Ok(SessionTime(NaiveDateTime::new(day, time)))
}

impl SessionTime {
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self(dt)
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Trading date in the runtime's `YYYYMMDD` encoding.
    pub fn trading_date(&self) -> u32 {
        let d = self.0.date();
        d.year() as u32 * 10_000 + d.month() * 100 + d.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    /// Time of day in the runtime's `HHMM` encoding.
    pub fn time_of_day(&self) -> u32 {
        self.hour() * 100 + self.minute()
    }

    /// Seconds within the minute in the runtime's `SSmmm` encoding.
    pub fn millis_of_minute(&self) -> u32 {
        self.second() * 1_000 + self.0.nanosecond() / 1_000_000
    }

    /// Signed elapsed seconds from `earlier` to `self` (negative if `earlier` is later).
    pub fn seconds_since(&self, earlier: SessionTime) -> f64 {
        (self.0 - earlier.0).num_milliseconds() as f64 / 1_000.0
    }

    /// Signed elapsed minutes from `earlier` to `self`, fractional.
    pub fn minutes_since(&self, earlier: SessionTime) -> f64 {
        self.seconds_since(earlier) / 60.0
    }

    /// Shift by a (possibly negative) number of milliseconds.
    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0 + chrono::Duration::milliseconds(millis))
    }
}

impl fmt::Display for SessionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_fields() {
        let t = now(20200723, 935, 37_500).unwrap();
        assert_eq!(t.hour(), 9);
        assert_eq!(t.minute(), 35);
        assert_eq!(t.second(), 37);
        assert_eq!(t.trading_date(), 20200723);
        assert_eq!((t.time_of_day(), t.millis_of_minute()), (935, 37_500));
        assert_eq!(t.to_string(), "2020-07-23 09:35:37.500");
    }

    #[test]
    fn fractional_seconds_are_retained() {
        let a = now(20211008, 1101, 0).unwrap();
        let b = now(20211008, 1101, 20_250).unwrap();
        assert_eq!(b.seconds_since(a), 20.25);
        assert_eq!(a.seconds_since(b), -20.25);
        assert!((b.minutes_since(a) - 20.25 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn crosses_hour_boundary() {
        let a = now(20211008, 1159, 59_000).unwrap();
        let b = now(20211008, 1200, 1_000).unwrap();
        assert_eq!(b.seconds_since(a), 2.0);
    }

    #[test]
    fn rejects_bad_fields() {
        assert_eq!(now(20211332, 900, 0), Err(ClockError::InvalidDate(20211332)));
        assert_eq!(now(20211008, 2460, 0), Err(ClockError::InvalidTime(2460)));
        assert_eq!(now(20211008, 960, 0), Err(ClockError::InvalidTime(960)));
        assert_eq!(now(20211008, 900, 60_000), Err(ClockError::InvalidMillis(60_000)));
    }

    #[test]
    fn ordering_follows_time() {
        let a = now(20211008, 900, 0).unwrap();
        let b = a.plus_millis(1);
        assert!(a < b);
    }
}
