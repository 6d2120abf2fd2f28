// Copyright 2026 confcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Timelike};

use super::{parse_time_suffix, IntervalError, Result, SEC_PER_DAY, SEC_PER_HOUR, SEC_PER_MIN};

/// Weekday (1 = Monday .. 7 = Sunday) and second of day of a UTC timestamp.
pub(crate) fn day_and_second(t: i64) -> (i64, i64) {
    match DateTime::from_timestamp(t, 0) {
        Some(dt) => (
            dt.weekday().number_from_monday() as i64,
            dt.num_seconds_from_midnight() as i64,
        ),
        None => (1, t.rem_euclid(SEC_PER_DAY)),
    }
}

/// A weekly time period, `d1[-d2],hh:mm-hh:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePeriod {
    /// First day, 1 = Monday.
    pub start_day: i64,
    /// Last day, inclusive.
    pub end_day: i64,
    /// Start second of day, inclusive.
    pub start_time: i64,
    /// End second of day, exclusive.
    pub end_time: i64,
}

fn parse_clock(s: &str) -> Option<i64> {
    let (h, m) = s.split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    let h: i64 = h.parse().ok()?;
    let m: i64 = m.parse().ok()?;
    if m > 59 || h > 24 || (h == 24 && m != 0) {
        return None;
    }
    Some(h * SEC_PER_HOUR + m * SEC_PER_MIN)
}

fn parse_day(s: &str) -> Option<i64> {
    match s.as_bytes() {
        [d @ b'1'..=b'7'] => Some((d - b'0') as i64),
        _ => None,
    }
}

impl FromStr for TimePeriod {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self> {
        let err = || IntervalError::Period(s.to_string());

        let (days, clock) = s.split_once(',').ok_or_else(err)?;
        let (start_day, end_day) = match days.split_once('-') {
            Some((a, b)) => (parse_day(a).ok_or_else(err)?, parse_day(b).ok_or_else(err)?),
            None => {
                let d = parse_day(days).ok_or_else(err)?;
                (d, d)
            }
        };
        let (a, b) = clock.split_once('-').ok_or_else(err)?;
        let start_time = parse_clock(a).ok_or_else(err)?;
        let end_time = parse_clock(b).ok_or_else(err)?;

        if start_day > end_day || start_time >= end_time {
            return Err(err());
        }

        Ok(Self {
            start_day,
            end_day,
            start_time,
            end_time,
        })
    }
}

impl TimePeriod {
    /// Returns `true` if `t` falls inside the period.
    pub fn contains(&self, t: i64) -> bool {
        let (day, sec) = day_and_second(t);
        self.start_day <= day && day <= self.end_day && self.start_time <= sec && sec < self.end_time
    }

    /// The nearest moment after `t` when the period starts or ends.
    pub fn next_boundary(&self, t: i64) -> i64 {
        let (day, sec) = day_and_second(t);

        let offset = if self.start_day <= day && day <= self.end_day && sec < self.end_time {
            if sec < self.start_time {
                self.start_time
            } else {
                self.end_time
            }
        } else if day < self.end_day {
            if day < self.start_day {
                SEC_PER_DAY * (self.start_day - day) + self.start_time
            } else {
                SEC_PER_DAY + self.start_time
            }
        } else {
            SEC_PER_DAY * (self.start_day + 7 - day) + self.start_time
        };

        t - sec + offset
    }
}

/// A flexible interval: `delay/period`.
///
/// While the period is active the item is polled every `delay` seconds instead of its simple delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexibleInterval {
    /// Delay in seconds while active.
    pub delay: i64,
    /// Active period.
    pub period: TimePeriod,
}

impl FromStr for FlexibleInterval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self> {
        let err = || IntervalError::Flexible(s.to_string());

        let (delay, period) = s.split_once('/').ok_or_else(err)?;
        let delay = parse_time_suffix(delay).map_err(|_| err())?;
        if delay > SEC_PER_DAY {
            return Err(err());
        }
        Ok(Self {
            delay,
            period: period.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-01 00:00:00 UTC, a Monday.
    const MONDAY: i64 = 1704067200;

    #[test]
    fn test_period_parse() {
        let p: TimePeriod = "1-5,9:00-18:30".parse().unwrap();
        assert_eq!(
            p,
            TimePeriod {
                start_day: 1,
                end_day: 5,
                start_time: 9 * 3600,
                end_time: 18 * 3600 + 1800,
            }
        );
        let p: TimePeriod = "7,00:00-24:00".parse().unwrap();
        assert_eq!((p.start_day, p.end_day, p.end_time), (7, 7, SEC_PER_DAY));

        for bad in ["0,00:00-01:00", "5-1,00:00-01:00", "1,10:00-09:00", "1,24:30-24:40", "1,00:60-01:00", "1"] {
            assert!(bad.parse::<TimePeriod>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_period_contains() {
        let p: TimePeriod = "1-5,09:00-18:00".parse().unwrap();
        assert!(!p.contains(MONDAY));
        assert!(p.contains(MONDAY + 9 * SEC_PER_HOUR));
        assert!(!p.contains(MONDAY + 18 * SEC_PER_HOUR));
        assert!(!p.contains(MONDAY + 5 * SEC_PER_DAY + 12 * SEC_PER_HOUR));
    }

    #[test]
    fn test_next_boundary() {
        let p: TimePeriod = "2-3,09:00-18:00".parse().unwrap();
        // Monday midnight: starts Tuesday 09:00.
        assert_eq!(p.next_boundary(MONDAY), MONDAY + SEC_PER_DAY + 9 * SEC_PER_HOUR);
        // Tuesday 10:00: ends Tuesday 18:00.
        let tuesday = MONDAY + SEC_PER_DAY;
        assert_eq!(p.next_boundary(tuesday + 10 * SEC_PER_HOUR), tuesday + 18 * SEC_PER_HOUR);
        // Tuesday 19:00: starts again Wednesday 09:00.
        assert_eq!(
            p.next_boundary(tuesday + 19 * SEC_PER_HOUR),
            tuesday + SEC_PER_DAY + 9 * SEC_PER_HOUR
        );
        // Wednesday 19:00: next Tuesday 09:00.
        assert_eq!(
            p.next_boundary(tuesday + SEC_PER_DAY + 19 * SEC_PER_HOUR),
            tuesday + 7 * SEC_PER_DAY + 9 * SEC_PER_HOUR
        );
    }

    #[test]
    fn test_flexible_parse() {
        let f: FlexibleInterval = "5m/1-7,00:00-24:00".parse().unwrap();
        assert_eq!(f.delay, 300);
        assert!("5m".parse::<FlexibleInterval>().is_err());
        assert!("2d/1-7,00:00-24:00".parse::<FlexibleInterval>().is_err());
    }
}
