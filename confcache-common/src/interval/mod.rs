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

//! Update interval expressions.
//!
//! An update interval is a simple delay optionally followed by `;`-separated custom intervals:
//!
//! ```text
//! 30s;50s/1-5,09:00-18:00;wd1-5h9
//! ```
//!
//! A custom interval starting with a digit is a flexible interval (`delay/period`), anything else is a scheduling
//! interval. All calendar computations are done in UTC.

mod flexible;
mod scheduling;

use std::str::FromStr;

pub use self::{
    flexible::{FlexibleInterval, TimePeriod},
    scheduling::SchedulingInterval,
};
use crate::error::{Error, ErrorKind};

/// Errors raised while parsing interval expressions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    /// A time value with an optional suffix.
    #[error("invalid time value: {0:?}")]
    TimeValue(String),
    /// The whole update interval.
    #[error("invalid update interval: {0:?}")]
    UpdateInterval(String),
    /// A `delay/period` flexible interval.
    #[error("invalid flexible interval: {0:?}")]
    Flexible(String),
    /// A `d[-d],hh:mm-hh:mm` time period.
    #[error("invalid time period: {0:?}")]
    Period(String),
    /// A `md..wd..h..m..s..` scheduling interval.
    #[error("invalid scheduling interval: {0:?}")]
    Scheduling(String),
}

impl From<IntervalError> for Error {
    fn from(e: IntervalError) -> Self {
        Error::new(ErrorKind::Parse, "malformed interval").with_source(e)
    }
}

/// Result type of interval parsing.
pub type Result<T> = std::result::Result<T, IntervalError>;

/// Seconds in a minute.
pub const SEC_PER_MIN: i64 = 60;
/// Seconds in an hour.
pub const SEC_PER_HOUR: i64 = 3600;
/// Seconds in a day.
pub const SEC_PER_DAY: i64 = 86400;
/// Seconds in a week.
pub const SEC_PER_WEEK: i64 = 7 * SEC_PER_DAY;
/// Seconds in a (non-leap) year.
pub const SEC_PER_YEAR: i64 = 365 * SEC_PER_DAY;

/// The "never" timestamp used for objects that cannot be scheduled.
pub const JAN_2038: i64 = 2145916800;

/// Parse a non-negative amount of time with an optional `s`, `m`, `h`, `d` or `w` suffix into seconds.
///
/// ```rust
/// # use confcache_common::interval::parse_time_suffix;
/// assert_eq!(parse_time_suffix("90").unwrap(), 90);
/// assert_eq!(parse_time_suffix("5m").unwrap(), 300);
/// assert!(parse_time_suffix("5y").is_err());
/// ```
pub fn parse_time_suffix(s: &str) -> Result<i64> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(IntervalError::TimeValue(s.to_string()));
    }
    let (num, suffix) = s.split_at(digits);
    let factor = match suffix {
        "" | "s" => 1,
        "m" => SEC_PER_MIN,
        "h" => SEC_PER_HOUR,
        "d" => SEC_PER_DAY,
        "w" => SEC_PER_WEEK,
        _ => return Err(IntervalError::TimeValue(s.to_string())),
    };
    num.parse::<i64>()
        .ok()
        .and_then(|v| v.checked_mul(factor))
        .filter(|v| *v <= i32::MAX as i64)
        .ok_or_else(|| IntervalError::TimeValue(s.to_string()))
}

/// Custom intervals attached to an update interval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomIntervals {
    /// Flexible intervals.
    pub flexible: Vec<FlexibleInterval>,
    /// Scheduling intervals.
    pub scheduling: Vec<SchedulingInterval>,
}

impl CustomIntervals {
    /// Returns `true` if there are no custom intervals at all.
    pub fn is_empty(&self) -> bool {
        self.flexible.is_empty() && self.scheduling.is_empty()
    }

    /// The delay in effect at `t`: the smallest delay among the active flexible intervals, or `simple` if none is
    /// active.
    pub fn current_delay(&self, simple: i64, t: i64) -> i64 {
        self.flexible
            .iter()
            .filter(|f| f.period.contains(t))
            .map(|f| f.delay)
            .min()
            .unwrap_or(simple)
    }

    /// The nearest moment after `t` when any flexible interval starts or ends.
    pub fn next_delay_change(&self, t: i64) -> Option<i64> {
        self.flexible.iter().map(|f| f.period.next_boundary(t)).min()
    }

    /// The earliest moment strictly after `now` matched by any scheduling interval.
    pub fn next_scheduled(&self, now: i64) -> Option<i64> {
        self.scheduling.iter().filter_map(|s| s.next_after(now)).min()
    }
}

/// A parsed update interval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateInterval {
    /// The simple delay in seconds, `0..=86400`.
    pub simple: i64,
    /// Optional custom intervals.
    pub custom: CustomIntervals,
}

impl UpdateInterval {
    /// Returns `true` if the interval can never produce a check.
    pub fn is_never(&self) -> bool {
        self.simple == 0 && self.custom.flexible.iter().all(|f| f.delay == 0) && self.custom.scheduling.is_empty()
    }
}

impl FromStr for UpdateInterval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self> {
        let err = || IntervalError::UpdateInterval(s.to_string());

        let mut parts = s.split(';');
        let simple = parse_time_suffix(parts.next().unwrap_or_default()).map_err(|_| err())?;
        if simple > SEC_PER_DAY {
            return Err(err());
        }

        let mut custom = CustomIntervals::default();
        for part in parts {
            match part.bytes().next() {
                Some(b) if b.is_ascii_digit() => custom.flexible.push(part.parse()?),
                Some(_) => custom.scheduling.push(part.parse()?),
                None => return Err(err()),
            }
        }

        Ok(Self { simple, custom })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_suffix() {
        assert_eq!(parse_time_suffix("0").unwrap(), 0);
        assert_eq!(parse_time_suffix("30s").unwrap(), 30);
        assert_eq!(parse_time_suffix("2h").unwrap(), 7200);
        assert_eq!(parse_time_suffix("1d").unwrap(), SEC_PER_DAY);
        assert_eq!(parse_time_suffix("1w").unwrap(), SEC_PER_WEEK);
        assert!(parse_time_suffix("").is_err());
        assert!(parse_time_suffix("s").is_err());
        assert!(parse_time_suffix("-1").is_err());
        assert!(parse_time_suffix("10ss").is_err());
        assert!(parse_time_suffix("99999999999").is_err());
    }

    #[test]
    fn test_parse_update_interval() {
        let interval: UpdateInterval = "30s;50s/1-5,09:00-18:00;wd1-5h9".parse().unwrap();
        assert_eq!(interval.simple, 30);
        assert_eq!(interval.custom.flexible.len(), 1);
        assert_eq!(interval.custom.flexible[0].delay, 50);
        assert_eq!(interval.custom.scheduling.len(), 1);

        assert!("2d".parse::<UpdateInterval>().is_err());
        assert!("30s;".parse::<UpdateInterval>().is_err());
        assert!("{$DELAY}".parse::<UpdateInterval>().is_err());
        assert_eq!(
            "30s;h25".parse::<UpdateInterval>(),
            Err(IntervalError::Scheduling("h25".to_string()))
        );

        let err: Error = "1y".parse::<UpdateInterval>().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_never() {
        assert!("0".parse::<UpdateInterval>().unwrap().is_never());
        assert!("0;0/1-7,00:00-24:00".parse::<UpdateInterval>().unwrap().is_never());
        assert!(!"0;h9".parse::<UpdateInterval>().unwrap().is_never());
        assert!(!"0;10/1-7,00:00-24:00".parse::<UpdateInterval>().unwrap().is_never());
    }

    #[test]
    fn test_current_delay() {
        // 2024-01-01 is a Monday.
        let monday_noon = 1704110400;
        let interval: UpdateInterval = "60;10/1-5,09:00-18:00;30/1,00:00-24:00".parse().unwrap();
        assert_eq!(interval.custom.current_delay(interval.simple, monday_noon), 10);
        assert_eq!(interval.custom.current_delay(interval.simple, monday_noon + 8 * SEC_PER_HOUR), 30);
        assert_eq!(interval.custom.current_delay(interval.simple, monday_noon + SEC_PER_DAY), 10);
        assert_eq!(
            interval.custom.current_delay(interval.simple, monday_noon + SEC_PER_DAY + 8 * SEC_PER_HOUR),
            60
        );
    }
}
