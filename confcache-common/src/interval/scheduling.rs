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

use chrono::{DateTime, Datelike};

use super::{flexible::day_and_second, IntervalError, Result, SEC_PER_DAY, SEC_PER_HOUR, SEC_PER_MIN};

/// Days searched ahead for a match before giving up, four years including a leap day.
const SEARCH_DAYS: i64 = 4 * 365 + 1;

/// A set of allowed values of one calendar field, as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mask(u64);

impl Mask {
    fn all(min: u32, max: u32) -> Self {
        Self::range(min, max, 1)
    }

    fn range(from: u32, to: u32, step: u32) -> Self {
        let mut mask = 0;
        let mut v = from;
        while v <= to {
            mask |= 1 << v;
            v += step;
        }
        Self(mask)
    }

    fn contains(&self, v: u32) -> bool {
        v < 64 && self.0 & (1 << v) != 0
    }

    /// The smallest allowed value that is `>= v`.
    fn first_from(&self, v: u32) -> Option<u32> {
        if v >= 64 {
            return None;
        }
        match self.0 >> v {
            0 => None,
            m => Some(v + m.trailing_zeros()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Field {
    MonthDay,
    WeekDay,
    Hour,
    Minute,
    Second,
}

impl Field {
    const ALL: [Field; 5] = [Field::MonthDay, Field::WeekDay, Field::Hour, Field::Minute, Field::Second];

    fn prefix(self) -> &'static str {
        match self {
            Field::MonthDay => "md",
            Field::WeekDay => "wd",
            Field::Hour => "h",
            Field::Minute => "m",
            Field::Second => "s",
        }
    }

    fn bounds(self) -> (u32, u32) {
        match self {
            Field::MonthDay => (1, 31),
            Field::WeekDay => (1, 7),
            Field::Hour => (0, 23),
            Field::Minute | Field::Second => (0, 59),
        }
    }
}

/// A scheduling interval such as `wd1-5h9-18/2m0`.
///
/// Filters must appear in the order `md`, `wd`, `h`, `m`, `s`. Each filter is a comma separated list of
/// `from[-to][/step]` items, `/step` alone covers the whole range. Time fields finer than the finest specified one
/// default to `0`, coarser ones default to every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingInterval {
    mday: Mask,
    wday: Mask,
    hour: Mask,
    minute: Mask,
    second: Mask,
}

fn parse_number(s: &str, (min, max): (u32, u32)) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let v: u32 = s.parse().ok()?;
    (min..=max).contains(&v).then_some(v)
}

fn parse_filter(s: &str, field: Field) -> Option<Mask> {
    let bounds = field.bounds();
    let mut mask = Mask(0);
    for item in s.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step = parse_number(step, (1, bounds.1.max(1)))?;
                (range, Some(step))
            }
            None => (item, None),
        };
        let (from, to) = match range.split_once('-') {
            Some((a, b)) => (parse_number(a, bounds)?, parse_number(b, bounds)?),
            None if range.is_empty() => {
                step?;
                bounds
            }
            None => {
                let v = parse_number(range, bounds)?;
                (v, if step.is_some() { bounds.1 } else { v })
            }
        };
        if from > to {
            return None;
        }
        mask.0 |= Mask::range(from, to, step.unwrap_or(1)).0;
    }
    Some(mask)
}

impl FromStr for SchedulingInterval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self> {
        let err = || IntervalError::Scheduling(s.to_string());

        let mut filters: [Option<Mask>; 5] = [None; 5];
        let mut rest = s;
        let mut next_field = 0;

        while !rest.is_empty() {
            let (idx, field) = Field::ALL
                .iter()
                .enumerate()
                .skip(next_field)
                .find(|(_, f)| rest.starts_with(f.prefix()))
                .map(|(i, f)| (i, *f))
                .ok_or_else(err)?;
            rest = &rest[field.prefix().len()..];
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '-' || c == '/'))
                .unwrap_or(rest.len());
            let (spec, tail) = rest.split_at(end);
            filters[idx] = Some(parse_filter(spec, field).ok_or_else(err)?);
            rest = tail;
            next_field = idx + 1;
        }

        if filters.iter().all(Option::is_none) {
            return Err(err());
        }

        let finest = filters[2..].iter().rposition(Option::is_some).map(|p| p + 2);
        let time = |idx: usize, field: Field| -> Mask {
            match filters[idx] {
                Some(mask) => mask,
                None if finest.is_some_and(|f| idx < f) => {
                    let (min, max) = field.bounds();
                    Mask::all(min, max)
                }
                None => Mask(1),
            }
        };

        Ok(Self {
            mday: filters[0].unwrap_or(Mask::all(1, 31)),
            wday: filters[1].unwrap_or(Mask::all(1, 7)),
            hour: time(2, Field::Hour),
            minute: time(3, Field::Minute),
            second: time(4, Field::Second),
        })
    }
}

impl SchedulingInterval {
    /// The smallest second of day `>= from` matched by the time filters.
    fn first_time_from(&self, from: i64) -> Option<i64> {
        let (fh, fm, fs) = (
            (from / SEC_PER_HOUR) as u32,
            (from % SEC_PER_HOUR / SEC_PER_MIN) as u32,
            (from % SEC_PER_MIN) as u32,
        );
        let mut h = self.hour.first_from(fh)?;
        loop {
            if h > fh {
                let m = self.minute.first_from(0)?;
                let s = self.second.first_from(0)?;
                return Some(h as i64 * SEC_PER_HOUR + m as i64 * SEC_PER_MIN + s as i64);
            }
            let mut m = self.minute.first_from(fm);
            while let Some(mm) = m {
                if mm > fm {
                    let s = self.second.first_from(0)?;
                    return Some(h as i64 * SEC_PER_HOUR + mm as i64 * SEC_PER_MIN + s as i64);
                }
                if let Some(s) = self.second.first_from(fs) {
                    return Some(h as i64 * SEC_PER_HOUR + mm as i64 * SEC_PER_MIN + s as i64);
                }
                m = self.minute.first_from(mm + 1);
            }
            h = self.hour.first_from(h + 1)?;
        }
    }

    fn day_matches(&self, midnight: i64) -> bool {
        match DateTime::from_timestamp(midnight, 0) {
            Some(dt) => self.mday.contains(dt.day()) && self.wday.contains(dt.weekday().number_from_monday()),
            None => false,
        }
    }

    /// The earliest moment strictly after `now` matched by this interval.
    pub fn next_after(&self, now: i64) -> Option<i64> {
        let t = now + 1;
        let (_, sec) = day_and_second(t);
        let midnight = t - sec;

        (0..SEARCH_DAYS).find_map(|i| {
            let day = midnight + i * SEC_PER_DAY;
            if !self.day_matches(day) {
                return None;
            }
            let from = if i == 0 { sec } else { 0 };
            self.first_time_from(from).map(|time| day + time)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-01 00:00:00 UTC, a Monday.
    const MONDAY: i64 = 1704067200;

    #[test]
    fn test_parse() {
        assert!("wd1-5h9".parse::<SchedulingInterval>().is_ok());
        assert!("md1,15h/6m0s0".parse::<SchedulingInterval>().is_ok());
        assert!("h9-18/2".parse::<SchedulingInterval>().is_ok());

        for bad in ["", "h25", "wd8", "md0", "h9wd1", "x1", "h9-8", "m/0", "h"] {
            assert!(bad.parse::<SchedulingInterval>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_defaults() {
        // Only hours: minutes and seconds default to zero.
        let s: SchedulingInterval = "h9".parse().unwrap();
        assert_eq!(s.next_after(MONDAY), Some(MONDAY + 9 * SEC_PER_HOUR));
        assert_eq!(s.next_after(MONDAY + 9 * SEC_PER_HOUR), Some(MONDAY + SEC_PER_DAY + 9 * SEC_PER_HOUR));

        // Only minutes: every hour at :30:00.
        let s: SchedulingInterval = "m30".parse().unwrap();
        assert_eq!(s.next_after(MONDAY + 31 * SEC_PER_MIN), Some(MONDAY + SEC_PER_HOUR + 30 * SEC_PER_MIN));
    }

    #[test]
    fn test_weekdays() {
        // Saturday 10:00 -> next Monday 09:00.
        let s: SchedulingInterval = "wd1-5h9".parse().unwrap();
        let saturday = MONDAY + 5 * SEC_PER_DAY;
        assert_eq!(s.next_after(saturday + 10 * SEC_PER_HOUR), Some(MONDAY + 7 * SEC_PER_DAY + 9 * SEC_PER_HOUR));
    }

    #[test]
    fn test_steps() {
        let s: SchedulingInterval = "s/15".parse().unwrap();
        assert_eq!(s.next_after(MONDAY), Some(MONDAY + 15));
        assert_eq!(s.next_after(MONDAY + 59), Some(MONDAY + 60));

        let s: SchedulingInterval = "h0m0s0,30".parse().unwrap();
        assert_eq!(s.next_after(MONDAY), Some(MONDAY + 30));
        assert_eq!(s.next_after(MONDAY + 30), Some(MONDAY + SEC_PER_DAY));
    }

    #[test]
    fn test_month_day() {
        // 2024-02-30 does not exist, the 30th of March does.
        let s: SchedulingInterval = "md30h0".parse().unwrap();
        let feb1 = MONDAY + 31 * SEC_PER_DAY;
        let mar30 = feb1 + (29 + 29) * SEC_PER_DAY;
        assert_eq!(s.next_after(feb1), Some(mar30));
    }
}
