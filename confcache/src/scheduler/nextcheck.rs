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

use confcache_common::interval::{UpdateInterval, JAN_2038, SEC_PER_YEAR};

use crate::model::ItemType;

/// Next check of an item polled on the given interval.
///
/// Items sharing `seed` and interval are aligned to the same slots while different seeds spread over the delay.
/// Flexible intervals switch the delay while active; scheduling intervals force an earlier check.
pub fn calculate_item_nextcheck(seed: u64, item_type: ItemType, interval: &UpdateInterval, now: i64) -> i64 {
    if item_type == ItemType::AgentActive {
        return match interval.simple {
            0 => JAN_2038,
            delay => now + delay,
        };
    }

    let custom = &interval.custom;
    let mut nextcheck = JAN_2038;
    let mut t = now;
    let tmax = now + SEC_PER_YEAR;
    let mut attempt = 0;

    while t < tmax {
        let delay = custom.current_delay(interval.simple, t);

        nextcheck = if delay != 0 {
            let mut next = delay * (t / delay) + (seed % delay as u64) as i64;
            if attempt == 0 {
                while next <= t {
                    next += delay;
                }
            } else {
                while next < t {
                    next += delay;
                }
            }
            next
        } else {
            JAN_2038
        };

        match custom.next_delay_change(t) {
            Some(change) if nextcheck >= change => {
                t = change;
                attempt += 1;
            }
            _ => break,
        }
    }

    match custom.next_scheduled(now) {
        Some(scheduled) if scheduled < nextcheck => scheduled,
        _ => nextcheck,
    }
}

/// Next check of an item on an unreachable host: the first moment from `disable_until` on with a non-zero delay.
pub fn calculate_item_nextcheck_unreachable(interval: &UpdateInterval, disable_until: i64) -> i64 {
    let custom = &interval.custom;
    let mut nextcheck = disable_until;
    let tmax = disable_until + SEC_PER_YEAR;

    if !custom.flexible.is_empty() {
        while nextcheck < tmax {
            if custom.current_delay(interval.simple, nextcheck) != 0 {
                break;
            }
            match custom.next_delay_change(nextcheck) {
                Some(change) => nextcheck = change,
                None => {
                    nextcheck = JAN_2038;
                    break;
                }
            }
        }
    }

    match custom.next_scheduled(disable_until) {
        Some(scheduled) if scheduled < nextcheck => scheduled,
        _ => nextcheck,
    }
}

fn aligned_after(seed: u64, delay: i64, now: i64) -> i64 {
    let mut nextcheck = delay * (now / delay) + (seed % delay as u64) as i64;
    while nextcheck <= now {
        nextcheck += delay;
    }
    nextcheck
}

/// Next poll of a passive proxy, spread over the delay by proxy id.
pub fn calculate_proxy_nextcheck(hostid: u64, delay: i64, now: i64) -> i64 {
    aligned_after(hostid, delay.max(1), now)
}

/// Next evaluation of a timer trigger.
///
/// `delay * floor(now / delay) + seed % delay`, advanced by `delay` until it is past `now`.
pub fn timer_nextcheck(seed: u64, now: i64, delay: i64) -> i64 {
    aligned_after(seed, delay.max(1), now)
}

#[cfg(test)]
mod tests {
    use confcache_common::interval::SEC_PER_HOUR;

    use super::*;

    // 2024-01-01 00:00:00 UTC, a Monday.
    const MONDAY: i64 = 1704067200;

    fn interval(s: &str) -> UpdateInterval {
        s.parse().unwrap()
    }

    #[test]
    fn test_timer_nextcheck() {
        assert_eq!(timer_nextcheck(1000000007, 1000, 30), 1007);
        assert_eq!(timer_nextcheck(1000000007, 1007, 30), 1037);
    }

    #[test]
    fn test_proxy_nextcheck() {
        assert_eq!(calculate_proxy_nextcheck(10, 60, 1000), 1030);
        assert_eq!(calculate_proxy_nextcheck(10, 60, 1030), 1090);
    }

    #[test]
    fn test_simple_interval_alignment() {
        let i = interval("60");
        let a = calculate_item_nextcheck(5, ItemType::Agent, &i, MONDAY);
        let b = calculate_item_nextcheck(65, ItemType::Agent, &i, MONDAY + 2);
        assert_eq!(a, MONDAY + 5);
        assert_eq!(a, b);
        assert_eq!(calculate_item_nextcheck(5, ItemType::Agent, &i, a), a + 60);
    }

    #[test]
    fn test_active_items() {
        assert_eq!(calculate_item_nextcheck(5, ItemType::AgentActive, &interval("30"), 1000), 1030);
        assert_eq!(calculate_item_nextcheck(5, ItemType::AgentActive, &interval("0"), 1000), JAN_2038);
    }

    #[test]
    fn test_zero_delay_is_never() {
        assert_eq!(calculate_item_nextcheck(5, ItemType::Agent, &interval("0"), 1000), JAN_2038);
    }

    #[test]
    fn test_flexible_interval() {
        // Only polled during working hours on Monday.
        let i = interval("0;600/1,09:00-18:00");
        let nextcheck = calculate_item_nextcheck(0, ItemType::Agent, &i, MONDAY);
        assert_eq!(nextcheck, MONDAY + 9 * SEC_PER_HOUR);
    }

    #[test]
    fn test_scheduling_interval_wins_when_earlier() {
        let i = interval("1h;m30");
        let nextcheck = calculate_item_nextcheck(0, ItemType::Agent, &i, MONDAY);
        assert_eq!(nextcheck, MONDAY + 30 * 60);
    }

    #[test]
    fn test_unreachable_nextcheck() {
        assert_eq!(calculate_item_nextcheck_unreachable(&interval("60"), 5000), 5000);
        let i = interval("0;600/1,09:00-18:00");
        assert_eq!(calculate_item_nextcheck_unreachable(&i, MONDAY), MONDAY + 9 * SEC_PER_HOUR);
    }
}
