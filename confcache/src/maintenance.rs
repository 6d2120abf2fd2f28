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

//! Maintenance windows and the host maintenance state derived from them.
//!
//! Recurring periods are evaluated in UTC.

use chrono::{DateTime, Datelike, Days, NaiveDate};
use confcache_common::interval::SEC_PER_DAY;
use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    model::{HostMaintenance, Maintenance, MaintenancePeriod, MaintenanceType, PeriodKind},
    store::Store,
};

/// A maintenance whose active window covers the queried moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningMaintenance {
    /// Maintenance id.
    pub maintenanceid: u64,
    /// Data collection mode.
    pub kind: MaintenanceType,
    /// How tag filters are combined.
    pub tags_evaltype: u8,
    /// Start of the running window.
    pub running_since: i64,
    /// End of the running window.
    pub running_until: i64,
    /// Host groups in maintenance, nested groups included.
    pub groupids: Vec<u64>,
    /// Hosts in maintenance directly.
    pub hostids: Vec<u64>,
    /// Problem tag filters as `(operator, tag, value)`.
    pub tags: Vec<(u8, String, String)>,
}

fn date_of(t: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(t, 0).map(|dt| dt.date_naive())
}

fn day_index(t: i64) -> i64 {
    t.div_euclid(SEC_PER_DAY)
}

/// Monday based week number since the epoch, which fell on a Thursday.
fn week_index(t: i64) -> i64 {
    (day_index(t) + 3).div_euclid(7)
}

fn weekday_bit(date: NaiveDate) -> u8 {
    1 << date.weekday().num_days_from_monday()
}

fn is_last_week(date: NaiveDate) -> bool {
    date.checked_add_days(Days::new(7))
        .is_none_or(|later| later.month() != date.month())
}

/// Whether a recurring period starts on the day beginning at `midnight`.
fn starts_on(kind: &PeriodKind, midnight: i64, active_since: i64) -> bool {
    let Some(date) = date_of(midnight) else {
        return false;
    };
    match *kind {
        PeriodKind::OneTime { .. } => false,
        PeriodKind::Daily { every } => {
            let days = day_index(midnight) - day_index(active_since);
            days >= 0 && days % i64::from(every.max(1)) == 0
        }
        PeriodKind::Weekly { every, dayofweek } => {
            let weeks = week_index(midnight) - week_index(active_since);
            weeks >= 0 && weeks % i64::from(every.max(1)) == 0 && dayofweek & weekday_bit(date) != 0
        }
        PeriodKind::Monthly {
            month,
            day,
            every,
            dayofweek,
        } => {
            if month & (1 << date.month0()) == 0 {
                return false;
            }
            match day {
                0 => {
                    let week = match every {
                        5 => is_last_week(date),
                        n => date.day0() / 7 + 1 == n,
                    };
                    week && dayofweek & weekday_bit(date) != 0
                }
                day => date.day() == day,
            }
        }
    }
}

/// The window of `period` covering `now`, clamped to the active range of the maintenance.
fn running_window(maintenance: &Maintenance, period: &MaintenancePeriod, now: i64) -> Option<(i64, i64)> {
    let (since, until) = match period.kind {
        PeriodKind::OneTime { start_date } => (start_date, start_date + period.period),
        ref kind => {
            let today = day_index(now) * SEC_PER_DAY;
            // A window may run over several midnights.
            let lookback = period.period.max(0) / SEC_PER_DAY + 1;
            (0..=lookback)
                .map(|back| today - back * SEC_PER_DAY)
                .filter(|&midnight| starts_on(kind, midnight, maintenance.active_since))
                .map(|midnight| (midnight + period.start_time, midnight + period.start_time + period.period))
                .filter(|&(since, until)| since <= now && now < until)
                .max_by_key(|&(_, until)| until)?
        }
    };
    let (since, until) = (since.max(maintenance.active_since), until.min(maintenance.active_until));
    (since <= now && now < until).then_some((since, until))
}

impl Store {
    fn running_window(&self, maintenance: &Maintenance, now: i64) -> Option<(i64, i64)> {
        if now < maintenance.active_since || now >= maintenance.active_until {
            return None;
        }
        maintenance
            .periods
            .iter()
            .filter_map(|&id| self.maintenance_periods.get(id))
            .filter_map(|period| running_window(maintenance, period, now))
            .max_by_key(|&(_, until)| until)
    }

    /// Maintenances running at `now`.
    pub fn get_running_maintenances(&mut self, now: i64) -> Vec<RunningMaintenance> {
        let running = self
            .maintenances
            .values()
            .filter_map(|m| self.running_window(m, now).map(|window| (m.maintenanceid, window)))
            .sorted_unstable()
            .collect_vec();

        running
            .into_iter()
            .filter_map(|(maintenanceid, (running_since, running_until))| {
                let groupids = self.maintenances.get(maintenanceid)?.groupids.clone();
                let groupids = self.get_nested_hostgroupids(&groupids);
                let m = self.maintenances.get(maintenanceid)?;
                let tags = m
                    .tags
                    .iter()
                    .filter_map(|&id| self.maintenance_tags.get(id))
                    .map(|t| (t.operator, self.pool.get(&t.tag).to_string(), self.pool.get(&t.value).to_string()))
                    .collect();
                Some(RunningMaintenance {
                    maintenanceid,
                    kind: m.kind,
                    tags_evaltype: m.tags_evaltype,
                    running_since,
                    running_until,
                    groupids,
                    hostids: m.hostids.clone(),
                    tags,
                })
            })
            .collect()
    }

    /// Apply the maintenances running at `now` to the hosts they cover.
    ///
    /// A host covered by several maintenances takes a no data one first, then the one with the smallest id.
    /// Returns the hosts whose maintenance state changed.
    pub fn update_host_maintenance(&mut self, now: i64) -> Vec<u64> {
        let running = self.get_running_maintenances(now);

        for m in self.maintenances.values_mut() {
            (m.running_since, m.running_until) = running
                .iter()
                .find(|r| r.maintenanceid == m.maintenanceid)
                .map_or((0, 0), |r| (r.running_since, r.running_until));
        }

        let mut applied: HashMap<u64, &RunningMaintenance> = HashMap::new();
        for r in &running {
            let hostids = r
                .groupids
                .iter()
                .filter_map(|&groupid| self.host_groups.get(groupid))
                .flat_map(|group| group.hostids.iter().copied())
                .chain(r.hostids.iter().copied());
            for hostid in hostids {
                let better = |current: &RunningMaintenance| {
                    (r.kind == MaintenanceType::NoData, std::cmp::Reverse(r.maintenanceid))
                        > (current.kind == MaintenanceType::NoData, std::cmp::Reverse(current.maintenanceid))
                };
                if applied.get(&hostid).is_none_or(|current| better(current)) {
                    applied.insert(hostid, r);
                }
            }
        }

        let mut changed = vec![];
        for host in self.hosts.values_mut() {
            let new = match applied.get(&host.hostid) {
                Some(r) => HostMaintenance {
                    maintenanceid: r.maintenanceid,
                    active: true,
                    kind: r.kind,
                    from: match host.maintenance.active && host.maintenance.maintenanceid == r.maintenanceid {
                        true => host.maintenance.from,
                        false => r.running_since,
                    },
                },
                None => HostMaintenance::default(),
            };
            if host.maintenance != new {
                host.maintenance = new;
                changed.push(host.hostid);
            }
        }
        changed.sort_unstable();
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-01 00:00:00 UTC, a Monday.
    const MONDAY: i64 = 1704067200;

    fn maintenance() -> Maintenance {
        Maintenance {
            maintenanceid: 1,
            active_since: MONDAY,
            active_until: MONDAY + 365 * SEC_PER_DAY,
            ..Default::default()
        }
    }

    fn period(kind: PeriodKind, start_time: i64, period: i64) -> MaintenancePeriod {
        MaintenancePeriod {
            kind,
            start_time,
            period,
            ..Default::default()
        }
    }

    #[test]
    fn test_one_time() {
        let m = maintenance();
        let p = period(PeriodKind::OneTime { start_date: MONDAY + 100 }, 0, 3600);
        assert_eq!(running_window(&m, &p, MONDAY + 50), None);
        assert_eq!(running_window(&m, &p, MONDAY + 200), Some((MONDAY + 100, MONDAY + 3700)));
        assert_eq!(running_window(&m, &p, MONDAY + 3700), None);
    }

    #[test]
    fn test_daily_over_midnight() {
        let m = maintenance();
        // Every second day from 22:00 for four hours.
        let p = period(PeriodKind::Daily { every: 2 }, 22 * 3600, 4 * 3600);
        let window = Some((MONDAY + 22 * 3600, MONDAY + 26 * 3600));
        assert_eq!(running_window(&m, &p, MONDAY + 23 * 3600), window);
        assert_eq!(running_window(&m, &p, MONDAY + 25 * 3600), window);
        assert_eq!(running_window(&m, &p, MONDAY + SEC_PER_DAY + 23 * 3600), None);
        assert!(running_window(&m, &p, MONDAY + 2 * SEC_PER_DAY + 23 * 3600).is_some());
    }

    #[test]
    fn test_weekly() {
        let m = maintenance();
        // Wednesdays, all day.
        let p = period(
            PeriodKind::Weekly {
                every: 1,
                dayofweek: 0b100,
            },
            0,
            SEC_PER_DAY,
        );
        assert_eq!(running_window(&m, &p, MONDAY + 3600), None);
        assert!(running_window(&m, &p, MONDAY + 2 * SEC_PER_DAY + 3600).is_some());
        assert!(running_window(&m, &p, MONDAY + 9 * SEC_PER_DAY + 3600).is_some());
    }

    #[test]
    fn test_monthly() {
        let m = maintenance();
        // The last Wednesday of January: 2024-01-31.
        let p = period(
            PeriodKind::Monthly {
                month: 0b1,
                day: 0,
                every: 5,
                dayofweek: 0b100,
            },
            0,
            3600,
        );
        assert_eq!(running_window(&m, &p, MONDAY + 23 * SEC_PER_DAY + 60), None);
        assert!(running_window(&m, &p, MONDAY + 30 * SEC_PER_DAY + 60).is_some());

        // The 15th of every month.
        let p = period(
            PeriodKind::Monthly {
                month: 0xfff,
                day: 15,
                every: 0,
                dayofweek: 0,
            },
            0,
            3600,
        );
        assert!(running_window(&m, &p, MONDAY + 14 * SEC_PER_DAY + 60).is_some());
        assert_eq!(running_window(&m, &p, MONDAY + 15 * SEC_PER_DAY + 60), None);
    }
}
