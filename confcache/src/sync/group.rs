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

//! Host groups and maintenances.
//!
//! Host group columns: `name`. Group membership columns: `groupid, hostid`.
//! Maintenance columns: `type, active_since, active_until, tags_evaltype`.
//! Maintenance tag columns: `maintenanceid, tag, operator, value`.
//! Maintenance period columns: `maintenanceid, timeperiod_type, every, month, dayofweek, day, start_time, period,
//! start_date`.
//! Maintenance group and host columns: `maintenanceid, groupid` and `maintenanceid, hostid`.

use confcache_common::error::Result;

use super::{drive, Applied, DiffRow, DiffSource, RowTag, SyncCounts};
use crate::{
    model::{HostGroup, Link, Maintenance, MaintenancePeriod, MaintenanceTag, MaintenanceType, PeriodKind},
    store::{Release, Store, Table},
};

fn insert_sorted(ids: &mut Vec<u64>, id: u64) {
    if let Err(pos) = ids.binary_search(&id) {
        ids.insert(pos, id);
    }
}

fn remove_sorted(ids: &mut Vec<u64>, id: u64) {
    if let Ok(pos) = ids.binary_search(&id) {
        ids.remove(pos);
    }
}

fn period_kind(row: &DiffRow) -> Option<PeriodKind> {
    Some(match row.u8(1) {
        0 => PeriodKind::OneTime {
            start_date: row.i64(8),
        },
        2 => PeriodKind::Daily {
            every: row.u32(2).max(1),
        },
        3 => PeriodKind::Weekly {
            every: row.u32(2).max(1),
            dayofweek: row.u8(4),
        },
        4 => PeriodKind::Monthly {
            month: row.u32(3) as u16,
            day: row.u32(5),
            every: row.u32(2),
            dayofweek: row.u8(4),
        },
        _ => return None,
    })
}

/// Upsert a link row, returning the previous link when the row changed.
fn upsert_link(table: &mut Table<Link>, row: &DiffRow) -> Result<(Link, Option<Link>)> {
    let link = Link {
        linkid: row.rowid,
        from: row.u64(0),
        to: row.u64(1),
    };
    let (token, found) = table.find_or_create(link.linkid, || link)?;
    let old = match found {
        true => table.at_mut(token).map(|l| std::mem::replace(l, link)).filter(|old| *old != link),
        false => None,
    };
    Ok((link, old))
}

impl Store {
    pub(super) fn sync_host_groups(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let groupid = row.rowid;
            self.nested_dirty = true;
            self.groups_dirty = true;
            if row.tag == RowTag::Remove {
                if let Some(group) = self.host_groups.remove(groupid) {
                    for &hostid in &group.hostids {
                        self.host_groups_index.remove(&hostid, groupid);
                    }
                    group.release(&mut self.pool);
                }
                return Ok(Applied::Done);
            }
            let (token, found) = self.host_groups.find_or_create(groupid, || HostGroup {
                groupid,
                ..Default::default()
            })?;
            if let Some(group) = self.host_groups.at_mut(token) {
                self.pool.replace(found, &mut group.name, row.str(0))?;
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_host_group_hosts(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            if row.tag == RowTag::Remove {
                self.remove_group_host(row.rowid);
                return Ok(Applied::Done);
            }
            if !self.host_groups.contains(row.u64(0)) {
                return Ok(Applied::Skipped);
            }
            let (link, old) = upsert_link(&mut self.group_hosts, &row)?;
            if let Some(old) = old {
                self.unlink_group_host(old);
            }
            if let Some(group) = self.host_groups.get_mut(link.from) {
                insert_sorted(&mut group.hostids, link.to);
            }
            self.host_groups_index.add(link.to, link.from);
            self.maintenance_dirty = true;
            Ok(Applied::Done)
        })
    }

    fn unlink_group_host(&mut self, link: Link) {
        if let Some(group) = self.host_groups.get_mut(link.from) {
            remove_sorted(&mut group.hostids, link.to);
        }
        self.host_groups_index.remove(&link.to, link.from);
        self.maintenance_dirty = true;
    }

    pub(crate) fn remove_group_host(&mut self, linkid: u64) {
        if let Some(link) = self.group_hosts.remove(linkid) {
            self.unlink_group_host(link);
        }
    }

    pub(super) fn sync_maintenances(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let maintenanceid = row.rowid;
            self.maintenance_dirty = true;
            if row.tag == RowTag::Remove {
                self.remove_maintenance(maintenanceid);
                return Ok(Applied::Done);
            }
            let (token, _) = self.maintenances.find_or_create(maintenanceid, || Maintenance {
                maintenanceid,
                ..Default::default()
            })?;
            if let Some(m) = self.maintenances.at_mut(token) {
                m.kind = MaintenanceType::from_raw(row.u8(0)).unwrap_or_default();
                m.active_since = row.i64(1);
                m.active_until = row.i64(2);
                m.tags_evaltype = row.u8(3);
            }
            Ok(Applied::Done)
        })
    }

    fn remove_maintenance(&mut self, maintenanceid: u64) {
        let Some(m) = self.maintenances.remove(maintenanceid) else {
            return;
        };
        for tagid in m.tags {
            if let Some(tag) = self.maintenance_tags.remove(tagid) {
                tag.release(&mut self.pool);
            }
        }
        for periodid in m.periods {
            self.maintenance_periods.remove(periodid);
        }
        for table in [&mut self.maintenance_groups, &mut self.maintenance_hosts] {
            let links = table
                .values()
                .filter(|l| l.from == maintenanceid)
                .map(|l| l.linkid)
                .collect::<Vec<_>>();
            for linkid in links {
                table.remove(linkid);
            }
        }
    }

    pub(super) fn sync_maintenance_tags(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let maintenancetagid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(tag) = self.maintenance_tags.remove(maintenancetagid) {
                    if let Some(m) = self.maintenances.get_mut(tag.maintenanceid) {
                        remove_sorted(&mut m.tags, maintenancetagid);
                    }
                    tag.release(&mut self.pool);
                }
                return Ok(Applied::Done);
            }
            let maintenanceid = row.u64(0);
            let Some(m) = self.maintenances.get_mut(maintenanceid) else {
                return Ok(Applied::Skipped);
            };
            insert_sorted(&mut m.tags, maintenancetagid);
            let (token, found) = self.maintenance_tags.find_or_create(maintenancetagid, || MaintenanceTag {
                maintenancetagid,
                maintenanceid,
                ..Default::default()
            })?;
            if let Some(tag) = self.maintenance_tags.at_mut(token) {
                self.pool.replace(found, &mut tag.tag, row.str(1))?;
                tag.operator = row.u8(2);
                self.pool.replace(found, &mut tag.value, row.str(3))?;
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_maintenance_periods(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let timeperiodid = row.rowid;
            self.maintenance_dirty = true;
            if row.tag == RowTag::Remove {
                if let Some(period) = self.maintenance_periods.remove(timeperiodid) {
                    if let Some(m) = self.maintenances.get_mut(period.maintenanceid) {
                        remove_sorted(&mut m.periods, timeperiodid);
                    }
                }
                return Ok(Applied::Done);
            }
            let maintenanceid = row.u64(0);
            let Some(kind) = period_kind(&row) else {
                tracing::warn!(timeperiodid, kind = row.str(1), "[sync]: unknown maintenance period type");
                return Ok(Applied::Skipped);
            };
            let Some(m) = self.maintenances.get_mut(maintenanceid) else {
                return Ok(Applied::Skipped);
            };
            insert_sorted(&mut m.periods, timeperiodid);
            let period = MaintenancePeriod {
                timeperiodid,
                maintenanceid,
                kind,
                start_time: row.i64(6),
                period: row.i64(7),
            };
            let (token, _) = self.maintenance_periods.find_or_create(timeperiodid, || period)?;
            if let Some(p) = self.maintenance_periods.at_mut(token) {
                *p = period;
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_maintenance_groups(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            self.maintenance_dirty = true;
            self.nested_dirty = true;
            if row.tag == RowTag::Remove {
                if let Some(link) = self.maintenance_groups.remove(row.rowid) {
                    if let Some(m) = self.maintenances.get_mut(link.from) {
                        remove_sorted(&mut m.groupids, link.to);
                    }
                }
                return Ok(Applied::Done);
            }
            if !self.maintenances.contains(row.u64(0)) {
                return Ok(Applied::Skipped);
            }
            let (link, old) = upsert_link(&mut self.maintenance_groups, &row)?;
            if let Some(old) = old {
                if let Some(m) = self.maintenances.get_mut(old.from) {
                    remove_sorted(&mut m.groupids, old.to);
                }
            }
            if let Some(m) = self.maintenances.get_mut(link.from) {
                insert_sorted(&mut m.groupids, link.to);
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_maintenance_hosts(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            self.maintenance_dirty = true;
            if row.tag == RowTag::Remove {
                if let Some(link) = self.maintenance_hosts.remove(row.rowid) {
                    if let Some(m) = self.maintenances.get_mut(link.from) {
                        remove_sorted(&mut m.hostids, link.to);
                    }
                }
                return Ok(Applied::Done);
            }
            if !self.maintenances.contains(row.u64(0)) {
                return Ok(Applied::Skipped);
            }
            let (link, old) = upsert_link(&mut self.maintenance_hosts, &row)?;
            if let Some(old) = old {
                if let Some(m) = self.maintenances.get_mut(old.from) {
                    remove_sorted(&mut m.hostids, old.to);
                }
            }
            if let Some(m) = self.maintenances.get_mut(link.from) {
                insert_sorted(&mut m.hostids, link.to);
            }
            Ok(Applied::Done)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_kind() {
        let row = DiffRow::add(1, ["10", "3", "2", "0", "5", "0", "3600", "7200", "0"]);
        assert_eq!(
            period_kind(&row),
            Some(PeriodKind::Weekly {
                every: 2,
                dayofweek: 5
            })
        );
        let row = DiffRow::add(1, ["10", "9"]);
        assert_eq!(period_kind(&row), None);
    }
}
