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

//! Functions, triggers, trigger dependencies and trigger tags.
//!
//! Function columns: `itemid, triggerid, name, parameter`.
//! Trigger columns: `description, expression, error, priority, type, value, state, lastchange, status,
//! recovery_mode, recovery_expression, correlation_mode, correlation_tag`.
//! Dependency columns: `triggerid_down, triggerid_up`. Tag columns: `triggerid, tag, value`.

use confcache_common::error::Result;

use super::{drive, Applied, DiffRow, DiffSource, RowTag, SyncCounts};
use crate::{
    model::{Function, Link, Trigger, TriggerState, TriggerStatus, TriggerTag, TriggerValue, TIMER_FUNCTIONS},
    store::{Release, Store},
};

const DESCRIPTION: usize = 0;
const EXPRESSION: usize = 1;
const ERROR: usize = 2;
const PRIORITY: usize = 3;
const TYPE: usize = 4;
const VALUE: usize = 5;
const STATE: usize = 6;
const LASTCHANGE: usize = 7;
const STATUS: usize = 8;
const RECOVERY_MODE: usize = 9;
const RECOVERY_EXPRESSION: usize = 10;
const CORRELATION_MODE: usize = 11;
const CORRELATION_TAG: usize = 12;

impl Store {
    pub(super) fn sync_functions(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let functionid = row.rowid;
            if row.tag == RowTag::Remove {
                self.remove_function(functionid);
                return Ok(Applied::Done);
            }
            let (itemid, triggerid) = (row.u64(0), row.u64(1));
            if !self.items.contains(itemid) {
                return Ok(Applied::Skipped);
            }

            let (token, found) = self.functions.find_or_create(functionid, || Function {
                functionid,
                itemid,
                triggerid,
                ..Default::default()
            })?;
            let Some(function) = self.functions.at_mut(token) else {
                return Ok(Applied::Skipped);
            };
            if found {
                self.item_functions.remove(&function.itemid, functionid);
                self.trigger_functions.remove(&function.triggerid, functionid);
            }
            function.itemid = itemid;
            function.triggerid = triggerid;
            self.pool.replace(found, &mut function.function, row.str(2))?;
            self.pool.replace(found, &mut function.parameter, row.str(3))?;
            function.timer = TIMER_FUNCTIONS.contains(&row.str(2));
            self.item_functions.add(itemid, functionid);
            self.trigger_functions.add(triggerid, functionid);
            Ok(Applied::Done)
        })
    }

    pub(crate) fn remove_function(&mut self, functionid: u64) {
        if let Some(function) = self.functions.remove(functionid) {
            self.item_functions.remove(&function.itemid, functionid);
            self.trigger_functions.remove(&function.triggerid, functionid);
            function.release(&mut self.pool);
        }
    }

    pub(super) fn sync_triggers(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| match row.tag {
            RowTag::Remove => {
                self.remove_trigger(row.rowid);
                Ok(Applied::Done)
            }
            _ => self.upsert_trigger(&row),
        })
    }

    fn upsert_trigger(&mut self, row: &DiffRow) -> Result<Applied> {
        let triggerid = row.rowid;
        let (token, found) = self.triggers.find_or_create(triggerid, || Trigger {
            triggerid,
            ..Default::default()
        })?;
        let Some(trigger) = self.triggers.at_mut(token) else {
            return Ok(Applied::Skipped);
        };
        let pool = &mut self.pool;

        pool.replace(found, &mut trigger.description, row.str(DESCRIPTION))?;
        pool.replace(found, &mut trigger.expression, row.str(EXPRESSION))?;
        pool.replace(found, &mut trigger.recovery_expression, row.str(RECOVERY_EXPRESSION))?;
        pool.replace(found, &mut trigger.correlation_tag, row.str(CORRELATION_TAG))?;
        trigger.priority = row.u8(PRIORITY);
        trigger.kind = row.u8(TYPE);
        trigger.recovery_mode = row.u8(RECOVERY_MODE);
        trigger.correlation_mode = row.u8(CORRELATION_MODE);
        trigger.status = TriggerStatus::from_raw(row.u8(STATUS)).unwrap_or(TriggerStatus::Disabled);

        if !found {
            trigger.value = TriggerValue::from_raw(row.u8(VALUE)).unwrap_or(TriggerValue::Ok);
            trigger.state = TriggerState::from_raw(row.u8(STATE)).unwrap_or(TriggerState::Normal);
            trigger.error = row.str(ERROR).to_string();
            trigger.lastchange = row.i64(LASTCHANGE);
        }
        Ok(Applied::Done)
    }

    /// Remove a trigger with its tags, dependency edges and timer entry.
    pub(crate) fn remove_trigger(&mut self, triggerid: u64) {
        let Some(trigger) = self.triggers.remove(triggerid) else {
            return;
        };
        self.queues.timers.remove(&triggerid);
        for itemid in &trigger.itemids {
            if let Some(item) = self.items.get_mut(*itemid) {
                item.triggers.retain(|&id| id != triggerid);
            }
        }
        for &tagid in &trigger.tags {
            if let Some(tag) = self.trigger_tags.remove(tagid) {
                tag.release(&mut self.pool);
            }
        }
        let edges = self
            .trigger_deps
            .values()
            .filter(|l| l.from == triggerid || l.to == triggerid)
            .map(|l| l.linkid)
            .collect::<Vec<_>>();
        for linkid in edges {
            self.remove_trigger_dep(linkid);
        }
        trigger.release(&mut self.pool);
    }

    /// Remove triggers whose functions have all been removed.
    pub(crate) fn remove_orphan_triggers(&mut self) {
        let orphans = self
            .triggers
            .values()
            .filter(|t| !t.functionids.is_empty() && self.trigger_functions.get(&t.triggerid).is_empty())
            .map(|t| t.triggerid)
            .collect::<Vec<_>>();
        for triggerid in orphans {
            self.remove_trigger(triggerid);
        }
    }

    pub(super) fn sync_trigger_deps(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let linkid = row.rowid;
            if row.tag == RowTag::Remove {
                self.remove_trigger_dep(linkid);
                return Ok(Applied::Done);
            }
            let link = Link {
                linkid,
                from: row.u64(0),
                to: row.u64(1),
            };
            if !self.triggers.contains(link.from) || !self.triggers.contains(link.to) {
                return Ok(Applied::Skipped);
            }
            let (token, found) = self.trigger_deps.find_or_create(linkid, || link)?;
            if found {
                let Some(old) = self.trigger_deps.at_mut(token).map(|l| std::mem::replace(l, link)) else {
                    return Ok(Applied::Skipped);
                };
                if old == link {
                    return Ok(Applied::Done);
                }
                self.dep_unlink(old.from, old.to);
            }
            self.dep_link(link.from, link.to);
            Ok(Applied::Done)
        })
    }

    fn remove_trigger_dep(&mut self, linkid: u64) {
        if let Some(link) = self.trigger_deps.remove(linkid) {
            self.dep_unlink(link.from, link.to);
        }
    }

    pub(super) fn sync_trigger_tags(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let triggertagid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(tag) = self.trigger_tags.remove(triggertagid) {
                    if let Some(trigger) = self.triggers.get_mut(tag.triggerid) {
                        trigger.tags.retain(|&id| id != triggertagid);
                    }
                    tag.release(&mut self.pool);
                }
                return Ok(Applied::Done);
            }

            let triggerid = row.u64(0);
            let Some(trigger) = self.triggers.get_mut(triggerid) else {
                return Ok(Applied::Skipped);
            };
            if let Err(pos) = trigger.tags.binary_search(&triggertagid) {
                trigger.tags.insert(pos, triggertagid);
            }

            let (token, found) = self.trigger_tags.find_or_create(triggertagid, || TriggerTag {
                triggertagid,
                triggerid,
                ..Default::default()
            })?;
            let Some(tag) = self.trigger_tags.at_mut(token) else {
                return Ok(Applied::Skipped);
            };
            if found && tag.triggerid != triggerid {
                if let Some(old) = self.triggers.get_mut(tag.triggerid) {
                    old.tags.retain(|&id| id != triggertagid);
                }
                tag.triggerid = triggerid;
            }
            self.pool.replace(found, &mut tag.tag, row.str(1))?;
            self.pool.replace(found, &mut tag.value, row.str(2))?;
            Ok(Applied::Done)
        })
    }
}
