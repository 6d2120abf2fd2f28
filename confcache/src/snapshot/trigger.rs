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

use confcache_memory::Interned;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::TriggerSnapshot;
use crate::{
    model::{Trigger, TriggerState, TriggerValue},
    store::Store,
    trigger_deps::DependencyCheck,
};

/// Runtime fields of a trigger reported after evaluation, `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDiff {
    /// Trigger id.
    pub triggerid: u64,
    /// New value.
    pub value: Option<TriggerValue>,
    /// New evaluation state.
    pub state: Option<TriggerState>,
    /// New error.
    pub error: Option<String>,
    /// Time of the value change.
    pub lastchange: Option<i64>,
}

/// Result of locking the triggers of a batch of history items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerLocks {
    /// Triggers locked by this call, to be unlocked by the caller.
    pub triggerids: Vec<u64>,
    /// Items with a trigger locked by another worker, to be processed later.
    pub busy_itemids: Vec<u64>,
}

/// Dependencies of one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDeps {
    /// Trigger id.
    pub triggerid: u64,
    /// Triggers it directly depends on.
    pub masters: Vec<u64>,
    /// Whether the masters let the trigger change its value.
    pub check: DependencyCheck,
}

impl Store {
    fn trigger_snapshot(&self, trigger: &Trigger) -> TriggerSnapshot {
        let s = |i: &Interned| self.pool.get(i).to_string();
        TriggerSnapshot {
            triggerid: trigger.triggerid,
            description: s(&trigger.description),
            expression: s(&trigger.expression),
            recovery_expression: s(&trigger.recovery_expression),
            correlation_tag: s(&trigger.correlation_tag),
            priority: trigger.priority,
            kind: trigger.kind,
            recovery_mode: trigger.recovery_mode,
            correlation_mode: trigger.correlation_mode,
            status: trigger.status,
            value: trigger.value,
            state: trigger.state,
            error: trigger.error.clone(),
            lastchange: trigger.lastchange,
            topoindex: trigger.topoindex,
            itemids: trigger.itemids.clone(),
            tags: trigger
                .tags
                .iter()
                .filter_map(|&id| self.trigger_tags.get(id))
                .map(|tag| (s(&tag.tag), s(&tag.value)))
                .collect(),
        }
    }

    /// Triggers by id.
    pub fn get_triggers_by_triggerids(&self, triggerids: &[u64]) -> Vec<Option<TriggerSnapshot>> {
        triggerids
            .iter()
            .map(|&id| self.triggers.get(id).map(|trigger| self.trigger_snapshot(trigger)))
            .collect()
    }

    /// Apply trigger values computed by history syncers.
    pub fn triggers_apply_changes(&mut self, diffs: &[TriggerDiff]) {
        for diff in diffs {
            let Some(trigger) = self.triggers.get_mut(diff.triggerid) else {
                continue;
            };
            if let Some(value) = diff.value {
                trigger.value = value;
            }
            if let Some(state) = diff.state {
                trigger.state = state;
            }
            if let Some(error) = &diff.error {
                trigger.error.clone_from(error);
            }
            if let Some(lastchange) = diff.lastchange {
                trigger.lastchange = lastchange;
            }
        }
    }

    /// Lock the evaluated triggers of every history item whose triggers are all unlocked.
    ///
    /// Items with at least one trigger locked elsewhere lock nothing and are reported as busy.
    pub fn lock_triggers_by_history_items(&mut self, itemids: &[u64]) -> TriggerLocks {
        let mut locks = TriggerLocks::default();
        for &itemid in itemids {
            let Some(item) = self.items.get(itemid) else {
                continue;
            };
            let triggerids = item
                .triggers
                .iter()
                .copied()
                .filter(|&id| self.triggers.get(id).is_some_and(Trigger::is_evaluated))
                .collect_vec();
            if triggerids
                .iter()
                .any(|&id| self.triggers.get(id).is_some_and(|trigger| trigger.locked))
            {
                locks.busy_itemids.push(itemid);
                continue;
            }
            for id in triggerids {
                if let Some(trigger) = self.triggers.get_mut(id) {
                    trigger.locked = true;
                    locks.triggerids.push(id);
                }
            }
        }
        locks
    }

    /// Lock evaluated triggers that are not locked yet, returning the ones locked by this call.
    pub fn lock_triggers_by_ids(&mut self, triggerids: &[u64]) -> Vec<u64> {
        let mut locked = vec![];
        for &id in triggerids {
            if let Some(trigger) = self.triggers.get_mut(id) {
                if trigger.is_evaluated() && !trigger.locked {
                    trigger.locked = true;
                    locked.push(id);
                }
            }
        }
        locked
    }

    /// Release trigger locks.
    pub fn unlock_triggers(&mut self, triggerids: &[u64]) {
        for &id in triggerids {
            if let Some(trigger) = self.triggers.get_mut(id) {
                trigger.locked = false;
            }
        }
    }

    /// Release every trigger lock.
    pub fn unlock_all_triggers(&mut self) {
        self.triggers.values_mut().for_each(|trigger| trigger.locked = false);
    }

    /// Direct masters of the given triggers and whether they block them.
    ///
    /// The given triggers are treated as one evaluation batch. Unknown triggers are skipped.
    pub fn get_trigger_dependencies(&self, triggerids: &[u64]) -> Vec<TriggerDeps> {
        let batch = triggerids.iter().copied().sorted_unstable().dedup().collect_vec();
        triggerids
            .iter()
            .filter(|&&id| self.triggers.contains(id))
            .map(|&triggerid| TriggerDeps {
                triggerid,
                masters: self.dep_masters(triggerid).to_vec(),
                check: self.check_dependencies(triggerid, &batch),
            })
            .collect()
    }

    /// Check whether the masters of `triggerid` let it change its value.
    ///
    /// `batch` lists the triggers evaluated together with it.
    pub fn check_trigger_dependencies(&self, triggerid: u64, batch: &[u64]) -> DependencyCheck {
        let batch = batch.iter().copied().sorted_unstable().collect_vec();
        self.check_dependencies(triggerid, &batch)
    }
}
