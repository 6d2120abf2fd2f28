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

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{FunctionSnapshot, InterfaceSnapshot, ItemSnapshot};
use crate::{
    model::{HostStatus, Item, ItemState, ItemStatus},
    store::Store,
};

/// Discovery rules and prototypes.
const DISCOVERY_RULE_OR_PROTOTYPE: u8 = 0b011;

/// Runtime fields of an item reported by a history syncer, `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDiff {
    /// Item id.
    pub itemid: u64,
    /// Log file size already read.
    pub lastlogsize: Option<u64>,
    /// Log file modification time.
    pub mtime: Option<i32>,
    /// Runtime state.
    pub state: Option<ItemState>,
    /// Last error.
    pub error: Option<String>,
    /// Last value timestamp.
    pub lastclock: Option<i64>,
}

impl Store {
    pub(crate) fn item_snapshot(&self, item: &Item) -> Option<ItemSnapshot> {
        let host = self.host_snapshot(self.hosts.get(item.hostid)?);
        let interface = self
            .interfaces
            .get(item.interfaceid)
            .map(|interface| InterfaceSnapshot::new(&self.pool, interface));
        Some(ItemSnapshot::new(&self.pool, item, host, interface))
    }

    /// Items by id.
    pub fn get_items_by_itemids(&self, itemids: &[u64]) -> Vec<Option<ItemSnapshot>> {
        itemids
            .iter()
            .map(|&itemid| self.items.get(itemid).and_then(|item| self.item_snapshot(item)))
            .collect()
    }

    /// Items by host technical name and key.
    pub fn get_items_by_keys(&self, keys: &[(&str, &str)]) -> Vec<Option<ItemSnapshot>> {
        keys.iter()
            .map(|&(host, key)| {
                let host = self.hosts.at(self.hosts_h.get(&self.pool.lookup(host)?)?)?;
                let token = self.items_hk.get(&(host.hostid, self.pool.lookup(key)?))?;
                self.item_snapshot(self.items.at(token)?)
            })
            .collect()
    }

    /// Dependent items of a master item.
    pub fn get_dependent_itemids(&self, master_itemid: u64) -> Vec<u64> {
        self.masteritems.get(&master_itemid).to_vec()
    }

    /// Preprocessing steps of an item as `(type, params)`, in step order.
    pub fn get_item_preprocessing(&self, itemid: u64) -> Vec<(u8, String)> {
        self.preprocitems
            .get(&itemid)
            .iter()
            .filter_map(|&id| self.preprocs.get(id))
            .sorted_unstable_by_key(|step| (step.step, step.item_preprocid))
            .map(|step| (step.kind, self.pool.get(&step.params).to_string()))
            .collect()
    }

    fn count_items(&self, hostid: Option<u64>, state: ItemState) -> usize {
        let counted = |item: &&Item| {
            item.status == ItemStatus::Active
                && item.state == state
                && item.flags & DISCOVERY_RULE_OR_PROTOTYPE == 0
                && self
                    .hosts
                    .get(item.hostid)
                    .is_some_and(|host| host.status == HostStatus::Monitored)
        };
        match hostid {
            Some(hostid) => self
                .host_items
                .get(&hostid)
                .iter()
                .filter_map(|&id| self.items.get(id))
                .filter(counted)
                .count(),
            None => self.items.values().filter(counted).count(),
        }
    }

    /// Enabled items collecting values, on one host or on every host.
    pub fn get_item_count(&self, hostid: Option<u64>) -> usize {
        self.count_items(hostid, ItemState::Normal)
    }

    /// Enabled items that are not supported, on one host or on every host.
    pub fn get_item_unsupported_count(&self, hostid: Option<u64>) -> usize {
        self.count_items(hostid, ItemState::NotSupported)
    }

    /// Apply runtime changes reported by history syncers.
    pub fn items_apply_changes(&mut self, diffs: &[ItemDiff]) {
        for diff in diffs {
            let Some(item) = self.items.get_mut(diff.itemid) else {
                continue;
            };
            if let Some(lastlogsize) = diff.lastlogsize {
                item.lastlogsize = lastlogsize;
            }
            if let Some(mtime) = diff.mtime {
                item.mtime = mtime;
            }
            if let Some(state) = diff.state {
                item.state = state;
            }
            if let Some(error) = &diff.error {
                item.error.clone_from(error);
            }
            if let Some(lastclock) = diff.lastclock {
                item.lastclock = lastclock;
            }
        }
    }

    /// Functions by id.
    pub fn get_functions_by_functionids(&self, functionids: &[u64]) -> Vec<Option<FunctionSnapshot>> {
        functionids
            .iter()
            .map(|&id| {
                let f = self.functions.get(id)?;
                Some(FunctionSnapshot {
                    functionid: f.functionid,
                    itemid: f.itemid,
                    triggerid: f.triggerid,
                    function: self.pool.get(&f.function).to_string(),
                    parameter: self.pool.get(&f.parameter).to_string(),
                })
            })
            .collect()
    }

    /// Hosts owning the items the given functions are evaluated on, sorted and deduplicated.
    pub fn get_hostids_by_functionids(&self, functionids: &[u64]) -> Vec<u64> {
        functionids
            .iter()
            .filter_map(|&id| self.functions.get(id))
            .filter_map(|f| self.items.get(f.itemid))
            .map(|item| item.hostid)
            .sorted_unstable()
            .dedup()
            .collect()
    }
}
