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

use crate::{
    model::{AgentKind, HostStatus, ItemStatus},
    scheduler::timer_nextcheck,
    store::Store,
};

/// Derived data of one trigger, computed from its functions.
struct TriggerLinks {
    triggerid: u64,
    functionids: Vec<u64>,
    itemids: Vec<u64>,
    timer: bool,
    functional: bool,
}

impl Store {
    /// Rebuild everything derived from the primary tables after a synchronization.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "confcache::sync::derived"))]
    pub(crate) fn rebuild_derived(&mut self, now: i64) {
        if self.groups_dirty {
            self.sort_host_groups();
            self.groups_dirty = false;
        }
        if self.nested_dirty {
            for group in self.host_groups.values_mut() {
                group.nested = None;
            }
            self.nested_dirty = false;
        }

        self.rebuild_item_counts();
        self.rebuild_trigger_links();
        self.rebuild_timer_queue(now);
        self.update_topoindex();

        let hostids = std::mem::take(&mut self.requeue_hosts);
        for hostid in hostids.into_iter().sorted_unstable().dedup() {
            for itemid in self.host_items.get(&hostid).to_vec() {
                self.update_item_queue(itemid, now, true);
            }
        }

        if self.maintenance_dirty {
            self.update_host_maintenance(now);
            self.maintenance_dirty = false;
        }
        self.status.invalidate();
    }

    fn sort_host_groups(&mut self) {
        let mut groups = self
            .host_groups
            .values()
            .map(|g| (self.pool.get(&g.name), g.groupid))
            .collect_vec();
        groups.sort_unstable();
        self.hostgroups_name = groups.into_iter().map(|(_, id)| id).collect();
    }

    fn rebuild_item_counts(&mut self) {
        for host in self.hosts.values_mut() {
            host.items_num = [0; 4];
        }
        for interface in self.interfaces.values_mut() {
            interface.items_num = 0;
        }

        let counted = self
            .items
            .values()
            .filter(|item| item.status == ItemStatus::Active)
            .map(|item| (item.hostid, item.interfaceid, item.item_type.agent_kind()))
            .collect_vec();
        for (hostid, interfaceid, kind) in counted {
            let Some(host) = self.hosts.get_mut(hostid) else {
                continue;
            };
            if host.status != HostStatus::Monitored {
                continue;
            }
            if let Some(kind) = kind {
                host.items_num[kind.index()] += 1;
            }
            if let Some(interface) = self.interfaces.get_mut(interfaceid) {
                interface.items_num += 1;
            }
        }
    }

    fn rebuild_trigger_links(&mut self) {
        for item in self.items.values_mut() {
            item.triggers.clear();
        }

        let links = self
            .triggers
            .values()
            .map(|trigger| {
                let functionids = self.trigger_functions.get(&trigger.triggerid).to_vec();
                let functions = functionids.iter().filter_map(|&id| self.functions.get(id)).collect_vec();
                let itemids = functions.iter().map(|f| f.itemid).sorted_unstable().dedup().collect_vec();
                let functional = !itemids.is_empty()
                    && itemids.iter().all(|&itemid| {
                        self.items.get(itemid).is_some_and(|item| {
                            item.status == ItemStatus::Active
                                && self
                                    .hosts
                                    .get(item.hostid)
                                    .is_some_and(|host| host.status == HostStatus::Monitored)
                        })
                    });
                TriggerLinks {
                    triggerid: trigger.triggerid,
                    timer: functions.iter().any(|f| f.timer),
                    functionids,
                    itemids,
                    functional,
                }
            })
            .collect_vec();

        for links in links {
            for &itemid in &links.itemids {
                if let Some(item) = self.items.get_mut(itemid) {
                    item.triggers.push(links.triggerid);
                }
            }
            if let Some(trigger) = self.triggers.get_mut(links.triggerid) {
                trigger.functionids = links.functionids;
                trigger.itemids = links.itemids;
                trigger.timer = links.timer;
                trigger.functional = links.functional;
            }
        }

        for item in self.items.values_mut() {
            item.triggers.sort_unstable();
        }
    }

    fn rebuild_timer_queue(&mut self, now: i64) {
        let delay = self.config.timer_delay;
        let enabled = self.config.timers > 0;
        let timers = self
            .triggers
            .values()
            .map(|t| (t.triggerid, enabled && t.timer && t.is_evaluated(), t.locked))
            .collect_vec();
        for (triggerid, timer, locked) in timers {
            match (timer, locked) {
                (true, false) => {
                    if !self.queues.timers.contains(&triggerid) {
                        self.queues.timers.insert(triggerid, timer_nextcheck(triggerid, now, delay));
                    }
                }
                (true, true) => {}
                (false, _) => {
                    self.queues.timers.remove(&triggerid);
                }
            }
        }
    }

    /// Availability families whose items are all gone from a host.
    pub(crate) fn agents_without_items(&self, hostid: u64) -> Vec<AgentKind> {
        self.hosts
            .get(hostid)
            .map(|host| {
                AgentKind::ALL
                    .into_iter()
                    .filter(|kind| host.items_num[kind.index()] == 0)
                    .collect()
            })
            .unwrap_or_default()
    }
}
