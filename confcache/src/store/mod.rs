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

//! Primary tables, secondary indices and the string pool, all guarded together by the cache lock.

mod index;
mod release;
mod table;

use std::sync::Arc;

use confcache_memory::{Arena, ArenaStats, StrKey, StringPool};
use hashbrown::HashMap;

pub(crate) use self::release::Release;
pub use self::{
    index::{MultiIndex, UniqueIndex},
    table::Table,
};
pub(crate) use self::index::index_anomaly;
use crate::{
    config::CacheConfig,
    model::{
        Action, ActionCondition, AutoregPsk, CorrCondition, CorrOperation, Correlation, DepNode, Expression, Function,
        GlobalConfig, GlobalMacro, Host, HostGroup, HostInventory, HostMacro, HostTag, Interface, InterfaceType, Item,
        Link, Maintenance, MaintenancePeriod, MaintenanceTag, PreprocStep, PrototypeItem, Proxy, Psk, TemplateItem,
        Trigger, TriggerTag,
    },
    scheduler::Queues,
    stats::StatusCache,
};

/// The whole cached configuration.
#[derive(Debug)]
pub struct Store {
    pub(crate) arena: Arc<Arena>,
    pub(crate) pool: StringPool,
    pub(crate) config: CacheConfig,

    /* single row tables */
    pub(crate) global: GlobalConfig,
    pub(crate) global_synced: bool,
    pub(crate) autoreg_psk: AutoregPsk,

    /* primary tables */
    pub(crate) hosts: Table<Host>,
    pub(crate) proxies: Table<Proxy>,
    pub(crate) inventories: Table<HostInventory>,
    pub(crate) psks: HashMap<StrKey, Psk>,
    pub(crate) host_templates: Table<Link>,
    pub(crate) host_tags: Table<HostTag>,
    pub(crate) gmacros: Table<GlobalMacro>,
    pub(crate) hmacros: Table<HostMacro>,
    pub(crate) interfaces: Table<Interface>,
    pub(crate) items: Table<Item>,
    pub(crate) template_items: Table<TemplateItem>,
    pub(crate) prototype_items: Table<PrototypeItem>,
    pub(crate) preprocs: Table<PreprocStep>,
    pub(crate) functions: Table<Function>,
    pub(crate) triggers: Table<Trigger>,
    pub(crate) trigger_deps: Table<Link>,
    pub(crate) trigger_tags: Table<TriggerTag>,
    pub(crate) expressions: Table<Expression>,
    pub(crate) actions: Table<Action>,
    pub(crate) action_conditions: Table<ActionCondition>,
    pub(crate) correlations: Table<Correlation>,
    pub(crate) corr_conditions: Table<CorrCondition>,
    pub(crate) corr_operations: Table<CorrOperation>,
    pub(crate) host_groups: Table<HostGroup>,
    pub(crate) group_hosts: Table<Link>,
    pub(crate) maintenances: Table<Maintenance>,
    pub(crate) maintenance_tags: Table<MaintenanceTag>,
    pub(crate) maintenance_periods: Table<MaintenancePeriod>,
    pub(crate) maintenance_groups: Table<Link>,
    pub(crate) maintenance_hosts: Table<Link>,

    /* secondary indices */
    /// Monitored and not monitored hosts by technical name.
    pub(crate) hosts_h: UniqueIndex<StrKey>,
    /// Proxies by name.
    pub(crate) hosts_p: UniqueIndex<StrKey>,
    /// Items by host and key.
    pub(crate) items_hk: UniqueIndex<(u64, StrKey)>,
    /// Main interfaces by host and type.
    pub(crate) interfaces_ht: UniqueIndex<(u64, InterfaceType)>,
    /// SNMP interfaces by address.
    pub(crate) interface_snmpaddrs: MultiIndex<String>,
    /// SNMP trap items by interface.
    pub(crate) interface_snmpitems: MultiIndex<u64>,
    /// Global macros by name.
    pub(crate) gmacros_m: MultiIndex<StrKey>,
    /// Host macros by host and name.
    pub(crate) hmacros_hm: MultiIndex<(u64, StrKey)>,
    /// Templates linked to a host.
    pub(crate) htmpls: MultiIndex<u64>,
    /// Host tags by host.
    pub(crate) host_tags_index: MultiIndex<u64>,
    /// Host groups of a host.
    pub(crate) host_groups_index: MultiIndex<u64>,
    /// Host groups sorted by name.
    pub(crate) hostgroups_name: Vec<u64>,
    /// Expressions by regular expression name.
    pub(crate) regexps: MultiIndex<StrKey>,
    /// Dependent items by master item.
    pub(crate) masteritems: MultiIndex<u64>,
    /// Preprocessing steps by item.
    pub(crate) preprocitems: MultiIndex<u64>,
    /// Items by host.
    pub(crate) host_items: MultiIndex<u64>,
    /// Functions by item.
    pub(crate) item_functions: MultiIndex<u64>,
    /// Functions by trigger.
    pub(crate) trigger_functions: MultiIndex<u64>,
    /// Trigger dependency graph.
    pub(crate) deplists: HashMap<u64, DepNode>,

    /* derived state */
    pub(crate) queues: Queues,
    pub(crate) status: StatusCache,
    /// Host groups or maintenance groups changed, nested group caches are stale.
    pub(crate) nested_dirty: bool,
    /// Maintenance configuration changed since the last host maintenance update.
    pub(crate) maintenance_dirty: bool,
    /// Host group names changed, the sorted group list must be rebuilt.
    pub(crate) groups_dirty: bool,
    /// Hosts whose items must be rescheduled after the running sync.
    pub(crate) requeue_hosts: Vec<u64>,
}

impl Store {
    pub(crate) fn new(config: CacheConfig, arena: Arc<Arena>) -> Self {
        macro_rules! table {
            () => {
                Table::new(arena.clone())
            };
        }
        Self {
            pool: StringPool::new(arena.clone()),
            config,
            global: GlobalConfig::default(),
            global_synced: false,
            autoreg_psk: AutoregPsk::default(),
            hosts: table!(),
            proxies: table!(),
            inventories: table!(),
            psks: HashMap::new(),
            host_templates: table!(),
            host_tags: table!(),
            gmacros: table!(),
            hmacros: table!(),
            interfaces: table!(),
            items: table!(),
            template_items: table!(),
            prototype_items: table!(),
            preprocs: table!(),
            functions: table!(),
            triggers: table!(),
            trigger_deps: table!(),
            trigger_tags: table!(),
            expressions: table!(),
            actions: table!(),
            action_conditions: table!(),
            correlations: table!(),
            corr_conditions: table!(),
            corr_operations: table!(),
            host_groups: table!(),
            group_hosts: table!(),
            maintenances: table!(),
            maintenance_tags: table!(),
            maintenance_periods: table!(),
            maintenance_groups: table!(),
            maintenance_hosts: table!(),
            hosts_h: UniqueIndex::default(),
            hosts_p: UniqueIndex::default(),
            items_hk: UniqueIndex::default(),
            interfaces_ht: UniqueIndex::default(),
            interface_snmpaddrs: MultiIndex::default(),
            interface_snmpitems: MultiIndex::default(),
            gmacros_m: MultiIndex::default(),
            hmacros_hm: MultiIndex::default(),
            htmpls: MultiIndex::default(),
            host_tags_index: MultiIndex::default(),
            host_groups_index: MultiIndex::default(),
            hostgroups_name: vec![],
            regexps: MultiIndex::default(),
            masteritems: MultiIndex::default(),
            preprocitems: MultiIndex::default(),
            host_items: MultiIndex::default(),
            item_functions: MultiIndex::default(),
            trigger_functions: MultiIndex::default(),
            deplists: HashMap::new(),
            queues: Queues::default(),
            status: StatusCache::default(),
            nested_dirty: true,
            maintenance_dirty: true,
            groups_dirty: true,
            requeue_hosts: vec![],
            arena,
        }
    }

    /// Arena usage.
    pub(crate) fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    /// Resolve a string to its pool key without taking a reference.
    pub(crate) fn key_of(&self, s: &str) -> Option<StrKey> {
        self.pool.lookup(s)
    }

    /// List every secondary index entry or back reference that does not lead to a live primary entry.
    pub(crate) fn dangling_references(&self) -> Vec<String> {
        let mut dangling = vec![];

        for (key, token) in self.hosts_h.iter() {
            if self.hosts.at(token).is_none() {
                dangling.push(format!("hosts_h: {}", self.pool.get_by_key(*key)));
            }
        }
        for (key, token) in self.hosts_p.iter() {
            if self.hosts.at(token).is_none() {
                dangling.push(format!("hosts_p: {}", self.pool.get_by_key(*key)));
            }
        }
        for ((hostid, key), token) in self.items_hk.iter() {
            if self.items.at(token).is_none() || !self.hosts.contains(*hostid) {
                dangling.push(format!("items_hk: [{hostid}] {}", self.pool.get_by_key(*key)));
            }
        }
        for ((hostid, kind), token) in self.interfaces_ht.iter() {
            if self.interfaces.at(token).is_none() || !self.hosts.contains(*hostid) {
                dangling.push(format!("interfaces_ht: [{hostid}] {kind:?}"));
            }
        }

        for (addr, ids) in self.interface_snmpaddrs.iter() {
            for &id in ids {
                if !self.interfaces.contains(id) {
                    dangling.push(format!("interface_snmpaddrs: {addr} -> {id}"));
                }
            }
        }
        for (interfaceid, ids) in self.interface_snmpitems.iter() {
            for &id in ids {
                if !self.items.contains(id) || !self.interfaces.contains(*interfaceid) {
                    dangling.push(format!("interface_snmpitems: {interfaceid} -> {id}"));
                }
            }
        }
        for ((hostid, _), ids) in self.hmacros_hm.iter() {
            for &id in ids {
                if !self.hmacros.contains(id) {
                    dangling.push(format!("hmacros_hm: [{hostid}] -> {id}"));
                }
            }
        }
        for (_, ids) in self.gmacros_m.iter() {
            for &id in ids {
                if !self.gmacros.contains(id) {
                    dangling.push(format!("gmacros_m: {id}"));
                }
            }
        }
        for (hostid, ids) in self.host_tags_index.iter() {
            for &id in ids {
                if !self.host_tags.contains(id) {
                    dangling.push(format!("host_tags_index: [{hostid}] -> {id}"));
                }
            }
        }
        for (master, ids) in self.masteritems.iter() {
            for &id in ids {
                if !self.items.contains(id) {
                    dangling.push(format!("masteritems: {master} -> {id}"));
                }
            }
        }
        for (itemid, ids) in self.preprocitems.iter() {
            for &id in ids {
                if !self.preprocs.contains(id) {
                    dangling.push(format!("preprocitems: {itemid} -> {id}"));
                }
            }
        }
        for (hostid, ids) in self.host_items.iter() {
            for &id in ids {
                if !self.items.contains(id) || !self.hosts.contains(*hostid) {
                    dangling.push(format!("host_items: {hostid} -> {id}"));
                }
            }
        }
        for (triggerid, ids) in self.trigger_functions.iter() {
            for &id in ids {
                if !self.functions.contains(id) {
                    dangling.push(format!("trigger_functions: {triggerid} -> {id}"));
                }
            }
        }
        for (itemid, ids) in self.item_functions.iter() {
            for &id in ids {
                if !self.functions.contains(id) {
                    dangling.push(format!("item_functions: {itemid} -> {id}"));
                }
            }
        }
        for host in self.hosts.values() {
            for &id in &host.interfaces {
                if !self.interfaces.contains(id) {
                    dangling.push(format!("host interfaces: [{}] -> {id}", host.hostid));
                }
            }
        }
        for trigger in self.triggers.values() {
            for &id in &trigger.tags {
                if !self.trigger_tags.contains(id) {
                    dangling.push(format!("trigger tags: [{}] -> {id}", trigger.triggerid));
                }
            }
        }
        for tag in self.trigger_tags.values() {
            if !self.triggers.contains(tag.triggerid) {
                dangling.push(format!("trigger tag: [{}] -> {}", tag.triggertagid, tag.triggerid));
            }
        }
        for item in self.items.values() {
            if !self.hosts.contains(item.hostid) {
                dangling.push(format!("item host: [{}] -> {}", item.itemid, item.hostid));
            }
        }
        for interface in self.interfaces.values() {
            if !self.hosts.contains(interface.hostid) {
                dangling.push(format!("interface host: [{}] -> {}", interface.interfaceid, interface.hostid));
            }
        }
        for poller_type in crate::scheduler::PollerType::ALL {
            for (&itemid, _) in self.queues.poller(poller_type).iter() {
                if !self.items.contains(itemid) {
                    dangling.push(format!("{poller_type:?} queue: {itemid}"));
                }
            }
        }

        dangling
    }
}
