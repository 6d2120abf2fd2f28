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

use confcache_common::interval::{UpdateInterval, JAN_2038};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{
    calculate_item_nextcheck, calculate_item_nextcheck_unreachable, BatchKey, Location, PollerType, QueueEntry,
    QueuePriority, MAX_SNMP_ITEMS,
};
use crate::{
    config::ProgramType,
    model::{Host, HostStatus, Item, ItemKind, ItemState, ItemStatus, ItemType, SnmpOidType},
    snapshot::ItemSnapshot,
    store::Store,
};

/// Outcome class of one poll, as reported by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollStatus {
    /// A value was collected.
    Succeed,
    /// The item is not supported by the target.
    NotSupported,
    /// The agent answered with an error.
    AgentError,
    /// The request timed out.
    TimeoutError,
    /// The target could not be reached.
    NetworkError,
    /// A gateway in between could not be reached.
    GatewayError,
    /// The item configuration is unusable.
    ConfigError,
}

/// A polled item handed back to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    /// Item id.
    pub itemid: u64,
    /// State the item ended up in.
    pub state: ItemState,
    /// When the poll finished.
    pub lastclock: i64,
    /// Outcome class.
    pub status: PollStatus,
}

/// An overdue item of the queue report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedItem {
    /// Item id.
    pub itemid: u64,
    /// Owner host.
    pub hostid: u64,
    /// Proxy of the host, `0` if none.
    pub proxy_hostid: u64,
    /// Item type.
    pub item_type: ItemType,
    /// When the item was due.
    pub nextcheck: i64,
}

/// Result of a "check now" request for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reschedule {
    /// The item is unknown or not scheduled.
    NotFound,
    /// The item was moved forward in its queue.
    Rescheduled,
    /// The item is polled by the given proxy, the request must be forwarded.
    Proxied(u64),
}

/// How host reachability is taken into account when scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    /// Derived from the host availability.
    Host,
    /// A value was just collected.
    Collected,
    /// The host just failed to answer.
    Unreachable,
}

const ICMPPING_KEYS: [&str; 3] = ["icmpping", "icmppingloss", "icmppingsec"];

fn is_icmpping(key: &str) -> bool {
    let id = key.split_once('[').map_or(key, |(id, _)| id);
    ICMPPING_KEYS.contains(&id)
}

fn server_side(item_type: ItemType) -> bool {
    matches!(item_type, ItemType::Internal | ItemType::Aggregate | ItemType::Calculated)
}

impl Store {
    fn agent_errors_from(item: &Item, host: &Host) -> i64 {
        item.item_type.agent_kind().map_or(0, |kind| host.agent(kind).errors_from)
    }

    fn agent_disable_until(item: &Item, host: &Host) -> i64 {
        item.item_type.agent_kind().map_or(0, |kind| host.agent(kind).disable_until)
    }

    fn interface_bulk(&self, interfaceid: u64) -> bool {
        self.interfaces.get(interfaceid).is_some_and(|i| i.bulk)
    }

    /// The queue an item belongs to, `None` if this process does not poll it.
    pub(crate) fn poller_by_item(&self, item: &Item, host: &Host, unreachable: bool) -> Option<PollerType> {
        if self.config.program_type == ProgramType::Server && host.is_proxied() && !server_side(item.item_type) {
            return None;
        }

        let config = &self.config;
        let (poller_type, size) = match item.item_type {
            ItemType::Simple if is_icmpping(self.pool.get(&item.key)) => (PollerType::Pinger, config.pingers),
            ItemType::Ipmi => (PollerType::Ipmi, config.ipmi_pollers),
            ItemType::Jmx => (PollerType::Java, config.java_pollers),
            t if !t.is_polled() => return None,
            _ => (PollerType::Normal, config.pollers),
        };
        if size == 0 {
            return None;
        }

        match poller_type {
            PollerType::Normal | PollerType::Java if unreachable && config.unreachable_pollers > 0 => {
                Some(PollerType::Unreachable)
            }
            poller_type => Some(poller_type),
        }
    }

    /// Items sharing a seed and an interval are checked together.
    fn item_seed(&self, item: &Item) -> u64 {
        match item.item_type {
            ItemType::Jmx => item.interfaceid,
            t if t.is_snmp() && self.interface_bulk(item.interfaceid) => item.interfaceid,
            ItemType::Simple if is_icmpping(self.pool.get(&item.key)) => item.interfaceid,
            _ => item.itemid,
        }
    }

    fn batch_key(item: &Item) -> BatchKey {
        match &item.kind {
            ItemKind::Snmp(snmp) => BatchKey::Snmp {
                interfaceid: item.interfaceid,
                port: item.port.key(),
                community: snmp.community.key(),
                securityname: snmp.securityname.key(),
                contextname: snmp.contextname.key(),
            },
            ItemKind::Jmx { credentials, endpoint } => BatchKey::Jmx {
                interfaceid: item.interfaceid,
                endpoint: endpoint.key(),
                username: credentials.username.key(),
            },
            _ => BatchKey::None,
        }
    }

    /// Next check of an item and whether its interval could be parsed.
    fn item_nextcheck(&self, item: &Item, host: &Host, now: i64, unreachable: bool) -> (i64, bool) {
        let interval = match item.state {
            ItemState::NotSupported => Ok(UpdateInterval {
                simple: self.global.refresh_unsupported,
                ..Default::default()
            }),
            ItemState::Normal => self
                .expand_macros(self.pool.get(&item.delay), &[item.hostid])
                .parse::<UpdateInterval>(),
        };
        let interval = match interval {
            Ok(interval) => interval,
            Err(e) => {
                tracing::warn!(itemid = item.itemid, error = %e, "[scheduler]: item is not schedulable");
                return (JAN_2038, false);
            }
        };

        let disable_until = Self::agent_disable_until(item, host);
        let nextcheck = if unreachable && disable_until != 0 && item.queue_priority != QueuePriority::High {
            calculate_item_nextcheck_unreachable(&interval, disable_until)
        } else {
            calculate_item_nextcheck(self.item_seed(item), item.item_type, &interval, now)
        };
        (nextcheck, true)
    }

    /// Bring the queue position of an item in line with its configuration.
    ///
    /// `recompute` forces a new next check even if the item stays in the same queue.
    pub(crate) fn update_item_queue(&mut self, itemid: u64, now: i64, recompute: bool) {
        self.schedule_item(itemid, now, Reach::Host, recompute);
    }

    fn schedule_item(&mut self, itemid: u64, now: i64, reach: Reach, recompute: bool) {
        let Some(item) = self.items.get(itemid) else {
            return;
        };
        let host = self
            .hosts
            .get(item.hostid)
            .filter(|host| host.status == HostStatus::Monitored && item.status == ItemStatus::Active);
        let Some(host) = host else {
            self.unqueue_item(itemid);
            if let Some(item) = self.items.get_mut(itemid) {
                item.poller_type = None;
            }
            return;
        };

        let unreachable = match reach {
            Reach::Host => Self::agent_errors_from(item, host) != 0,
            Reach::Collected => false,
            Reach::Unreachable => true,
        };
        let poller_type = self.poller_by_item(item, host, unreachable);

        let queued = item.location == Location::Queue;
        let refresh = recompute || !queued;
        let (nextcheck, schedulable) = match refresh && item.item_type.is_polled() {
            true => self.item_nextcheck(item, host, now, unreachable),
            false => (item.nextcheck, item.schedulable),
        };
        let entry = QueueEntry {
            nextcheck,
            priority: item.queue_priority,
            interfaceid: item.interfaceid,
            batch: Self::batch_key(item),
        };
        let (location, old_poller) = (item.location, item.poller_type);

        if location == Location::Queue && old_poller != poller_type {
            if let Some(old) = old_poller {
                self.queues.poller_mut(old).remove(&itemid);
            }
        }

        let Some(item) = self.items.get_mut(itemid) else {
            return;
        };
        item.poller_type = poller_type;
        item.nextcheck = nextcheck;
        item.schedulable = schedulable;

        match (location, poller_type) {
            // Handed out: the requeue puts it back.
            (Location::Poller, _) => {}
            (_, Some(poller_type)) => {
                item.location = Location::Queue;
                self.queues.poller_mut(poller_type).insert(itemid, entry);
            }
            (_, None) => item.location = Location::Nowhere,
        }
    }

    /// Take an item out of its queue.
    pub(crate) fn unqueue_item(&mut self, itemid: u64) {
        let Some(item) = self.items.get_mut(itemid) else {
            return;
        };
        if item.location == Location::Queue {
            if let Some(poller_type) = item.poller_type {
                self.queues.poller_mut(poller_type).remove(&itemid);
            }
        }
        item.location = Location::Nowhere;
    }

    fn max_poller_items(&self, poller_type: PollerType, first: &Item) -> usize {
        let config = &self.config;
        let max = match poller_type {
            PollerType::Pinger => config.max_pinger_items,
            PollerType::Java => config.max_java_items,
            PollerType::Normal if first.item_type.is_snmp() => match &first.kind {
                ItemKind::Snmp(snmp)
                    if !first.is_discovery_rule()
                        && snmp.oid_type != SnmpOidType::Macro
                        && self.interface_bulk(first.interfaceid) =>
                {
                    self.get_snmp_max_vars(first.interfaceid).min(config.max_snmp_items)
                }
                _ => 1,
            },
            PollerType::Unreachable => 1,
            PollerType::Normal | PollerType::Ipmi => config.max_poller_items,
        };
        max.max(1)
    }

    /// Dequeue the items of a poller that are due at `now`.
    ///
    /// Items of hosts that cannot be checked right now are put back into their queues instead of being returned.
    /// Every returned item must be handed back through [`Store::requeue_items`].
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "confcache::scheduler::get_poller_items"))]
    pub fn get_poller_items(&mut self, poller_type: PollerType, now: i64) -> Vec<ItemSnapshot> {
        let mut out = vec![];
        let mut deferred = vec![];
        let mut max_items = usize::MAX;
        let mut batch = None;

        while out.len() < max_items {
            let Some((&itemid, entry)) = self.queues.poller(poller_type).peek() else {
                break;
            };
            if entry.nextcheck > now {
                break;
            }
            if let Some(first) = batch {
                if first != BatchKey::None && entry.batch != first {
                    break;
                }
            }
            self.queues.poller_mut(poller_type).pop();

            let Some(item) = self.items.get(itemid) else {
                continue;
            };
            let host = self
                .hosts
                .get(item.hostid)
                .filter(|host| host.status == HostStatus::Monitored && item.status == ItemStatus::Active);
            let Some(host) = host else {
                if let Some(item) = self.items.get_mut(itemid) {
                    item.location = Location::Nowhere;
                }
                continue;
            };

            if host.in_nodata_maintenance() && item.item_type != ItemType::Internal {
                deferred.push((itemid, Reach::Collected));
                continue;
            }

            if item.queue_priority != QueuePriority::High {
                let disable_until = Self::agent_disable_until(item, host);
                if disable_until == 0 {
                    if poller_type == PollerType::Unreachable && item.queue_priority != QueuePriority::Low {
                        deferred.push((itemid, Reach::Collected));
                        continue;
                    }
                } else if matches!(poller_type, PollerType::Normal | PollerType::Java) || disable_until > now {
                    deferred.push((itemid, Reach::Unreachable));
                    continue;
                } else if let Some(kind) = item.item_type.agent_kind() {
                    let timeout = self.config.timeout;
                    if let Some(host) = self.hosts.get_mut(item.hostid) {
                        let agent = host.agent_mut(kind);
                        if agent.errors_from != 0 {
                            agent.disable_until = now + timeout;
                        }
                    }
                }
            }

            let Some(item) = self.items.get(itemid) else {
                continue;
            };
            if batch.is_none() {
                batch = Some(Self::batch_key(item));
                max_items = self.max_poller_items(poller_type, item);
            }
            let Some(snapshot) = self.item_snapshot(item) else {
                continue;
            };
            out.push(snapshot);
            if let Some(item) = self.items.get_mut(itemid) {
                item.location = Location::Poller;
                item.unreachable = poller_type == PollerType::Unreachable;
            }
        }

        for (itemid, reach) in deferred {
            if let Some(item) = self.items.get_mut(itemid) {
                item.location = Location::Nowhere;
            }
            self.schedule_item(itemid, now, reach, true);
        }

        out
    }

    /// Hand polled items back and schedule their next checks.
    ///
    /// Returns the next check of the poller queue, if it is not empty.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "confcache::scheduler::requeue_items"))]
    pub fn requeue_items(&mut self, poller_type: PollerType, results: &[ItemResult]) -> Option<i64> {
        for result in results {
            let Some(item) = self.items.get_mut(result.itemid) else {
                continue;
            };
            if item.location != Location::Poller {
                continue;
            }
            item.location = Location::Nowhere;
            item.unreachable = false;

            let reach = match result.status {
                PollStatus::Succeed | PollStatus::NotSupported | PollStatus::AgentError => {
                    item.state = result.state;
                    item.queue_priority = QueuePriority::Normal;
                    Reach::Collected
                }
                PollStatus::NetworkError | PollStatus::GatewayError | PollStatus::TimeoutError => {
                    item.queue_priority = QueuePriority::Low;
                    Reach::Unreachable
                }
                PollStatus::ConfigError => {
                    item.state = ItemState::NotSupported;
                    item.queue_priority = QueuePriority::Normal;
                    Reach::Collected
                }
            };
            self.schedule_item(result.itemid, result.lastclock, reach, true);
        }
        self.poller_nextcheck(poller_type)
    }

    /// Hand back dequeued items that were not polled because their host is unreachable.
    ///
    /// The items follow the unreachable cadence of their host from now on.
    pub fn requeue_unreachable_items(&mut self, itemids: &[u64], now: i64) {
        for &itemid in itemids {
            let Some(item) = self.items.get_mut(itemid) else {
                continue;
            };
            if item.location != Location::Poller {
                continue;
            }
            item.location = Location::Nowhere;
            item.unreachable = false;
            self.schedule_item(itemid, now, Reach::Unreachable, true);
        }
    }

    /// Move items forward to `nextcheck` with the highest priority.
    pub fn reschedule_items(&mut self, itemids: &[u64], nextcheck: i64) -> Vec<Reschedule> {
        itemids
            .iter()
            .map(|&itemid| {
                let Some(item) = self.items.get(itemid) else {
                    return Reschedule::NotFound;
                };
                let Some(host) = self.hosts.get(item.hostid) else {
                    return Reschedule::NotFound;
                };
                if item.status != ItemStatus::Active || host.status != HostStatus::Monitored {
                    return Reschedule::NotFound;
                }
                if host.is_proxied() && self.config.program_type == ProgramType::Server && !server_side(item.item_type)
                {
                    return Reschedule::Proxied(host.proxy_hostid);
                }

                let (location, poller_type) = (item.location, item.poller_type);
                let Some(item) = self.items.get_mut(itemid) else {
                    return Reschedule::NotFound;
                };
                match (location, poller_type) {
                    (Location::Queue, Some(poller_type)) => {
                        item.queue_priority = QueuePriority::High;
                        item.nextcheck = item.nextcheck.min(nextcheck);
                        let nextcheck = item.nextcheck;
                        self.queues.poller_mut(poller_type).update(&itemid, |entry| {
                            entry.priority = QueuePriority::High;
                            entry.nextcheck = nextcheck;
                        });
                        Reschedule::Rescheduled
                    }
                    (Location::Poller, Some(_)) => {
                        item.queue_priority = QueuePriority::High;
                        Reschedule::Rescheduled
                    }
                    _ => Reschedule::NotFound,
                }
            })
            .collect()
    }

    /// Items overdue by at least `from` seconds and, if `to` is given, by less than `to` seconds.
    pub fn get_item_queue(&self, from: i64, to: Option<i64>, now: i64) -> Vec<QueuedItem> {
        self.items
            .values()
            .filter(|item| item.status == ItemStatus::Active && item.item_type.is_polled() && item.schedulable)
            .filter(|item| item.nextcheck != 0)
            .filter_map(|item| {
                let host = self.hosts.get(item.hostid)?;
                if host.status != HostStatus::Monitored || host.in_nodata_maintenance() {
                    return None;
                }
                let late = now - item.nextcheck;
                if late < from || to.is_some_and(|to| late >= to) {
                    return None;
                }
                Some(QueuedItem {
                    itemid: item.itemid,
                    hostid: item.hostid,
                    proxy_hostid: host.proxy_hostid,
                    item_type: item.item_type,
                    nextcheck: item.nextcheck,
                })
            })
            .sorted_unstable_by_key(|q| (q.nextcheck, q.itemid))
            .collect()
    }

    /// The earliest next check waiting in a poller queue.
    pub fn poller_nextcheck(&self, poller_type: PollerType) -> Option<i64> {
        self.queues.poller(poller_type).peek().map(|(_, entry)| entry.nextcheck)
    }

    /// Record the outcome of bulk SNMP requests on an interface.
    pub fn update_interface_snmp_stats(&mut self, interfaceid: u64, max_snmp_succeed: u8, min_snmp_fail: u8) {
        let Some(interface) = self.interfaces.get_mut(interfaceid).filter(|i| i.bulk) else {
            return;
        };
        interface.max_snmp_succeed = interface.max_snmp_succeed.max(max_snmp_succeed);
        interface.min_snmp_fail = interface.min_snmp_fail.min(min_snmp_fail);
    }

    /// Suggested number of variables for the next bulk SNMP request on an interface.
    ///
    /// The request size grows by half while no limit is known, then by one, and never drops more than two below
    /// the largest size that has worked.
    pub fn get_snmp_max_vars(&self, interfaceid: u64) -> usize {
        let Some(interface) = self.interfaces.get(interfaceid).filter(|i| i.bulk) else {
            return 1;
        };
        let succeed = interface.max_snmp_succeed as i64;
        let fail = interface.min_snmp_fail as i64;

        let num = match succeed <= 1 || fail != MAX_SNMP_ITEMS as i64 + 1 {
            true => succeed + 1,
            false => succeed * 3 / 2,
        };
        let num = match num < fail {
            true => num,
            false => (succeed - 2).max(fail - 1),
        };
        num.clamp(1, MAX_SNMP_ITEMS as i64) as usize
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confcache_memory::{arena::MIN_CAPACITY, Arena};

    use super::*;
    use crate::{
        config::CacheConfig,
        model::{Interface, SnmpItem},
    };

    fn store() -> Store {
        let arena = Arc::new(Arena::new(MIN_CAPACITY * 8).unwrap());
        Store::new(CacheConfig::default(), arena)
    }

    #[test]
    fn test_icmpping_keys() {
        assert!(is_icmpping("icmpping"));
        assert!(is_icmpping("icmppingsec[,5]"));
        assert!(!is_icmpping("icmpping2"));
        assert!(!is_icmpping("net.tcp.service[icmpping]"));
    }

    #[test]
    fn test_snmp_max_vars() {
        let mut store = store();
        store
            .interfaces
            .find_or_create(1, || Interface {
                interfaceid: 1,
                bulk: true,
                ..Default::default()
            })
            .unwrap();

        // Nothing known yet: grow one by one.
        assert_eq!(store.get_snmp_max_vars(1), 1);
        store.update_interface_snmp_stats(1, 10, MAX_SNMP_ITEMS + 1);
        assert_eq!(store.get_snmp_max_vars(1), 15);

        // Over the limit: back off, but not below two under the best size.
        store.update_interface_snmp_stats(1, 10, 12);
        assert_eq!(store.get_snmp_max_vars(1), 11);
        store.update_interface_snmp_stats(1, 10, 8);
        assert_eq!(store.get_snmp_max_vars(1), 8);
        store.update_interface_snmp_stats(1, 10, 3);
        assert_eq!(store.get_snmp_max_vars(1), 8);

        assert_eq!(store.get_snmp_max_vars(2), 1);
    }

    #[test]
    fn test_snmp_batch_size() {
        let mut store = store();
        store
            .interfaces
            .find_or_create(1, || Interface {
                interfaceid: 1,
                bulk: true,
                ..Default::default()
            })
            .unwrap();
        store.update_interface_snmp_stats(1, 10, MAX_SNMP_ITEMS + 1);

        let snmp = |oid_type: SnmpOidType, flags: u8| Item {
            item_type: ItemType::SnmpV2c,
            interfaceid: 1,
            flags,
            kind: ItemKind::Snmp(SnmpItem {
                oid_type,
                ..Default::default()
            }),
            ..Default::default()
        };
        let batch = |item: &Item| store.max_poller_items(PollerType::Normal, item);
        assert_eq!(batch(&snmp(SnmpOidType::Normal, 0)), 15);
        assert_eq!(batch(&snmp(SnmpOidType::Dynamic, 0)), 15);
        assert_eq!(batch(&snmp(SnmpOidType::Macro, 0)), 1);
        // Discovery rules are polled one at a time.
        assert_eq!(batch(&snmp(SnmpOidType::Normal, 1)), 1);
    }
}
