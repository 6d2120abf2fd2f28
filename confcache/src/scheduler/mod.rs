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

//! Item, proxy and trigger timer scheduling.

mod nextcheck;
mod poller;
mod proxy;
mod timer;

use std::cmp::Ordering;

use confcache_memory::{IndexedHeap, StrKey};
use serde::{Deserialize, Serialize};

pub use self::{
    nextcheck::{calculate_item_nextcheck, calculate_item_nextcheck_unreachable, calculate_proxy_nextcheck, timer_nextcheck},
    poller::{ItemResult, PollStatus, QueuedItem, Reschedule},
    proxy::ProxyChecks,
};

/// Upper bound of variables in one SNMP bulk request.
pub const MAX_SNMP_ITEMS: u8 = 128;

/// Worker pool category an item is scheduled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollerType {
    /// Regular pollers, SNMP included.
    Normal,
    /// Pollers dedicated to unreachable hosts.
    Unreachable,
    /// IPMI pollers.
    Ipmi,
    /// ICMP pingers.
    Pinger,
    /// Java gateway pollers.
    Java,
}

impl PollerType {
    /// Every poller type, in index order.
    pub const ALL: [PollerType; 5] = [
        PollerType::Normal,
        PollerType::Unreachable,
        PollerType::Ipmi,
        PollerType::Pinger,
        PollerType::Java,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Tie-break among items due at the same moment, smaller first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueuePriority {
    /// Requested "check now".
    High = 0,
    /// Regular.
    #[default]
    Normal = 1,
    /// Backed off after a network error.
    Low = 2,
}

/// Where an item currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// Neither queued nor polled.
    #[default]
    Nowhere,
    /// Waiting in a poller queue.
    Queue,
    /// Handed out to a poller.
    Poller,
}

/// Key grouping items that one request can serve together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum BatchKey {
    /// Not batched.
    #[default]
    None,
    /// SNMP items on the same interface with the same credentials.
    Snmp {
        interfaceid: u64,
        port: StrKey,
        community: StrKey,
        securityname: StrKey,
        contextname: StrKey,
    },
    /// JMX items on the same endpoint.
    Jmx {
        interfaceid: u64,
        endpoint: StrKey,
        username: StrKey,
    },
}

/// Ordering data of a queued item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueEntry {
    pub nextcheck: i64,
    pub priority: QueuePriority,
    pub interfaceid: u64,
    pub batch: BatchKey,
}

fn default_cmp(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    (a.nextcheck, a.priority, a.batch).cmp(&(b.nextcheck, b.priority, b.batch))
}

fn pinger_cmp(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    (a.nextcheck, a.priority, a.interfaceid).cmp(&(b.nextcheck, b.priority, b.interfaceid))
}

/// Every scheduling queue of the cache.
#[derive(Debug)]
pub(crate) struct Queues {
    pollers: [IndexedHeap<u64, QueueEntry>; 5],
    /// Passive proxies by next due schedule.
    pub proxies: IndexedHeap<u64, i64>,
    /// Timer triggers by next evaluation.
    pub timers: IndexedHeap<u64, i64>,
}

impl Default for Queues {
    fn default() -> Self {
        let heap = |poller_type: PollerType| {
            IndexedHeap::new(match poller_type {
                PollerType::Pinger => pinger_cmp,
                _ => default_cmp,
            })
        };
        Self {
            pollers: PollerType::ALL.map(heap),
            proxies: IndexedHeap::new(i64::cmp),
            timers: IndexedHeap::new(i64::cmp),
        }
    }
}

impl Queues {
    pub fn poller(&self, poller_type: PollerType) -> &IndexedHeap<u64, QueueEntry> {
        &self.pollers[poller_type.index()]
    }

    pub fn poller_mut(&mut self, poller_type: PollerType) -> &mut IndexedHeap<u64, QueueEntry> {
        &mut self.pollers[poller_type.index()]
    }

    /// Items waiting in any poller queue.
    pub fn queued_items(&self) -> usize {
        self.pollers.iter().map(IndexedHeap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(nextcheck: i64, priority: QueuePriority, interfaceid: u64) -> QueueEntry {
        QueueEntry {
            nextcheck,
            priority,
            interfaceid,
            batch: BatchKey::None,
        }
    }

    #[test]
    fn test_queue_order() {
        let mut queues = Queues::default();
        let heap = queues.poller_mut(PollerType::Normal);
        heap.insert(1, entry(10, QueuePriority::Normal, 0));
        heap.insert(2, entry(10, QueuePriority::High, 0));
        heap.insert(3, entry(5, QueuePriority::Normal, 0));

        let order = std::iter::from_fn(|| heap.pop().map(|(id, _)| id)).collect::<Vec<_>>();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_pinger_groups_by_interface() {
        let mut queues = Queues::default();
        let heap = queues.poller_mut(PollerType::Pinger);
        heap.insert(1, entry(10, QueuePriority::Normal, 7));
        heap.insert(2, entry(10, QueuePriority::Normal, 3));
        heap.insert(3, entry(10, QueuePriority::Normal, 7));
        heap.insert(4, entry(10, QueuePriority::Normal, 3));

        let interfaces = std::iter::from_fn(|| heap.pop().map(|(_, e)| e.interfaceid)).collect::<Vec<_>>();
        assert_eq!(interfaces, vec![3, 3, 7, 7]);
    }

    #[test]
    fn test_snmp_batching() {
        let mut queues = Queues::default();
        let heap = queues.poller_mut(PollerType::Normal);
        let snmp = |interfaceid| BatchKey::Snmp {
            interfaceid,
            port: StrKey::default(),
            community: StrKey::default(),
            securityname: StrKey::default(),
            contextname: StrKey::default(),
        };
        for (id, interfaceid) in [(1, 2), (2, 1), (3, 2), (4, 1)] {
            heap.insert(
                id,
                QueueEntry {
                    batch: snmp(interfaceid),
                    ..entry(10, QueuePriority::Normal, interfaceid)
                },
            );
        }
        let interfaces = std::iter::from_fn(|| heap.pop().map(|(_, e)| e.interfaceid)).collect::<Vec<_>>();
        assert_eq!(interfaces, vec![1, 1, 2, 2]);
    }
}
