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

use std::{sync::Arc, time::Instant};

use confcache_common::{error::Result, metrics::model::Metrics};
use confcache_memory::Arena;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    availability::AvailabilityChange,
    config::CacheConfig,
    maintenance::RunningMaintenance,
    model::AgentKind,
    scheduler::{ItemResult, PollerType, ProxyChecks, Reschedule},
    snapshot::{ItemDiff, ItemSnapshot, ProxySnapshot, TriggerDiff, TriggerLocks},
    stats::CacheStats,
    store::Store,
    sync::{DiffFeed, EntityKind, SyncReport},
};

struct Inner {
    name: &'static str,
    config: CacheConfig,
    store: RwLock<Store>,
    metrics: Arc<Metrics>,
}

/// The configuration cache shared by every worker.
///
/// One reader/writer lock guards the whole store. Read accessors copy data out under the read lock; runtime
/// writers and synchronization take the write lock for a bounded critical section.
///
/// Cloning is cheap, clones share the same store.
#[derive(Clone)]
pub struct ConfigCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl ConfigCache {
    pub(crate) fn open(name: &'static str, config: CacheConfig, metrics: Arc<Metrics>) -> Result<Self> {
        let arena = Arc::new(Arena::new(config.cache_size)?);
        let store = Store::new(config.clone(), arena);
        tracing::info!(name, cache_size = config.cache_size, "[cache]: configuration cache opened");
        Ok(Self {
            inner: Arc::new(Inner {
                name,
                config,
                store: RwLock::new(store),
                metrics,
            }),
        })
    }

    /// Name of the cache.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Settings the cache was opened with.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Take the read lock for a sequence of read accessors.
    ///
    /// The guard must not be held across blocking operations.
    pub fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.inner.store.read()
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.inner.store.write()
    }

    /// Apply a diff feed to the cache and rebuild the derived state.
    ///
    /// Entity types missing from the feed are left untouched. An error means the cache ran out of memory and
    /// must not be used any more.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "confcache::cache::sync"))]
    pub fn sync(&self, feed: &mut DiffFeed, now: i64) -> Result<SyncReport> {
        let start = Instant::now();
        let mut report = SyncReport::default();
        let mut store = self.write();

        for &kind in EntityKind::ORDER {
            let Some(mut source) = feed.take(kind) else {
                continue;
            };
            let counts = store.apply_diff(kind, source.as_mut(), now).inspect_err(|e| {
                tracing::error!(?kind, ?e, "[cache]: synchronization failed");
            })?;
            report.counts.push((kind, counts));
        }
        store.rebuild_derived(now);

        let total = report.total();
        let metrics = &self.inner.metrics;
        metrics.sync_add.increase(total.add as u64);
        metrics.sync_update.increase(total.update as u64);
        metrics.sync_remove.increase(total.remove as u64);
        metrics.sync_duration.record(start.elapsed().as_secs_f64());
        metrics.arena_usage.absolute(store.arena_stats().used as u64);
        metrics.strpool_size.absolute(store.pool.len() as u64);
        metrics.queue_len.absolute(store.queues.queued_items() as u64);
        drop(store);

        tracing::debug!(
            add = total.add,
            update = total.update,
            remove = total.remove,
            skipped = total.skipped,
            elapsed = ?start.elapsed(),
            "[cache]: synchronization finished"
        );
        Ok(report)
    }

    /// Hand due items to a poller, see [`Store::get_poller_items`].
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "confcache::cache::get_poller_items"))]
    pub fn get_poller_items(&self, poller_type: PollerType, now: i64) -> Vec<ItemSnapshot> {
        let mut store = self.write();
        let items = store.get_poller_items(poller_type, now);
        self.inner.metrics.queue_dequeue.increase(items.len() as u64);
        self.inner.metrics.queue_len.absolute(store.queues.queued_items() as u64);
        items
    }

    /// Return polled items to their queues, see [`Store::requeue_items`].
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "confcache::cache::requeue_items"))]
    pub fn requeue_items(&self, poller_type: PollerType, results: &[ItemResult]) -> Option<i64> {
        let mut store = self.write();
        let nextcheck = store.requeue_items(poller_type, results);
        self.inner.metrics.queue_requeue.increase(results.len() as u64);
        self.inner.metrics.queue_len.absolute(store.queues.queued_items() as u64);
        nextcheck
    }

    /// Hand back dequeued items of an unreachable host, see [`Store::requeue_unreachable_items`].
    pub fn requeue_unreachable_items(&self, itemids: &[u64], now: i64) {
        let mut store = self.write();
        store.requeue_unreachable_items(itemids, now);
        self.inner.metrics.queue_requeue.increase(itemids.len() as u64);
    }

    /// Move items to the front of their queues.
    pub fn reschedule_items(&self, itemids: &[u64], nextcheck: i64) -> Vec<Reschedule> {
        self.write().reschedule_items(itemids, nextcheck)
    }

    /// Record the outcome of an SNMP bulk request.
    pub fn update_interface_snmp_stats(&self, interfaceid: u64, max_snmp_succeed: u8, min_snmp_fail: u8) {
        self.write()
            .update_interface_snmp_stats(interfaceid, max_snmp_succeed, min_snmp_fail)
    }

    /// Take the next passive proxy due for a poll.
    pub fn get_proxy_for_poll(&self, now: i64) -> Option<ProxySnapshot> {
        self.write().get_proxy_for_poll(now)
    }

    /// Return a polled proxy to its queue.
    pub fn requeue_proxy(&self, hostid: u64, checks: ProxyChecks, now: i64) {
        self.write().requeue_proxy(hostid, checks, now)
    }

    /// Record what a proxy reported about itself.
    pub fn proxy_update(&self, hostid: u64, version: u32, lastaccess: i64, compress: bool) -> bool {
        self.write().proxy_update(hostid, version, lastaccess, compress)
    }

    /// Take due timer triggers, locking them.
    pub fn get_timer_triggerids(&self, now: i64, limit: usize) -> Vec<u64> {
        self.write().get_timer_triggerids(now, limit)
    }

    /// Requeue timer triggers after evaluation.
    pub fn reschedule_timer_triggers(&self, triggerids: &[u64], now: i64) {
        self.write().reschedule_timer_triggers(triggerids, now)
    }

    /// Lock the triggers of a batch of history items.
    pub fn lock_triggers_by_history_items(&self, itemids: &[u64]) -> TriggerLocks {
        self.write().lock_triggers_by_history_items(itemids)
    }

    /// Lock triggers by id.
    pub fn lock_triggers_by_ids(&self, triggerids: &[u64]) -> Vec<u64> {
        self.write().lock_triggers_by_ids(triggerids)
    }

    /// Release trigger locks.
    pub fn unlock_triggers(&self, triggerids: &[u64]) {
        self.write().unlock_triggers(triggerids)
    }

    /// Release every trigger lock.
    pub fn unlock_all_triggers(&self) {
        self.write().unlock_all_triggers()
    }

    /// Apply runtime item changes reported by history syncers.
    pub fn items_apply_changes(&self, diffs: &[ItemDiff]) {
        self.write().items_apply_changes(diffs)
    }

    /// Apply trigger values computed by history syncers.
    pub fn triggers_apply_changes(&self, diffs: &[TriggerDiff]) {
        self.write().triggers_apply_changes(diffs)
    }

    /// Record a successful check of a host over an agent protocol.
    pub fn activate_host(&self, hostid: u64, kind: AgentKind, now: i64) -> Option<AvailabilityChange> {
        self.write().activate_host(hostid, kind, now)
    }

    /// Record a failed check of a host over an agent protocol.
    pub fn deactivate_host(
        &self,
        hostid: u64,
        kind: AgentKind,
        now: i64,
        error: &str,
    ) -> Option<AvailabilityChange> {
        self.write().deactivate_host(hostid, kind, now, error)
    }

    /// Availability changes since the previous call.
    pub fn hosts_availability_diff(&self) -> Vec<AvailabilityChange> {
        self.write().hosts_availability_diff()
    }

    /// Reset the availability of agents a host has no items for.
    pub fn reset_hosts_availability(&self) -> Vec<AvailabilityChange> {
        self.write().reset_hosts_availability()
    }

    /// Apply availability received from elsewhere.
    pub fn set_hosts_availability(&self, changes: &[AvailabilityChange]) -> usize {
        self.write().set_hosts_availability(changes)
    }

    /// Aggregate statistics, recomputed when older than the configured ttl.
    pub fn get_status(&self, now: i64) -> CacheStats {
        self.write().get_status(now)
    }

    /// Host groups with their nested groups.
    pub fn get_nested_hostgroupids(&self, groupids: &[u64]) -> Vec<u64> {
        self.write().get_nested_hostgroupids(groupids)
    }

    /// Host groups with their nested groups, by group name.
    pub fn get_nested_hostgroupids_by_names(&self, names: &[&str]) -> Vec<u64> {
        self.write().get_nested_hostgroupids_by_names(names)
    }

    /// Maintenances running at `now`.
    pub fn get_running_maintenances(&self, now: i64) -> Vec<RunningMaintenance> {
        self.write().get_running_maintenances(now)
    }

    /// Reapply maintenance status to hosts, returning the hosts whose status changed.
    pub fn update_host_maintenance(&self, now: i64) -> Vec<u64> {
        self.write().update_host_maintenance(now)
    }

    /// Index anomalies found in the store, empty when consistent.
    #[doc(hidden)]
    pub fn consistency_check(&self) -> Vec<String> {
        self.read().dangling_references()
    }
}
