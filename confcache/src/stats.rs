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

//! Aggregate statistics, recomputed at most once per `status_ttl`.

use confcache_common::interval::UpdateInterval;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    model::{HostStatus, ItemState, ItemStatus, TriggerStatus, TriggerValue},
    store::Store,
};

/// Discovery rules and prototypes are not collected.
const DISCOVERY_RULE_OR_PROTOTYPE: u8 = 0b011;

/// Statistics of the hosts monitored by one proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyStats {
    /// Monitored hosts.
    pub hosts_monitored: u64,
    /// Values per second expected from the proxy.
    pub required_performance: f64,
}

/// Aggregate statistics of the cached configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Monitored hosts.
    pub hosts_monitored: u64,
    /// Disabled hosts.
    pub hosts_not_monitored: u64,
    /// Enabled items collecting values.
    pub items_active_normal: u64,
    /// Enabled items that are not supported.
    pub items_active_notsupported: u64,
    /// Disabled items and items of disabled hosts.
    pub items_disabled: u64,
    /// Enabled triggers in OK.
    pub triggers_enabled_ok: u64,
    /// Enabled triggers in PROBLEM.
    pub triggers_enabled_problem: u64,
    /// Disabled triggers and triggers on disabled items or hosts.
    pub triggers_disabled: u64,
    /// Values per second expected in total.
    pub required_performance: f64,
    /// Per proxy statistics.
    pub proxies: HashMap<u64, ProxyStats>,
}

/// Cached statistics with the moment they were computed.
#[derive(Debug, Default)]
pub(crate) struct StatusCache {
    computed_at: Option<i64>,
    stats: CacheStats,
}

impl StatusCache {
    /// Force a recomputation on the next query.
    pub fn invalidate(&mut self) {
        self.computed_at = None;
    }

    fn is_fresh(&self, now: i64, ttl: i64) -> bool {
        self.computed_at.is_some_and(|at| now >= at && now - at < ttl)
    }
}

impl Store {
    fn compute_stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        for host in self.hosts.values() {
            match host.status {
                HostStatus::Monitored => {
                    stats.hosts_monitored += 1;
                    if host.is_proxied() {
                        stats.proxies.entry(host.proxy_hostid).or_default().hosts_monitored += 1;
                    }
                }
                HostStatus::NotMonitored => stats.hosts_not_monitored += 1,
                _ => {}
            }
        }

        for item in self.items.values() {
            if item.flags & DISCOVERY_RULE_OR_PROTOTYPE != 0 {
                continue;
            }
            let Some(host) = self.hosts.get(item.hostid) else {
                continue;
            };
            match host.status {
                HostStatus::Monitored => {}
                HostStatus::NotMonitored => {
                    stats.items_disabled += 1;
                    continue;
                }
                _ => continue,
            }
            match (item.status, item.state) {
                (ItemStatus::Disabled, _) => {
                    stats.items_disabled += 1;
                    continue;
                }
                (ItemStatus::Active, ItemState::Normal) => stats.items_active_normal += 1,
                (ItemStatus::Active, ItemState::NotSupported) => stats.items_active_notsupported += 1,
            }

            let delay = self
                .expand_macros(self.pool.get(&item.delay), &[item.hostid])
                .parse::<UpdateInterval>()
                .map_or(0, |interval| interval.simple);
            if delay > 0 {
                let nvps = 1.0 / delay as f64;
                stats.required_performance += nvps;
                if host.is_proxied() {
                    stats.proxies.entry(host.proxy_hostid).or_default().required_performance += nvps;
                }
            }
        }

        for trigger in self.triggers.values() {
            match (trigger.status, trigger.functional, trigger.value) {
                (TriggerStatus::Enabled, true, TriggerValue::Ok) => stats.triggers_enabled_ok += 1,
                (TriggerStatus::Enabled, true, TriggerValue::Problem) => stats.triggers_enabled_problem += 1,
                _ => stats.triggers_disabled += 1,
            }
        }

        stats
    }

    /// Aggregate statistics, recomputed if older than `status_ttl` seconds.
    pub fn get_status(&mut self, now: i64) -> CacheStats {
        if !self.status.is_fresh(now, self.config.status_ttl) {
            self.status.stats = self.compute_stats();
            self.status.computed_at = Some(now);
        }
        self.status.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl() {
        let mut cache = StatusCache::default();
        assert!(!cache.is_fresh(100, 60));
        cache.computed_at = Some(100);
        assert!(cache.is_fresh(159, 60));
        assert!(!cache.is_fresh(160, 60));
        assert!(!cache.is_fresh(99, 60));
        cache.invalidate();
        assert!(!cache.is_fresh(100, 60));
    }
}
