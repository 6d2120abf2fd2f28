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

use bitflags::bitflags;

use super::calculate_proxy_nextcheck;
use crate::{model::HostStatus, snapshot::ProxySnapshot, store::Store};

/// Seconds between task polls of passive proxies.
const PROXY_TASKS_FREQUENCY: i64 = 1;

bitflags! {
    /// Schedules of a passive proxy to move forward after a poll.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProxyChecks: u8 {
        /// Configuration push.
        const CONFIG = 0b001;
        /// Data poll.
        const DATA = 0b010;
        /// Task poll.
        const TASKS = 0b100;
    }
}

impl Store {
    fn is_passive_proxy(&self, hostid: u64) -> bool {
        self.hosts
            .get(hostid)
            .is_some_and(|host| host.status == HostStatus::ProxyPassive)
    }

    /// Put a passive proxy into the proxy queue, or refresh its position.
    pub(crate) fn queue_proxy(&mut self, hostid: u64) {
        if !self.is_passive_proxy(hostid) {
            return;
        }
        let Some(proxy) = self.proxies.get_mut(hostid) else {
            return;
        };
        proxy.queued = true;
        self.queues.proxies.insert(hostid, proxy.nextcheck());
    }

    /// Take a proxy out of the proxy queue.
    pub(crate) fn unqueue_proxy(&mut self, hostid: u64) {
        self.queues.proxies.remove(&hostid);
        if let Some(proxy) = self.proxies.get_mut(hostid) {
            proxy.queued = false;
        }
    }

    /// Dequeue the passive proxy that is due first, if any is due at `now`.
    ///
    /// The proxy must be handed back through [`Store::requeue_proxy`].
    pub fn get_proxy_for_poll(&mut self, now: i64) -> Option<ProxySnapshot> {
        loop {
            let (&hostid, &nextcheck) = self.queues.proxies.peek()?;
            if nextcheck > now {
                return None;
            }
            self.unqueue_proxy(hostid);

            let snapshot = self.proxies.get(hostid).and_then(|proxy| {
                let host = self.hosts.get(hostid)?;
                Some(ProxySnapshot::new(&self.pool, proxy, self.host_snapshot(host)))
            });
            if snapshot.is_some() {
                return snapshot;
            }
        }
    }

    /// Move the given schedules of a polled proxy forward and put it back into the queue.
    pub fn requeue_proxy(&mut self, hostid: u64, checks: ProxyChecks, now: i64) {
        let (config_frequency, data_frequency) = (self.config.proxy_config_frequency, self.config.proxy_data_frequency);
        let Some(proxy) = self.proxies.get_mut(hostid) else {
            return;
        };
        if checks.contains(ProxyChecks::CONFIG) {
            proxy.proxy_config_nextcheck = calculate_proxy_nextcheck(hostid, config_frequency, now);
        }
        if checks.contains(ProxyChecks::DATA) {
            proxy.proxy_data_nextcheck = calculate_proxy_nextcheck(hostid, data_frequency, now);
        }
        if checks.contains(ProxyChecks::TASKS) {
            proxy.proxy_tasks_nextcheck = calculate_proxy_nextcheck(hostid, PROXY_TASKS_FREQUENCY, now);
        }
        self.queue_proxy(hostid);
    }

    /// Record that a proxy has been heard from.
    ///
    /// Returns `false` if the proxy is unknown.
    pub fn proxy_update(&mut self, hostid: u64, version: u32, lastaccess: i64, compress: bool) -> bool {
        let Some(proxy) = self.proxies.get_mut(hostid) else {
            return false;
        };
        if proxy.version != version {
            tracing::debug!(hostid, old = proxy.version, new = version, "[proxy]: protocol version changed");
        }
        proxy.version = version;
        proxy.lastaccess = proxy.lastaccess.max(lastaccess);
        proxy.compress = compress;
        true
    }
}
