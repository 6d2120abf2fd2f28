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

//! Per agent family host reachability.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    config::ProgramType,
    model::{AgentAvailability, AgentKind, Availability, HostStatus},
    store::Store,
};

bitflags! {
    /// Fields of an availability record that changed.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AvailabilityFlags: u8 {
        /// `available`.
        const AVAILABLE = 0b0001;
        /// `error`.
        const ERROR = 0b0010;
        /// `errors_from`.
        const ERRORS_FROM = 0b0100;
        /// `disable_until`.
        const DISABLE_UNTIL = 0b1000;
    }
}

/// New availability of one agent family of a host, with the fields that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityChange {
    /// Host id.
    pub hostid: u64,
    /// Agent family.
    pub kind: AgentKind,
    /// Changed fields.
    pub flags: AvailabilityFlags,
    /// The record after the change.
    pub availability: AgentAvailability,
}

fn diff(old: &AgentAvailability, new: &AgentAvailability) -> AvailabilityFlags {
    let mut flags = AvailabilityFlags::empty();
    flags.set(AvailabilityFlags::AVAILABLE, old.available != new.available);
    flags.set(AvailabilityFlags::ERROR, old.error != new.error);
    flags.set(AvailabilityFlags::ERRORS_FROM, old.errors_from != new.errors_from);
    flags.set(AvailabilityFlags::DISABLE_UNTIL, old.disable_until != new.disable_until);
    flags
}

fn apply(target: &mut AgentAvailability, flags: AvailabilityFlags, source: &AgentAvailability) {
    if flags.contains(AvailabilityFlags::AVAILABLE) {
        target.available = source.available;
    }
    if flags.contains(AvailabilityFlags::ERROR) {
        target.error.clone_from(&source.error);
    }
    if flags.contains(AvailabilityFlags::ERRORS_FROM) {
        target.errors_from = source.errors_from;
    }
    if flags.contains(AvailabilityFlags::DISABLE_UNTIL) {
        target.disable_until = source.disable_until;
    }
}

impl Store {
    /// Whether this process tracks the availability of a host.
    fn tracks_availability(&self, hostid: u64) -> bool {
        self.hosts.get(hostid).is_some_and(|host| {
            host.status == HostStatus::Monitored
                && !(self.config.program_type == ProgramType::Server && host.is_proxied())
        })
    }

    fn set_availability(
        &mut self,
        hostid: u64,
        kind: AgentKind,
        new: AgentAvailability,
    ) -> Option<AvailabilityChange> {
        let host = self.hosts.get_mut(hostid)?;
        let agent = host.agent_mut(kind);
        let flags = diff(agent, &new);
        if flags.is_empty() {
            return None;
        }
        *agent = new.clone();
        Some(AvailabilityChange {
            hostid,
            kind,
            flags,
            availability: new,
        })
    }

    /// A check of the host succeeded: mark the agent family available and clear its errors.
    ///
    /// Returns `None` if nothing changed.
    pub fn activate_host(&mut self, hostid: u64, kind: AgentKind, now: i64) -> Option<AvailabilityChange> {
        if !self.tracks_availability(hostid) {
            return None;
        }
        let host = self.hosts.get(hostid)?;
        let old = host.agent(kind).clone();
        let name = self.pool.get(&host.host).to_string();

        let change = self.set_availability(
            hostid,
            kind,
            AgentAvailability {
                available: Availability::Available,
                ..Default::default()
            },
        )?;
        match old.available {
            Availability::Available => {
                tracing::warn!(host = %name, ?kind, now, "[availability]: resuming checks, connection restored")
            }
            _ => tracing::warn!(host = %name, ?kind, now, "[availability]: enabling checks, host became available"),
        }
        Some(change)
    }

    /// A check of the host failed with a network error.
    ///
    /// The first error starts the unreachable cadence, repeated errors keep retrying it, and errors persisting for
    /// `unreachable_period` make the agent family unavailable. Errors within `unreachable_delay` of the first one
    /// change nothing. Returns `None` if nothing changed.
    pub fn deactivate_host(&mut self, hostid: u64, kind: AgentKind, now: i64, error: &str) -> Option<AvailabilityChange> {
        if !self.tracks_availability(hostid) {
            return None;
        }
        let (delay, period, unavailable_delay) = (
            self.config.unreachable_delay,
            self.config.unreachable_period,
            self.config.unavailable_delay,
        );
        let host = self.hosts.get(hostid)?;
        let old = host.agent(kind).clone();
        let name = self.pool.get(&host.host).to_string();

        if old.errors_from != 0 && now - old.errors_from < delay {
            return None;
        }

        let mut new = old.clone();
        if old.errors_from == 0 {
            new.errors_from = now;
            new.disable_until = now + delay;
        } else if now - old.errors_from < period {
            new.disable_until = now + delay;
        } else {
            new.available = Availability::Unavailable;
            new.disable_until = now + unavailable_delay;
            new.error = error.to_string();
        }

        let change = self.set_availability(hostid, kind, new)?;
        let wait = change.availability.disable_until - now;
        if old.errors_from == 0 {
            tracing::warn!(host = %name, ?kind, wait, error, "[availability]: first network error");
        } else if old.available != Availability::Unavailable {
            match change.availability.available {
                Availability::Unavailable => {
                    tracing::warn!(host = %name, ?kind, error, "[availability]: temporarily disabling checks, host unavailable")
                }
                _ => tracing::warn!(host = %name, ?kind, wait, error, "[availability]: another network error"),
            }
        }
        Some(change)
    }

    /// Availability records changed since the previous call.
    pub fn hosts_availability_diff(&mut self) -> Vec<AvailabilityChange> {
        let mut changes = vec![];
        for host in self.hosts.values_mut() {
            for kind in AgentKind::ALL {
                let (current, reported) = (&host.availability[kind.index()], &mut host.reported[kind.index()]);
                let flags = diff(reported, current);
                if flags.is_empty() {
                    continue;
                }
                reported.clone_from(current);
                changes.push(AvailabilityChange {
                    hostid: host.hostid,
                    kind,
                    flags,
                    availability: current.clone(),
                });
            }
        }
        changes.sort_unstable_by_key(|c| (c.hostid, c.kind.index()));
        changes
    }

    /// Reset the availability of agent families a host has no items for back to unknown.
    pub fn reset_hosts_availability(&mut self) -> Vec<AvailabilityChange> {
        let mut changes = vec![];
        for hostid in self.hosts.ids() {
            if !self.tracks_availability(hostid) {
                continue;
            }
            for kind in self.agents_without_items(hostid) {
                changes.extend(self.set_availability(hostid, kind, AgentAvailability::default()));
            }
        }
        changes.sort_unstable_by_key(|c| (c.hostid, c.kind.index()));
        changes
    }

    /// Apply availability reported from elsewhere, for example by a proxy.
    ///
    /// Returns the number of records applied; unknown hosts are skipped.
    pub fn set_hosts_availability(&mut self, changes: &[AvailabilityChange]) -> usize {
        changes
            .iter()
            .filter(|change| {
                let Some(host) = self.hosts.get_mut(change.hostid) else {
                    return false;
                };
                apply(host.agent_mut(change.kind), change.flags, &change.availability);
                true
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confcache_memory::{arena::MIN_CAPACITY, Arena};

    use super::*;
    use crate::{config::CacheConfig, model::Host};

    fn store() -> Store {
        let arena = Arc::new(Arena::new(MIN_CAPACITY * 8).unwrap());
        let mut store = Store::new(CacheConfig::default(), arena);
        store
            .hosts
            .find_or_create(1, || Host {
                hostid: 1,
                ..Default::default()
            })
            .unwrap();
        store
    }

    fn agent(store: &Store) -> AgentAvailability {
        store.hosts.get(1).unwrap().agent(AgentKind::Agent).clone()
    }

    #[test_log::test]
    fn test_escalation() {
        let mut store = store();
        store.activate_host(1, AgentKind::Agent, 50).unwrap();

        let change = store.deactivate_host(1, AgentKind::Agent, 100, "timeout").unwrap();
        assert_eq!(change.flags, AvailabilityFlags::ERRORS_FROM | AvailabilityFlags::DISABLE_UNTIL);
        let a = agent(&store);
        assert_eq!((a.available, a.errors_from, a.disable_until), (Availability::Available, 100, 115));

        // Within the unreachable delay of the first error.
        assert!(store.deactivate_host(1, AgentKind::Agent, 110, "timeout").is_none());

        store.deactivate_host(1, AgentKind::Agent, 116, "timeout").unwrap();
        let a = agent(&store);
        assert_eq!((a.available, a.errors_from, a.disable_until), (Availability::Available, 100, 131));

        store.deactivate_host(1, AgentKind::Agent, 200, "timeout").unwrap();
        let a = agent(&store);
        assert_eq!((a.available, a.errors_from, a.disable_until), (Availability::Unavailable, 100, 260));
        assert_eq!(a.error, "timeout");

        let change = store.activate_host(1, AgentKind::Agent, 300).unwrap();
        assert!(change.flags.is_all());
        assert_eq!(agent(&store), AgentAvailability {
            available: Availability::Available,
            ..Default::default()
        });
        assert!(store.activate_host(1, AgentKind::Agent, 301).is_none());
    }

    #[test]
    fn test_availability_diff() {
        let mut store = store();
        assert!(store.hosts_availability_diff().is_empty());

        store.activate_host(1, AgentKind::Snmp, 10);
        let diff = store.hosts_availability_diff();
        assert_eq!(diff.len(), 1);
        assert_eq!((diff[0].kind, diff[0].flags), (AgentKind::Snmp, AvailabilityFlags::AVAILABLE));
        assert!(store.hosts_availability_diff().is_empty());

        let mut other = self::store();
        assert_eq!(other.set_hosts_availability(&diff), 1);
        assert_eq!(other.hosts.get(1).unwrap().agent(AgentKind::Snmp).available, Availability::Available);

        // The host has no SNMP items.
        let reset = store.reset_hosts_availability();
        assert_eq!(reset.len(), 1);
        assert_eq!(reset[0].availability, AgentAvailability::default());
    }
}
