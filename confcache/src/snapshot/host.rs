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

use super::{HostSnapshot, InterfaceSnapshot, ItemSnapshot, ProxySnapshot};
use crate::{
    model::{Host, HostStatus, InterfaceType, ItemStatus},
    store::Store,
};

impl Store {
    pub(crate) fn host_snapshot(&self, host: &Host) -> HostSnapshot {
        let psk = host.tls_psk_identity.and_then(|identity| self.psks.get(&identity));
        HostSnapshot::new(&self.pool, host, psk)
    }

    /// A host by id.
    pub fn get_host_by_hostid(&self, hostid: u64) -> Option<HostSnapshot> {
        self.hosts.get(hostid).map(|host| self.host_snapshot(host))
    }

    /// Hosts by id.
    pub fn get_hosts_by_hostids(&self, hostids: &[u64]) -> Vec<Option<HostSnapshot>> {
        hostids.iter().map(|&hostid| self.get_host_by_hostid(hostid)).collect()
    }

    /// A monitored or disabled host by technical name.
    pub fn get_host_by_name(&self, name: &str) -> Option<HostSnapshot> {
        let key = self.pool.lookup(name)?;
        let token = self.hosts_h.get(&key)?;
        self.hosts.at(token).map(|host| self.host_snapshot(host))
    }

    /// An active proxy by name.
    pub fn get_active_proxy_by_name(&self, name: &str) -> Option<ProxySnapshot> {
        let key = self.pool.lookup(name)?;
        let host = self.hosts.at(self.hosts_p.get(&key)?)?;
        if host.status != HostStatus::ProxyActive {
            return None;
        }
        let proxy = self.proxies.get(host.hostid)?;
        Some(ProxySnapshot::new(&self.pool, proxy, self.host_snapshot(host)))
    }

    /// Every interface of a host.
    pub fn get_host_interfaces(&self, hostid: u64) -> Vec<InterfaceSnapshot> {
        let Some(host) = self.hosts.get(hostid) else {
            return vec![];
        };
        host.interfaces
            .iter()
            .filter_map(|&id| self.interfaces.get(id))
            .map(|interface| InterfaceSnapshot::new(&self.pool, interface))
            .collect()
    }

    /// The main interface of a type on a host.
    pub fn get_interface_by_type(&self, hostid: u64, kind: InterfaceType) -> Option<InterfaceSnapshot> {
        let token = self.interfaces_ht.get(&(hostid, kind))?;
        self.interfaces
            .at(token)
            .map(|interface| InterfaceSnapshot::new(&self.pool, interface))
    }

    /// SNMP interfaces listening on an address, IP or DNS name.
    pub fn get_snmp_interfaces_by_addr(&self, addr: &str) -> Vec<InterfaceSnapshot> {
        self.interface_snmpaddrs
            .get(addr)
            .iter()
            .filter_map(|&id| self.interfaces.get(id))
            .map(|interface| InterfaceSnapshot::new(&self.pool, interface))
            .collect()
    }

    /// Enabled SNMP trap items of an interface on monitored hosts.
    pub fn get_snmp_trap_items(&self, interfaceid: u64) -> Vec<ItemSnapshot> {
        self.interface_snmpitems
            .get(&interfaceid)
            .iter()
            .filter_map(|&id| self.items.get(id))
            .filter(|item| item.status == ItemStatus::Active)
            .filter_map(|item| self.item_snapshot(item))
            .filter(|item| item.host.status == HostStatus::Monitored)
            .collect()
    }

    fn nested_groups(&self, groupid: u64) -> Vec<u64> {
        let Some(group) = self.host_groups.get(groupid) else {
            return vec![];
        };
        let prefix = format!("{}/", self.pool.get(&group.name));
        let name = |id: &u64| self.host_groups.get(*id).map_or("", |g| self.pool.get(&g.name));

        let start = self.hostgroups_name.partition_point(|id| name(id) < prefix.as_str());
        std::iter::once(groupid)
            .chain(
                self.hostgroups_name[start..]
                    .iter()
                    .take_while(|id| name(id).starts_with(&prefix))
                    .copied(),
            )
            .sorted_unstable()
            .collect()
    }

    /// The given host groups together with every group nested below them.
    ///
    /// Nested lists are computed on first use after a host group change and cached.
    pub fn get_nested_hostgroupids(&mut self, groupids: &[u64]) -> Vec<u64> {
        let mut out = vec![];
        for &groupid in groupids {
            let Some(cached) = self.host_groups.get(groupid).map(|g| g.nested.clone()) else {
                continue;
            };
            let nested = match cached {
                Some(nested) => nested,
                None => {
                    let nested = self.nested_groups(groupid);
                    if let Some(group) = self.host_groups.get_mut(groupid) {
                        group.nested = Some(nested.clone());
                    }
                    nested
                }
            };
            out.extend(nested);
        }
        out.into_iter().sorted_unstable().dedup().collect()
    }

    /// Like [`Store::get_nested_hostgroupids`], starting from group names.
    pub fn get_nested_hostgroupids_by_names(&mut self, names: &[&str]) -> Vec<u64> {
        let groupids = names
            .iter()
            .filter_map(|name| {
                let name = *name;
                let pos = self
                    .hostgroups_name
                    .binary_search_by(|id| {
                        self.host_groups
                            .get(*id)
                            .map_or("", |g| self.pool.get(&g.name))
                            .cmp(name)
                    })
                    .ok()?;
                Some(self.hostgroups_name[pos])
            })
            .collect_vec();
        self.get_nested_hostgroupids(&groupids)
    }
}
