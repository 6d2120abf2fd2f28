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

//! Host interfaces.
//!
//! Columns: `hostid, type, main, useip, bulk, ip, dns, port`. User macros in the address columns are expanded
//! against the owner host, so host and macro tables must be synchronized first.

use confcache_common::error::Result;

use super::{drive, Applied, DiffSource, RowTag, SyncCounts};
use crate::{
    model::{Interface, InterfaceType},
    store::{Release, Store},
};

const HOSTID: usize = 0;
const TYPE: usize = 1;
const MAIN: usize = 2;
const USEIP: usize = 3;
const BULK: usize = 4;
const IP: usize = 5;
const DNS: usize = 6;
const PORT: usize = 7;

/// Address an SNMP interface is reached at.
pub(crate) fn snmp_address(store: &Store, interface: &Interface) -> String {
    match interface.useip {
        true => store.pool.get(&interface.ip).to_string(),
        false => store.pool.get(&interface.dns).to_string(),
    }
}

impl Store {
    pub(super) fn sync_interfaces(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let interfaceid = row.rowid;
            if row.tag == RowTag::Remove {
                self.remove_interface(interfaceid);
                return Ok(Applied::Done);
            }

            let hostid = row.u64(HOSTID);
            if !self.hosts.contains(hostid) {
                return Ok(Applied::Skipped);
            }
            let Some(kind) = InterfaceType::from_raw(row.u8(TYPE)) else {
                tracing::warn!(interfaceid, kind = row.str(TYPE), "[sync]: unknown interface type");
                return Ok(Applied::Skipped);
            };
            let ip = self.expand_macros(row.str(IP), &[hostid]);
            let dns = self.expand_macros(row.str(DNS), &[hostid]);
            let port = self.expand_macros(row.str(PORT), &[hostid]);

            let (token, found) = self.interfaces.find_or_create(interfaceid, || Interface {
                interfaceid,
                hostid,
                kind,
                ..Default::default()
            })?;

            let old = self.interfaces.at(token).map(|i| {
                let addr = (i.kind == InterfaceType::Snmp).then(|| snmp_address(self, i));
                (i.hostid, i.kind, i.main, addr)
            });
            let Some((old_hostid, old_kind, old_main, old_addr)) = old else {
                return Ok(Applied::Skipped);
            };

            let main = row.bool(MAIN);
            if found && old_main && (old_hostid != hostid || old_kind != kind || !main) {
                self.interfaces_ht.remove(&(old_hostid, old_kind), token);
            }
            if found && old_hostid != hostid {
                if let Some(host) = self.hosts.get_mut(old_hostid) {
                    host.interfaces.retain(|&id| id != interfaceid);
                }
            }
            if let Some(host) = self.hosts.get_mut(hostid) {
                if !host.interfaces.contains(&interfaceid) {
                    host.interfaces.push(interfaceid);
                }
            }

            let Some(interface) = self.interfaces.at_mut(token) else {
                return Ok(Applied::Skipped);
            };
            interface.hostid = hostid;
            interface.kind = kind;
            interface.main = main;
            let mut changed = interface.useip != row.bool(USEIP) || interface.bulk != row.bool(BULK);
            interface.useip = row.bool(USEIP);
            interface.bulk = row.bool(BULK);
            changed |= self.pool.replace(found, &mut interface.ip, &ip)?;
            changed |= self.pool.replace(found, &mut interface.dns, &dns)?;
            changed |= self.pool.replace(found, &mut interface.port, &port)?;
            if !interface.bulk {
                interface.max_snmp_succeed = 0;
                interface.min_snmp_fail = crate::scheduler::MAX_SNMP_ITEMS + 1;
            }

            if main {
                self.interfaces_ht.insert((hostid, kind), token);
            }

            let new_addr = self
                .interfaces
                .at(token)
                .filter(|i| i.kind == InterfaceType::Snmp)
                .map(|i| snmp_address(self, i));
            if old_addr != new_addr || !found {
                if let Some(addr) = old_addr.filter(|_| found) {
                    self.interface_snmpaddrs.remove(&addr, interfaceid);
                }
                if let Some(addr) = new_addr {
                    self.interface_snmpaddrs.add(addr, interfaceid);
                }
            }

            if found && (changed || old_hostid != hostid || old_kind != kind) {
                self.requeue_hosts.push(hostid);
            }
            Ok(Applied::Done)
        })
    }

    /// Remove an interface and its index entries.
    pub(crate) fn remove_interface(&mut self, interfaceid: u64) {
        let Some(token) = self.interfaces.token(interfaceid) else {
            return;
        };
        let Some((hostid, kind, main, addr)) = self.interfaces.at(token).map(|i| {
            let addr = (i.kind == InterfaceType::Snmp).then(|| snmp_address(self, i));
            (i.hostid, i.kind, i.main, addr)
        }) else {
            return;
        };

        if main {
            self.interfaces_ht.remove(&(hostid, kind), token);
        }
        if let Some(addr) = addr {
            self.interface_snmpaddrs.remove(&addr, interfaceid);
        }
        self.interface_snmpitems.take(&interfaceid);
        if let Some(host) = self.hosts.get_mut(hostid) {
            host.interfaces.retain(|&id| id != interfaceid);
        }
        if let Some(interface) = self.interfaces.remove(interfaceid) {
            interface.release(&mut self.pool);
        }
    }
}
