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

//! Hosts, proxies, host inventories, template links and host tags.
//!
//! Host columns: `proxy_hostid, host, status, ipmi_authtype, ipmi_privilege, ipmi_username, ipmi_password,
//! maintenanceid, maintenance_status, maintenance_type, maintenance_from`, then `available, errors_from,
//! disable_until, error` for the agent, SNMP, IPMI and JMX families, then `name, tls_connect, tls_accept,
//! tls_issuer, tls_subject, tls_psk_identity, tls_psk, proxy_address`.
//!
//! Inventory columns: `inventory_mode` followed by the inventory fields.
//! Template link columns: `hostid, templateid`. Host tag columns: `hostid, tag, value`.

use confcache_common::error::Result;
use confcache_memory::{StrKey, Token};

use super::{drive, Applied, DiffRow, DiffSource, RowTag, SyncCounts};
use crate::{
    model::{
        AgentAvailability, AgentKind, Availability, Host, HostInventory, HostMaintenance, HostStatus, HostTag, IpmiHost,
        Link, MaintenanceType, Proxy, Psk,
    },
    scheduler::calculate_proxy_nextcheck,
    store::{Release, Store},
};

const PROXY_HOSTID: usize = 0;
const HOST: usize = 1;
const STATUS: usize = 2;
const IPMI_AUTHTYPE: usize = 3;
const IPMI_PRIVILEGE: usize = 4;
const IPMI_USERNAME: usize = 5;
const IPMI_PASSWORD: usize = 6;
const MAINTENANCEID: usize = 7;
const MAINTENANCE_STATUS: usize = 8;
const MAINTENANCE_TYPE: usize = 9;
const MAINTENANCE_FROM: usize = 10;
const AVAILABILITY: usize = 11;
const NAME: usize = 27;
const TLS_CONNECT: usize = 28;
const TLS_ACCEPT: usize = 29;
const TLS_ISSUER: usize = 30;
const TLS_SUBJECT: usize = 31;
const TLS_PSK_IDENTITY: usize = 32;
const TLS_PSK: usize = 33;
const PROXY_ADDRESS: usize = 34;

/// `tls_connect`/`tls_accept` bit selecting pre-shared keys.
const TLS_PSK_FLAG: u8 = 2;

const IPMI_DEFAULT_AUTHTYPE: i8 = -1;
const IPMI_DEFAULT_PRIVILEGE: u8 = 2;

/// Which name index a host belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameIndex {
    Hosts,
    Proxies,
    None,
}

impl NameIndex {
    fn of(status: HostStatus) -> Self {
        match status {
            HostStatus::Monitored | HostStatus::NotMonitored => NameIndex::Hosts,
            HostStatus::ProxyActive | HostStatus::ProxyPassive => NameIndex::Proxies,
            HostStatus::Template => NameIndex::None,
        }
    }
}

fn agent_availability(row: &DiffRow, kind: AgentKind) -> AgentAvailability {
    let base = AVAILABILITY + 4 * kind.index();
    AgentAvailability {
        available: Availability::from_raw(row.u8(base)).unwrap_or_default(),
        errors_from: row.i64(base + 1),
        disable_until: row.i64(base + 2),
        error: row.str(base + 3).to_string(),
    }
}

impl Store {
    fn unindex_host_name(&mut self, key: StrKey, status: HostStatus, token: Token) {
        match NameIndex::of(status) {
            NameIndex::Hosts => {
                self.hosts_h.remove(&key, token);
            }
            NameIndex::Proxies => {
                self.hosts_p.remove(&key, token);
            }
            NameIndex::None => {}
        }
    }

    fn index_host_name(&mut self, key: StrKey, status: HostStatus, token: Token) {
        match NameIndex::of(status) {
            NameIndex::Hosts => {
                self.hosts_h.insert(key, token);
            }
            NameIndex::Proxies => {
                self.hosts_p.insert(key, token);
            }
            NameIndex::None => {}
        }
    }

    /// Drop a host's reference on its pre-shared key.
    fn unlink_psk(&mut self, key: StrKey) {
        let Some(psk) = self.psks.get_mut(&key) else {
            return;
        };
        psk.refcount = psk.refcount.saturating_sub(1);
        if psk.refcount == 0 {
            if let Some(psk) = self.psks.remove(&key) {
                psk.identity.release(&mut self.pool);
                psk.value.release(&mut self.pool);
            }
        }
    }

    /// Point a host at the pre-shared key `identity`, returning the linked key.
    fn link_psk(&mut self, hostid: u64, current: Option<StrKey>, identity: &str, value: &str) -> Result<Option<StrKey>> {
        if let Some(key) = current {
            if self.pool.get_by_key(key) == identity {
                let Some(psk) = self.psks.get_mut(&key) else {
                    return Ok(None);
                };
                if self.pool.get(&psk.value) == value {
                    return Ok(Some(key));
                }
                if psk.refcount == 1 {
                    self.pool.replace(true, &mut psk.value, value)?;
                    return Ok(Some(key));
                }
            }
            self.unlink_psk(key);
        }

        if identity.is_empty() {
            return Ok(None);
        }

        if let Some(key) = self.pool.lookup(identity) {
            if let Some(psk) = self.psks.get_mut(&key) {
                if self.pool.get(&psk.value) != value {
                    tracing::warn!(
                        hostid,
                        identity,
                        "[sync]: pre-shared key identity is used with different values, key not linked to the host"
                    );
                    return Ok(None);
                }
                psk.refcount += 1;
                return Ok(Some(key));
            }
        }

        let identity = self.pool.intern(identity)?;
        let value = self.pool.intern(value)?;
        let key = identity.key();
        self.psks.insert(key, Psk {
            identity,
            value,
            refcount: 1,
        });
        Ok(Some(key))
    }

    pub(super) fn sync_hosts(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts, now: i64) -> Result<()> {
        drive(source, counts, |row| match row.tag {
            RowTag::Remove => {
                self.remove_host(row.rowid);
                Ok(Applied::Done)
            }
            _ => self.upsert_host(&row, now),
        })
    }

    fn upsert_host(&mut self, row: &DiffRow, now: i64) -> Result<Applied> {
        let hostid = row.rowid;
        let Some(status) = HostStatus::from_raw(row.u8(STATUS)) else {
            tracing::warn!(hostid, status = row.str(STATUS), "[sync]: unknown host status");
            return Ok(Applied::Skipped);
        };

        let (token, found) = self.hosts.find_or_create(hostid, || Host {
            hostid,
            ..Default::default()
        })?;

        let Store {
            pool, hosts, config, ..
        } = self;
        let Some(host) = hosts.at_mut(token) else {
            return Ok(Applied::Skipped);
        };

        let old_status = host.status;
        let old_name = host.host.key();
        let proxy_hostid = row.u64(PROXY_HOSTID);
        let requeue = found && (host.status != status || host.proxy_hostid != proxy_hostid);

        let name_changed = pool.replace(found, &mut host.host, row.str(HOST))?;
        pool.replace(found, &mut host.name, row.str(NAME))?;
        let new_name = host.host.key();
        host.proxy_hostid = proxy_hostid;
        host.status = status;

        if !found {
            for kind in AgentKind::ALL {
                host.availability[kind.index()] = agent_availability(row, kind);
            }
            host.reported = host.availability.clone();
            host.maintenance = HostMaintenance {
                maintenanceid: row.u64(MAINTENANCEID),
                active: row.bool(MAINTENANCE_STATUS),
                kind: MaintenanceType::from_raw(row.u8(MAINTENANCE_TYPE)).unwrap_or_default(),
                from: row.i64(MAINTENANCE_FROM),
            };
            host.data_expected_from = now;
        }

        let authtype = row.i8(IPMI_AUTHTYPE);
        let privilege = row.u8(IPMI_PRIVILEGE);
        let (username, password) = (row.str(IPMI_USERNAME), row.str(IPMI_PASSWORD));
        if authtype == IPMI_DEFAULT_AUTHTYPE
            && privilege == IPMI_DEFAULT_PRIVILEGE
            && username.is_empty()
            && password.is_empty()
        {
            host.ipmi.take().release(pool);
        } else {
            let ipmi_found = host.ipmi.is_some();
            let ipmi = host.ipmi.get_or_insert_with(IpmiHost::default);
            ipmi.authtype = authtype;
            ipmi.privilege = privilege;
            pool.replace(ipmi_found, &mut ipmi.username, username)?;
            pool.replace(ipmi_found, &mut ipmi.password, password)?;
        }

        host.tls_connect = row.u8(TLS_CONNECT);
        host.tls_accept = row.u8(TLS_ACCEPT);
        pool.replace(found, &mut host.tls_issuer, row.str(TLS_ISSUER))?;
        pool.replace(found, &mut host.tls_subject, row.str(TLS_SUBJECT))?;
        let uses_psk = (host.tls_connect | host.tls_accept) & TLS_PSK_FLAG != 0;
        let current_psk = host.tls_psk_identity;
        let is_passive_proxy = status == HostStatus::ProxyPassive;
        let proxy_config_frequency = config.proxy_config_frequency;
        let proxy_data_frequency = config.proxy_data_frequency;

        if !found || name_changed || old_status != status {
            if found {
                self.unindex_host_name(old_name, old_status, token);
            }
            self.index_host_name(new_name, status, token);
        }

        let psk = match uses_psk {
            true => self.link_psk(hostid, current_psk, row.str(TLS_PSK_IDENTITY), row.str(TLS_PSK))?,
            false => {
                if let Some(key) = current_psk {
                    self.unlink_psk(key);
                }
                None
            }
        };
        if let Some(host) = self.hosts.at_mut(token) {
            host.tls_psk_identity = psk;
        }

        if status.is_proxy() {
            let (proxy_token, proxy_found) = self.proxies.find_or_create(hostid, || Proxy {
                hostid,
                ..Default::default()
            })?;
            if let Some(proxy) = self.proxies.at_mut(proxy_token) {
                self.pool
                    .replace(proxy_found, &mut proxy.proxy_address, row.str(PROXY_ADDRESS))?;
                if !proxy_found || old_status != status {
                    proxy.proxy_config_nextcheck = calculate_proxy_nextcheck(hostid, proxy_config_frequency, now);
                    proxy.proxy_data_nextcheck = calculate_proxy_nextcheck(hostid, proxy_data_frequency, now);
                    proxy.proxy_tasks_nextcheck = proxy.proxy_data_nextcheck;
                }
            }
            match is_passive_proxy {
                true => self.queue_proxy(hostid),
                false => self.unqueue_proxy(hostid),
            }
        } else if let Some(proxy) = self.proxies.remove(hostid) {
            self.unqueue_proxy(hostid);
            proxy.release(&mut self.pool);
        }

        if requeue {
            self.requeue_hosts.push(hostid);
        }
        Ok(Applied::Done)
    }

    /// Remove a host with everything hanging off it.
    pub(crate) fn remove_host(&mut self, hostid: u64) {
        let Some(token) = self.hosts.token(hostid) else {
            return;
        };
        if let Some(host) = self.hosts.at(token) {
            let (key, status) = (host.host.key(), host.status);
            self.unindex_host_name(key, status, token);
        }

        let interfaceids = self.hosts.at(token).map(|h| h.interfaces.clone()).unwrap_or_default();
        for interfaceid in interfaceids {
            self.remove_interface(interfaceid);
        }
        for itemid in self.host_items.take(&hostid) {
            self.remove_item(itemid);
        }
        self.remove_orphan_triggers();

        let hmacroids = self
            .hmacros
            .values()
            .filter(|m| m.hostid == hostid)
            .map(|m| m.hostmacroid)
            .collect::<Vec<_>>();
        for hostmacroid in hmacroids {
            self.remove_host_macro(hostmacroid);
        }
        for hosttagid in self.host_tags_index.get(&hostid).to_vec() {
            self.remove_host_tag(hosttagid);
        }
        let templates = self
            .host_templates
            .values()
            .filter(|l| l.from == hostid)
            .map(|l| l.linkid)
            .collect::<Vec<_>>();
        for linkid in templates {
            self.remove_host_template(linkid);
        }
        let memberships = self
            .group_hosts
            .values()
            .filter(|l| l.to == hostid)
            .map(|l| l.linkid)
            .collect::<Vec<_>>();
        for linkid in memberships {
            self.remove_group_host(linkid);
        }

        if let Some(inventory) = self.inventories.remove(hostid) {
            inventory.release(&mut self.pool);
        }
        if let Some(proxy) = self.proxies.remove(hostid) {
            self.unqueue_proxy(hostid);
            proxy.release(&mut self.pool);
        }
        if let Some(host) = self.hosts.remove(hostid) {
            if let Some(key) = host.tls_psk_identity {
                self.unlink_psk(key);
            }
            host.release(&mut self.pool);
        }
    }

    pub(super) fn sync_host_inventory(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let hostid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(inventory) = self.inventories.remove(hostid) {
                    inventory.release(&mut self.pool);
                }
                if let Some(host) = self.hosts.get_mut(hostid) {
                    host.inventory_mode = -1;
                }
                return Ok(Applied::Done);
            }

            let Some(host) = self.hosts.get_mut(hostid) else {
                return Ok(Applied::Skipped);
            };
            let mode = row.i8(0);
            host.inventory_mode = mode;

            let (token, found) = self.inventories.find_or_create(hostid, || HostInventory {
                hostid,
                ..Default::default()
            })?;
            let Some(inventory) = self.inventories.at_mut(token) else {
                return Ok(Applied::Skipped);
            };
            inventory.inventory_mode = mode;
            let fields = row.columns.len().saturating_sub(1);
            while inventory.values.len() > fields {
                if let Some(v) = inventory.values.pop() {
                    self.pool.release(v);
                }
            }
            for i in 0..fields {
                let value = row.str(i + 1);
                match inventory.values.get_mut(i) {
                    Some(slot) => {
                        self.pool.replace(found, slot, value)?;
                    }
                    None => inventory.values.push(self.pool.intern(value)?),
                }
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_host_templates(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let linkid = row.rowid;
            if row.tag == RowTag::Remove {
                self.remove_host_template(linkid);
                return Ok(Applied::Done);
            }
            let link = Link {
                linkid,
                from: row.u64(0),
                to: row.u64(1),
            };
            let (token, found) = self.host_templates.find_or_create(linkid, || link)?;
            if found {
                if let Some(old) = self.host_templates.at_mut(token) {
                    let old = std::mem::replace(old, link);
                    self.htmpls.remove(&old.from, old.to);
                }
            }
            self.htmpls.add(link.from, link.to);
            Ok(Applied::Done)
        })
    }

    fn remove_host_template(&mut self, linkid: u64) {
        if let Some(link) = self.host_templates.remove(linkid) {
            self.htmpls.remove(&link.from, link.to);
        }
    }

    pub(super) fn sync_host_tags(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let hosttagid = row.rowid;
            if row.tag == RowTag::Remove {
                self.remove_host_tag(hosttagid);
                return Ok(Applied::Done);
            }
            let hostid = row.u64(0);
            let (token, found) = self.host_tags.find_or_create(hosttagid, || HostTag {
                hosttagid,
                hostid,
                ..Default::default()
            })?;
            let Some(tag) = self.host_tags.at_mut(token) else {
                return Ok(Applied::Skipped);
            };
            if found && tag.hostid != hostid {
                self.host_tags_index.remove(&tag.hostid, hosttagid);
                tag.hostid = hostid;
            }
            self.pool.replace(found, &mut tag.tag, row.str(1))?;
            self.pool.replace(found, &mut tag.value, row.str(2))?;
            self.host_tags_index.add(hostid, hosttagid);
            Ok(Applied::Done)
        })
    }

    fn remove_host_tag(&mut self, hosttagid: u64) {
        if let Some(tag) = self.host_tags.remove(hosttagid) {
            self.host_tags_index.remove(&tag.hostid, hosttagid);
            tag.release(&mut self.pool);
        }
    }
}
