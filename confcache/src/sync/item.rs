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

//! Items, template items, item prototypes and preprocessing steps.
//!
//! Item columns, in order: `hostid, status, type, value_type, key, delay, history, trends, interfaceid, port,
//! flags, inventory_link, valuemapid, units, logtimefmt, state, error, lastlogsize, mtime`, the SNMP columns
//! `community, oid, securityname, securitylevel, authpassphrase, privpassphrase, authprotocol, privprotocol,
//! contextname`, then `ipmi_sensor, trapper_hosts, master_itemid, params, username, password, authtype, publickey,
//! privatekey, jmx_endpoint` and the HTTP agent columns `timeout, url, query_fields, posts, status_codes,
//! follow_redirects, post_type, http_proxy, headers, retrieve_mode, request_method, output_format, ssl_cert_file,
//! ssl_key_file, ssl_key_password, verify_peer, verify_host, allow_traps`.
//!
//! Template and prototype item columns: `hostid, templateid`.
//! Preprocessing columns: `itemid, type, params, step`.

use confcache_common::error::Result;
use confcache_memory::StringPool;

use super::{drive, Applied, DiffRow, DiffSource, RowTag, SyncCounts};
use crate::{
    model::{
        Credentials, HttpAgentItem, Item, ItemKind, ItemState, ItemStatus, ItemType, PreprocStep, PrototypeItem,
        SnmpItem, SnmpOidType, TemplateItem, ValueExt, ValueType,
    },
    store::{Release, Store},
};

const HOSTID: usize = 0;
const STATUS: usize = 1;
const TYPE: usize = 2;
const VALUE_TYPE: usize = 3;
const KEY: usize = 4;
const DELAY: usize = 5;
const HISTORY: usize = 6;
const TRENDS: usize = 7;
const INTERFACEID: usize = 8;
const PORT: usize = 9;
const FLAGS: usize = 10;
const INVENTORY_LINK: usize = 11;
const VALUEMAPID: usize = 12;
const UNITS: usize = 13;
const LOGTIMEFMT: usize = 14;
const STATE: usize = 15;
const ERROR: usize = 16;
const LASTLOGSIZE: usize = 17;
const MTIME: usize = 18;
const SNMP_COMMUNITY: usize = 19;
const SNMP_OID: usize = 20;
const SNMPV3_SECURITYNAME: usize = 21;
const SNMPV3_SECURITYLEVEL: usize = 22;
const SNMPV3_AUTHPASSPHRASE: usize = 23;
const SNMPV3_PRIVPASSPHRASE: usize = 24;
const SNMPV3_AUTHPROTOCOL: usize = 25;
const SNMPV3_PRIVPROTOCOL: usize = 26;
const SNMPV3_CONTEXTNAME: usize = 27;
const IPMI_SENSOR: usize = 28;
const TRAPPER_HOSTS: usize = 29;
const MASTER_ITEMID: usize = 30;
const PARAMS: usize = 31;
const USERNAME: usize = 32;
const PASSWORD: usize = 33;
const AUTHTYPE: usize = 34;
const PUBLICKEY: usize = 35;
const PRIVATEKEY: usize = 36;
const JMX_ENDPOINT: usize = 37;
const TIMEOUT: usize = 38;
const URL: usize = 39;
const QUERY_FIELDS: usize = 40;
const POSTS: usize = 41;
const STATUS_CODES: usize = 42;
const FOLLOW_REDIRECTS: usize = 43;
const POST_TYPE: usize = 44;
const HTTP_PROXY: usize = 45;
const HEADERS: usize = 46;
const RETRIEVE_MODE: usize = 47;
const REQUEST_METHOD: usize = 48;
const OUTPUT_FORMAT: usize = 49;
const SSL_CERT_FILE: usize = 50;
const SSL_KEY_FILE: usize = 51;
const SSL_KEY_PASSWORD: usize = 52;
const VERIFY_PEER: usize = 53;
const VERIFY_HOST: usize = 54;
const ALLOW_TRAPS: usize = 55;

/// Empty extension record of an item type.
fn empty_kind(item_type: ItemType) -> ItemKind {
    match item_type {
        ItemType::SnmpV1 | ItemType::SnmpV2c | ItemType::SnmpV3 => ItemKind::Snmp(SnmpItem::default()),
        ItemType::Ipmi => ItemKind::Ipmi {
            sensor: Default::default(),
        },
        ItemType::Trapper => ItemKind::Trapper {
            trapper_hosts: Default::default(),
        },
        ItemType::Dependent => ItemKind::Dependent { master_itemid: 0 },
        ItemType::DbMonitor => ItemKind::DbMonitor {
            params: Default::default(),
            credentials: Credentials::default(),
        },
        ItemType::Ssh => ItemKind::Ssh {
            authtype: 0,
            credentials: Credentials::default(),
            publickey: Default::default(),
            privatekey: Default::default(),
            params: Default::default(),
        },
        ItemType::Telnet => ItemKind::Telnet {
            credentials: Credentials::default(),
            params: Default::default(),
        },
        ItemType::Simple => ItemKind::Simple {
            credentials: Credentials::default(),
        },
        ItemType::Jmx => ItemKind::Jmx {
            credentials: Credentials::default(),
            endpoint: Default::default(),
        },
        ItemType::Calculated => ItemKind::Calculated {
            params: Default::default(),
        },
        ItemType::HttpAgent => ItemKind::HttpAgent(Box::default()),
        _ => ItemKind::Plain,
    }
}

fn fill_credentials(pool: &mut StringPool, found: bool, c: &mut Credentials, row: &DiffRow) -> Result<bool> {
    let mut changed = pool.replace(found, &mut c.username, row.str(USERNAME))?;
    changed |= pool.replace(found, &mut c.password, row.str(PASSWORD))?;
    Ok(changed)
}

/// Bring the extension record in line with the row, returning whether a scheduling relevant field changed.
fn fill_kind(pool: &mut StringPool, found: bool, item_type: ItemType, kind: &mut ItemKind, row: &DiffRow) -> Result<bool> {
    let found = found && kind.matches(item_type);
    if !found {
        std::mem::replace(kind, empty_kind(item_type)).release(pool);
    }

    let changed = match kind {
        ItemKind::Plain => false,
        ItemKind::Snmp(snmp) => {
            let mut changed = pool.replace(found, &mut snmp.community, row.str(SNMP_COMMUNITY))?;
            pool.replace(found, &mut snmp.oid, row.str(SNMP_OID))?;
            snmp.oid_type = SnmpOidType::of(row.str(SNMP_OID));
            changed |= pool.replace(found, &mut snmp.securityname, row.str(SNMPV3_SECURITYNAME))?;
            snmp.securitylevel = row.u8(SNMPV3_SECURITYLEVEL);
            pool.replace(found, &mut snmp.authpassphrase, row.str(SNMPV3_AUTHPASSPHRASE))?;
            pool.replace(found, &mut snmp.privpassphrase, row.str(SNMPV3_PRIVPASSPHRASE))?;
            snmp.authprotocol = row.u8(SNMPV3_AUTHPROTOCOL);
            snmp.privprotocol = row.u8(SNMPV3_PRIVPROTOCOL);
            changed |= pool.replace(found, &mut snmp.contextname, row.str(SNMPV3_CONTEXTNAME))?;
            changed
        }
        ItemKind::Ipmi { sensor } => {
            pool.replace(found, sensor, row.str(IPMI_SENSOR))?;
            false
        }
        ItemKind::Trapper { trapper_hosts } => {
            pool.replace(found, trapper_hosts, row.str(TRAPPER_HOSTS))?;
            false
        }
        ItemKind::Dependent { master_itemid } => {
            *master_itemid = row.u64(MASTER_ITEMID);
            false
        }
        ItemKind::DbMonitor { params, credentials } => {
            pool.replace(found, params, row.str(PARAMS))?;
            fill_credentials(pool, found, credentials, row)?;
            false
        }
        ItemKind::Ssh {
            authtype,
            credentials,
            publickey,
            privatekey,
            params,
        } => {
            *authtype = row.u8(AUTHTYPE);
            fill_credentials(pool, found, credentials, row)?;
            pool.replace(found, publickey, row.str(PUBLICKEY))?;
            pool.replace(found, privatekey, row.str(PRIVATEKEY))?;
            pool.replace(found, params, row.str(PARAMS))?;
            false
        }
        ItemKind::Telnet { credentials, params } => {
            fill_credentials(pool, found, credentials, row)?;
            pool.replace(found, params, row.str(PARAMS))?;
            false
        }
        ItemKind::Simple { credentials } => {
            fill_credentials(pool, found, credentials, row)?;
            false
        }
        ItemKind::Jmx { credentials, endpoint } => {
            let mut changed = fill_credentials(pool, found, credentials, row)?;
            changed |= pool.replace(found, endpoint, row.str(JMX_ENDPOINT))?;
            changed
        }
        ItemKind::Calculated { params } => {
            pool.replace(found, params, row.str(PARAMS))?;
            false
        }
        ItemKind::HttpAgent(http) => {
            fill_http(pool, found, http, row)?;
            false
        }
    };
    Ok(changed || !found)
}

fn fill_http(pool: &mut StringPool, found: bool, http: &mut HttpAgentItem, row: &DiffRow) -> Result<()> {
    pool.replace(found, &mut http.timeout, row.str(TIMEOUT))?;
    pool.replace(found, &mut http.url, row.str(URL))?;
    pool.replace(found, &mut http.query_fields, row.str(QUERY_FIELDS))?;
    pool.replace(found, &mut http.posts, row.str(POSTS))?;
    pool.replace(found, &mut http.status_codes, row.str(STATUS_CODES))?;
    http.follow_redirects = row.bool(FOLLOW_REDIRECTS);
    http.post_type = row.u8(POST_TYPE);
    pool.replace(found, &mut http.http_proxy, row.str(HTTP_PROXY))?;
    pool.replace(found, &mut http.headers, row.str(HEADERS))?;
    http.retrieve_mode = row.u8(RETRIEVE_MODE);
    http.request_method = row.u8(REQUEST_METHOD);
    http.output_format = row.u8(OUTPUT_FORMAT);
    pool.replace(found, &mut http.ssl_cert_file, row.str(SSL_CERT_FILE))?;
    pool.replace(found, &mut http.ssl_key_file, row.str(SSL_KEY_FILE))?;
    pool.replace(found, &mut http.ssl_key_password, row.str(SSL_KEY_PASSWORD))?;
    http.verify_peer = row.bool(VERIFY_PEER);
    http.verify_host = row.bool(VERIFY_HOST);
    http.allow_traps = row.bool(ALLOW_TRAPS);
    http.authtype = row.u8(AUTHTYPE);
    fill_credentials(pool, found, &mut http.credentials, row)?;
    pool.replace(found, &mut http.trapper_hosts, row.str(TRAPPER_HOSTS))?;
    Ok(())
}

fn fill_value_ext(pool: &mut StringPool, found: bool, value_type: ValueType, ext: &mut ValueExt, row: &DiffRow) -> Result<()> {
    let matches = match ext {
        ValueExt::None => !value_type.is_numeric() && value_type != ValueType::Log,
        ValueExt::Numeric { .. } => value_type.is_numeric(),
        ValueExt::Log { .. } => value_type == ValueType::Log,
    };
    let found = found && matches;
    if !found {
        let empty = match value_type {
            ValueType::Float | ValueType::Uint => ValueExt::Numeric {
                units: Default::default(),
                trends: Default::default(),
            },
            ValueType::Log => ValueExt::Log {
                logtimefmt: Default::default(),
            },
            ValueType::Str | ValueType::Text => ValueExt::None,
        };
        std::mem::replace(ext, empty).release(pool);
    }
    match ext {
        ValueExt::None => {}
        ValueExt::Numeric { units, trends } => {
            pool.replace(found, units, row.str(UNITS))?;
            pool.replace(found, trends, row.str(TRENDS))?;
        }
        ValueExt::Log { logtimefmt } => {
            pool.replace(found, logtimefmt, row.str(LOGTIMEFMT))?;
        }
    }
    Ok(())
}

impl Store {
    pub(super) fn sync_items(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts, now: i64) -> Result<()> {
        drive(source, counts, |row| match row.tag {
            RowTag::Remove => {
                self.remove_item(row.rowid);
                Ok(Applied::Done)
            }
            _ => self.upsert_item(&row, now),
        })
    }

    fn upsert_item(&mut self, row: &DiffRow, now: i64) -> Result<Applied> {
        let itemid = row.rowid;
        let hostid = row.u64(HOSTID);
        if !self.hosts.contains(hostid) {
            return Ok(Applied::Skipped);
        }
        let (Some(item_type), Some(value_type)) = (ItemType::from_raw(row.u8(TYPE)), ValueType::from_raw(row.u8(VALUE_TYPE)))
        else {
            tracing::warn!(itemid, kind = row.str(TYPE), value_type = row.str(VALUE_TYPE), "[sync]: unknown item type");
            return Ok(Applied::Skipped);
        };
        let status = ItemStatus::from_raw(row.u8(STATUS)).unwrap_or(ItemStatus::Disabled);

        let (token, found) = self.items.find_or_create(itemid, || Item {
            itemid,
            hostid,
            ..Default::default()
        })?;

        let Store {
            pool,
            items,
            items_hk,
            host_items,
            masteritems,
            interface_snmpitems,
            ..
        } = self;
        let Some(item) = items.at_mut(token) else {
            return Ok(Applied::Skipped);
        };

        let key = row.str(KEY);
        if !found || item.hostid != hostid || pool.get(&item.key) != key {
            if found {
                items_hk.remove(&(item.hostid, item.key.key()), token);
                host_items.remove(&item.hostid, itemid);
            }
            pool.replace(found, &mut item.key, key)?;
            items_hk.insert((hostid, item.key.key()), token);
            host_items.add(hostid, itemid);
        }

        let interfaceid = row.u64(INTERFACEID);
        let was_trap = found && item.item_type == ItemType::SnmpTrap;
        if was_trap && (item.interfaceid != interfaceid || item_type != ItemType::SnmpTrap) {
            interface_snmpitems.remove(&item.interfaceid, itemid);
        }
        if item_type == ItemType::SnmpTrap && interfaceid != 0 {
            interface_snmpitems.add(interfaceid, itemid);
        }

        let mut recompute = !found
            || item.item_type != item_type
            || item.interfaceid != interfaceid
            || item.status != status
            || item.hostid != hostid;
        recompute |= pool.replace(found, &mut item.delay, row.str(DELAY))?;
        let batch_changed = pool.replace(found, &mut item.port, row.str(PORT))?;

        item.hostid = hostid;
        item.item_type = item_type;
        item.value_type = value_type;
        item.status = status;
        item.interfaceid = interfaceid;
        item.flags = row.u8(FLAGS);
        item.inventory_link = row.u8(INVENTORY_LINK);
        item.valuemapid = row.u64(VALUEMAPID);
        pool.replace(found, &mut item.history, row.str(HISTORY))?;

        let old_master = item.master_itemid();
        let batch_changed = fill_kind(pool, found, item_type, &mut item.kind, row)? || batch_changed;
        fill_value_ext(pool, found, value_type, &mut item.value_ext, row)?;

        let master = item.master_itemid();
        if let Some(old_master) = old_master.filter(|&old| Some(old) != master) {
            masteritems.remove(&old_master, itemid);
        }
        if let Some(master) = master {
            masteritems.add(master, itemid);
        }

        if !found {
            item.state = ItemState::from_raw(row.u8(STATE)).unwrap_or(ItemState::Normal);
            item.error = row.str(ERROR).to_string();
            item.lastlogsize = row.u64(LASTLOGSIZE);
            item.mtime = row.i32(MTIME);
            item.data_expected_from = now;
        }

        self.update_item_queue(itemid, now, recompute || batch_changed);
        Ok(Applied::Done)
    }

    /// Remove an item with its functions, preprocessing steps and index entries.
    pub(crate) fn remove_item(&mut self, itemid: u64) {
        let Some(token) = self.items.token(itemid) else {
            return;
        };
        self.unqueue_item(itemid);

        if let Some(item) = self.items.at(token) {
            let (hostid, key) = (item.hostid, item.key.key());
            self.items_hk.remove(&(hostid, key), token);
            self.host_items.remove(&hostid, itemid);
            if item.item_type == ItemType::SnmpTrap {
                self.interface_snmpitems.remove(&item.interfaceid, itemid);
            }
            if let Some(master) = item.master_itemid() {
                self.masteritems.remove(&master, itemid);
            }
        }
        self.masteritems.take(&itemid);

        for preprocid in self.preprocitems.take(&itemid) {
            if let Some(step) = self.preprocs.remove(preprocid) {
                step.release(&mut self.pool);
            }
        }
        for functionid in self.item_functions.get(&itemid).to_vec() {
            self.remove_function(functionid);
        }

        if let Some(item) = self.items.remove(itemid) {
            item.release(&mut self.pool);
        }
    }

    pub(super) fn sync_template_items(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let itemid = row.rowid;
            if row.tag == RowTag::Remove {
                self.template_items.remove(itemid);
                return Ok(Applied::Done);
            }
            let record = TemplateItem {
                itemid,
                hostid: row.u64(0),
                templateid: row.u64(1),
            };
            let (token, _) = self.template_items.find_or_create(itemid, || record)?;
            if let Some(item) = self.template_items.at_mut(token) {
                *item = record;
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_prototype_items(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let itemid = row.rowid;
            if row.tag == RowTag::Remove {
                self.prototype_items.remove(itemid);
                return Ok(Applied::Done);
            }
            let record = PrototypeItem {
                itemid,
                hostid: row.u64(0),
                templateid: row.u64(1),
            };
            let (token, _) = self.prototype_items.find_or_create(itemid, || record)?;
            if let Some(item) = self.prototype_items.at_mut(token) {
                *item = record;
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_item_preproc(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let item_preprocid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(step) = self.preprocs.remove(item_preprocid) {
                    self.preprocitems.remove(&step.itemid, item_preprocid);
                    step.release(&mut self.pool);
                }
                return Ok(Applied::Done);
            }
            let itemid = row.u64(0);
            if !self.items.contains(itemid) {
                return Ok(Applied::Skipped);
            }
            let (token, found) = self.preprocs.find_or_create(item_preprocid, || PreprocStep {
                item_preprocid,
                itemid,
                ..Default::default()
            })?;
            let Some(step) = self.preprocs.at_mut(token) else {
                return Ok(Applied::Skipped);
            };
            if found && step.itemid != itemid {
                self.preprocitems.remove(&step.itemid, item_preprocid);
            }
            step.itemid = itemid;
            step.kind = row.u8(1);
            step.step = row.u32(3);
            self.pool.replace(found, &mut step.params, row.str(2))?;
            self.preprocitems.add(itemid, item_preprocid);
            Ok(Applied::Done)
        })
    }
}
