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

use confcache_memory::{Interned, StrKey};
use serde::{Deserialize, Serialize};

use super::{AgentKind, Availability, HostStatus, InterfaceType, MaintenanceType};

/// Availability record of one agent family of a host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAvailability {
    /// Current availability.
    pub available: Availability,
    /// When the current streak of errors started, `0` if none.
    pub errors_from: i64,
    /// Checks are suspended until this moment.
    pub disable_until: i64,
    /// Last error message.
    pub error: String,
}

/// IPMI settings of a host.
#[derive(Debug, Default)]
pub struct IpmiHost {
    /// Authentication algorithm, `-1` for default.
    pub authtype: i8,
    /// Privilege level.
    pub privilege: u8,
    /// User name.
    pub username: Interned,
    /// Password.
    pub password: Interned,
}

/// Maintenance state applied to a host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMaintenance {
    /// Maintenance the host is in, `0` if none.
    pub maintenanceid: u64,
    /// Whether a maintenance is in effect.
    pub active: bool,
    /// Data collection mode during the maintenance.
    pub kind: MaintenanceType,
    /// Maintenance start.
    pub from: i64,
}

/// A host, template or proxy.
#[derive(Debug)]
pub struct Host {
    /// Host id.
    pub hostid: u64,
    /// Monitoring proxy, `0` if monitored by the server.
    pub proxy_hostid: u64,
    /// Technical name.
    pub host: Interned,
    /// Visible name.
    pub name: Interned,
    /// Status.
    pub status: HostStatus,

    /// Availability per agent family, indexed by [`AgentKind::index`].
    pub availability: [AgentAvailability; 4],
    /// Enabled items per agent family.
    pub items_num: [u32; 4],
    /// Availability last handed out by the availability diff.
    pub(crate) reported: [AgentAvailability; 4],

    /// Maintenance state.
    pub maintenance: HostMaintenance,

    /// Connection encryption to the host.
    pub tls_connect: u8,
    /// Accepted encryption from the host.
    pub tls_accept: u8,
    /// Certificate issuer.
    pub tls_issuer: Interned,
    /// Certificate subject.
    pub tls_subject: Interned,
    /// Identity of the linked pre-shared key, if any.
    pub tls_psk_identity: Option<StrKey>,

    /// IPMI settings, `None` when every field holds the default.
    pub ipmi: Option<IpmiHost>,
    /// Interfaces owned by the host.
    pub interfaces: Vec<u64>,
    /// Whether the host has an inventory record.
    pub inventory_mode: i8,
    /// Values are not expected before this moment.
    pub data_expected_from: i64,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            hostid: 0,
            proxy_hostid: 0,
            host: Interned::default(),
            name: Interned::default(),
            status: HostStatus::Monitored,
            availability: Default::default(),
            items_num: [0; 4],
            reported: Default::default(),
            maintenance: HostMaintenance::default(),
            tls_connect: 1,
            tls_accept: 1,
            tls_issuer: Interned::default(),
            tls_subject: Interned::default(),
            tls_psk_identity: None,
            ipmi: None,
            interfaces: vec![],
            inventory_mode: -1,
            data_expected_from: 0,
        }
    }
}

impl Host {
    /// Availability of the given agent family.
    pub fn agent(&self, kind: AgentKind) -> &AgentAvailability {
        &self.availability[kind.index()]
    }

    /// Mutable availability of the given agent family.
    pub fn agent_mut(&mut self, kind: AgentKind) -> &mut AgentAvailability {
        &mut self.availability[kind.index()]
    }

    /// Returns `true` if the host is monitored through a proxy.
    pub fn is_proxied(&self) -> bool {
        self.proxy_hostid != 0
    }

    /// Returns `true` if the host is in a maintenance without data collection.
    pub fn in_nodata_maintenance(&self) -> bool {
        self.maintenance.active && self.maintenance.kind == MaintenanceType::NoData
    }
}

/// Runtime state of a proxy.
#[derive(Debug, Default)]
pub struct Proxy {
    /// Host id of the proxy.
    pub hostid: u64,
    /// Address the proxy connects from, for active proxies.
    pub proxy_address: Interned,
    /// Next configuration push, passive proxies only.
    pub proxy_config_nextcheck: i64,
    /// Next data poll, passive proxies only.
    pub proxy_data_nextcheck: i64,
    /// Next task poll, passive proxies only.
    pub proxy_tasks_nextcheck: i64,
    /// Last time the proxy was heard from.
    pub lastaccess: i64,
    /// Protocol version reported by the proxy.
    pub version: u32,
    /// Whether the proxy accepts compressed data.
    pub compress: bool,
    /// Whether the proxy sits in the proxy queue.
    pub queued: bool,
}

impl Proxy {
    /// The earliest of the three schedules.
    pub fn nextcheck(&self) -> i64 {
        self.proxy_config_nextcheck
            .min(self.proxy_data_nextcheck)
            .min(self.proxy_tasks_nextcheck)
    }
}

/// A host interface.
#[derive(Debug)]
pub struct Interface {
    /// Interface id.
    pub interfaceid: u64,
    /// Owner host.
    pub hostid: u64,
    /// Interface type.
    pub kind: InterfaceType,
    /// Main interface of its type on the host.
    pub main: bool,
    /// Connect by IP instead of DNS.
    pub useip: bool,
    /// Bulk SNMP requests enabled.
    pub bulk: bool,
    /// IP address, user macros expanded.
    pub ip: Interned,
    /// DNS name, user macros expanded.
    pub dns: Interned,
    /// Port, user macros expanded.
    pub port: Interned,
    /// Largest number of variables a bulk request has succeeded with.
    pub max_snmp_succeed: u8,
    /// Smallest number of variables a bulk request has failed with.
    pub min_snmp_fail: u8,
    /// Enabled items on the interface.
    pub items_num: u32,
}

impl Default for Interface {
    fn default() -> Self {
        Self {
            interfaceid: 0,
            hostid: 0,
            kind: InterfaceType::Agent,
            main: false,
            useip: true,
            bulk: true,
            ip: Interned::default(),
            dns: Interned::default(),
            port: Interned::default(),
            max_snmp_succeed: 0,
            min_snmp_fail: crate::scheduler::MAX_SNMP_ITEMS + 1,
            items_num: 0,
        }
    }
}

/// Inventory of a host.
#[derive(Debug, Default)]
pub struct HostInventory {
    /// Host id.
    pub hostid: u64,
    /// Inventory mode: `0` manual, `1` automatic.
    pub inventory_mode: i8,
    /// Inventory fields, in column order.
    pub values: Vec<Interned>,
}

/// A pre-shared key shared by every host using the same identity.
#[derive(Debug, Default)]
pub struct Psk {
    /// PSK identity.
    pub identity: Interned,
    /// PSK value.
    pub value: Interned,
    /// Hosts referencing the key.
    pub refcount: u32,
}
