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

use confcache_memory::Interned;

use super::{ItemState, ItemStatus, ItemType, ValueType};
use crate::scheduler::{Location, PollerType, QueuePriority};

/// Shape of an SNMP object identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnmpOidType {
    /// A plain numeric or symbolic OID.
    #[default]
    Normal,
    /// An index looked up by value, `oid[name,value]`.
    Dynamic,
    /// An OID with macros, resolved per request.
    Macro,
}

impl SnmpOidType {
    /// Classify an OID by its text.
    pub fn of(oid: &str) -> Self {
        if oid.contains('{') {
            Self::Macro
        } else if oid.contains('[') {
            Self::Dynamic
        } else {
            Self::Normal
        }
    }
}

/// SNMP specific fields.
#[derive(Debug, Default)]
pub struct SnmpItem {
    /// Community string for v1 and v2c.
    pub community: Interned,
    /// Object identifier.
    pub oid: Interned,
    /// Shape of `oid`.
    pub oid_type: SnmpOidType,
    /// SNMPv3 security name.
    pub securityname: Interned,
    /// SNMPv3 security level.
    pub securitylevel: u8,
    /// SNMPv3 authentication passphrase.
    pub authpassphrase: Interned,
    /// SNMPv3 privacy passphrase.
    pub privpassphrase: Interned,
    /// SNMPv3 authentication protocol.
    pub authprotocol: u8,
    /// SNMPv3 privacy protocol.
    pub privprotocol: u8,
    /// SNMPv3 context name.
    pub contextname: Interned,
}

/// Credentials shared by several item types.
#[derive(Debug, Default)]
pub struct Credentials {
    /// User name.
    pub username: Interned,
    /// Password.
    pub password: Interned,
}

/// HTTP agent specific fields.
#[derive(Debug, Default)]
pub struct HttpAgentItem {
    /// Request timeout.
    pub timeout: Interned,
    /// URL.
    pub url: Interned,
    /// Query fields.
    pub query_fields: Interned,
    /// Request body.
    pub posts: Interned,
    /// Accepted status codes.
    pub status_codes: Interned,
    /// Follow redirects.
    pub follow_redirects: bool,
    /// Body type.
    pub post_type: u8,
    /// Proxy to use.
    pub http_proxy: Interned,
    /// Request headers.
    pub headers: Interned,
    /// What part of the response to keep.
    pub retrieve_mode: u8,
    /// Request method.
    pub request_method: u8,
    /// Response conversion.
    pub output_format: u8,
    /// TLS client certificate.
    pub ssl_cert_file: Interned,
    /// TLS client key.
    pub ssl_key_file: Interned,
    /// TLS client key password.
    pub ssl_key_password: Interned,
    /// Verify the peer certificate.
    pub verify_peer: bool,
    /// Verify the host name.
    pub verify_host: bool,
    /// Accept values pushed by senders as well.
    pub allow_traps: bool,
    /// Authentication method.
    pub authtype: u8,
    /// Credentials.
    pub credentials: Credentials,
    /// Allowed sender addresses.
    pub trapper_hosts: Interned,
}

/// Type specific part of an item, selected by [`ItemType`].
#[derive(Debug, Default)]
pub enum ItemKind {
    /// Item types without extra fields.
    #[default]
    Plain,
    /// SNMP v1, v2c and v3.
    Snmp(SnmpItem),
    /// IPMI sensor.
    Ipmi {
        /// Sensor name.
        sensor: Interned,
    },
    /// Trapper.
    Trapper {
        /// Allowed sender addresses.
        trapper_hosts: Interned,
    },
    /// Dependent item.
    Dependent {
        /// Master item.
        master_itemid: u64,
    },
    /// Database monitor.
    DbMonitor {
        /// SQL query.
        params: Interned,
        /// Credentials.
        credentials: Credentials,
    },
    /// SSH command.
    Ssh {
        /// Authentication method.
        authtype: u8,
        /// Credentials.
        credentials: Credentials,
        /// Public key file.
        publickey: Interned,
        /// Private key file.
        privatekey: Interned,
        /// Script.
        params: Interned,
    },
    /// Telnet command.
    Telnet {
        /// Credentials.
        credentials: Credentials,
        /// Script.
        params: Interned,
    },
    /// Simple check.
    Simple {
        /// Credentials.
        credentials: Credentials,
    },
    /// JMX counter.
    Jmx {
        /// Credentials.
        credentials: Credentials,
        /// JMX endpoint.
        endpoint: Interned,
    },
    /// Calculated item.
    Calculated {
        /// Formula.
        params: Interned,
    },
    /// HTTP agent.
    HttpAgent(Box<HttpAgentItem>),
}

impl ItemKind {
    /// Returns `true` if the extension record matches the item type.
    pub fn matches(&self, item_type: ItemType) -> bool {
        match self {
            ItemKind::Snmp(_) => item_type.is_snmp(),
            ItemKind::Ipmi { .. } => item_type == ItemType::Ipmi,
            ItemKind::Trapper { .. } => item_type == ItemType::Trapper,
            ItemKind::Dependent { .. } => item_type == ItemType::Dependent,
            ItemKind::DbMonitor { .. } => item_type == ItemType::DbMonitor,
            ItemKind::Ssh { .. } => item_type == ItemType::Ssh,
            ItemKind::Telnet { .. } => item_type == ItemType::Telnet,
            ItemKind::Simple { .. } => item_type == ItemType::Simple,
            ItemKind::Jmx { .. } => item_type == ItemType::Jmx,
            ItemKind::Calculated { .. } => item_type == ItemType::Calculated,
            ItemKind::HttpAgent(_) => item_type == ItemType::HttpAgent,
            ItemKind::Plain => !matches!(
                item_type,
                ItemType::SnmpV1
                    | ItemType::SnmpV2c
                    | ItemType::SnmpV3
                    | ItemType::Ipmi
                    | ItemType::Trapper
                    | ItemType::Dependent
                    | ItemType::DbMonitor
                    | ItemType::Ssh
                    | ItemType::Telnet
                    | ItemType::Simple
                    | ItemType::Jmx
                    | ItemType::Calculated
                    | ItemType::HttpAgent
            ),
        }
    }
}

/// Value type specific part of an item, selected by [`ValueType`].
#[derive(Debug, Default)]
pub enum ValueExt {
    /// String and text items.
    #[default]
    None,
    /// Numeric items.
    Numeric {
        /// Units.
        units: Interned,
        /// Trend storage period, `"0"` disables trends.
        trends: Interned,
    },
    /// Log items.
    Log {
        /// Timestamp format.
        logtimefmt: Interned,
    },
}

/// A configured item.
#[derive(Debug)]
pub struct Item {
    /// Item id.
    pub itemid: u64,
    /// Owner host.
    pub hostid: u64,
    /// Interface the item is polled on, `0` if none.
    pub interfaceid: u64,
    /// Item key.
    pub key: Interned,
    /// Port override.
    pub port: Interned,
    /// Update interval expression, may contain user macros.
    pub delay: Interned,
    /// History storage period.
    pub history: Interned,
    /// How the value is obtained.
    pub item_type: ItemType,
    /// Type of collected values.
    pub value_type: ValueType,
    /// Configured status.
    pub status: ItemStatus,
    /// Discovery flags.
    pub flags: u8,
    /// Linked inventory field.
    pub inventory_link: u8,
    /// Value map.
    pub valuemapid: u64,
    /// Type specific fields.
    pub kind: ItemKind,
    /// Value type specific fields.
    pub value_ext: ValueExt,

    /// Runtime state.
    pub state: ItemState,
    /// Last error message.
    pub error: String,
    /// Log file size already read.
    pub lastlogsize: u64,
    /// Log file modification time.
    pub mtime: i32,
    /// Last value timestamp.
    pub lastclock: i64,

    /// Next scheduled check.
    pub nextcheck: i64,
    /// Queue the item belongs to.
    pub poller_type: Option<PollerType>,
    /// Where the item is.
    pub location: Location,
    /// Priority among items due at the same moment.
    pub queue_priority: QueuePriority,
    /// Whether the update interval could be parsed.
    pub schedulable: bool,
    /// Taken by an unreachable poller.
    pub unreachable: bool,
    /// Values are not expected before this moment.
    pub data_expected_from: i64,

    /// Triggers referencing the item.
    pub triggers: Vec<u64>,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            itemid: 0,
            hostid: 0,
            interfaceid: 0,
            key: Interned::default(),
            port: Interned::default(),
            delay: Interned::default(),
            history: Interned::default(),
            item_type: ItemType::Agent,
            value_type: ValueType::Float,
            status: ItemStatus::Active,
            flags: 0,
            inventory_link: 0,
            valuemapid: 0,
            kind: ItemKind::Plain,
            value_ext: ValueExt::None,
            state: ItemState::Normal,
            error: String::new(),
            lastlogsize: 0,
            mtime: 0,
            lastclock: 0,
            nextcheck: 0,
            poller_type: None,
            location: Location::Nowhere,
            queue_priority: QueuePriority::Normal,
            schedulable: true,
            unreachable: false,
            data_expected_from: 0,
            triggers: vec![],
        }
    }
}

const FLAG_DISCOVERY_RULE: u8 = 0x01;

impl Item {
    /// Returns `true` for low level discovery rules.
    pub fn is_discovery_rule(&self) -> bool {
        self.flags & FLAG_DISCOVERY_RULE != 0
    }

    /// The master item of a dependent item.
    pub fn master_itemid(&self) -> Option<u64> {
        match self.kind {
            ItemKind::Dependent { master_itemid, .. } if master_itemid != 0 => Some(master_itemid),
            _ => None,
        }
    }
}

/// One preprocessing step of an item.
#[derive(Debug, Default)]
pub struct PreprocStep {
    /// Step id.
    pub item_preprocid: u64,
    /// Owner item.
    pub itemid: u64,
    /// Position of the step.
    pub step: u32,
    /// Preprocessing operation.
    pub kind: u8,
    /// Operation parameters.
    pub params: Interned,
}

/// An item of a template, kept for template inheritance lookups.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TemplateItem {
    /// Item id.
    pub itemid: u64,
    /// Owner template.
    pub hostid: u64,
    /// Parent template item, `0` if none.
    pub templateid: u64,
}

/// An item prototype of a discovery rule.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PrototypeItem {
    /// Item id.
    pub itemid: u64,
    /// Owner host.
    pub hostid: u64,
    /// Parent template item, `0` if none.
    pub templateid: u64,
}
