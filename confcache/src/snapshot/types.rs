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

use confcache_memory::{Interned, StringPool};
use serde::{Deserialize, Serialize};

use crate::{
    model::{
        AgentAvailability, AgentKind, Credentials, CorrConditionKind, CorrOperationKind, CorrOperator, Host,
        HostMaintenance, HostStatus, Interface, InterfaceType, Item, ItemKind, ItemState, ItemStatus, ItemType,
        Proxy, Psk, TriggerState, TriggerStatus, TriggerValue, ValueExt, ValueType,
    },
    scheduler::{PollerType, QueuePriority},
};

fn owned(pool: &StringPool, s: &Interned) -> String {
    pool.get(s).to_string()
}

/// IPMI settings of a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpmiSnapshot {
    /// Authentication algorithm.
    pub authtype: i8,
    /// Privilege level.
    pub privilege: u8,
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// A host copied out of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSnapshot {
    /// Host id.
    pub hostid: u64,
    /// Monitoring proxy, `0` if none.
    pub proxy_hostid: u64,
    /// Technical name.
    pub host: String,
    /// Visible name.
    pub name: String,
    /// Status.
    pub status: HostStatus,
    /// Availability per agent family, indexed by [`AgentKind::index`].
    pub availability: [AgentAvailability; 4],
    /// Maintenance state.
    pub maintenance: HostMaintenance,
    /// Connection encryption to the host.
    pub tls_connect: u8,
    /// Accepted encryption from the host.
    pub tls_accept: u8,
    /// Certificate issuer.
    pub tls_issuer: String,
    /// Certificate subject.
    pub tls_subject: String,
    /// PSK identity.
    pub tls_psk_identity: String,
    /// PSK value.
    pub tls_psk: String,
    /// IPMI settings.
    pub ipmi: Option<IpmiSnapshot>,
    /// Inventory mode, `-1` if disabled.
    pub inventory_mode: i8,
    /// Values are not expected before this moment.
    pub data_expected_from: i64,
}

impl HostSnapshot {
    pub(crate) fn new(pool: &StringPool, host: &Host, psk: Option<&Psk>) -> Self {
        Self {
            hostid: host.hostid,
            proxy_hostid: host.proxy_hostid,
            host: owned(pool, &host.host),
            name: owned(pool, &host.name),
            status: host.status,
            availability: host.availability.clone(),
            maintenance: host.maintenance,
            tls_connect: host.tls_connect,
            tls_accept: host.tls_accept,
            tls_issuer: owned(pool, &host.tls_issuer),
            tls_subject: owned(pool, &host.tls_subject),
            tls_psk_identity: psk.map(|p| owned(pool, &p.identity)).unwrap_or_default(),
            tls_psk: psk.map(|p| owned(pool, &p.value)).unwrap_or_default(),
            ipmi: host.ipmi.as_ref().map(|ipmi| IpmiSnapshot {
                authtype: ipmi.authtype,
                privilege: ipmi.privilege,
                username: owned(pool, &ipmi.username),
                password: owned(pool, &ipmi.password),
            }),
            inventory_mode: host.inventory_mode,
            data_expected_from: host.data_expected_from,
        }
    }

    /// Availability of one agent family.
    pub fn agent(&self, kind: AgentKind) -> &AgentAvailability {
        &self.availability[kind.index()]
    }
}

/// An interface copied out of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSnapshot {
    /// Interface id.
    pub interfaceid: u64,
    /// Owner host.
    pub hostid: u64,
    /// Interface type.
    pub kind: InterfaceType,
    /// Main interface of its type.
    pub main: bool,
    /// Connect by IP.
    pub useip: bool,
    /// Bulk SNMP requests enabled.
    pub bulk: bool,
    /// IP address.
    pub ip: String,
    /// DNS name.
    pub dns: String,
    /// Port as configured.
    pub port: String,
}

impl InterfaceSnapshot {
    pub(crate) fn new(pool: &StringPool, interface: &Interface) -> Self {
        Self {
            interfaceid: interface.interfaceid,
            hostid: interface.hostid,
            kind: interface.kind,
            main: interface.main,
            useip: interface.useip,
            bulk: interface.bulk,
            ip: owned(pool, &interface.ip),
            dns: owned(pool, &interface.dns),
            port: owned(pool, &interface.port),
        }
    }

    /// The address to connect to.
    pub fn addr(&self) -> &str {
        match self.useip {
            true => &self.ip,
            false => &self.dns,
        }
    }

    /// The port as a number, if it is a valid one.
    pub fn port_number(&self) -> Option<u16> {
        self.port.parse().ok()
    }
}

/// User name and password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsSnapshot {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl CredentialsSnapshot {
    fn new(pool: &StringPool, credentials: &Credentials) -> Self {
        Self {
            username: owned(pool, &credentials.username),
            password: owned(pool, &credentials.password),
        }
    }
}

/// SNMP fields of an item.
#[expect(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpDetails {
    pub community: String,
    pub oid: String,
    pub securityname: String,
    pub securitylevel: u8,
    pub authpassphrase: String,
    pub privpassphrase: String,
    pub authprotocol: u8,
    pub privprotocol: u8,
    pub contextname: String,
}

/// HTTP agent fields of an item.
#[expect(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpDetails {
    pub timeout: String,
    pub url: String,
    pub query_fields: String,
    pub posts: String,
    pub status_codes: String,
    pub follow_redirects: bool,
    pub post_type: u8,
    pub http_proxy: String,
    pub headers: String,
    pub retrieve_mode: u8,
    pub request_method: u8,
    pub output_format: u8,
    pub ssl_cert_file: String,
    pub ssl_key_file: String,
    pub ssl_key_password: String,
    pub verify_peer: bool,
    pub verify_host: bool,
    pub allow_traps: bool,
    pub authtype: u8,
    pub credentials: CredentialsSnapshot,
    pub trapper_hosts: String,
}

/// Type specific fields of an item copied out of the cache.
#[expect(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemDetails {
    #[default]
    Plain,
    Snmp(SnmpDetails),
    Ipmi {
        sensor: String,
    },
    Trapper {
        trapper_hosts: String,
    },
    Dependent {
        master_itemid: u64,
    },
    DbMonitor {
        params: String,
        credentials: CredentialsSnapshot,
    },
    Ssh {
        authtype: u8,
        credentials: CredentialsSnapshot,
        publickey: String,
        privatekey: String,
        params: String,
    },
    Telnet {
        credentials: CredentialsSnapshot,
        params: String,
    },
    Simple {
        credentials: CredentialsSnapshot,
    },
    Jmx {
        credentials: CredentialsSnapshot,
        endpoint: String,
    },
    Calculated {
        params: String,
    },
    HttpAgent(Box<HttpDetails>),
}

impl ItemDetails {
    fn new(pool: &StringPool, kind: &ItemKind) -> Self {
        let s = |i: &Interned| owned(pool, i);
        let c = |c: &Credentials| CredentialsSnapshot::new(pool, c);
        match kind {
            ItemKind::Plain => ItemDetails::Plain,
            ItemKind::Snmp(snmp) => ItemDetails::Snmp(SnmpDetails {
                community: s(&snmp.community),
                oid: s(&snmp.oid),
                securityname: s(&snmp.securityname),
                securitylevel: snmp.securitylevel,
                authpassphrase: s(&snmp.authpassphrase),
                privpassphrase: s(&snmp.privpassphrase),
                authprotocol: snmp.authprotocol,
                privprotocol: snmp.privprotocol,
                contextname: s(&snmp.contextname),
            }),
            ItemKind::Ipmi { sensor } => ItemDetails::Ipmi { sensor: s(sensor) },
            ItemKind::Trapper { trapper_hosts } => ItemDetails::Trapper {
                trapper_hosts: s(trapper_hosts),
            },
            ItemKind::Dependent { master_itemid, .. } => ItemDetails::Dependent {
                master_itemid: *master_itemid,
            },
            ItemKind::DbMonitor { params, credentials } => ItemDetails::DbMonitor {
                params: s(params),
                credentials: c(credentials),
            },
            ItemKind::Ssh {
                authtype,
                credentials,
                publickey,
                privatekey,
                params,
            } => ItemDetails::Ssh {
                authtype: *authtype,
                credentials: c(credentials),
                publickey: s(publickey),
                privatekey: s(privatekey),
                params: s(params),
            },
            ItemKind::Telnet { credentials, params } => ItemDetails::Telnet {
                credentials: c(credentials),
                params: s(params),
            },
            ItemKind::Simple { credentials } => ItemDetails::Simple {
                credentials: c(credentials),
            },
            ItemKind::Jmx { credentials, endpoint } => ItemDetails::Jmx {
                credentials: c(credentials),
                endpoint: s(endpoint),
            },
            ItemKind::Calculated { params } => ItemDetails::Calculated { params: s(params) },
            ItemKind::HttpAgent(http) => ItemDetails::HttpAgent(Box::new(HttpDetails {
                timeout: s(&http.timeout),
                url: s(&http.url),
                query_fields: s(&http.query_fields),
                posts: s(&http.posts),
                status_codes: s(&http.status_codes),
                follow_redirects: http.follow_redirects,
                post_type: http.post_type,
                http_proxy: s(&http.http_proxy),
                headers: s(&http.headers),
                retrieve_mode: http.retrieve_mode,
                request_method: http.request_method,
                output_format: http.output_format,
                ssl_cert_file: s(&http.ssl_cert_file),
                ssl_key_file: s(&http.ssl_key_file),
                ssl_key_password: s(&http.ssl_key_password),
                verify_peer: http.verify_peer,
                verify_host: http.verify_host,
                allow_traps: http.allow_traps,
                authtype: http.authtype,
                credentials: c(&http.credentials),
                trapper_hosts: s(&http.trapper_hosts),
            })),
        }
    }
}

/// An item copied out of the cache together with its host and interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    /// Item id.
    pub itemid: u64,
    /// Key.
    pub key: String,
    /// Port override.
    pub port: String,
    /// Update interval as configured.
    pub delay: String,
    /// History storage period.
    pub history: String,
    /// Item type.
    pub item_type: ItemType,
    /// Value type.
    pub value_type: ValueType,
    /// Configured status.
    pub status: ItemStatus,
    /// Runtime state.
    pub state: ItemState,
    /// Discovery flags.
    pub flags: u8,
    /// Linked inventory field.
    pub inventory_link: u8,
    /// Value map.
    pub valuemapid: u64,
    /// Units of numeric items.
    pub units: String,
    /// Trend storage period of numeric items.
    pub trends: String,
    /// Timestamp format of log items.
    pub logtimefmt: String,
    /// Type specific fields.
    pub details: ItemDetails,
    /// Last error.
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
    /// Priority in the queue.
    pub queue_priority: QueuePriority,
    /// Values are not expected before this moment.
    pub data_expected_from: i64,
    /// Owner host.
    pub host: HostSnapshot,
    /// Interface, if the item has one.
    pub interface: Option<InterfaceSnapshot>,
}

impl ItemSnapshot {
    pub(crate) fn new(pool: &StringPool, item: &Item, host: HostSnapshot, interface: Option<InterfaceSnapshot>) -> Self {
        let (units, trends, logtimefmt) = match &item.value_ext {
            ValueExt::None => Default::default(),
            ValueExt::Numeric { units, trends } => (owned(pool, units), owned(pool, trends), String::new()),
            ValueExt::Log { logtimefmt } => (String::new(), String::new(), owned(pool, logtimefmt)),
        };
        Self {
            itemid: item.itemid,
            key: owned(pool, &item.key),
            port: owned(pool, &item.port),
            delay: owned(pool, &item.delay),
            history: owned(pool, &item.history),
            item_type: item.item_type,
            value_type: item.value_type,
            status: item.status,
            state: item.state,
            flags: item.flags,
            inventory_link: item.inventory_link,
            valuemapid: item.valuemapid,
            units,
            trends,
            logtimefmt,
            details: ItemDetails::new(pool, &item.kind),
            error: item.error.clone(),
            lastlogsize: item.lastlogsize,
            mtime: item.mtime,
            lastclock: item.lastclock,
            nextcheck: item.nextcheck,
            poller_type: item.poller_type,
            queue_priority: item.queue_priority,
            data_expected_from: item.data_expected_from.max(host.data_expected_from),
            host,
            interface,
        }
    }
}

/// A trigger function copied out of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSnapshot {
    /// Function id.
    pub functionid: u64,
    /// Item the function is evaluated on.
    pub itemid: u64,
    /// Owner trigger.
    pub triggerid: u64,
    /// Function name.
    pub function: String,
    /// Parameters.
    pub parameter: String,
}

/// A trigger copied out of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSnapshot {
    /// Trigger id.
    pub triggerid: u64,
    /// Name.
    pub description: String,
    /// Problem expression.
    pub expression: String,
    /// Recovery expression.
    pub recovery_expression: String,
    /// Correlation tag.
    pub correlation_tag: String,
    /// Severity.
    pub priority: u8,
    /// Generate multiple problem events.
    pub kind: u8,
    /// Recovery mode.
    pub recovery_mode: u8,
    /// Correlation mode.
    pub correlation_mode: u8,
    /// Status.
    pub status: TriggerStatus,
    /// Current value.
    pub value: TriggerValue,
    /// Evaluation state.
    pub state: TriggerState,
    /// Last error.
    pub error: String,
    /// Last value change.
    pub lastchange: i64,
    /// Position in dependency order.
    pub topoindex: u32,
    /// Referenced items.
    pub itemids: Vec<u64>,
    /// Tags as `(tag, value)` pairs.
    pub tags: Vec<(String, String)>,
}

/// One expression of a global regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionSnapshot {
    /// Name of the regular expression.
    pub name: String,
    /// Expression text.
    pub expression: String,
    /// Expression type.
    pub kind: u8,
    /// Delimiter of list expressions.
    pub delimiter: char,
    /// Case sensitive match.
    pub case_sensitive: bool,
}

/// A condition of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSnapshot {
    /// Condition id.
    pub conditionid: u64,
    /// Owner action.
    pub actionid: u64,
    /// What is compared.
    pub conditiontype: u8,
    /// Operator.
    pub operator: u8,
    /// Compared value.
    pub value: String,
    /// Second compared value.
    pub value2: String,
}

/// An action with the data needed to evaluate it against an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEval {
    /// Action id.
    pub actionid: u64,
    /// Event source.
    pub eventsource: u8,
    /// How conditions are combined.
    pub evaltype: u8,
    /// Custom expression.
    pub formula: String,
    /// Conditions.
    pub conditions: Vec<ConditionSnapshot>,
}

/// A correlation condition copied out of the cache.
#[expect(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrConditionSnapshot {
    OldEventTag { tag: String },
    NewEventTag { tag: String },
    NewEventHostGroup { groupid: u64, op: CorrOperator },
    EventTagPair { oldtag: String, newtag: String },
    OldEventTagValue { tag: String, value: String, op: CorrOperator },
    NewEventTagValue { tag: String, value: String, op: CorrOperator },
}

impl CorrConditionSnapshot {
    pub(crate) fn new(pool: &StringPool, kind: &CorrConditionKind) -> Self {
        let s = |i: &Interned| owned(pool, i);
        match kind {
            CorrConditionKind::OldEventTag { tag } => Self::OldEventTag { tag: s(tag) },
            CorrConditionKind::NewEventTag { tag } => Self::NewEventTag { tag: s(tag) },
            CorrConditionKind::NewEventHostGroup { groupid, op } => Self::NewEventHostGroup {
                groupid: *groupid,
                op: *op,
            },
            CorrConditionKind::EventTagPair { oldtag, newtag } => Self::EventTagPair {
                oldtag: s(oldtag),
                newtag: s(newtag),
            },
            CorrConditionKind::OldEventTagValue { tag, value, op } => Self::OldEventTagValue {
                tag: s(tag),
                value: s(value),
                op: *op,
            },
            CorrConditionKind::NewEventTagValue { tag, value, op } => Self::NewEventTagValue {
                tag: s(tag),
                value: s(value),
                op: *op,
            },
        }
    }
}

/// A correlation rule with its conditions and operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationRule {
    /// Correlation id.
    pub correlationid: u64,
    /// Name.
    pub name: String,
    /// How conditions are combined.
    pub evaltype: u8,
    /// Custom expression, conditions referenced as `{id}`.
    pub formula: String,
    /// Conditions by condition id.
    pub conditions: Vec<(u64, CorrConditionSnapshot)>,
    /// Operations.
    pub operations: Vec<CorrOperationKind>,
}

/// Runtime state of a proxy copied out of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySnapshot {
    /// The proxy host record.
    pub host: HostSnapshot,
    /// Address active proxies connect from.
    pub proxy_address: String,
    /// Next configuration push.
    pub proxy_config_nextcheck: i64,
    /// Next data poll.
    pub proxy_data_nextcheck: i64,
    /// Next task poll.
    pub proxy_tasks_nextcheck: i64,
    /// Last time the proxy was heard from.
    pub lastaccess: i64,
    /// Protocol version.
    pub version: u32,
    /// Accepts compressed data.
    pub compress: bool,
}

impl ProxySnapshot {
    pub(crate) fn new(pool: &StringPool, proxy: &Proxy, host: HostSnapshot) -> Self {
        Self {
            host,
            proxy_address: owned(pool, &proxy.proxy_address),
            proxy_config_nextcheck: proxy.proxy_config_nextcheck,
            proxy_data_nextcheck: proxy.proxy_data_nextcheck,
            proxy_tasks_nextcheck: proxy.proxy_tasks_nextcheck,
            lastaccess: proxy.lastaccess,
            version: proxy.version,
            compress: proxy.compress,
        }
    }
}
