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

//! Entity records held by the cache and the enumerations they are built from.

mod action;
mod group;
mod host;
mod item;
mod macros;
mod misc;
mod trigger;

use serde::{Deserialize, Serialize};

pub use self::{action::*, group::*, host::*, item::*, macros::*, misc::*, trigger::*};

macro_rules! raw_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $raw:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Convert from the raw database value.
            pub fn from_raw(raw: $raw) -> Option<Self> {
                match raw {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use raw_enum;

raw_enum! {
    /// How the value of an item is obtained.
    pub enum ItemType: u8 {
        /// Passive agent check.
        Agent = 0,
        /// SNMPv1 agent.
        SnmpV1 = 1,
        /// Values pushed by senders.
        Trapper = 2,
        /// Simple check.
        Simple = 3,
        /// SNMPv2c agent.
        SnmpV2c = 4,
        /// Internal check.
        Internal = 5,
        /// SNMPv3 agent.
        SnmpV3 = 6,
        /// Active agent check.
        AgentActive = 7,
        /// Aggregate check.
        Aggregate = 8,
        /// Web scenario item.
        HttpTest = 9,
        /// External script.
        External = 10,
        /// Database monitor.
        DbMonitor = 11,
        /// IPMI sensor.
        Ipmi = 12,
        /// SSH command.
        Ssh = 13,
        /// Telnet command.
        Telnet = 14,
        /// Calculated item.
        Calculated = 15,
        /// JMX counter.
        Jmx = 16,
        /// SNMP trap.
        SnmpTrap = 17,
        /// Dependent item.
        Dependent = 18,
        /// HTTP agent.
        HttpAgent = 19,
    }
}

impl ItemType {
    /// Returns `true` for SNMP polled items.
    pub fn is_snmp(self) -> bool {
        matches!(self, ItemType::SnmpV1 | ItemType::SnmpV2c | ItemType::SnmpV3)
    }

    /// The agent family whose availability this item type reports, if any.
    pub fn agent_kind(self) -> Option<AgentKind> {
        match self {
            ItemType::Agent => Some(AgentKind::Agent),
            ItemType::SnmpV1 | ItemType::SnmpV2c | ItemType::SnmpV3 => Some(AgentKind::Snmp),
            ItemType::Ipmi => Some(AgentKind::Ipmi),
            ItemType::Jmx => Some(AgentKind::Jmx),
            _ => None,
        }
    }

    /// Returns `true` for item types polled by the cache owner at a regular interval.
    pub fn is_polled(self) -> bool {
        !matches!(
            self,
            ItemType::Trapper | ItemType::AgentActive | ItemType::HttpTest | ItemType::SnmpTrap | ItemType::Dependent
        )
    }
}

raw_enum! {
    /// Type of values an item collects.
    pub enum ValueType: u8 {
        /// Floating point numbers.
        Float = 0,
        /// Short strings.
        Str = 1,
        /// Log lines.
        Log = 2,
        /// Unsigned integers.
        Uint = 3,
        /// Text.
        Text = 4,
    }
}

impl ValueType {
    /// Returns `true` for numeric value types.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Float | ValueType::Uint)
    }
}

raw_enum! {
    /// Configured status of an item.
    pub enum ItemStatus: u8 {
        /// Enabled.
        Active = 0,
        /// Disabled.
        Disabled = 1,
    }
}

raw_enum! {
    /// Runtime state of an item.
    pub enum ItemState: u8 {
        /// Values are collected.
        Normal = 0,
        /// The last collection attempt failed permanently.
        NotSupported = 1,
    }
}

raw_enum! {
    /// Status of a host record.
    pub enum HostStatus: u8 {
        /// Monitored host.
        Monitored = 0,
        /// Disabled host.
        NotMonitored = 1,
        /// Template.
        Template = 3,
        /// Active proxy.
        ProxyActive = 5,
        /// Passive proxy.
        ProxyPassive = 6,
    }
}

impl HostStatus {
    /// Returns `true` for proxies.
    pub fn is_proxy(self) -> bool {
        matches!(self, HostStatus::ProxyActive | HostStatus::ProxyPassive)
    }
}

raw_enum! {
    /// Availability of one agent family of a host.
    pub enum Availability: u8 {
        /// Nothing is known yet.
        Unknown = 0,
        /// Reachable.
        Available = 1,
        /// Unreachable for longer than the unreachable period.
        Unavailable = 2,
    }
}

impl Default for Availability {
    fn default() -> Self {
        Availability::Unknown
    }
}

raw_enum! {
    /// Type of a host interface.
    pub enum InterfaceType: u8 {
        /// Agent interface.
        Agent = 1,
        /// SNMP interface.
        Snmp = 2,
        /// IPMI interface.
        Ipmi = 3,
        /// JMX interface.
        Jmx = 4,
    }
}

/// The four agent families whose availability is tracked per host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Native agent.
    Agent,
    /// SNMP.
    Snmp,
    /// IPMI.
    Ipmi,
    /// JMX.
    Jmx,
}

impl AgentKind {
    /// Every agent family, in index order.
    pub const ALL: [AgentKind; 4] = [AgentKind::Agent, AgentKind::Snmp, AgentKind::Ipmi, AgentKind::Jmx];

    /// Position of the family in per-host arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The interface type serving this family.
    pub fn interface_type(self) -> InterfaceType {
        match self {
            AgentKind::Agent => InterfaceType::Agent,
            AgentKind::Snmp => InterfaceType::Snmp,
            AgentKind::Ipmi => InterfaceType::Ipmi,
            AgentKind::Jmx => InterfaceType::Jmx,
        }
    }
}

raw_enum! {
    /// Value of a trigger.
    pub enum TriggerValue: u8 {
        /// No problem.
        Ok = 0,
        /// Problem.
        Problem = 1,
    }
}

raw_enum! {
    /// Evaluation state of a trigger.
    pub enum TriggerState: u8 {
        /// Evaluated normally.
        Normal = 0,
        /// Could not be evaluated.
        Unknown = 1,
    }
}

raw_enum! {
    /// Configured status of a trigger.
    pub enum TriggerStatus: u8 {
        /// Enabled.
        Enabled = 0,
        /// Disabled.
        Disabled = 1,
    }
}
