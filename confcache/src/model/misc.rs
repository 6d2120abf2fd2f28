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
use serde::{Deserialize, Serialize};

/// Retention of one housekeeping data class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retention {
    /// Housekeeping enabled for the class.
    pub enabled: bool,
    /// Storage period in seconds.
    pub period: i64,
}

/// Housekeeping settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Housekeeping {
    /// Events and alerts.
    pub events: Retention,
    /// Audit log.
    pub audit: Retention,
    /// IT services.
    pub services: Retention,
    /// User sessions.
    pub sessions: Retention,
    /// History.
    pub history: Retention,
    /// Override item history periods with the global one.
    pub history_global: bool,
    /// Trends.
    pub trends: Retention,
    /// Override item trend periods with the global one.
    pub trends_global: bool,
}

/// The single row of global settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Retry interval for unsupported items, in seconds.
    pub refresh_unsupported: i64,
    /// Host group of discovered hosts.
    pub discovery_groupid: u64,
    /// Log unmatched SNMP traps.
    pub snmptrap_logging: bool,
    /// Severity names, by severity.
    pub severity_name: [String; 6],
    /// Inventory mode of new hosts.
    pub default_inventory_mode: i8,
    /// Accepted encryption of autoregistration requests.
    pub autoreg_tls_accept: u8,
    /// Housekeeping settings.
    pub hk: Housekeeping,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            refresh_unsupported: 600,
            discovery_groupid: 0,
            snmptrap_logging: true,
            severity_name: [
                "Not classified".to_string(),
                "Information".to_string(),
                "Warning".to_string(),
                "Average".to_string(),
                "High".to_string(),
                "Disaster".to_string(),
            ],
            default_inventory_mode: -1,
            autoreg_tls_accept: 1,
            hk: Housekeeping::default(),
        }
    }
}

/// The pre-shared key accepted from autoregistering agents.
#[derive(Debug, Default)]
pub struct AutoregPsk {
    /// PSK identity.
    pub identity: Interned,
    /// PSK value.
    pub value: Interned,
}

/// One expression of a global regular expression.
#[derive(Debug, Default)]
pub struct Expression {
    /// Expression id.
    pub expressionid: u64,
    /// Name of the owning regular expression.
    pub regexp: Interned,
    /// Expression text.
    pub expression: Interned,
    /// Expression type.
    pub kind: u8,
    /// Delimiter for list expressions.
    pub delimiter: char,
    /// Case sensitive match.
    pub case_sensitive: bool,
}

/// A row of a many-to-many relation, such as host to template or host group to host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Row id.
    pub linkid: u64,
    /// Owner side.
    pub from: u64,
    /// Referenced side.
    pub to: u64,
}
