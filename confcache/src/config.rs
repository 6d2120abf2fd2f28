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

use serde::{Deserialize, Serialize};

/// The kind of process owning the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    /// Monitoring server: items of proxy-monitored hosts are polled by their proxies.
    #[default]
    Server,
    /// Proxy: every item in the cache is polled locally.
    Proxy,
}

/// Settings of a configuration cache.
///
/// ```rust
/// # use confcache::CacheConfig;
/// let config: CacheConfig = serde_json::from_str(r#"{ "cache_size": 16777216, "pingers": 0 }"#).unwrap();
/// assert_eq!(config.pingers, 0);
/// assert_eq!(config.pollers, CacheConfig::default().pollers);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Arena budget in bytes.
    pub cache_size: usize,
    /// Server or proxy.
    pub program_type: ProgramType,

    /// Regular pollers.
    pub pollers: usize,
    /// Pollers for unreachable hosts.
    pub unreachable_pollers: usize,
    /// IPMI pollers.
    pub ipmi_pollers: usize,
    /// ICMP pingers.
    pub pingers: usize,
    /// Java gateway pollers.
    pub java_pollers: usize,
    /// Trigger timer workers.
    pub timers: usize,

    /// Seconds between checks of an unreachable host.
    pub unreachable_delay: i64,
    /// Seconds of continuous errors before a host is unavailable.
    pub unreachable_period: i64,
    /// Seconds between checks of an unavailable host.
    pub unavailable_delay: i64,
    /// Seconds a polled item may stay with a poller before it is considered lost.
    pub timeout: i64,

    /// Stride of the trigger timer queue.
    pub timer_delay: i64,
    /// Seconds between configuration pushes to passive proxies.
    pub proxy_config_frequency: i64,
    /// Seconds between data polls of passive proxies.
    pub proxy_data_frequency: i64,
    /// Seconds aggregate statistics stay valid.
    pub status_ttl: i64,

    /// Items handed to a regular or IPMI poller at once when they cannot be batched.
    pub max_poller_items: usize,
    /// Items handed to an SNMP poller at once.
    pub max_snmp_items: usize,
    /// Items handed to a Java poller at once.
    pub max_java_items: usize,
    /// Items handed to a pinger at once.
    pub max_pinger_items: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: 8 * 1024 * 1024,
            program_type: ProgramType::Server,
            pollers: 5,
            unreachable_pollers: 1,
            ipmi_pollers: 0,
            pingers: 1,
            java_pollers: 0,
            timers: 1,
            unreachable_delay: 15,
            unreachable_period: 45,
            unavailable_delay: 60,
            timeout: 3,
            timer_delay: 60,
            proxy_config_frequency: 3600,
            proxy_data_frequency: 1,
            status_ttl: 60,
            max_poller_items: 1,
            max_snmp_items: 128,
            max_java_items: 32,
            max_pinger_items: 128,
        }
    }
}
