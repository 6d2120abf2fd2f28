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

//! Single row tables.
//!
//! Config columns: `refresh_unsupported, discovery_groupid, snmptrap_logging, severity_name_0..=5,
//! default_inventory_mode, autoreg_tls_accept` followed by housekeeping pairs `(mode, period)` for events, audit,
//! services and sessions, then `history_mode, history_global, history, trends_mode, trends_global, trends`.
//!
//! Autoregistration PSK columns: `identity, value`.

use confcache_common::{error::Result, interval::parse_time_suffix};

use super::{drive, Applied, DiffRow, DiffSource, RowTag, SyncCounts};
use crate::{
    model::{GlobalConfig, Housekeeping, Retention},
    store::{index_anomaly, Store},
};

const REFRESH_UNSUPPORTED: usize = 0;
const DISCOVERY_GROUPID: usize = 1;
const SNMPTRAP_LOGGING: usize = 2;
const SEVERITY_NAME: usize = 3;
const DEFAULT_INVENTORY_MODE: usize = 9;
const AUTOREG_TLS_ACCEPT: usize = 10;
const HK_EVENTS: usize = 11;
const HK_AUDIT: usize = 13;
const HK_SERVICES: usize = 15;
const HK_SESSIONS: usize = 17;
const HK_HISTORY: usize = 19;
const HK_TRENDS: usize = 22;

/// Housekeeping periods shorter than this are rejected.
const HK_MIN_PERIOD: i64 = 60 * 60;
/// Housekeeping periods longer than this are rejected.
const HK_MAX_PERIOD: i64 = 25 * 365 * 24 * 60 * 60;

fn retention(row: &DiffRow, mode: usize, period: usize, class: &'static str) -> Retention {
    let enabled = row.bool(mode);
    match parse_time_suffix(row.str(period)) {
        Ok(p) if (HK_MIN_PERIOD..=HK_MAX_PERIOD).contains(&p) || (!enabled && p == 0) => Retention { enabled, period: p },
        _ if !enabled => Retention::default(),
        _ => {
            tracing::warn!(
                class,
                period = row.str(period),
                "[sync]: invalid housekeeping period, housekeeping disabled for the data class"
            );
            Retention::default()
        }
    }
}

/// Trend and history periods may be `0` when the global override is in use.
fn storage_retention(row: &DiffRow, base: usize, class: &'static str) -> (Retention, bool) {
    let global = row.bool(base + 1);
    let mode = row.bool(base);
    let r = match parse_time_suffix(row.str(base + 2)) {
        Ok(0) if global => Retention { enabled: mode, period: 0 },
        Ok(p) if !global || (HK_MIN_PERIOD..=HK_MAX_PERIOD).contains(&p) => Retention { enabled: mode, period: p },
        _ => {
            tracing::warn!(
                class,
                period = row.str(base + 2),
                "[sync]: invalid housekeeping period, housekeeping disabled for the data class"
            );
            Retention::default()
        }
    };
    (r, global && r.enabled)
}

fn parse_global_config(row: &DiffRow) -> GlobalConfig {
    let defaults = GlobalConfig::default();

    let refresh_unsupported = match parse_time_suffix(row.str(REFRESH_UNSUPPORTED)) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(
                value = row.str(REFRESH_UNSUPPORTED),
                "[sync]: invalid unsupported item refresh interval: {e}, using {}",
                defaults.refresh_unsupported
            );
            defaults.refresh_unsupported
        }
    };

    let mut severity_name = defaults.severity_name;
    for (i, name) in severity_name.iter_mut().enumerate() {
        if let Some(s) = row.opt_str(SEVERITY_NAME + i) {
            *name = s.to_string();
        }
    }

    let (history, history_global) = storage_retention(row, HK_HISTORY, "history");
    let (trends, trends_global) = storage_retention(row, HK_TRENDS, "trends");

    GlobalConfig {
        refresh_unsupported,
        discovery_groupid: row.u64(DISCOVERY_GROUPID),
        snmptrap_logging: row.bool(SNMPTRAP_LOGGING),
        severity_name,
        default_inventory_mode: row.i8(DEFAULT_INVENTORY_MODE),
        autoreg_tls_accept: row.u8(AUTOREG_TLS_ACCEPT),
        hk: Housekeeping {
            events: retention(row, HK_EVENTS, HK_EVENTS + 1, "events"),
            audit: retention(row, HK_AUDIT, HK_AUDIT + 1, "audit"),
            services: retention(row, HK_SERVICES, HK_SERVICES + 1, "services"),
            sessions: retention(row, HK_SESSIONS, HK_SESSIONS + 1, "sessions"),
            history,
            history_global,
            trends,
            trends_global,
        },
    }
}

impl Store {
    pub(super) fn sync_config(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        let mut seen = 0usize;
        drive(source, counts, |row| {
            if row.tag == RowTag::Remove {
                return Ok(Applied::Skipped);
            }
            seen += 1;
            if seen > 1 {
                index_anomaly("config", row.rowid);
                return Ok(Applied::Skipped);
            }
            let global = parse_global_config(&row);
            if global.refresh_unsupported != self.global.refresh_unsupported {
                // Unsupported items are rescheduled with the new interval.
                self.requeue_hosts.extend(self.hosts.ids());
            }
            self.global = global;
            self.global_synced = true;
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_autoreg_psk(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let (identity, value) = match row.tag {
                RowTag::Remove => ("", ""),
                _ => (row.str(0), row.str(1)),
            };
            let psk = &mut self.autoreg_psk;
            self.pool.replace(true, &mut psk.identity, identity)?;
            self.pool.replace(true, &mut psk.value, value)?;
            Ok(Applied::Done)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_row(history: &str, hk_events: &str) -> DiffRow {
        let mut columns = vec!["10m", "5", "1", "N", "I", "W", "A", "H", "D", "0", "1"];
        columns.extend(["1", hk_events, "1", "365d", "1", "365d", "1", "365d"]);
        columns.extend(["1", "1", history, "1", "0", "365d"]);
        DiffRow::add(1, columns)
    }

    #[test]
    fn test_parse_global_config() {
        let global = parse_global_config(&config_row("90d", "365d"));
        assert_eq!(global.refresh_unsupported, 600);
        assert_eq!(global.discovery_groupid, 5);
        assert_eq!(global.severity_name[5], "D");
        assert!(global.hk.events.enabled);
        assert_eq!(global.hk.history.period, 90 * 86400);
        assert!(global.hk.history_global);
        assert!(!global.hk.trends_global);
    }

    #[test_log::test]
    fn test_invalid_housekeeping_disables_class() {
        let global = parse_global_config(&config_row("1s", "nonsense"));
        assert!(!global.hk.events.enabled);
        assert!(!global.hk.history.enabled);
        assert!(!global.hk.history_global);
        assert!(global.hk.audit.enabled);
    }
}
