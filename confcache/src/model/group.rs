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

use super::raw_enum;

/// A host group.
#[derive(Debug, Default)]
pub struct HostGroup {
    /// Group id.
    pub groupid: u64,
    /// Name, `/` separates nesting levels.
    pub name: Interned,
    /// Member hosts, sorted.
    pub hostids: Vec<u64>,
    /// This group and every group nested below it, computed on first use.
    pub(crate) nested: Option<Vec<u64>>,
}

/// A tag of a host.
#[derive(Debug, Default)]
pub struct HostTag {
    /// Tag id.
    pub hosttagid: u64,
    /// Owner host.
    pub hostid: u64,
    /// Tag name.
    pub tag: Interned,
    /// Tag value.
    pub value: Interned,
}

raw_enum! {
    /// Data collection mode during a maintenance.
    pub enum MaintenanceType: u8 {
        /// Data is collected.
        Normal = 0,
        /// No data is collected.
        NoData = 1,
    }
}

impl Default for MaintenanceType {
    fn default() -> Self {
        MaintenanceType::Normal
    }
}

/// Recurrence of a maintenance period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodKind {
    /// Once, starting at `start_date`.
    OneTime {
        /// Start timestamp.
        start_date: i64,
    },
    /// Every `every` days.
    Daily {
        /// Stride in days.
        every: u32,
    },
    /// Every `every` weeks on the selected weekdays.
    Weekly {
        /// Stride in weeks.
        every: u32,
        /// Weekday bitmask, bit 0 is Monday.
        dayofweek: u8,
    },
    /// Monthly on the selected months.
    Monthly {
        /// Month bitmask, bit 0 is January.
        month: u16,
        /// Day of month; `0` selects `every` and `dayofweek` instead.
        day: u32,
        /// Week of month, `1..=4`, `5` is the last week.
        every: u32,
        /// Weekday bitmask, bit 0 is Monday.
        dayofweek: u8,
    },
}

impl Default for PeriodKind {
    fn default() -> Self {
        PeriodKind::OneTime { start_date: 0 }
    }
}

/// One active window definition of a maintenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenancePeriod {
    /// Period id.
    pub timeperiodid: u64,
    /// Owner maintenance.
    pub maintenanceid: u64,
    /// Recurrence.
    pub kind: PeriodKind,
    /// Second of day the window opens at, for recurring periods.
    pub start_time: i64,
    /// Length of the window in seconds.
    pub period: i64,
}

/// A problem tag filter of a maintenance.
#[derive(Debug, Default)]
pub struct MaintenanceTag {
    /// Tag filter id.
    pub maintenancetagid: u64,
    /// Owner maintenance.
    pub maintenanceid: u64,
    /// Operator: `0` equals, `2` contains.
    pub operator: u8,
    /// Tag name.
    pub tag: Interned,
    /// Tag value.
    pub value: Interned,
}

/// A maintenance.
#[derive(Debug, Default)]
pub struct Maintenance {
    /// Maintenance id.
    pub maintenanceid: u64,
    /// Data collection mode.
    pub kind: MaintenanceType,
    /// How tag filters are combined.
    pub tags_evaltype: u8,
    /// The maintenance is effective from this moment.
    pub active_since: i64,
    /// The maintenance is effective until this moment.
    pub active_until: i64,
    /// Host groups in maintenance.
    pub groupids: Vec<u64>,
    /// Hosts in maintenance.
    pub hostids: Vec<u64>,
    /// Problem tag filters.
    pub tags: Vec<u64>,
    /// Active windows.
    pub periods: Vec<u64>,
    /// Start of the running window, `0` if idle.
    pub running_since: i64,
    /// End of the running window.
    pub running_until: i64,
}
