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

use std::str::FromStr;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Transition a diff row asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowTag {
    /// The row is new.
    Add,
    /// The row changed.
    Update,
    /// The row is gone.
    Remove,
}

/// One row of a diff feed.
///
/// Columns are kept as database text, `None` for SQL `NULL`. Typed accessors fall back to the zero value of the
/// type for `NULL`, missing or unparsable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    /// Primary key of the row.
    pub rowid: u64,
    /// Transition.
    pub tag: RowTag,
    /// Column values, without the primary key.
    pub columns: Vec<Option<String>>,
}

impl DiffRow {
    /// Create a row.
    pub fn new<I, S>(tag: RowTag, rowid: u64, columns: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            rowid,
            tag,
            columns: columns.into_iter().map(|c| c.map(Into::into)).collect(),
        }
    }

    /// Create an `Add` row with every column set.
    pub fn add<'a>(rowid: u64, columns: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(RowTag::Add, rowid, columns.into_iter().map(Some))
    }

    /// Create an `Update` row with every column set.
    pub fn update<'a>(rowid: u64, columns: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(RowTag::Update, rowid, columns.into_iter().map(Some))
    }

    /// Create a `Remove` row.
    pub fn remove(rowid: u64) -> Self {
        Self {
            rowid,
            tag: RowTag::Remove,
            columns: vec![],
        }
    }

    /// Returns `true` if the column is `NULL` or missing.
    pub fn is_null(&self, idx: usize) -> bool {
        !matches!(self.columns.get(idx), Some(Some(_)))
    }

    /// Text of a column, empty for `NULL`.
    pub fn str(&self, idx: usize) -> &str {
        match self.columns.get(idx) {
            Some(Some(s)) => s,
            _ => "",
        }
    }

    /// Text of a column, `None` for `NULL`.
    pub fn opt_str(&self, idx: usize) -> Option<&str> {
        self.columns.get(idx).and_then(Option::as_deref)
    }

    fn parse<T>(&self, idx: usize) -> T
    where
        T: FromStr + Default,
    {
        self.str(idx).trim().parse().unwrap_or_default()
    }

    /// Column as an id or unsigned counter.
    pub fn u64(&self, idx: usize) -> u64 {
        self.parse(idx)
    }

    /// Column as a 32 bit unsigned value.
    pub fn u32(&self, idx: usize) -> u32 {
        self.parse(idx)
    }

    /// Column as a timestamp or signed value.
    pub fn i64(&self, idx: usize) -> i64 {
        self.parse(idx)
    }

    /// Column as a 32 bit signed value.
    pub fn i32(&self, idx: usize) -> i32 {
        self.parse(idx)
    }

    /// Column as a small enumeration value.
    pub fn u8(&self, idx: usize) -> u8 {
        self.parse(idx)
    }

    /// Column as a small signed enumeration value.
    pub fn i8(&self, idx: usize) -> i8 {
        self.parse(idx)
    }

    /// Column as a flag, any non-zero integer is `true`.
    pub fn bool(&self, idx: usize) -> bool {
        self.i64(idx) != 0
    }
}

/// An ordered stream of diff rows of one entity type.
///
/// Implementations must yield every `Remove` row after all `Add` and `Update` rows.
pub trait DiffSource {
    /// The next row, `None` when the stream is exhausted.
    fn next_row(&mut self) -> Option<DiffRow>;
}

/// In-memory diff source.
#[derive(Debug, Default, Clone)]
pub struct VecDiff {
    rows: std::vec::IntoIter<DiffRow>,
}

impl VecDiff {
    /// Create a source from rows in any order.
    ///
    /// Rows are stably reordered so that removals come last.
    pub fn new(mut rows: Vec<DiffRow>) -> Self {
        rows.sort_by_key(|row| row.tag == RowTag::Remove);
        Self { rows: rows.into_iter() }
    }
}

impl From<Vec<DiffRow>> for VecDiff {
    fn from(rows: Vec<DiffRow>) -> Self {
        Self::new(rows)
    }
}

impl DiffSource for VecDiff {
    fn next_row(&mut self) -> Option<DiffRow> {
        self.rows.next()
    }
}

macro_rules! entity_kinds {
    ($( $(#[$meta:meta])* $name:ident ),+ $(,)?) => {
        /// Entity types carried by a diff feed.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum EntityKind {
            $( $(#[$meta])* $name ),+
        }

        impl EntityKind {
            /// Every entity type in synchronization order.
            pub const ORDER: &'static [EntityKind] = &[$( EntityKind::$name ),+];
        }
    };
}

entity_kinds! {
    /// Global settings, a single row.
    Config,
    /// Autoregistration pre-shared key, a single row.
    AutoregPsk,
    /// Host to template links.
    HostTemplates,
    /// Global user macros.
    GlobalMacros,
    /// Host and template user macros.
    HostMacros,
    /// Host tags.
    HostTags,
    /// Hosts, templates and proxies.
    Hosts,
    /// Host inventories.
    HostInventory,
    /// Host groups.
    HostGroups,
    /// Host group membership.
    HostGroupHosts,
    /// Maintenances.
    Maintenances,
    /// Maintenance problem tag filters.
    MaintenanceTags,
    /// Maintenance periods.
    MaintenancePeriods,
    /// Host groups in maintenance.
    MaintenanceGroups,
    /// Hosts in maintenance.
    MaintenanceHosts,
    /// Host interfaces.
    Interfaces,
    /// Items of monitored hosts.
    Items,
    /// Template items.
    TemplateItems,
    /// Item prototypes.
    PrototypeItems,
    /// Item preprocessing steps.
    ItemPreproc,
    /// Trigger functions.
    Functions,
    /// Triggers.
    Triggers,
    /// Trigger dependencies.
    TriggerDeps,
    /// Global regular expressions.
    Expressions,
    /// Actions.
    Actions,
    /// Action conditions.
    ActionConditions,
    /// Trigger tags.
    TriggerTags,
    /// Correlation rules.
    Correlations,
    /// Correlation conditions.
    CorrConditions,
    /// Correlation operations.
    CorrOperations,
}

/// One diff source per entity type, consumed by a full synchronization.
///
/// Entity types without a source are left unchanged.
#[derive(Default)]
pub struct DiffFeed {
    sources: HashMap<EntityKind, Box<dyn DiffSource + Send>>,
}

impl std::fmt::Debug for DiffFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds = self.sources.keys().collect::<Vec<_>>();
        kinds.sort();
        f.debug_struct("DiffFeed").field("sources", &kinds).finish()
    }
}

impl DiffFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source of an entity type.
    pub fn with<S>(mut self, kind: EntityKind, source: S) -> Self
    where
        S: DiffSource + Send + 'static,
    {
        self.insert(kind, source);
        self
    }

    /// Set the source of an entity type, replacing the previous one.
    pub fn insert<S>(&mut self, kind: EntityKind, source: S)
    where
        S: DiffSource + Send + 'static,
    {
        self.sources.insert(kind, Box::new(source));
    }

    /// Take the source of an entity type out of the feed.
    pub fn take(&mut self, kind: EntityKind) -> Option<Box<dyn DiffSource + Send>> {
        self.sources.remove(&kind)
    }

    /// Returns `true` if no source is left.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Rows applied for one entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    /// `Add` rows.
    pub add: usize,
    /// `Update` rows.
    pub update: usize,
    /// `Remove` rows.
    pub remove: usize,
    /// Rows skipped because they referenced unknown records.
    pub skipped: usize,
}

impl SyncCounts {
    pub(crate) fn record(&mut self, tag: RowTag) {
        match tag {
            RowTag::Add => self.add += 1,
            RowTag::Update => self.update += 1,
            RowTag::Remove => self.remove += 1,
        }
    }

    /// Rows applied in total.
    pub fn total(&self) -> usize {
        self.add + self.update + self.remove
    }
}

/// Outcome of a synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Rows applied per entity type, in synchronization order.
    pub counts: Vec<(EntityKind, SyncCounts)>,
}

impl SyncReport {
    /// Rows applied for an entity type.
    pub fn get(&self, kind: EntityKind) -> SyncCounts {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, c)| *c)
            .unwrap_or_default()
    }

    /// Sum over every entity type.
    pub fn total(&self) -> SyncCounts {
        self.counts.iter().fold(SyncCounts::default(), |acc, (_, c)| SyncCounts {
            add: acc.add + c.add,
            update: acc.update + c.update,
            remove: acc.remove + c.remove,
            skipped: acc.skipped + c.skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_diff_moves_removals_last() {
        let mut diff = VecDiff::new(vec![
            DiffRow::remove(1),
            DiffRow::add(2, ["a"]),
            DiffRow::remove(3),
            DiffRow::update(4, ["b"]),
        ]);
        let order = std::iter::from_fn(|| diff.next_row())
            .map(|row| (row.rowid, row.tag))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                (2, RowTag::Add),
                (4, RowTag::Update),
                (1, RowTag::Remove),
                (3, RowTag::Remove)
            ]
        );
    }

    #[test]
    fn test_row_accessors() {
        let row = DiffRow::new(RowTag::Add, 7, [Some("42"), None, Some("-3"), Some("x")]);
        assert_eq!(row.u64(0), 42);
        assert_eq!(row.u64(1), 0);
        assert!(row.is_null(1));
        assert_eq!(row.opt_str(1), None);
        assert_eq!(row.i32(2), -3);
        assert_eq!(row.u8(3), 0);
        assert_eq!(row.str(3), "x");
        assert_eq!(row.str(10), "");
        assert!(row.bool(0));
    }

    #[test]
    fn test_entity_order() {
        let order = EntityKind::ORDER;
        let pos = |kind| order.iter().position(|&k| k == kind).unwrap();
        assert!(pos(EntityKind::Config) < pos(EntityKind::Hosts));
        assert!(pos(EntityKind::Hosts) < pos(EntityKind::Interfaces));
        assert!(pos(EntityKind::Interfaces) < pos(EntityKind::Items));
        assert!(pos(EntityKind::Items) < pos(EntityKind::Functions));
        assert!(pos(EntityKind::Functions) < pos(EntityKind::Triggers));
        assert!(pos(EntityKind::Triggers) < pos(EntityKind::TriggerDeps));
        assert!(pos(EntityKind::ActionConditions) < pos(EntityKind::TriggerTags));
    }
}
