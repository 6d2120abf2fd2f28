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

//! Application of diff feeds to the store.
//!
//! Every entity type is consumed in one pass over its [`DiffSource`], in [`EntityKind::ORDER`]. Column layouts are
//! documented next to the code applying them; the row id is never part of the columns.

mod action;
mod config;
mod derived;
mod diff;
mod group;
mod host;
mod interface;
mod item;
mod macros;
mod trigger;

use confcache_common::error::Result;

pub use self::diff::{DiffFeed, DiffRow, DiffSource, EntityKind, RowTag, SyncCounts, SyncReport, VecDiff};
use crate::store::Store;

/// Outcome of applying one row.
pub(crate) enum Applied {
    /// The row was applied.
    Done,
    /// The row referenced unknown records or carried unusable values.
    Skipped,
}

/// Feed every row of `source` to `apply`, counting the outcome.
pub(crate) fn drive<F>(source: &mut dyn DiffSource, counts: &mut SyncCounts, mut apply: F) -> Result<()>
where
    F: FnMut(DiffRow) -> Result<Applied>,
{
    while let Some(row) = source.next_row() {
        let tag = row.tag;
        match apply(row)? {
            Applied::Done => counts.record(tag),
            Applied::Skipped => counts.skipped += 1,
        }
    }
    Ok(())
}

impl Store {
    /// Apply the rows of one entity type.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "confcache::sync::apply"))]
    pub(crate) fn apply_diff(&mut self, kind: EntityKind, source: &mut dyn DiffSource, now: i64) -> Result<SyncCounts> {
        let mut counts = SyncCounts::default();
        let c = &mut counts;
        match kind {
            EntityKind::Config => self.sync_config(source, c)?,
            EntityKind::AutoregPsk => self.sync_autoreg_psk(source, c)?,
            EntityKind::HostTemplates => self.sync_host_templates(source, c)?,
            EntityKind::GlobalMacros => self.sync_global_macros(source, c)?,
            EntityKind::HostMacros => self.sync_host_macros(source, c)?,
            EntityKind::HostTags => self.sync_host_tags(source, c)?,
            EntityKind::Hosts => self.sync_hosts(source, c, now)?,
            EntityKind::HostInventory => self.sync_host_inventory(source, c)?,
            EntityKind::HostGroups => self.sync_host_groups(source, c)?,
            EntityKind::HostGroupHosts => self.sync_host_group_hosts(source, c)?,
            EntityKind::Maintenances => self.sync_maintenances(source, c)?,
            EntityKind::MaintenanceTags => self.sync_maintenance_tags(source, c)?,
            EntityKind::MaintenancePeriods => self.sync_maintenance_periods(source, c)?,
            EntityKind::MaintenanceGroups => self.sync_maintenance_groups(source, c)?,
            EntityKind::MaintenanceHosts => self.sync_maintenance_hosts(source, c)?,
            EntityKind::Interfaces => self.sync_interfaces(source, c)?,
            EntityKind::Items => self.sync_items(source, c, now)?,
            EntityKind::TemplateItems => self.sync_template_items(source, c)?,
            EntityKind::PrototypeItems => self.sync_prototype_items(source, c)?,
            EntityKind::ItemPreproc => self.sync_item_preproc(source, c)?,
            EntityKind::Functions => self.sync_functions(source, c)?,
            EntityKind::Triggers => self.sync_triggers(source, c)?,
            EntityKind::TriggerDeps => self.sync_trigger_deps(source, c)?,
            EntityKind::Expressions => self.sync_expressions(source, c)?,
            EntityKind::Actions => self.sync_actions(source, c)?,
            EntityKind::ActionConditions => self.sync_action_conditions(source, c)?,
            EntityKind::TriggerTags => self.sync_trigger_tags(source, c)?,
            EntityKind::Correlations => self.sync_correlations(source, c)?,
            EntityKind::CorrConditions => self.sync_corr_conditions(source, c)?,
            EntityKind::CorrOperations => self.sync_corr_operations(source, c)?,
        }
        tracing::debug!(
            ?kind,
            add = counts.add,
            update = counts.update,
            remove = counts.remove,
            skipped = counts.skipped,
            "[sync]: entity type applied"
        );
        Ok(counts)
    }
}
