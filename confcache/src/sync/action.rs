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

//! Global regular expressions, actions and correlation rules.
//!
//! Expression columns: `name, expression, expression_type, exp_delimiter, case_sensitive`.
//! Action columns: `eventsource, evaltype, formula`.
//! Action condition columns: `actionid, conditiontype, operator, value, value2`.
//! Correlation columns: `name, evaltype, formula`.
//! Correlation condition columns: `correlationid, type, tag, newtag, value, groupid, operator`.
//! Correlation operation columns: `correlationid, type`.

use confcache_common::error::Result;
use confcache_memory::StringPool;

use super::{drive, Applied, DiffRow, DiffSource, RowTag, SyncCounts};
use crate::{
    model::{
        Action, ActionCondition, CorrCondition, CorrConditionKind, CorrOperation, CorrOperationKind, CorrOperator,
        Correlation, Expression,
    },
    store::{Release, Store},
};

fn insert_sorted(ids: &mut Vec<u64>, id: u64) {
    if let Err(pos) = ids.binary_search(&id) {
        ids.insert(pos, id);
    }
}

fn remove_sorted(ids: &mut Vec<u64>, id: u64) {
    if let Ok(pos) = ids.binary_search(&id) {
        ids.remove(pos);
    }
}

/// Build a correlation condition from its row, `None` for unknown condition types.
fn corr_condition_kind(pool: &mut StringPool, row: &DiffRow) -> Result<Option<CorrConditionKind>> {
    let op = CorrOperator::from_raw(row.u8(6));
    let kind = match row.u8(1) {
        0 => CorrConditionKind::OldEventTag {
            tag: pool.intern(row.str(2))?,
        },
        1 => CorrConditionKind::NewEventTag {
            tag: pool.intern(row.str(2))?,
        },
        2 => CorrConditionKind::NewEventHostGroup {
            groupid: row.u64(5),
            op,
        },
        3 => CorrConditionKind::EventTagPair {
            oldtag: pool.intern(row.str(2))?,
            newtag: pool.intern(row.str(3))?,
        },
        4 => CorrConditionKind::OldEventTagValue {
            tag: pool.intern(row.str(2))?,
            value: pool.intern(row.str(4))?,
            op,
        },
        5 => CorrConditionKind::NewEventTagValue {
            tag: pool.intern(row.str(2))?,
            value: pool.intern(row.str(4))?,
            op,
        },
        _ => return Ok(None),
    };
    Ok(Some(kind))
}

impl Store {
    pub(super) fn sync_expressions(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let expressionid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(e) = self.expressions.remove(expressionid) {
                    self.regexps.remove(&e.regexp.key(), expressionid);
                    e.release(&mut self.pool);
                }
                return Ok(Applied::Done);
            }
            let (token, found) = self.expressions.find_or_create(expressionid, || Expression {
                expressionid,
                ..Default::default()
            })?;
            let Some(e) = self.expressions.at_mut(token) else {
                return Ok(Applied::Skipped);
            };
            let name = row.str(0);
            if !found || self.pool.get(&e.regexp) != name {
                if found {
                    self.regexps.remove(&e.regexp.key(), expressionid);
                }
                self.pool.replace(found, &mut e.regexp, name)?;
                self.regexps.add(e.regexp.key(), expressionid);
            }
            self.pool.replace(found, &mut e.expression, row.str(1))?;
            e.kind = row.u8(2);
            e.delimiter = row.str(3).chars().next().unwrap_or(',');
            e.case_sensitive = row.bool(4);
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_actions(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let actionid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(action) = self.actions.remove(actionid) {
                    for &conditionid in &action.conditions {
                        if let Some(c) = self.action_conditions.remove(conditionid) {
                            c.release(&mut self.pool);
                        }
                    }
                    action.release(&mut self.pool);
                }
                return Ok(Applied::Done);
            }
            let (token, found) = self.actions.find_or_create(actionid, || Action {
                actionid,
                ..Default::default()
            })?;
            if let Some(action) = self.actions.at_mut(token) {
                action.eventsource = row.u8(0);
                action.evaltype = row.u8(1);
                self.pool.replace(found, &mut action.formula, row.str(2))?;
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_action_conditions(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let conditionid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(c) = self.action_conditions.remove(conditionid) {
                    if let Some(action) = self.actions.get_mut(c.actionid) {
                        remove_sorted(&mut action.conditions, conditionid);
                    }
                    c.release(&mut self.pool);
                }
                return Ok(Applied::Done);
            }
            let actionid = row.u64(0);
            let Some(action) = self.actions.get_mut(actionid) else {
                return Ok(Applied::Skipped);
            };
            insert_sorted(&mut action.conditions, conditionid);
            let (token, found) = self.action_conditions.find_or_create(conditionid, || ActionCondition {
                conditionid,
                actionid,
                ..Default::default()
            })?;
            if let Some(c) = self.action_conditions.at_mut(token) {
                c.conditiontype = row.u8(1);
                c.operator = row.u8(2);
                self.pool.replace(found, &mut c.value, row.str(3))?;
                self.pool.replace(found, &mut c.value2, row.str(4))?;
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_correlations(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let correlationid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(corr) = self.correlations.remove(correlationid) {
                    for &id in &corr.conditions {
                        if let Some(c) = self.corr_conditions.remove(id) {
                            c.release(&mut self.pool);
                        }
                    }
                    for &id in &corr.operations {
                        self.corr_operations.remove(id);
                    }
                    corr.release(&mut self.pool);
                }
                return Ok(Applied::Done);
            }
            let (token, found) = self.correlations.find_or_create(correlationid, || Correlation {
                correlationid,
                ..Default::default()
            })?;
            if let Some(corr) = self.correlations.at_mut(token) {
                self.pool.replace(found, &mut corr.name, row.str(0))?;
                corr.evaltype = row.u8(1);
                self.pool.replace(found, &mut corr.formula, row.str(2))?;
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_corr_conditions(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let corr_conditionid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(c) = self.corr_conditions.remove(corr_conditionid) {
                    if let Some(corr) = self.correlations.get_mut(c.correlationid) {
                        remove_sorted(&mut corr.conditions, corr_conditionid);
                    }
                    c.release(&mut self.pool);
                }
                return Ok(Applied::Done);
            }
            let correlationid = row.u64(0);
            if !self.correlations.contains(correlationid) {
                return Ok(Applied::Skipped);
            }
            let Some(kind) = corr_condition_kind(&mut self.pool, &row)? else {
                tracing::warn!(corr_conditionid, kind = row.str(1), "[sync]: unknown correlation condition type");
                return Ok(Applied::Skipped);
            };

            let (token, _) = self.corr_conditions.find_or_create(corr_conditionid, || CorrCondition {
                corr_conditionid,
                correlationid,
                ..Default::default()
            })?;
            if let Some(c) = self.corr_conditions.at_mut(token) {
                c.correlationid = correlationid;
                std::mem::replace(&mut c.kind, kind).release(&mut self.pool);
            }
            if let Some(corr) = self.correlations.get_mut(correlationid) {
                insert_sorted(&mut corr.conditions, corr_conditionid);
            }
            Ok(Applied::Done)
        })
    }

    pub(super) fn sync_corr_operations(&mut self, source: &mut dyn DiffSource, counts: &mut SyncCounts) -> Result<()> {
        drive(source, counts, |row| {
            let corr_operationid = row.rowid;
            if row.tag == RowTag::Remove {
                if let Some(op) = self.corr_operations.remove(corr_operationid) {
                    if let Some(corr) = self.correlations.get_mut(op.correlationid) {
                        remove_sorted(&mut corr.operations, corr_operationid);
                    }
                }
                return Ok(Applied::Done);
            }
            let correlationid = row.u64(0);
            let Some(corr) = self.correlations.get_mut(correlationid) else {
                return Ok(Applied::Skipped);
            };
            let kind = match row.u8(1) {
                0 => CorrOperationKind::CloseOld,
                1 => CorrOperationKind::CloseNew,
                other => {
                    tracing::warn!(corr_operationid, kind = other, "[sync]: unknown correlation operation type");
                    return Ok(Applied::Skipped);
                }
            };
            insert_sorted(&mut corr.operations, corr_operationid);
            let operation = CorrOperation {
                corr_operationid,
                correlationid,
                kind,
            };
            let (token, _) = self.corr_operations.find_or_create(corr_operationid, || operation)?;
            if let Some(op) = self.corr_operations.at_mut(token) {
                *op = operation;
            }
            Ok(Applied::Done)
        })
    }
}
