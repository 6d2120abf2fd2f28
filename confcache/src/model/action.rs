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

/// An action.
#[derive(Debug, Default)]
pub struct Action {
    /// Action id.
    pub actionid: u64,
    /// Source of events the action reacts to.
    pub eventsource: u8,
    /// How conditions are combined.
    pub evaltype: u8,
    /// Custom expression over conditions.
    pub formula: Interned,
    /// Conditions, ordered by id.
    pub conditions: Vec<u64>,
}

/// A condition of an action.
#[derive(Debug, Default)]
pub struct ActionCondition {
    /// Condition id.
    pub conditionid: u64,
    /// Owner action.
    pub actionid: u64,
    /// What is compared.
    pub conditiontype: u8,
    /// Comparison operator.
    pub operator: u8,
    /// Compared value.
    pub value: Interned,
    /// Second compared value.
    pub value2: Interned,
}

/// A global correlation rule.
#[derive(Debug, Default)]
pub struct Correlation {
    /// Correlation id.
    pub correlationid: u64,
    /// Name.
    pub name: Interned,
    /// How conditions are combined.
    pub evaltype: u8,
    /// Custom expression over conditions.
    pub formula: Interned,
    /// Conditions, ordered by id.
    pub conditions: Vec<u64>,
    /// Operations, ordered by id.
    pub operations: Vec<u64>,
}

/// Comparison operator used by correlation conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrOperator {
    /// Equal.
    #[default]
    Equal,
    /// Not equal.
    NotEqual,
    /// Contains.
    Like,
    /// Does not contain.
    NotLike,
}

impl CorrOperator {
    /// Convert from the raw database value.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => CorrOperator::NotEqual,
            2 => CorrOperator::Like,
            3 => CorrOperator::NotLike,
            _ => CorrOperator::Equal,
        }
    }
}

/// What a correlation condition checks.
#[derive(Debug)]
pub enum CorrConditionKind {
    /// Old event has a tag.
    OldEventTag {
        /// Tag name.
        tag: Interned,
    },
    /// New event has a tag.
    NewEventTag {
        /// Tag name.
        tag: Interned,
    },
    /// New event belongs to a host group.
    NewEventHostGroup {
        /// Host group.
        groupid: u64,
        /// Operator.
        op: CorrOperator,
    },
    /// Old and new events share a tag value.
    EventTagPair {
        /// Tag of the old event.
        oldtag: Interned,
        /// Tag of the new event.
        newtag: Interned,
    },
    /// Old event tag value matches.
    OldEventTagValue {
        /// Tag name.
        tag: Interned,
        /// Value.
        value: Interned,
        /// Operator.
        op: CorrOperator,
    },
    /// New event tag value matches.
    NewEventTagValue {
        /// Tag name.
        tag: Interned,
        /// Value.
        value: Interned,
        /// Operator.
        op: CorrOperator,
    },
}

impl Default for CorrConditionKind {
    fn default() -> Self {
        CorrConditionKind::NewEventTag { tag: Interned::default() }
    }
}

/// A condition of a correlation rule.
#[derive(Debug, Default)]
pub struct CorrCondition {
    /// Condition id.
    pub corr_conditionid: u64,
    /// Owner correlation.
    pub correlationid: u64,
    /// Condition.
    pub kind: CorrConditionKind,
}

/// What a correlation does on match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrOperationKind {
    /// Close old events.
    #[default]
    CloseOld,
    /// Close the new event.
    CloseNew,
}

/// An operation of a correlation rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrOperation {
    /// Operation id.
    pub corr_operationid: u64,
    /// Owner correlation.
    pub correlationid: u64,
    /// Operation.
    pub kind: CorrOperationKind,
}
