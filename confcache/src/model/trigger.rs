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

use super::{TriggerState, TriggerStatus, TriggerValue};

/// A trigger.
#[derive(Debug)]
pub struct Trigger {
    /// Trigger id.
    pub triggerid: u64,
    /// Name.
    pub description: Interned,
    /// Problem expression.
    pub expression: Interned,
    /// Recovery expression.
    pub recovery_expression: Interned,
    /// Tag used to correlate problem and recovery events.
    pub correlation_tag: Interned,
    /// Severity, `0..=5`.
    pub priority: u8,
    /// Generate multiple problem events.
    pub kind: u8,
    /// How the trigger recovers.
    pub recovery_mode: u8,
    /// How events are correlated.
    pub correlation_mode: u8,
    /// Configured status.
    pub status: TriggerStatus,

    /// Current value.
    pub value: TriggerValue,
    /// Evaluation state.
    pub state: TriggerState,
    /// Last evaluation error.
    pub error: String,
    /// When the value last changed.
    pub lastchange: i64,
    /// Held by a history syncer.
    pub locked: bool,

    /// All items are enabled and belong to monitored hosts.
    pub functional: bool,
    /// Uses time based functions.
    pub timer: bool,
    /// Position in dependency order, `1` for triggers without dependencies.
    pub topoindex: u32,
    /// Items referenced by the trigger functions.
    pub itemids: Vec<u64>,
    /// Functions of the trigger.
    pub functionids: Vec<u64>,
    /// Tags of the trigger.
    pub tags: Vec<u64>,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            triggerid: 0,
            description: Interned::default(),
            expression: Interned::default(),
            recovery_expression: Interned::default(),
            correlation_tag: Interned::default(),
            priority: 0,
            kind: 0,
            recovery_mode: 0,
            correlation_mode: 0,
            status: TriggerStatus::Enabled,
            value: TriggerValue::Ok,
            state: TriggerState::Normal,
            error: String::new(),
            lastchange: 0,
            locked: false,
            functional: false,
            timer: false,
            topoindex: 1,
            itemids: vec![],
            functionids: vec![],
            tags: vec![],
        }
    }
}

impl Trigger {
    /// Returns `true` if the trigger takes part in evaluation.
    pub fn is_evaluated(&self) -> bool {
        self.status == TriggerStatus::Enabled && self.functional
    }
}

/// Function names evaluated on a timer instead of on new values.
pub const TIMER_FUNCTIONS: [&str; 6] = ["nodata", "date", "dayofmonth", "dayofweek", "now", "time"];

/// A function call inside a trigger expression.
#[derive(Debug, Default)]
pub struct Function {
    /// Function id.
    pub functionid: u64,
    /// Item the function is evaluated on.
    pub itemid: u64,
    /// Trigger the function belongs to.
    pub triggerid: u64,
    /// Function name.
    pub function: Interned,
    /// Function parameters.
    pub parameter: Interned,
    /// Evaluated on a timer.
    pub timer: bool,
}

/// A tag of a trigger.
#[derive(Debug, Default)]
pub struct TriggerTag {
    /// Tag id.
    pub triggertagid: u64,
    /// Owner trigger.
    pub triggerid: u64,
    /// Tag name.
    pub tag: Interned,
    /// Tag value.
    pub value: Interned,
}

/// Node of the trigger dependency graph.
///
/// A node exists while the trigger has dependencies or another node depends on it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DepNode {
    /// Owner trigger.
    pub triggerid: u64,
    /// One reference for the node's own dependency list plus one per dependent node.
    pub refcount: u32,
    /// Triggers this trigger depends on.
    pub masters: Vec<u64>,
}
