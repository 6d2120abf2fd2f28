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

use itertools::Itertools;

use super::{ActionEval, ConditionSnapshot, CorrConditionSnapshot, CorrelationRule, ExpressionSnapshot};
use crate::{model::GlobalConfig, store::Store};

impl Store {
    /// Expressions of the named global regular expressions, grouped by name in the requested order.
    pub fn get_expressions_by_names(&self, names: &[&str]) -> Vec<ExpressionSnapshot> {
        names
            .iter()
            .filter_map(|name| self.pool.lookup(name))
            .flat_map(|key| self.regexps.get(&key).iter().copied())
            .filter_map(|id| self.expressions.get(id))
            .map(|e| ExpressionSnapshot {
                name: self.pool.get(&e.regexp).to_string(),
                expression: self.pool.get(&e.expression).to_string(),
                kind: e.kind,
                delimiter: e.delimiter,
                case_sensitive: e.case_sensitive,
            })
            .collect()
    }

    /// Expressions of one global regular expression.
    pub fn get_expressions_by_name(&self, name: &str) -> Vec<ExpressionSnapshot> {
        self.get_expressions_by_names(&[name])
    }

    /// Actions of an event source with their conditions, conditions ordered by type.
    pub fn get_actions_eval(&self, eventsource: u8) -> Vec<ActionEval> {
        self.actions
            .values()
            .filter(|action| action.eventsource == eventsource)
            .sorted_unstable_by_key(|action| action.actionid)
            .map(|action| ActionEval {
                actionid: action.actionid,
                eventsource: action.eventsource,
                evaltype: action.evaltype,
                formula: self.pool.get(&action.formula).to_string(),
                conditions: action
                    .conditions
                    .iter()
                    .filter_map(|&id| self.action_conditions.get(id))
                    .sorted_by_key(|c| c.conditiontype)
                    .map(|c| ConditionSnapshot {
                        conditionid: c.conditionid,
                        actionid: c.actionid,
                        conditiontype: c.conditiontype,
                        operator: c.operator,
                        value: self.pool.get(&c.value).to_string(),
                        value2: self.pool.get(&c.value2).to_string(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Every correlation rule, ordered by id.
    pub fn correlation_rules(&self) -> Vec<CorrelationRule> {
        self.correlations
            .values()
            .sorted_unstable_by_key(|corr| corr.correlationid)
            .map(|corr| CorrelationRule {
                correlationid: corr.correlationid,
                name: self.pool.get(&corr.name).to_string(),
                evaltype: corr.evaltype,
                formula: self.pool.get(&corr.formula).to_string(),
                conditions: corr
                    .conditions
                    .iter()
                    .filter_map(|&id| self.corr_conditions.get(id))
                    .map(|c| (c.corr_conditionid, CorrConditionSnapshot::new(&self.pool, &c.kind)))
                    .collect(),
                operations: corr
                    .operations
                    .iter()
                    .filter_map(|&id| self.corr_operations.get(id))
                    .map(|op| op.kind)
                    .collect(),
            })
            .collect()
    }

    /// Global configuration.
    pub fn get_global_config(&self) -> GlobalConfig {
        self.global.clone()
    }

    /// Identity and value of the autoregistration PSK, if one is configured.
    pub fn get_autoreg_psk(&self) -> Option<(String, String)> {
        let identity = self.pool.get(&self.autoreg_psk.identity);
        match identity.is_empty() {
            true => None,
            false => Some((identity.to_string(), self.pool.get(&self.autoreg_psk.value).to_string())),
        }
    }

    /// PSK value of an identity used by hosts or by autoregistration.
    pub fn get_psk_by_identity(&self, identity: &str) -> Option<String> {
        if identity.is_empty() {
            return None;
        }
        if let Some(psk) = self.pool.lookup(identity).and_then(|key| self.psks.get(&key)) {
            return Some(self.pool.get(&psk.value).to_string());
        }
        self.get_autoreg_psk()
            .and_then(|(autoreg_identity, value)| (autoreg_identity == identity).then_some(value))
    }
}
