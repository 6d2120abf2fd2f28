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

//! Trigger dependency graph.
//!
//! A trigger depending on other triggers owns a node listing its masters. Nodes are shared: a node also exists
//! while other nodes list it as a master, and is dropped once nothing references it.

use hashbrown::HashMap;

use crate::{
    model::{DepNode, TriggerValue},
    store::Store,
};

/// Maximum depth of dependency walks.
pub const MAX_DEPENDENCY_DEPTH: usize = 32;

/// Outcome of a dependency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyCheck {
    /// No master prevents the trigger from changing its value.
    Pass,
    /// A master outside the batch is in problem state.
    Blocked,
    /// Masters being processed in the same batch must be evaluated first.
    Unresolved(Vec<u64>),
}

impl Store {
    fn dep_node(&mut self, triggerid: u64) -> &mut DepNode {
        self.deplists.entry(triggerid).or_insert_with(|| DepNode {
            triggerid,
            ..Default::default()
        })
    }

    fn dep_release(&mut self, triggerid: u64) {
        if let Some(node) = self.deplists.get_mut(&triggerid) {
            node.refcount = node.refcount.saturating_sub(1);
            if node.refcount == 0 {
                self.deplists.remove(&triggerid);
            }
        }
    }

    /// Add the edge `down` depends on `up`.
    pub(crate) fn dep_link(&mut self, down: u64, up: u64) {
        let node = self.dep_node(down);
        if node.masters.contains(&up) {
            return;
        }
        if node.masters.is_empty() {
            node.refcount += 1;
        }
        node.masters.push(up);
        self.dep_node(up).refcount += 1;
    }

    /// Remove the edge `down` depends on `up`.
    pub(crate) fn dep_unlink(&mut self, down: u64, up: u64) {
        let Some(node) = self.deplists.get_mut(&down) else {
            return;
        };
        let Some(pos) = node.masters.iter().position(|&id| id == up) else {
            return;
        };
        node.masters.remove(pos);
        let own_list_gone = node.masters.is_empty();
        self.dep_release(up);
        if own_list_gone {
            self.dep_release(down);
        }
    }

    /// Masters of a trigger.
    pub(crate) fn dep_masters(&self, triggerid: u64) -> &[u64] {
        self.deplists
            .get(&triggerid)
            .map(|node| node.masters.as_slice())
            .unwrap_or_default()
    }

    /// Check whether the masters of `triggerid` let it change its value.
    ///
    /// `batch` lists triggers evaluated together with `triggerid`, sorted.
    pub(crate) fn check_dependencies(&self, triggerid: u64, batch: &[u64]) -> DependencyCheck {
        let mut unresolved = vec![];
        if !self.check_dependencies_rec(triggerid, 0, batch, &mut unresolved) {
            return DependencyCheck::Blocked;
        }
        match unresolved.is_empty() {
            true => DependencyCheck::Pass,
            false => {
                unresolved.sort_unstable();
                unresolved.dedup();
                DependencyCheck::Unresolved(unresolved)
            }
        }
    }

    fn check_dependencies_rec(&self, triggerid: u64, level: usize, batch: &[u64], unresolved: &mut Vec<u64>) -> bool {
        if level >= MAX_DEPENDENCY_DEPTH {
            tracing::error!(triggerid, "[deps]: recursive trigger dependency is too deep");
            return true;
        }
        for &master in self.dep_masters(triggerid) {
            if let Some(trigger) = self.triggers.get(master) {
                if trigger.is_evaluated() {
                    if batch.binary_search(&master).is_ok() {
                        unresolved.push(master);
                    } else if trigger.value == TriggerValue::Problem {
                        return false;
                    }
                }
            }
            if !self.check_dependencies_rec(master, level + 1, batch, unresolved) {
                return false;
            }
        }
        true
    }

    /// Recompute the dependency order of every trigger.
    pub(crate) fn update_topoindex(&mut self) {
        let mut index = HashMap::with_capacity(self.deplists.len());
        let mut cycles = 0usize;
        for &triggerid in self.deplists.keys() {
            topoindex_rec(&self.deplists, &mut index, triggerid, 0, &mut cycles);
        }
        if cycles > 0 {
            tracing::error!(cycles, "[deps]: trigger dependency cycle detected, dependency order clamped");
        }
        for trigger in self.triggers.values_mut() {
            trigger.topoindex = index.get(&trigger.triggerid).copied().filter(|&v| v > 0).unwrap_or(1);
        }
    }
}

/// Dependency order of one trigger. `0` in `index` marks a trigger on the current path.
fn topoindex_rec(
    deplists: &HashMap<u64, DepNode>,
    index: &mut HashMap<u64, u32>,
    triggerid: u64,
    depth: usize,
    cycles: &mut usize,
) -> Option<u32> {
    match index.get(&triggerid) {
        Some(0) => {
            *cycles += 1;
            return None;
        }
        Some(&v) => return Some(v),
        None => {}
    }
    let masters = match deplists.get(&triggerid) {
        Some(node) if !node.masters.is_empty() => &node.masters,
        _ => {
            index.insert(triggerid, 1);
            return Some(1);
        }
    };
    if depth >= MAX_DEPENDENCY_DEPTH {
        *cycles += 1;
        return None;
    }

    index.insert(triggerid, 0);
    let mut max = 0;
    for &master in masters {
        if let Some(v) = topoindex_rec(deplists, index, master, depth + 1, cycles) {
            max = max.max(v);
        }
    }
    let v = max + 1;
    index.insert(triggerid, v);
    Some(v)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confcache_memory::{arena::MIN_CAPACITY, Arena};

    use super::*;
    use crate::{
        config::CacheConfig,
        model::{Trigger, TriggerValue},
    };

    fn store(triggers: &[(u64, TriggerValue)]) -> Store {
        let arena = Arc::new(Arena::new(MIN_CAPACITY * 8).unwrap());
        let mut store = Store::new(CacheConfig::default(), arena);
        for &(triggerid, value) in triggers {
            store
                .triggers
                .find_or_create(triggerid, || Trigger {
                    triggerid,
                    value,
                    functional: true,
                    ..Default::default()
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_node_refcount() {
        let mut store = store(&[]);
        store.dep_link(1, 2);
        store.dep_link(1, 3);
        assert_eq!(store.deplists[&1].refcount, 1);
        assert_eq!(store.deplists[&2].refcount, 1);

        store.dep_link(2, 3);
        assert_eq!(store.deplists[&2].refcount, 2);
        assert_eq!(store.deplists[&3].refcount, 2);

        store.dep_unlink(1, 2);
        store.dep_unlink(1, 3);
        assert!(!store.deplists.contains_key(&1));
        assert_eq!(store.deplists[&2].refcount, 1);
        store.dep_unlink(2, 3);
        assert!(store.deplists.is_empty());
    }

    #[test]
    fn test_check_dependencies() {
        let mut store = store(&[(1, TriggerValue::Ok), (2, TriggerValue::Problem), (3, TriggerValue::Ok)]);
        store.dep_link(1, 3);
        assert_eq!(store.check_dependencies(1, &[]), DependencyCheck::Pass);
        store.dep_link(3, 2);
        assert_eq!(store.check_dependencies(1, &[]), DependencyCheck::Blocked);
        assert_eq!(store.check_dependencies(1, &[2, 3]), DependencyCheck::Unresolved(vec![2, 3]));
    }

    #[test]
    fn test_batch_master_does_not_hide_its_masters() {
        let mut store = store(&[(1, TriggerValue::Ok), (2, TriggerValue::Problem), (3, TriggerValue::Ok)]);
        store.dep_link(1, 3);
        store.dep_link(3, 2);
        assert_eq!(store.check_dependencies(1, &[3]), DependencyCheck::Blocked);

        store.triggers.get_mut(2).unwrap().value = TriggerValue::Ok;
        assert_eq!(store.check_dependencies(1, &[3]), DependencyCheck::Unresolved(vec![3]));
    }

    #[test_log::test]
    fn test_cycle_is_bounded() {
        let mut store = store(&[(1, TriggerValue::Ok), (2, TriggerValue::Ok)]);
        store.dep_link(1, 2);
        store.dep_link(2, 1);
        assert_eq!(store.check_dependencies(1, &[]), DependencyCheck::Pass);
        store.update_topoindex();
        let a = store.triggers.get(1).unwrap().topoindex;
        let b = store.triggers.get(2).unwrap().topoindex;
        assert!((1..=2).contains(&a) && (1..=2).contains(&b));
    }

    #[test]
    fn test_topoindex() {
        let mut store = store(&[(1, TriggerValue::Ok), (2, TriggerValue::Ok), (3, TriggerValue::Ok), (4, TriggerValue::Ok)]);
        store.dep_link(1, 2);
        store.dep_link(2, 3);
        store.dep_link(4, 3);
        store.update_topoindex();
        let topo = |id| store.triggers.get(id).unwrap().topoindex;
        assert_eq!((topo(1), topo(2), topo(3), topo(4)), (3, 2, 1, 2));
    }
}
