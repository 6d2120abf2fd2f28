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

use std::hash::Hash;

use confcache_common::strict_assert;
use confcache_memory::Token;
use equivalent::Equivalent;
use hashbrown::HashMap;

/// Secondary index mapping a key to the one entry holding it.
///
/// Removal is checked against the identity of the entry: an entry only removes the index slot if it still points at
/// that very entry, so a record that took over the key in the meantime keeps its slot.
#[derive(Debug)]
pub struct UniqueIndex<K> {
    map: HashMap<K, Token>,
}

impl<K> Default for UniqueIndex<K> {
    fn default() -> Self {
        Self { map: HashMap::new() }
    }
}

impl<K> UniqueIndex<K>
where
    K: Hash + Eq,
{
    /// Point `key` at `token`, returning the previous holder.
    pub fn insert(&mut self, key: K, token: Token) -> Option<Token> {
        self.map.insert(key, token)
    }

    /// Remove `key` if it points at `token`.
    pub fn remove<Q>(&mut self, key: &Q, token: Token) -> bool
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        match self.map.get(key) {
            Some(&t) if t == token => {
                self.map.remove(key);
                true
            }
            _ => false,
        }
    }

    /// The entry holding `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Token>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.map.get(key).copied()
    }

    /// Returns `true` if any key points at `token`.
    pub fn references(&self, token: Token) -> bool {
        self.map.values().any(|&t| t == token)
    }

    /// Iterate over keys and their entries.
    pub fn iter(&self) -> impl Iterator<Item = (&K, Token)> {
        self.map.iter().map(|(k, &t)| (k, t))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Secondary index grouping entry ids under a key.
#[derive(Debug)]
pub struct MultiIndex<K> {
    map: HashMap<K, Vec<u64>>,
}

impl<K> Default for MultiIndex<K> {
    fn default() -> Self {
        Self { map: HashMap::new() }
    }
}

impl<K> MultiIndex<K>
where
    K: Hash + Eq,
{
    /// Add `id` under `key`, keeping ids sorted and unique.
    pub fn add(&mut self, key: K, id: u64) {
        let ids = self.map.entry(key).or_default();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
    }

    /// Remove `id` from `key`, dropping the key when it becomes empty.
    pub fn remove<Q>(&mut self, key: &Q, id: u64) -> bool
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let Some(ids) = self.map.get_mut(key) else {
            return false;
        };
        let removed = match ids.binary_search(&id) {
            Ok(pos) => {
                ids.remove(pos);
                true
            }
            Err(_) => false,
        };
        if ids.is_empty() {
            self.map.remove(key);
        }
        removed
    }

    /// Ids under `key`, sorted.
    pub fn get<Q>(&self, key: &Q) -> &[u64]
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.map.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Remove a whole key.
    pub fn take<Q>(&mut self, key: &Q) -> Vec<u64>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.map.remove(key).unwrap_or_default()
    }

    /// Returns `true` if `id` is listed under any key.
    pub fn references(&self, id: u64) -> bool {
        self.map.values().any(|ids| ids.binary_search(&id).is_ok())
    }

    /// Iterate over keys and their ids.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[u64])> {
        self.map.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

/// Log and assert on an index slot pointing at an unexpected entry.
pub(crate) fn index_anomaly(index: &'static str, id: u64) {
    tracing::error!(index, id, "[index]: secondary index points at an unexpected entry");
    strict_assert!(false, "secondary index {index} points at an unexpected entry, id: {id}");
}

#[cfg(test)]
mod tests {
    use confcache_memory::Slab;

    use super::*;

    #[test]
    fn test_unique_remove_by_identity() {
        let mut slab = Slab::new();
        let old = slab.insert(());
        let new = slab.insert(());

        let mut index = UniqueIndex::default();
        index.insert("web01", old);
        // A new record takes over the name before the old one is removed.
        assert_eq!(index.insert("web01", new), Some(old));
        assert!(!index.remove(&"web01", old));
        assert_eq!(index.get(&"web01"), Some(new));
        assert!(index.remove(&"web01", new));
        assert!(index.is_empty());
    }

    #[test]
    fn test_multi() {
        let mut index = MultiIndex::default();
        index.add(1u64, 30);
        index.add(1, 10);
        index.add(1, 20);
        index.add(1, 10);
        assert_eq!(index.get(&1), &[10, 20, 30]);
        assert!(index.remove(&1, 20));
        assert!(!index.remove(&1, 20));
        assert!(index.remove(&1, 10));
        assert!(index.remove(&1, 30));
        assert!(index.is_empty());
        assert_eq!(index.get(&1), &[] as &[u64]);
    }
}
