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

use std::{mem::size_of, sync::Arc};

use confcache_common::error::Result;
use confcache_memory::{arena::Allocation, Arena, Slab, Token};
use hashbrown::HashMap;

#[derive(Debug)]
struct Record<T> {
    value: T,
    allocation: Allocation,
}

/// Primary table of one entity type, keyed by id.
///
/// Entries live in a slab so that their [`Token`] identifies one incarnation of an id: an entry removed and
/// created again under the same id gets a different token.
#[derive(Debug)]
pub struct Table<T> {
    slab: Slab<Record<T>>,
    ids: HashMap<u64, Token>,
    arena: Arc<Arena>,
}

impl<T> Table<T> {
    /// Create an empty table charging `arena`.
    pub fn new(arena: Arc<Arena>) -> Self {
        Self {
            slab: Slab::new(),
            ids: HashMap::new(),
            arena,
        }
    }

    /// Return the entry of `id`, creating it with `init` if absent.
    ///
    /// The flag is `true` if the entry already existed.
    pub fn find_or_create<F>(&mut self, id: u64, init: F) -> Result<(Token, bool)>
    where
        F: FnOnce() -> T,
    {
        if let Some(&token) = self.ids.get(&id) {
            return Ok((token, true));
        }
        let allocation = self.arena.malloc(size_of::<T>())?;
        let token = self.slab.insert(Record { value: init(), allocation });
        self.ids.insert(id, token);
        Ok((token, false))
    }

    /// Remove the entry of `id`.
    pub fn remove(&mut self, id: u64) -> Option<T> {
        let token = self.ids.remove(&id)?;
        let record = self.slab.remove(token)?;
        self.arena.free(record.allocation);
        Some(record.value)
    }

    /// The token of the current entry of `id`.
    pub fn token(&self, id: u64) -> Option<Token> {
        self.ids.get(&id).copied()
    }

    /// The entry of `id`.
    pub fn get(&self, id: u64) -> Option<&T> {
        self.at(self.token(id)?)
    }

    /// The entry of `id`, mutably.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        let token = self.token(id)?;
        self.at_mut(token)
    }

    /// The entry identified by `token`, if it is still alive.
    pub fn at(&self, token: Token) -> Option<&T> {
        self.slab.get(token).map(|r| &r.value)
    }

    /// The entry identified by `token` mutably, if it is still alive.
    pub fn at_mut(&mut self, token: Token) -> Option<&mut T> {
        self.slab.get_mut(token).map(|r| &mut r.value)
    }

    /// Returns `true` if `id` has an entry.
    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains_key(&id)
    }

    /// Iterate over entries in no particular order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slab.iter().map(|(_, r)| &r.value)
    }

    /// Iterate mutably over entries in no particular order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slab.iter_mut().map(|(_, r)| &mut r.value)
    }

    /// Ids of every entry.
    pub fn ids(&self) -> Vec<u64> {
        self.ids.keys().copied().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.slab.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use confcache_memory::arena::MIN_CAPACITY;

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Row {
        value: u32,
    }

    fn table() -> Table<Row> {
        Table::new(Arc::new(Arena::new(MIN_CAPACITY).unwrap()))
    }

    #[test]
    fn test_find_or_create_identity() {
        let mut t = table();
        let (a, found) = t.find_or_create(7, || Row { value: 1 }).unwrap();
        assert!(!found);
        let (b, found) = t.find_or_create(7, || Row { value: 2 }).unwrap();
        assert!(found);
        assert_eq!(a, b);
        assert_eq!(t.get(7).map(|r| r.value), Some(1));
    }

    #[test]
    fn test_recreate_changes_identity() {
        let mut t = table();
        let (a, _) = t.find_or_create(7, Row::default).unwrap();
        assert_eq!(t.remove(7), Some(Row::default()));
        let (b, found) = t.find_or_create(7, Row::default).unwrap();
        assert!(!found);
        assert_ne!(a, b);
        assert!(t.at(a).is_none());
        assert!(t.at(b).is_some());
    }

    #[test]
    fn test_arena_charge() {
        let mut t = table();
        let arena = t.arena.clone();
        for id in 0..16 {
            t.find_or_create(id, Row::default).unwrap();
        }
        assert_eq!(arena.stats().allocations, 16);
        for id in 0..16 {
            t.remove(id);
        }
        assert_eq!(arena.stats().used, 0);
        assert!(t.is_empty());
    }
}
