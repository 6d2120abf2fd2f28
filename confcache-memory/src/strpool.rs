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

use std::sync::Arc;

use ahash::RandomState;
use confcache_common::{error::Result, strict_assert};
use hashbrown::hash_table::{Entry as HashTableEntry, HashTable};

use crate::arena::{Allocation, Arena};

/// Size of the refcount header charged in front of every pooled string.
const REFCOUNT_HEADER: usize = 4;

/// An owned reference to a pooled string.
///
/// `Interned` is intentionally neither `Clone` nor `Copy`: a new reference is obtained with
/// [`StringPool::acquire`] and every reference is given back exactly once with [`StringPool::release`], which
/// consumes it. The default value is the empty string, which is never counted.
#[derive(Debug, Default, PartialEq, Eq, Hash)]
pub struct Interned(u32);

impl Interned {
    /// A copyable key identifying the pooled string, usable in secondary indices.
    ///
    /// The key stays valid while at least one `Interned` for the same string is alive.
    pub fn key(&self) -> StrKey {
        StrKey(self.0)
    }

    /// Returns `true` for the empty string.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Copyable identity of a pooled string. Two keys are equal iff the strings are equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrKey(u32);

#[derive(Debug, Default)]
struct Slot {
    s: Box<str>,
    refs: u32,
    hash: u64,
    allocation: Option<Allocation>,
}

/// Refcounted, deduplicated string interning table.
///
/// Every distinct non-empty string is stored once and charged to the arena together with its refcount header.
#[derive(Debug)]
pub struct StringPool {
    arena: Arc<Arena>,
    hasher: RandomState,
    table: HashTable<u32>,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl StringPool {
    /// Create an empty pool charging the given arena.
    pub fn new(arena: Arc<Arena>) -> Self {
        Self {
            arena,
            hasher: RandomState::new(),
            table: HashTable::new(),
            // Slot 0 is the permanent empty string.
            slots: vec![Slot::default()],
            free: vec![],
        }
    }

    /// Intern `s`, returning a new reference.
    pub fn intern(&mut self, s: &str) -> Result<Interned> {
        if s.is_empty() {
            return Ok(Interned::default());
        }

        let hash = self.hasher.hash_one(s);
        let slots = &mut self.slots;
        match self
            .table
            .entry(hash, |&i| &*slots[i as usize].s == s, |&i| slots[i as usize].hash)
        {
            HashTableEntry::Occupied(o) => {
                let index = *o.get();
                slots[index as usize].refs += 1;
                Ok(Interned(index))
            }
            HashTableEntry::Vacant(v) => {
                let allocation = self.arena.malloc(s.len() + REFCOUNT_HEADER)?;
                let slot = Slot {
                    s: s.into(),
                    refs: 1,
                    hash,
                    allocation: Some(allocation),
                };
                let index = match self.free.pop() {
                    Some(index) => {
                        slots[index as usize] = slot;
                        index
                    }
                    None => {
                        slots.push(slot);
                        (slots.len() - 1) as u32
                    }
                };
                v.insert(index);
                Ok(Interned(index))
            }
        }
    }

    /// Take another reference to an already interned string without hashing it.
    pub fn acquire(&mut self, interned: &Interned) -> Interned {
        if interned.0 != 0 {
            self.slots[interned.0 as usize].refs += 1;
        }
        Interned(interned.0)
    }

    /// Give a reference back. The string is removed from the pool with its last reference.
    pub fn release(&mut self, interned: Interned) {
        let index = interned.0;
        if index == 0 {
            return;
        }

        let slot = &mut self.slots[index as usize];
        if slot.refs == 0 {
            tracing::error!(index, "[strpool]: released a string with no references");
            strict_assert!(false, "released a string with no references");
            return;
        }
        slot.refs -= 1;
        if slot.refs > 0 {
            return;
        }

        let hash = slot.hash;
        if let Ok(o) = self.table.find_entry(hash, |&i| i == index) {
            o.remove();
        }
        let slot = std::mem::take(&mut self.slots[index as usize]);
        if let Some(allocation) = slot.allocation {
            self.arena.free(allocation);
        }
        self.free.push(index);
    }

    /// Point `slot` at `value`.
    ///
    /// If the owner of `slot` already existed (`found`) and the value is unchanged, nothing happens. Otherwise the
    /// previous reference is released and `value` is interned. Returns whether the value changed.
    pub fn replace(&mut self, found: bool, slot: &mut Interned, value: &str) -> Result<bool> {
        if found && self.get(slot) == value {
            return Ok(false);
        }
        let interned = self.intern(value)?;
        let old = std::mem::replace(slot, interned);
        self.release(old);
        Ok(true)
    }

    /// Borrow the pooled string.
    pub fn get(&self, interned: &Interned) -> &str {
        self.slots.get(interned.0 as usize).map(|s| &*s.s).unwrap_or_default()
    }

    /// Borrow the pooled string by key.
    pub fn get_by_key(&self, key: StrKey) -> &str {
        self.slots.get(key.0 as usize).map(|s| &*s.s).unwrap_or_default()
    }

    /// Find the key of `s` without taking a reference.
    pub fn lookup(&self, s: &str) -> Option<StrKey> {
        if s.is_empty() {
            return Some(StrKey(0));
        }
        let hash = self.hasher.hash_one(s);
        self.table
            .find(hash, |&i| &*self.slots[i as usize].s == s)
            .map(|&i| StrKey(i))
    }

    /// Number of references held on `s`, `0` if absent.
    pub fn refcount(&self, s: &str) -> u32 {
        match self.lookup(s) {
            Some(StrKey(0)) | None => 0,
            Some(StrKey(i)) => self.slots[i as usize].refs,
        }
    }

    /// Number of distinct non-empty strings in the pool.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the pool holds no string.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;
    use crate::arena::MIN_CAPACITY;

    fn pool() -> StringPool {
        StringPool::new(Arc::new(Arena::new(MIN_CAPACITY).unwrap()))
    }

    #[test_log::test]
    fn test_dedup() {
        let mut pool = pool();
        let a = pool.intern("system.cpu.load").unwrap();
        let b = pool.intern("system.cpu.load").unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.refcount("system.cpu.load"), 2);
        pool.release(a);
        pool.release(b);
        assert!(pool.is_empty());
        assert_eq!(pool.arena.stats().used, 0);
    }

    #[test]
    fn test_empty_string_is_free() {
        let mut pool = pool();
        let e = pool.intern("").unwrap();
        assert!(e.is_empty());
        assert_eq!(pool.get(&e), "");
        pool.release(e);
        assert_eq!(pool.arena.stats().used, 0);
    }

    #[test_log::test]
    fn test_acquire_release_balance() {
        let mut rng = SmallRng::seed_from_u64(114514);
        let mut pool = pool();

        for round in 0..64 {
            let s = format!("key[{round}]");
            let first = pool.intern(&s).unwrap();
            let n = rng.random_range(0..16);
            let copies = (0..n).map(|_| pool.acquire(&first)).collect::<Vec<_>>();
            assert_eq!(pool.refcount(&s), n + 1);

            // N + 1 acquisitions need N + 1 releases.
            for c in copies {
                assert!(pool.lookup(&s).is_some());
                pool.release(c);
            }
            assert!(pool.lookup(&s).is_some());
            pool.release(first);
            assert!(pool.lookup(&s).is_none());
        }
        assert!(pool.is_empty());
    }

    #[test]
    fn test_replace() {
        let mut pool = pool();

        let mut slot = Interned::default();
        assert!(pool.replace(false, &mut slot, "agent.ping").unwrap());
        assert!(!pool.replace(true, &mut slot, "agent.ping").unwrap());
        assert_eq!(pool.refcount("agent.ping"), 1);

        assert!(pool.replace(true, &mut slot, "agent.version").unwrap());
        assert_eq!(pool.refcount("agent.ping"), 0);
        assert_eq!(pool.get(&slot), "agent.version");

        pool.release(slot);
        assert!(pool.is_empty());
    }

    #[test_log::test]
    fn test_slot_reuse() {
        let mut pool = pool();
        let a = pool.intern("a").unwrap();
        let key = a.key();
        pool.release(a);
        let b = pool.intern("b").unwrap();
        assert_eq!(b.key(), key);
        assert_eq!(pool.get_by_key(key), "b");
        assert_eq!(pool.lookup("a"), None);
        pool.release(b);
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = pool();
        let huge = "x".repeat(MIN_CAPACITY);
        assert!(pool.intern(&huge).is_err());
        assert!(pool.is_empty());
    }

    #[cfg(debug_assertions)]
    #[test_log::test]
    #[should_panic(expected = "released a string with no references")]
    fn test_release_unreferenced() {
        let mut pool = pool();
        let a = pool.intern("a").unwrap();
        let index = a.0;
        pool.release(a);
        pool.release(Interned(index));
    }
}
