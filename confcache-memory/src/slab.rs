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

use serde::{Deserialize, Serialize};

/// Identity of a slab entry.
///
/// A token is only valid for the entry it was returned for: once that entry is removed, the slot may be reused but
/// the new entry gets a different generation, so stale tokens never alias it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token {
    index: u32,
    generation: u32,
}

impl Token {
    /// Slot index.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone)]
enum Entry<T> {
    Vacant { next: u32, generation: u32 },
    Occupied { value: T, generation: u32 },
}

/// Vector-backed storage with a free list and generational tokens.
#[derive(Debug, Clone)]
pub struct Slab<T> {
    entries: Vec<Entry<T>>,
    len: usize,
    next: u32,
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Slab<T> {
    /// Create an empty slab.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            len: 0,
            next: 0,
        }
    }

    /// Insert a value and return its token.
    pub fn insert(&mut self, value: T) -> Token {
        let index = self.next;
        self.len += 1;

        let generation = match self.entries.get(index as usize) {
            None => {
                self.entries.push(Entry::Occupied { value, generation: 0 });
                self.next = index + 1;
                0
            }
            Some(&Entry::Vacant { next, generation }) => {
                let generation = generation.wrapping_add(1);
                self.entries[index as usize] = Entry::Occupied { value, generation };
                self.next = next;
                generation
            }
            Some(Entry::Occupied { .. }) => unreachable!("free list points at an occupied entry"),
        };

        Token { index, generation }
    }

    /// Remove the entry identified by `token`.
    pub fn remove(&mut self, token: Token) -> Option<T> {
        let entry = self.entries.get_mut(token.index as usize)?;
        match &*entry {
            Entry::Occupied { generation, .. } if *generation == token.generation => {}
            _ => return None,
        }

        let vacant = Entry::Vacant {
            next: self.next,
            generation: token.generation,
        };
        match std::mem::replace(entry, vacant) {
            Entry::Occupied { value, .. } => {
                self.len -= 1;
                self.next = token.index;
                Some(value)
            }
            Entry::Vacant { .. } => None,
        }
    }

    /// Get the entry identified by `token`.
    pub fn get(&self, token: Token) -> Option<&T> {
        match self.entries.get(token.index as usize) {
            Some(Entry::Occupied { value, generation }) if *generation == token.generation => Some(value),
            _ => None,
        }
    }

    /// Get the entry identified by `token` mutably.
    pub fn get_mut(&mut self, token: Token) -> Option<&mut T> {
        match self.entries.get_mut(token.index as usize) {
            Some(Entry::Occupied { value, generation }) if *generation == token.generation => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if `token` identifies a live entry.
    pub fn contains(&self, token: Token) -> bool {
        self.get(token).is_some()
    }

    /// Iterate over live entries.
    pub fn iter(&self) -> impl Iterator<Item = (Token, &T)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| match entry {
            Entry::Occupied { value, generation } => Some((
                Token {
                    index: index as u32,
                    generation: *generation,
                },
                value,
            )),
            Entry::Vacant { .. } => None,
        })
    }

    /// Iterate mutably over live entries.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Token, &mut T)> {
        self.entries.iter_mut().enumerate().filter_map(|(index, entry)| match entry {
            Entry::Occupied { value, generation } => Some((
                Token {
                    index: index as u32,
                    generation: *generation,
                },
                value,
            )),
            Entry::Vacant { .. } => None,
        })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the slab is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut slab = Slab::new();
        let a = slab.insert("a");
        let b = slab.insert("b");
        assert_eq!(slab.len(), 2);
        assert_eq!(slab.get(a), Some(&"a"));
        assert_eq!(slab.remove(a), Some("a"));
        assert_eq!(slab.remove(a), None);
        assert_eq!(slab.get(b), Some(&"b"));
        assert_eq!(slab.len(), 1);
    }

    #[test]
    fn test_stale_token() {
        let mut slab = Slab::new();
        let a = slab.insert(1);
        slab.remove(a);
        let b = slab.insert(2);
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert_eq!(slab.get(a), None);
        assert_eq!(slab.get_mut(a), None);
        assert_eq!(slab.remove(a), None);
        assert_eq!(slab.get(b), Some(&2));
    }

    #[test]
    fn test_iter() {
        let mut slab = Slab::new();
        let tokens = (0..8).map(|i| slab.insert(i)).collect::<Vec<_>>();
        for t in tokens.iter().step_by(2) {
            slab.remove(*t);
        }
        let values = slab.iter().map(|(_, v)| *v).collect::<Vec<_>>();
        assert_eq!(values, vec![1, 3, 5, 7]);
        for (_, v) in slab.iter_mut() {
            *v *= 10;
        }
        assert_eq!(slab.get(tokens[1]), Some(&10));
    }
}
