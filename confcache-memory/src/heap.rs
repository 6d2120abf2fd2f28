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

use std::{cmp::Ordering, hash::Hash};

use hashbrown::HashMap;

/// A binary min-heap addressable by key.
///
/// Besides the usual push/pop, elements can be updated or removed by key in `O(log n)`. The order is given by a
/// comparator over values, the smallest value is on top.
#[derive(Debug, Clone)]
pub struct IndexedHeap<K, V> {
    elems: Vec<(K, V)>,
    positions: HashMap<K, usize>,
    cmp: fn(&V, &V) -> Ordering,
}

impl<K, V> IndexedHeap<K, V>
where
    K: Copy + Hash + Eq,
{
    /// Create an empty heap ordered by `cmp`.
    pub fn new(cmp: fn(&V, &V) -> Ordering) -> Self {
        Self {
            elems: vec![],
            positions: HashMap::new(),
            cmp,
        }
    }

    /// Insert `value` under `key`, or replace the value already stored under `key`.
    ///
    /// Returns the replaced value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&pos) = self.positions.get(&key) {
            let old = std::mem::replace(&mut self.elems[pos].1, value);
            self.fix(pos);
            return Some(old);
        }
        let pos = self.elems.len();
        self.elems.push((key, value));
        self.positions.insert(key, pos);
        self.sift_up(pos);
        None
    }

    /// Modify the value stored under `key` in place and restore the heap order.
    ///
    /// Returns `false` if `key` is absent.
    pub fn update<F>(&mut self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        match self.positions.get(key) {
            Some(&pos) => {
                f(&mut self.elems[pos].1);
                self.fix(pos);
                true
            }
            None => false,
        }
    }

    /// Remove the element stored under `key`.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let pos = self.positions.remove(key)?;
        let (_, value) = self.elems.swap_remove(pos);
        if pos < self.elems.len() {
            self.positions.insert(self.elems[pos].0, pos);
            self.fix(pos);
        }
        Some(value)
    }

    /// The smallest element.
    pub fn peek(&self) -> Option<(&K, &V)> {
        self.elems.first().map(|(k, v)| (k, v))
    }

    /// Remove and return the smallest element.
    pub fn pop(&mut self) -> Option<(K, V)> {
        let key = self.elems.first()?.0;
        self.remove(&key).map(|v| (key, v))
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.positions.get(key).map(|&pos| &self.elems[pos].1)
    }

    /// Returns `true` if `key` is in the heap.
    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Returns `true` if the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Iterate over the elements in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.elems.iter().map(|(k, v)| (k, v))
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.elems.clear();
        self.positions.clear();
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.cmp)(&self.elems[a].1, &self.elems[b].1) == Ordering::Less
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.elems.swap(a, b);
        self.positions.insert(self.elems[a].0, a);
        self.positions.insert(self.elems[b].0, b);
    }

    fn fix(&mut self, pos: usize) {
        if pos > 0 && self.less(pos, (pos - 1) / 2) {
            self.sift_up(pos);
        } else {
            self.sift_down(pos);
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(pos, parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.elems.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;

    #[test]
    fn test_order() {
        let mut heap = IndexedHeap::new(|a: &(i64, u8), b: &(i64, u8)| a.cmp(b));
        heap.insert('A', (10, 1));
        heap.insert('B', (10, 0));
        heap.insert('C', (5, 1));

        let order = std::iter::from_fn(|| heap.pop().map(|(k, _)| k)).collect::<String>();
        assert_eq!(order, "CBA");
    }

    #[test]
    fn test_update_remove() {
        let mut heap = IndexedHeap::new(|a: &i64, b: &i64| a.cmp(b));
        for (k, v) in [(1u64, 50), (2, 40), (3, 30), (4, 20)] {
            heap.insert(k, v);
        }
        assert_eq!(heap.peek(), Some((&4, &20)));

        assert!(heap.update(&1, |v| *v = 10));
        assert_eq!(heap.peek(), Some((&1, &10)));
        assert!(!heap.update(&9, |v| *v = 0));

        assert_eq!(heap.remove(&1), Some(10));
        assert_eq!(heap.remove(&1), None);
        assert_eq!(heap.insert(3, 35), Some(30));
        assert_eq!(heap.pop(), Some((4, 20)));
        assert_eq!(heap.pop(), Some((3, 35)));
        assert_eq!(heap.pop(), Some((2, 40)));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_random() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut heap = IndexedHeap::new(|a: &u32, b: &u32| a.cmp(b));

        for k in 0..1000u64 {
            heap.insert(k, rng.random_range(0..10_000));
        }
        for _ in 0..300 {
            let k = rng.random_range(0..1000u64);
            if rng.random_bool(0.5) {
                heap.remove(&k);
            } else {
                let v = rng.random_range(0..10_000);
                heap.update(&k, |old| *old = v);
            }
        }

        let mut last = 0;
        while let Some((k, v)) = heap.pop() {
            assert!(v >= last);
            assert!(!heap.contains(&k));
            last = v;
        }
    }
}
