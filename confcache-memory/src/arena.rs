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

use std::sync::atomic::{AtomicUsize, Ordering};

use confcache_common::error::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};

/// Every allocation is rounded up to this alignment.
pub const ALIGN: usize = 8;
/// Per-allocation bookkeeping overhead.
pub const HEADER: usize = 8;
/// The smallest arena that can hold a useful cache.
pub const MIN_CAPACITY: usize = 128 * 1024;

/// Bytes charged against the arena for a request of `size` bytes.
pub const fn footprint(size: usize) -> usize {
    HEADER + size.div_ceil(ALIGN) * ALIGN
}

/// A live allocation.
///
/// An allocation only records its footprint: the cache owns its data on the Rust heap and uses the arena as a
/// fixed memory budget. An allocation must be handed back with [`Arena::free`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Allocation {
    footprint: usize,
}

impl Allocation {
    /// Bytes charged for this allocation.
    pub fn footprint(&self) -> usize {
        self.footprint
    }
}

/// Arena usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArenaStats {
    /// Total budget in bytes.
    pub capacity: usize,
    /// Bytes in use.
    pub used: usize,
    /// Highest `used` ever observed.
    pub peak: usize,
    /// Number of live allocations.
    pub allocations: usize,
}

impl ArenaStats {
    /// Bytes still available.
    pub fn free(&self) -> usize {
        self.capacity - self.used
    }

    /// Used fraction of the budget, `0.0..=1.0`.
    pub fn usage(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.used as f64 / self.capacity as f64
    }
}

/// Fixed-size memory budget every cache structure allocates from.
///
/// Exhaustion is reported as [`ErrorKind::NoSpace`] and must be treated as fatal by the caller.
#[derive(Debug)]
pub struct Arena {
    capacity: usize,
    used: AtomicUsize,
    peak: AtomicUsize,
    allocations: AtomicUsize,
}

impl Arena {
    /// Create an arena with the given capacity in bytes.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < MIN_CAPACITY {
            return Err(Error::new(ErrorKind::Config, "cache size is too small")
                .with_context("capacity", capacity)
                .with_context("min", MIN_CAPACITY));
        }
        Ok(Self {
            capacity,
            used: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            allocations: AtomicUsize::new(0),
        })
    }

    /// Total budget in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn reserve(&self, bytes: usize) -> Result<()> {
        let mut used = self.used.load(Ordering::Relaxed);
        loop {
            let next = used + bytes;
            if next > self.capacity {
                return Err(Error::no_space(self.capacity, used, bytes));
            }
            match self
                .used
                .compare_exchange_weak(used, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => {
                    self.peak.fetch_max(next, Ordering::Relaxed);
                    return Ok(());
                }
                Err(current) => used = current,
            }
        }
    }

    /// Allocate `size` bytes.
    pub fn malloc(&self, size: usize) -> Result<Allocation> {
        let footprint = footprint(size);
        self.reserve(footprint)?;
        self.allocations.fetch_add(1, Ordering::Relaxed);
        Ok(Allocation { footprint })
    }

    /// Resize an allocation in place.
    ///
    /// On failure the allocation keeps its previous size.
    pub fn realloc(&self, allocation: &mut Allocation, size: usize) -> Result<()> {
        let footprint = footprint(size);
        match footprint.cmp(&allocation.footprint) {
            std::cmp::Ordering::Greater => self.reserve(footprint - allocation.footprint)?,
            std::cmp::Ordering::Less => {
                self.used.fetch_sub(allocation.footprint - footprint, Ordering::AcqRel);
            }
            std::cmp::Ordering::Equal => {}
        }
        allocation.footprint = footprint;
        Ok(())
    }

    /// Return an allocation to the arena.
    pub fn free(&self, allocation: Allocation) {
        self.used.fetch_sub(allocation.footprint, Ordering::AcqRel);
        self.allocations.fetch_sub(1, Ordering::Relaxed);
    }

    /// Current usage statistics.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity: self.capacity,
            used: self.used.load(Ordering::Relaxed),
            peak: self.peak.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn test_send_sync_static() {
        is_send_sync_static::<Arena>();
    }

    #[test]
    fn test_footprint() {
        assert_eq!(footprint(0), 8);
        assert_eq!(footprint(1), 16);
        assert_eq!(footprint(8), 16);
        assert_eq!(footprint(9), 24);
    }

    #[test]
    fn test_too_small() {
        let err = Arena::new(1024).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_malloc_free() {
        let arena = Arena::new(MIN_CAPACITY).unwrap();
        let a = arena.malloc(100).unwrap();
        let b = arena.malloc(10).unwrap();
        assert_eq!(arena.stats().used, footprint(100) + footprint(10));
        assert_eq!(arena.stats().allocations, 2);

        arena.free(a);
        arena.free(b);
        let stats = arena.stats();
        assert_eq!(stats.used, 0);
        assert_eq!(stats.allocations, 0);
        assert_eq!(stats.peak, footprint(100) + footprint(10));
    }

    #[test]
    fn test_exhaustion() {
        let arena = Arena::new(MIN_CAPACITY).unwrap();
        let big = arena.malloc(MIN_CAPACITY - 2 * HEADER).unwrap();
        let err = arena.malloc(64).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSpace);
        // The failed request charged nothing.
        assert_eq!(arena.stats().allocations, 1);
        arena.free(big);
        arena.malloc(64).map(|a| arena.free(a)).unwrap();
    }

    #[test]
    fn test_realloc() {
        let arena = Arena::new(MIN_CAPACITY).unwrap();
        let mut a = arena.malloc(16).unwrap();
        arena.realloc(&mut a, 1000).unwrap();
        assert_eq!(arena.stats().used, footprint(1000));
        arena.realloc(&mut a, 1).unwrap();
        assert_eq!(arena.stats().used, footprint(1));

        assert!(arena.realloc(&mut a, MIN_CAPACITY).is_err());
        assert_eq!(a.footprint(), footprint(1));
        arena.free(a);
        assert_eq!(arena.stats().used, 0);
    }
}
