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

//! Memory primitives of confcache: the budgeted arena, the string pool, the slab and the indexed heap.

/// Fixed memory budget.
pub mod arena;
/// Direct-addressable binary min-heap.
pub mod heap;
/// Generational slab.
pub mod slab;
/// Refcounted string interning.
pub mod strpool;

pub use arena::{Arena, ArenaStats};
pub use heap::IndexedHeap;
pub use slab::{Slab, Token};
pub use strpool::{Interned, StrKey, StringPool};
