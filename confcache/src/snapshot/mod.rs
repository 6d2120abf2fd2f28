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

//! Read and runtime write accessors copying cache data into caller owned values.
//!
//! Batch accessors resolve every id on its own and answer `None` for the ones that cannot be resolved.

mod action;
mod host;
mod item;
mod trigger;
mod types;

pub use self::{
    item::ItemDiff,
    trigger::{TriggerDeps, TriggerDiff, TriggerLocks},
    types::*,
};
use crate::store::Store;

impl Store {
    /// Replace every resolvable user macro in `text`, looking host macros up on `hostids` and their templates.
    pub fn expand_user_macros(&self, text: &str, hostids: &[u64]) -> String {
        self.expand_macros(text, hostids)
    }

    /// Like [`Store::expand_user_macros`], leaving macros whose value `validator` rejects untouched.
    pub fn expand_user_macros_with(&self, text: &str, hostids: &[u64], validator: &dyn Fn(&str) -> bool) -> String {
        self.expand_macros_with(text, hostids, Some(validator))
    }
}
