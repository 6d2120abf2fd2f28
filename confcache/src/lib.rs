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

//! An in-memory replica of monitoring configuration shared by pollers, trappers, history syncers and event
//! processors.
//!
//! A [`ConfigCache`] is built with [`ConfigCacheBuilder`], kept up to date with [`ConfigCache::sync`] from a
//! [`DiffFeed`], and queried through the accessors of [`Store`] under [`ConfigCache::read`] or through the
//! write accessors of [`ConfigCache`] itself.

mod availability;
mod builder;
mod cache;
mod config;
mod maintenance;
pub mod model;
mod scheduler;
mod snapshot;
mod stats;
mod store;
mod sync;
mod trigger_deps;
mod usermacro;

pub mod prelude;
pub use prelude::*;
