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

//! Commonly used types, re-exported at the crate root.

pub use confcache_common::{
    error::{Error, ErrorKind, Result},
    interval::UpdateInterval,
    metrics::{model::Metrics, RegistryOps},
};

pub use crate::{
    availability::{AvailabilityChange, AvailabilityFlags},
    builder::ConfigCacheBuilder,
    cache::ConfigCache,
    config::{CacheConfig, ProgramType},
    maintenance::RunningMaintenance,
    scheduler::{
        ItemResult, Location, PollStatus, PollerType, ProxyChecks, QueuePriority, QueuedItem, Reschedule,
        MAX_SNMP_ITEMS,
    },
    snapshot::*,
    stats::{CacheStats, ProxyStats},
    store::Store,
    sync::{DiffFeed, DiffRow, DiffSource, EntityKind, RowTag, SyncCounts, SyncReport, VecDiff},
    trigger_deps::{DependencyCheck, MAX_DEPENDENCY_DEPTH},
};
