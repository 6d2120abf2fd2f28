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

//! The metrics of one cache instance.

use super::{BoxedCounter, BoxedGauge, BoxedHistogram, CounterVecOps, GaugeVecOps, HistogramVecOps, RegistryOps};

trait Boxer {
    fn boxed(self) -> Box<Self>
    where
        Self: Sized,
    {
        Box::new(self)
    }
}
impl<T> Boxer for T {}

/// Metrics of a configuration cache instance.
#[derive(Debug)]
pub struct Metrics {
    /* synchronization */
    /// Rows that created a new object.
    pub sync_add: BoxedCounter,
    /// Rows that updated an existing object.
    pub sync_update: BoxedCounter,
    /// Rows that removed an object.
    pub sync_remove: BoxedCounter,
    /// Wall time of a full synchronization pass, in seconds.
    pub sync_duration: BoxedHistogram,

    /* scheduling */
    /// Items handed out to pollers.
    pub queue_dequeue: BoxedCounter,
    /// Items put back into a queue after polling.
    pub queue_requeue: BoxedCounter,
    /// Items currently sitting in any poller queue.
    pub queue_len: BoxedGauge,

    /* memory */
    /// Bytes used in the arena.
    pub arena_usage: BoxedGauge,
    /// Distinct strings held by the string pool.
    pub strpool_size: BoxedGauge,
}

impl Metrics {
    /// Create a new metric with the given name.
    pub fn new<R>(name: &'static str, registry: &R) -> Self
    where
        R: RegistryOps,
    {
        let confcache_sync_op_total = registry.register_counter_vec(
            "confcache_sync_op_total",
            "confcache synchronized rows by outcome",
            &["name", "op"],
        );
        let confcache_sync_duration = registry.register_histogram_vec(
            "confcache_sync_duration",
            "confcache synchronization durations",
            &["name"],
        );

        let sync_add = confcache_sync_op_total.counter(&[name, "add"]).boxed();
        let sync_update = confcache_sync_op_total.counter(&[name, "update"]).boxed();
        let sync_remove = confcache_sync_op_total.counter(&[name, "remove"]).boxed();
        let sync_duration = confcache_sync_duration.histogram(&[name]).boxed();

        let confcache_queue_op_total =
            registry.register_counter_vec("confcache_queue_op_total", "confcache poller queue operations", &["name", "op"]);
        let confcache_queue_len =
            registry.register_gauge_vec("confcache_queue_len", "confcache queued items", &["name"]);

        let queue_dequeue = confcache_queue_op_total.counter(&[name, "dequeue"]).boxed();
        let queue_requeue = confcache_queue_op_total.counter(&[name, "requeue"]).boxed();
        let queue_len = confcache_queue_len.gauge(&[name]).boxed();

        let confcache_memory_usage =
            registry.register_gauge_vec("confcache_memory_usage", "confcache memory usage", &["name", "component"]);

        let arena_usage = confcache_memory_usage.gauge(&[name, "arena"]).boxed();
        let strpool_size = confcache_memory_usage.gauge(&[name, "strpool"]).boxed();

        Self {
            sync_add,
            sync_update,
            sync_remove,
            sync_duration,
            queue_dequeue,
            queue_requeue,
            queue_len,
            arena_usage,
            strpool_size,
        }
    }

    /// Build noop metrics.
    #[doc(hidden)]
    pub fn noop() -> Self {
        use super::registry::noop::NoopMetricsRegistry;

        Self::new("test", &NoopMetricsRegistry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::registry::noop::NoopMetricsRegistry;

    #[test]
    fn test_metrics_noop() {
        let metrics = Metrics::new("test", &NoopMetricsRegistry);
        metrics.sync_add.increase(1);
        metrics.arena_usage.absolute(1024);
    }
}
