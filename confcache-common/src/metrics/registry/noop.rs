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

use crate::metrics::{CounterOps, CounterVecOps, GaugeOps, GaugeVecOps, HistogramOps, HistogramVecOps, RegistryOps};

/// Noop metrics placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsRegistry;

impl CounterOps for NoopMetricsRegistry {
    fn increase(&self, _: u64) {}
}

impl CounterVecOps for NoopMetricsRegistry {
    fn counter(&self, _: &[&'static str]) -> impl CounterOps {
        NoopMetricsRegistry
    }
}

impl GaugeOps for NoopMetricsRegistry {
    fn absolute(&self, _: u64) {}
}

impl GaugeVecOps for NoopMetricsRegistry {
    fn gauge(&self, _: &[&'static str]) -> impl GaugeOps {
        NoopMetricsRegistry
    }
}

impl HistogramOps for NoopMetricsRegistry {
    fn record(&self, _: f64) {}
}

impl HistogramVecOps for NoopMetricsRegistry {
    fn histogram(&self, _: &[&'static str]) -> impl HistogramOps {
        NoopMetricsRegistry
    }
}

impl RegistryOps for NoopMetricsRegistry {
    fn register_counter_vec(&self, _: &'static str, _: &'static str, _: &'static [&'static str]) -> impl CounterVecOps {
        NoopMetricsRegistry
    }

    fn register_gauge_vec(&self, _: &'static str, _: &'static str, _: &'static [&'static str]) -> impl GaugeVecOps {
        NoopMetricsRegistry
    }

    fn register_histogram_vec(
        &self,
        _: &'static str,
        _: &'static str,
        _: &'static [&'static str],
    ) -> impl HistogramVecOps {
        NoopMetricsRegistry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_registry() {
        let noop = NoopMetricsRegistry;

        let cv = noop.register_counter_vec("confcache_sync_total", "sync rows", &["name", "op"]);
        cv.counter(&["test", "add"]).increase(42);

        let gv = noop.register_gauge_vec("confcache_arena_usage", "arena usage", &["name"]);
        gv.gauge(&["test"]).absolute(4096);

        let hv = noop.register_histogram_vec("confcache_sync_duration", "sync durations", &["name"]);
        hv.histogram(&["test"]).record(0.25);
    }
}
