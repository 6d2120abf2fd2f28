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

//! Metrics seen by the cache: counters, gauges and histograms grouped in labelled vectors and created by a
//! registry back end.
//!
//! Only the noop back end ships with the crate. Any other back end implements [`RegistryOps`] and the vector
//! traits it returns.

use std::fmt::Debug;

/// A monotonic counter.
pub trait CounterOps: Send + Sync + 'static + Debug {
    /// Add `val` to the counter.
    fn increase(&self, val: u64);
}

/// A gauge reporting the current level of something.
pub trait GaugeOps: Send + Sync + 'static + Debug {
    /// Set the gauge to `val`.
    fn absolute(&self, val: u64);
}

/// A histogram of observed values.
pub trait HistogramOps: Send + Sync + 'static + Debug {
    /// Observe `val`.
    fn record(&self, val: f64);
}

/// Counters sharing a name, told apart by label values.
pub trait CounterVecOps: Send + Sync + 'static + Debug {
    /// The counter for `labels`, in the order of the registered label names.
    fn counter(&self, labels: &[&'static str]) -> impl CounterOps;
}

/// Gauges sharing a name, told apart by label values.
pub trait GaugeVecOps: Send + Sync + 'static + Debug {
    /// The gauge for `labels`, in the order of the registered label names.
    fn gauge(&self, labels: &[&'static str]) -> impl GaugeOps;
}

/// Histograms sharing a name, told apart by label values.
pub trait HistogramVecOps: Send + Sync + 'static + Debug {
    /// The histogram for `labels`, in the order of the registered label names.
    fn histogram(&self, labels: &[&'static str]) -> impl HistogramOps;
}

/// A metrics back end.
///
/// `name` is the exported metric name, `desc` its help text and `label_names` the labels every member of the
/// vector carries.
pub trait RegistryOps: Send + Sync + 'static + Debug {
    /// Create a counter vector.
    fn register_counter_vec(
        &self,
        name: &'static str,
        desc: &'static str,
        label_names: &'static [&'static str],
    ) -> impl CounterVecOps;

    /// Create a gauge vector.
    fn register_gauge_vec(
        &self,
        name: &'static str,
        desc: &'static str,
        label_names: &'static [&'static str],
    ) -> impl GaugeVecOps;

    /// Create a histogram vector.
    fn register_histogram_vec(
        &self,
        name: &'static str,
        desc: &'static str,
        label_names: &'static [&'static str],
    ) -> impl HistogramVecOps;
}

/// A counter of any back end.
pub type BoxedCounter = Box<dyn CounterOps>;
/// A gauge of any back end.
pub type BoxedGauge = Box<dyn GaugeOps>;
/// A histogram of any back end.
pub type BoxedHistogram = Box<dyn HistogramOps>;

pub mod model;
pub mod registry;
