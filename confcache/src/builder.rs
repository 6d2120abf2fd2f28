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

use std::sync::Arc;

use confcache_common::{
    error::{Error, Result},
    metrics::{model::Metrics, RegistryOps},
};

use crate::{cache::ConfigCache, config::CacheConfig};

type MetricsFactory = Box<dyn FnOnce(&'static str) -> Metrics>;

/// Builder of a [`ConfigCache`].
pub struct ConfigCacheBuilder {
    name: &'static str,
    config: CacheConfig,
    metrics: MetricsFactory,
}

impl Default for ConfigCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigCacheBuilder {
    /// Create a builder with the default settings and noop metrics.
    pub fn new() -> Self {
        Self {
            name: "confcache",
            config: CacheConfig::default(),
            metrics: Box::new(|name| {
                Metrics::new(name, &confcache_common::metrics::registry::noop::NoopMetricsRegistry)
            }),
        }
    }

    /// Set the name of the cache, used as metrics label.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Set the cache settings.
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the metrics registry.
    ///
    /// Default: [`NoopMetricsRegistry`](confcache_common::metrics::registry::noop::NoopMetricsRegistry).
    pub fn with_metrics_registry<R>(mut self, registry: R) -> Self
    where
        R: RegistryOps,
    {
        self.metrics = Box::new(move |name| Metrics::new(name, &registry));
        self
    }

    fn validate(config: &CacheConfig) -> Result<()> {
        let positive = [
            ("unreachable_delay", config.unreachable_delay),
            ("unreachable_period", config.unreachable_period),
            ("unavailable_delay", config.unavailable_delay),
            ("timer_delay", config.timer_delay),
            ("proxy_config_frequency", config.proxy_config_frequency),
            ("proxy_data_frequency", config.proxy_data_frequency),
        ];
        for (key, value) in positive {
            if value <= 0 {
                return Err(Error::config("setting must be positive")
                    .with_context("key", key)
                    .with_context("value", value));
            }
        }
        if config.status_ttl < 0 || config.timeout < 0 {
            return Err(Error::config("setting must not be negative"));
        }
        Ok(())
    }

    /// Validate the settings and build the cache.
    pub fn build(self) -> Result<ConfigCache> {
        Self::validate(&self.config)?;
        let metrics = Arc::new((self.metrics)(self.name));
        ConfigCache::open(self.name, self.config, metrics)
    }
}

#[cfg(test)]
mod tests {
    use confcache_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_build_default() {
        let cache = ConfigCacheBuilder::new().build().unwrap();
        assert_eq!(cache.config().timer_delay, 60);
    }

    #[test]
    fn test_reject_small_cache() {
        let err = ConfigCacheBuilder::new()
            .with_config(CacheConfig {
                cache_size: 4096,
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_reject_zero_timer_delay() {
        let err = ConfigCacheBuilder::new()
            .with_config(CacheConfig {
                timer_delay: 0,
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
