use std::sync::Arc;

use log::debug;
use shunt_core::{publish, unpublish, FlowKey, LruTable, StatsMap, DEFAULT_TABLE_CAPACITY};

use crate::config::{EngineConfig, DEFAULT_REDIRECTS_TABLE, DEFAULT_STATISTICS_TABLE};
use crate::engine::RedirectEngine;
use crate::error::ShuntError;
use crate::fib::FibLookup;

/// Configures and publishes the shared tables of one dataplane instance.
pub struct ShuntBuilder {
    redirects_name: String,
    statistics_name: String,
    capacity: usize,
    replicas: usize,
    config: EngineConfig,
}

impl ShuntBuilder {
    pub fn new() -> Self {
        Self {
            redirects_name: DEFAULT_REDIRECTS_TABLE.to_string(),
            statistics_name: DEFAULT_STATISTICS_TABLE.to_string(),
            capacity: DEFAULT_TABLE_CAPACITY,
            replicas: 1,
            config: EngineConfig::default(),
        }
    }

    pub fn redirects_name(mut self, name: &str) -> Self {
        self.redirects_name = name.to_string();
        self
    }

    pub fn statistics_name(mut self, name: &str) -> Self {
        self.statistics_name = name.to_string();
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Number of concurrent execution contexts that will run engines. Each
    /// gets its own statistics replica.
    pub fn replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn loopback_ifindex(mut self, ifindex: u32) -> Self {
        self.config.loopback_ifindex = ifindex;
        self
    }

    pub fn loopback_mac(mut self, mac: [u8; 6]) -> Self {
        self.config.loopback_mac = mac;
        self
    }

    /// Create both tables, make them reachable under their configured names
    /// and return the dataplane handle.
    pub fn publish(self) -> Result<Shunt, ShuntError> {
        if self.capacity == 0 {
            return Err(ShuntError::InvalidConfiguration(
                "table capacity must be greater than zero".into(),
            ));
        }
        if self.replicas == 0 {
            return Err(ShuntError::InvalidConfiguration(
                "at least one execution context is required".into(),
            ));
        }

        let redirects: Arc<LruTable<FlowKey, FlowKey>> = Arc::new(LruTable::new(self.capacity));
        let statistics = Arc::new(StatsMap::new(self.replicas, self.capacity));

        publish(&self.redirects_name, Arc::clone(&redirects))?;
        if let Err(err) = publish(&self.statistics_name, Arc::clone(&statistics)) {
            unpublish(&self.redirects_name);
            return Err(err.into());
        }
        debug!(
            "published tables '{}' and '{}' ({} entries, {} replicas)",
            self.redirects_name, self.statistics_name, self.capacity, self.replicas
        );

        Ok(Shunt {
            redirects,
            statistics,
            config: self.config,
        })
    }
}

impl Default for ShuntBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Dataplane handle holding the published tables. Engines derived from it
/// share the tables; the handle itself is cheap to keep around.
#[derive(Debug)]
pub struct Shunt {
    redirects: Arc<LruTable<FlowKey, FlowKey>>,
    statistics: Arc<StatsMap>,
    config: EngineConfig,
}

impl Shunt {
    /// Derive the engine for one execution context.
    pub fn engine<F: FibLookup>(&self, replica: usize, fib: F) -> Result<RedirectEngine<F>, ShuntError> {
        if replica >= self.statistics.replicas() {
            return Err(ShuntError::InvalidConfiguration(format!(
                "replica {} out of range, {} configured",
                replica,
                self.statistics.replicas()
            )));
        }
        Ok(RedirectEngine::new(
            Arc::clone(&self.redirects),
            Arc::clone(&self.statistics),
            replica,
            self.config,
            fib,
        ))
    }

    pub fn redirects(&self) -> Arc<LruTable<FlowKey, FlowKey>> {
        Arc::clone(&self.redirects)
    }

    pub fn statistics(&self) -> Arc<StatsMap> {
        Arc::clone(&self.statistics)
    }
}
