// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend registry.
//!
//! Maps backend names to builders. Backends are registered explicitly;
//! looking up a name nobody registered fails instead of falling back to a
//! default backend.

use crate::broker::{Broker, BrokerError, FileBroker, FileBrokerConfig, MemoryBroker};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Settings handed to a backend builder
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Broker address for networked backends
    pub address: Option<String>,
    /// Directory for file-based backends
    pub data_dir: Option<PathBuf>,
    /// Tail poll interval for file-based backends
    pub poll_interval: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            address: None,
            data_dir: None,
            poll_interval: Duration::from_millis(200),
        }
    }
}

/// Creates a broker from backend settings
pub trait BackendBuilder: Send + Sync + 'static {
    fn build(&self, config: &BackendConfig) -> Result<Arc<dyn Broker>, BrokerError>;
}

impl<F> BackendBuilder for F
where
    F: Fn(&BackendConfig) -> Result<Arc<dyn Broker>, BrokerError> + Send + Sync + 'static,
{
    fn build(&self, config: &BackendConfig) -> Result<Arc<dyn Broker>, BrokerError> {
        self(config)
    }
}

/// Name to builder map, case-insensitive
#[derive(Clone, Default)]
pub struct BackendRegistry {
    builders: HashMap<String, Arc<dyn BackendBuilder>>,
}

impl BackendRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the in-process `memory` and `file` backends
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register_memory(MemoryBroker::new());
        registry.register("file", |config: &BackendConfig| {
            let data_dir = config.data_dir.clone().ok_or_else(|| {
                BrokerError::InvalidConfig("file backend requires a data directory".to_string())
            })?;
            let broker: Arc<dyn Broker> = Arc::new(FileBroker::new(FileBrokerConfig {
                data_dir,
                poll_interval: config.poll_interval,
            }));
            Ok(broker)
        });
        registry
    }

    /// Register a builder, replacing any previous one with the same name
    pub fn register(&mut self, name: &str, builder: impl BackendBuilder) {
        self.builders
            .insert(name.to_ascii_lowercase(), Arc::new(builder));
    }

    /// Register `memory` as the given broker, so callers can pre-populate it
    pub fn register_memory(&mut self, broker: MemoryBroker) {
        self.register("memory", move |_: &BackendConfig| {
            let broker: Arc<dyn Broker> = Arc::new(broker.clone());
            Ok(broker)
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builders.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up a builder by name
    pub fn get(&self, name: &str) -> Result<Arc<dyn BackendBuilder>, BrokerError> {
        self.builders
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| BrokerError::UnsupportedBackend(name.to_string()))
    }

    /// Build the named backend
    pub fn build(&self, name: &str, config: &BackendConfig) -> Result<Arc<dyn Broker>, BrokerError> {
        let builder = self.get(name)?;
        tracing::debug!(backend = name, "building broker backend");
        builder.build(config)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
