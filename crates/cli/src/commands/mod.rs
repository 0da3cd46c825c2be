// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod compare;
pub mod tail;

use crate::config::Config;
use crate::error::CliError;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use ws_adapters::{BackendRegistry, Broker, BrokerError, TracedBroker};
use ws_core::PChannelInfo;
use ws_engine::{ReadOption, Scanner, ScannerConfig};

/// Backend selection shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// WAL backend to read from (overrides the config file)
    #[arg(long)]
    pub backend: Option<String>,

    /// Directory of `<pchannel>.jsonl` dumps for the file backend
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Build the selected backend, wrapped with tracing
pub fn connect(config: &Config, args: &BackendArgs) -> Result<Arc<dyn Broker>, CliError> {
    let name = args.backend.as_deref().unwrap_or(&config.backend);
    let mut backend_config = config.backend_config();
    if let Some(dir) = &args.data_dir {
        backend_config.data_dir = Some(dir.clone());
    }

    let registry = BackendRegistry::with_builtin();
    if !registry.contains(name) {
        return Err(CliError::unsupported_backend(name, &registry.names()));
    }

    let broker = registry
        .build(name, &backend_config)
        .map_err(|e| match e {
            BrokerError::InvalidConfig(_) if backend_config.data_dir.is_none() => {
                CliError::missing_data_dir(name)
            }
            e => CliError::backend_failed(name, e),
        })?;
    tracing::debug!(backend = name, "backend ready");
    Ok(Arc::new(TracedBroker::new(broker)))
}

/// Open a reader on one physical channel and start scanning it
pub async fn open_scanner(
    broker: &Arc<dyn Broker>,
    pchannel: &str,
    option: ReadOption,
    config: ScannerConfig,
) -> anyhow::Result<Scanner> {
    let reader = broker
        .open(PChannelInfo::read_only(pchannel))
        .await
        .with_context(|| format!("failed to open pchannel {}", pchannel))?;
    Ok(Scanner::new(Arc::from(reader), option, config))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
