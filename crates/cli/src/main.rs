// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! walscan - ordered WAL inspection

mod commands;
mod config;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{compare, tail};
use config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "walscan",
    version,
    about = "Tail and compare WAL channels in time tick order"
)]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/walscan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter for stderr, e.g. `info` or `ws_engine=debug`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ordered message stream of one physical channel
    Tail(tail::TailArgs),
    /// Compare message streams of several physical channels
    Compare(compare::CompareArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    setup_logging(cli.log_level.as_deref(), &config);

    match cli.command {
        Commands::Tail(args) => tail::handle(args, &config).await,
        Commands::Compare(args) => compare::handle(args, &config).await,
    }
}

/// Logs go to stderr so stdout only carries messages.
///
/// The `--log-level` flag wins over `RUST_LOG`, which wins over the config file.
fn setup_logging(flag: Option<&str>, config: &Config) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match flag {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}
