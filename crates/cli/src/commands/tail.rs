// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `walscan tail --pchannel <name>` - Print the ordered stream of one channel

use super::{connect, open_scanner, BackendArgs};
use crate::config::Config;
use crate::output::{write_message, OutputFormat};
use anyhow::{anyhow, bail, Result};
use clap::Args;
use std::future::Future;
use std::io::Write;
use ws_core::{DeliverFilter, DeliverPolicy, MessageType};
use ws_engine::{ReadOption, Scanner};

#[derive(Args, Debug, Clone)]
pub struct TailArgs {
    /// Physical channel to read
    #[arg(long)]
    pub pchannel: String,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Only deliver this vchannel (plus broadcast messages)
    #[arg(long)]
    pub vchannel: Option<String>,

    /// Start position: all, latest, from:<id> or after:<id>
    #[arg(long, default_value = "all")]
    pub from: DeliverPolicy,

    /// Comma-separated message types to deliver
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<MessageType>,

    /// Only deliver messages with a time tick above this value
    #[arg(long)]
    pub after_tick: Option<u64>,

    /// Stop after printing this many messages (0 means no limit)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Also print time ticks and other WAL-generated messages
    #[arg(long)]
    pub show_system: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl TailArgs {
    pub fn read_option(&self) -> ReadOption {
        let mut option = ReadOption::new().deliver_policy(self.from);
        if let Some(vchannel) = &self.vchannel {
            option = option.vchannel(vchannel.clone());
        }
        if !self.types.is_empty() {
            option = option.filter(DeliverFilter::MessageType(self.types.clone()));
        }
        if let Some(tick) = self.after_tick {
            option = option.filter(DeliverFilter::TimeTickGt(tick));
        }
        option
    }

    fn limit(&self) -> Option<usize> {
        self.limit.filter(|limit| *limit > 0)
    }
}

pub async fn handle(args: TailArgs, config: &Config) -> Result<()> {
    validate(&args)?;
    let broker = connect(config, &args.backend)?;
    let mut scanner = open_scanner(
        &broker,
        &args.pchannel,
        args.read_option(),
        config.scanner_config(),
    )
    .await?;

    let result = print_stream(
        &mut scanner,
        &args,
        &mut std::io::stdout(),
        tokio::signal::ctrl_c(),
    )
    .await;
    if let Err(e) = scanner.close().await {
        tracing::warn!(error = %e, "scanner closed with error");
    }
    result.map(|_| ())
}

/// Print delivered messages until the limit, `stop` resolves, or the stream
/// ends. Returns how many messages were printed.
pub(crate) async fn print_stream<W, S>(
    scanner: &mut Scanner,
    args: &TailArgs,
    out: &mut W,
    stop: S,
) -> Result<usize>
where
    W: Write,
    S: Future,
{
    tokio::pin!(stop);
    let mut printed = 0;
    loop {
        let msg = tokio::select! {
            _ = &mut stop => {
                tracing::info!(printed, "interrupted, stopping consumption");
                return Ok(printed);
            }
            msg = scanner.recv() => msg,
        };

        let Some(msg) = msg else {
            return match scanner.done().await {
                Ok(()) => Err(anyhow!("scanner closed")),
                Err(e) => Err(anyhow!(e).context("scanner closed")),
            };
        };
        if !args.show_system && msg.message_type().is_self_controlled() {
            continue;
        }

        write_message(out, &msg, args.output)?;
        out.flush()?;
        printed += 1;

        if let Some(limit) = args.limit() {
            if printed >= limit {
                eprintln!("Reached limit {}, stopping consumption.", limit);
                return Ok(printed);
            }
        }
    }
}

/// Fail early on flags that can never match anything
pub fn validate(args: &TailArgs) -> Result<()> {
    if args.pchannel.trim().is_empty() {
        bail!("--pchannel must not be empty");
    }
    Ok(())
}

#[cfg(test)]
#[path = "tail_tests.rs"]
mod tests;
