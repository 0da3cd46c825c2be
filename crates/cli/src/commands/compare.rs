// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `walscan compare --pchannels a,b` - Check that channels carry the same
//! messages in the same order.
//!
//! Each round takes the next message that is not WAL-generated from every
//! channel and compares it against the first channel's message.

use super::{connect, open_scanner, BackendArgs};
use crate::config::Config;
use crate::error::CliError;
use crate::output::{format_consistent_round, write_inconsistency};
use anyhow::{bail, Result};
use clap::Args;
use std::future::Future;
use std::io::Write;
use ws_core::{ImmutableMessage, MessageId, MessageType};
use ws_engine::{ReadOption, Scanner};

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Comma-separated physical channels; the first is the reference
    #[arg(long, value_delimiter = ',', required = true)]
    pub pchannels: Vec<String>,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Stop after this many consistent rounds (0 means no limit)
    #[arg(long)]
    pub rounds: Option<usize>,
}

/// Id a message is compared by: the origin id of a replicated message,
/// otherwise its own id
pub fn logical_id(msg: &ImmutableMessage) -> MessageId {
    msg.replicate_header()
        .map(|header| header.message_id)
        .unwrap_or_else(|| msg.id())
}

/// Whether every message matches the first one
pub fn consistent(messages: &[ImmutableMessage]) -> bool {
    let Some((reference, rest)) = messages.split_first() else {
        return true;
    };
    rest.iter().all(|msg| {
        // A secondary cluster may append replicate config changes itself,
        // so only their type has to line up
        if reference.message_type() == MessageType::AlterReplicateConfig {
            return msg.message_type() == MessageType::AlterReplicateConfig;
        }
        msg.message_type() == reference.message_type() && logical_id(msg) == logical_id(reference)
    })
}

pub async fn handle(args: CompareArgs, config: &Config) -> Result<()> {
    let pchannels: Vec<String> = args
        .pchannels
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if pchannels.len() < 2 {
        return Err(CliError::too_few_pchannels(pchannels.len()).into());
    }

    let broker = connect(config, &args.backend)?;
    let mut scanners = Vec::with_capacity(pchannels.len());
    for pchannel in &pchannels {
        let scanner =
            open_scanner(&broker, pchannel, ReadOption::new(), config.scanner_config()).await?;
        scanners.push(scanner);
    }

    eprintln!("Starting message comparison. Press Ctrl+C to stop...");
    let result = compare_streams(
        &mut scanners,
        &pchannels,
        args.rounds,
        &mut std::io::stdout(),
        tokio::signal::ctrl_c(),
    )
    .await;

    for scanner in &scanners {
        if let Err(e) = scanner.close().await {
            tracing::warn!(channel = %scanner.channel().name, error = %e, "scanner closed with error");
        }
    }
    result.map(|_| ())
}

/// Compare rounds until the round limit, `stop` resolves, or a mismatch.
/// Returns the number of consistent rounds.
pub(crate) async fn compare_streams<W, S>(
    scanners: &mut [Scanner],
    pchannels: &[String],
    rounds: Option<usize>,
    out: &mut W,
    stop: S,
) -> Result<usize>
where
    W: Write,
    S: Future,
{
    tokio::pin!(stop);
    let rounds = rounds.filter(|r| *r > 0);
    let mut counts = vec![0usize; scanners.len()];
    let mut completed = 0;

    loop {
        let mut messages = Vec::with_capacity(scanners.len());
        for (scanner, count) in scanners.iter_mut().zip(counts.iter_mut()) {
            let msg = tokio::select! {
                _ = &mut stop => {
                    tracing::info!(completed, "interrupted, stopping comparison");
                    return Ok(completed);
                }
                msg = next_user_message(scanner) => msg?,
            };
            *count += 1;
            messages.push(msg);
        }

        if !consistent(&messages) {
            write_inconsistency(out, pchannels, &messages)?;
            out.flush()?;
            bail!("message inconsistency detected between pchannels");
        }

        writeln!(out, "{}", format_consistent_round(pchannels, &messages, &counts))?;
        out.flush()?;
        completed += 1;

        if rounds.is_some_and(|r| completed >= r) {
            return Ok(completed);
        }
    }
}

async fn next_user_message(scanner: &mut Scanner) -> Result<ImmutableMessage> {
    loop {
        match scanner.recv().await {
            Some(msg) if msg.message_type().is_self_controlled() => continue,
            Some(msg) => return Ok(msg),
            None => bail!("scanner of pchannel {} closed", scanner.channel().name),
        }
    }
}

#[cfg(test)]
#[path = "compare_tests.rs"]
mod tests;
