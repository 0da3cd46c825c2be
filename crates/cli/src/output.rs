// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use chrono::SecondsFormat;
use clap::ValueEnum;
use std::io::Write;
use ws_core::{tso, ImmutableMessage, MessageType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One serialized message per line
    Json,
}

fn format_time(time_tick: u64) -> String {
    tso::physical_time(time_tick)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "-".to_string())
}

/// One-line summary of a message
pub fn format_message_info(msg: &ImmutableMessage) -> String {
    let mut parts = vec![
        format!("[Type={}]", msg.message_type()),
        format!("[VChannel={}]", msg.vchannel()),
        format!("[TimeTick={}]", msg.time_tick()),
        format!("[Time={}]", format_time(msg.time_tick())),
        format!("[MessageID={}]", msg.id()),
    ];

    if let Some(header) = msg.replicate_header() {
        parts.push(format!("[rVChannel={}]", header.vchannel));
        parts.push(format!("[rTimeTick={}]", header.time_tick));
        parts.push(format!("[rTime={}]", format_time(header.time_tick)));
        parts.push(format!("[rMessageID={}]", header.message_id));
    }

    parts.push(format!("[Size={}]", msg.estimate_size()));
    parts.join(" ")
}

/// Write a delivered message. Transactions print a header line followed by
/// one indented line per member.
pub fn write_message<W: Write>(
    out: &mut W,
    msg: &ImmutableMessage,
    format: OutputFormat,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "{}", format_message_info(msg))?;
            if msg.message_type() == MessageType::Txn {
                for member in msg.txn_members() {
                    writeln!(out, "  {}", format_message_info(member))?;
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string(msg).map_err(std::io::Error::other)?;
            writeln!(out, "{}", json)?;
        }
    }
    Ok(())
}

/// Message id and time tick of a compared message, with the replicated
/// origin in parentheses
fn compared_position(msg: &ImmutableMessage) -> (String, String) {
    match msg.replicate_header() {
        Some(header) => (
            format!("{}(r:{})", msg.id(), header.message_id),
            format!("{}(r:{})", msg.time_tick(), header.time_tick),
        ),
        None => (msg.id().to_string(), msg.time_tick().to_string()),
    }
}

fn bracketed<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    let items: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    format!("[{}]", items.join(" "))
}

/// Summary line of a consistent compare round
pub fn format_consistent_round(
    pchannels: &[String],
    messages: &[ImmutableMessage],
    counts: &[usize],
) -> String {
    let message_type = messages
        .first()
        .map(|m| m.message_type().to_string())
        .unwrap_or_default();
    let (ids, ticks): (Vec<String>, Vec<String>) = messages.iter().map(compared_position).unzip();
    format!(
        "✅ [Type={}] [MessageIDs={}] [TimeTicks={}] [PChannels={}] [Counts={}]",
        message_type,
        bracketed(ids),
        bracketed(ticks),
        bracketed(pchannels),
        bracketed(counts),
    )
}

/// Report of an inconsistent compare round
pub fn write_inconsistency<W: Write>(
    out: &mut W,
    pchannels: &[String],
    messages: &[ImmutableMessage],
) -> std::io::Result<()> {
    writeln!(out, "❌ INCONSISTENCY DETECTED!")?;
    writeln!(out, "=== INCONSISTENT MESSAGES ===")?;
    for (pchannel, msg) in pchannels.iter().zip(messages) {
        writeln!(out, "PChannel {}: {}", pchannel, format_message_info(msg))?;
    }
    writeln!(out, "=============================")
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
