// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deliver policies and deliver filters for scans

use crate::id::MessageId;
use crate::message::ImmutableMessage;
use crate::message_type::MessageType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Where a scan starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverPolicy {
    /// From the earliest retained message
    #[default]
    All,
    /// Only messages appended after the read starts
    Latest,
    /// From the given message, inclusive
    StartFrom(MessageId),
    /// From the message after the given one
    StartAfter(MessageId),
}

impl fmt::Display for DeliverPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliverPolicy::All => f.write_str("all"),
            DeliverPolicy::Latest => f.write_str("latest"),
            DeliverPolicy::StartFrom(id) => write!(f, "from:{}", id),
            DeliverPolicy::StartAfter(id) => write!(f, "after:{}", id),
        }
    }
}

impl FromStr for DeliverPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" | "earliest" => Ok(DeliverPolicy::All),
            "latest" => Ok(DeliverPolicy::Latest),
            other => {
                let (kind, id) = other
                    .split_once(':')
                    .ok_or_else(|| format!("unknown deliver policy: {}", other))?;
                let id: MessageId = id.parse().map_err(|e| format!("{}", e))?;
                match kind {
                    "from" => Ok(DeliverPolicy::StartFrom(id)),
                    "after" => Ok(DeliverPolicy::StartAfter(id)),
                    _ => Err(format!("unknown deliver policy: {}", other)),
                }
            }
        }
    }
}

/// Condition a message must meet to be delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverFilter {
    /// Time tick strictly greater than the value
    TimeTickGt(u64),
    /// Time tick greater than or equal to the value
    TimeTickGte(u64),
    /// One of the listed types (system types always pass)
    MessageType(Vec<MessageType>),
}

impl DeliverFilter {
    /// Whether the message passes this filter
    pub fn accepts(&self, msg: &ImmutableMessage) -> bool {
        match self {
            DeliverFilter::TimeTickGt(tick) => !judged_by_time_tick(msg) || msg.time_tick() > *tick,
            DeliverFilter::TimeTickGte(tick) => {
                !judged_by_time_tick(msg) || msg.time_tick() >= *tick
            }
            DeliverFilter::MessageType(types) => {
                msg.message_type().is_system() || types.contains(&msg.message_type())
            }
        }
    }
}

// A transaction is visible at its commit time, so only the commit marker of a
// transaction is judged by time tick.
fn judged_by_time_tick(msg: &ImmutableMessage) -> bool {
    msg.txn_context().is_none() || msg.message_type() == MessageType::CommitTxn
}

/// Combined filter, true means deliver
pub type MessageFilter = Arc<dyn Fn(&ImmutableMessage) -> bool + Send + Sync>;

/// Combine filters with AND; `None` when there is nothing to filter
pub fn filter_fn(filters: &[DeliverFilter]) -> Option<MessageFilter> {
    if filters.is_empty() {
        return None;
    }
    let filters = filters.to_vec();
    Some(Arc::new(move |msg: &ImmutableMessage| {
        filters.iter().all(|f| f.accepts(msg))
    }))
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
