// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker message identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Position of a message inside one physical channel.
///
/// Ids produced by the same backend for the same channel are totally ordered.
/// Comparing ids of different variants is meaningless but well defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageId {
    /// Monotonic sequence used by the in-process backends
    Sequence(u64),
    /// Pulsar ledger/entry/batch position
    Pulsar {
        ledger_id: i64,
        entry_id: i64,
        batch_index: i32,
    },
    /// Kafka partition offset
    Kafka { partition: i32, offset: i64 },
}

impl MessageId {
    /// Sequence number, if this id came from an in-process backend
    pub fn as_sequence(&self) -> Option<u64> {
        match self {
            MessageId::Sequence(seq) => Some(*seq),
            _ => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Sequence(seq) => write!(f, "{}", seq),
            MessageId::Pulsar {
                ledger_id,
                entry_id,
                batch_index,
            } => write!(f, "{}:{}:{}", ledger_id, entry_id, batch_index),
            MessageId::Kafka { partition, offset } => write!(f, "{}@{}", partition, offset),
        }
    }
}

/// Error parsing a message id from its display form
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid message id: {0}")]
pub struct ParseIdError(pub String);

impl FromStr for MessageId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ParseIdError(s.to_string());

        if let Some((partition, offset)) = s.split_once('@') {
            return Ok(MessageId::Kafka {
                partition: partition.parse().map_err(|_| invalid())?,
                offset: offset.parse().map_err(|_| invalid())?,
            });
        }

        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [seq] => seq.parse().map(MessageId::Sequence).map_err(|_| invalid()),
            [ledger, entry, batch] => Ok(MessageId::Pulsar {
                ledger_id: ledger.parse().map_err(|_| invalid())?,
                entry_id: entry.parse().map_err(|_| invalid())?,
                batch_index: batch.parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
