// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL message types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a WAL message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    TimeTick,
    Insert,
    Delete,
    Flush,
    ManualFlush,
    CreateSegment,
    CreateCollection,
    DropCollection,
    CreatePartition,
    DropPartition,
    Import,
    SchemaChange,
    AlterReplicateConfig,
    BeginTxn,
    CommitTxn,
    RollbackTxn,
    /// A committed transaction delivered as one unit
    Txn,
}

const ALL: [MessageType; 17] = [
    MessageType::TimeTick,
    MessageType::Insert,
    MessageType::Delete,
    MessageType::Flush,
    MessageType::ManualFlush,
    MessageType::CreateSegment,
    MessageType::CreateCollection,
    MessageType::DropCollection,
    MessageType::CreatePartition,
    MessageType::DropPartition,
    MessageType::Import,
    MessageType::SchemaChange,
    MessageType::AlterReplicateConfig,
    MessageType::BeginTxn,
    MessageType::CommitTxn,
    MessageType::RollbackTxn,
    MessageType::Txn,
];

impl MessageType {
    /// Every known message type
    pub fn all() -> &'static [MessageType] {
        &ALL
    }

    /// Messages generated by the WAL itself rather than by a user request.
    ///
    /// Operators skip these when tailing or comparing channels.
    pub fn is_self_controlled(&self) -> bool {
        matches!(
            self,
            MessageType::TimeTick | MessageType::CreateSegment | MessageType::Flush
        )
    }

    /// Types that a message-type filter must never reject
    pub fn is_system(&self) -> bool {
        self.is_self_controlled() || self.is_txn_control()
    }

    /// Transaction markers and the composite transaction message
    pub fn is_txn_control(&self) -> bool {
        matches!(
            self,
            MessageType::BeginTxn
                | MessageType::CommitTxn
                | MessageType::RollbackTxn
                | MessageType::Txn
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::TimeTick => "TimeTick",
            MessageType::Insert => "Insert",
            MessageType::Delete => "Delete",
            MessageType::Flush => "Flush",
            MessageType::ManualFlush => "ManualFlush",
            MessageType::CreateSegment => "CreateSegment",
            MessageType::CreateCollection => "CreateCollection",
            MessageType::DropCollection => "DropCollection",
            MessageType::CreatePartition => "CreatePartition",
            MessageType::DropPartition => "DropPartition",
            MessageType::Import => "Import",
            MessageType::SchemaChange => "SchemaChange",
            MessageType::AlterReplicateConfig => "AlterReplicateConfig",
            MessageType::BeginTxn => "BeginTxn",
            MessageType::CommitTxn => "CommitTxn",
            MessageType::RollbackTxn => "RollbackTxn",
            MessageType::Txn => "Txn",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    /// Accepts both `CreateCollection` and `create_collection` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        ALL.iter()
            .copied()
            .find(|t| t.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("unknown message type: {}", s))
    }
}
