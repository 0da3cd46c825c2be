// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Physical channel identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a physical channel is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Inspection only; the diagnostic tool never writes
    #[default]
    ReadOnly,
    ReadWrite,
}

/// A physical broker-level channel (topic)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PChannelInfo {
    pub name: String,
    #[serde(default)]
    pub access_mode: AccessMode,
}

impl PChannelInfo {
    /// Read-only channel info, the only mode operators need
    pub fn read_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access_mode: AccessMode::ReadOnly,
        }
    }
}

impl fmt::Display for PChannelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
