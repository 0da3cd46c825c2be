// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Buffering limits for the scan pipeline.
//!
//! These limits bound how much a scanner holds in memory when the consumer
//! is slower than the broker.

/// Pending queue length above which a scanner stops reading upstream
pub const PENDING_QUEUE_THRESHOLD: usize = 16;

/// Buffering limits for one scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLimits {
    /// Upstream intake is disabled while the pending queue is longer than this
    pub pending_queue_threshold: usize,
    /// Capacity of the channel between the produce and consume loops
    pub raw_channel_capacity: usize,
    /// Capacity of the delivery channel behind `Scanner::chan`
    pub delivery_channel_capacity: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            pending_queue_threshold: PENDING_QUEUE_THRESHOLD,
            raw_channel_capacity: 1,
            delivery_channel_capacity: 1,
        }
    }
}

impl ScanLimits {
    /// Limits suitable for testing (tiny threshold).
    pub fn for_testing() -> Self {
        Self {
            pending_queue_threshold: 2,
            ..Self::default()
        }
    }

    /// Whether the consume loop may take another raw message
    pub fn accepts_upstream(&self, pending_len: usize) -> bool {
        pending_len <= self.pending_queue_threshold
    }
}
