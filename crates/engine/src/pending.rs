// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending queue between ordering and delivery

use std::collections::VecDeque;
use ws_core::ImmutableMessage;

/// FIFO of confirmed messages awaiting delivery.
///
/// The head stays in place while a delivery is attempted and is only removed
/// by [`PendingQueue::advance`] once the handler confirmed it.
#[derive(Default)]
pub struct PendingQueue {
    queue: VecDeque<ImmutableMessage>,
    bytes: usize,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an ordered batch
    pub fn add(&mut self, msgs: impl IntoIterator<Item = ImmutableMessage>) {
        for msg in msgs {
            self.bytes += msg.estimate_size();
            self.queue.push_back(msg);
        }
    }

    /// Next message to deliver, without removing it
    pub fn next(&self) -> Option<&ImmutableMessage> {
        self.queue.front()
    }

    /// Drop the head after it was delivered
    pub fn advance(&mut self) {
        if let Some(msg) = self.queue.pop_front() {
            self.bytes = self.bytes.saturating_sub(msg.estimate_size());
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Estimated size of queued messages
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}
