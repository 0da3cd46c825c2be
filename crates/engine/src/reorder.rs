// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reorder buffer keyed by time tick.
//!
//! Messages wait here until a time tick confirms that nothing at or below
//! their tick can still arrive.

use crate::error::ReorderError;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use ws_core::ImmutableMessage;

struct Entry {
    time_tick: u64,
    /// Arrival order, breaks ties between equal ticks
    seq: u64,
    msg: ImmutableMessage,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time_tick, self.seq).cmp(&(other.time_tick, other.seq))
    }
}

/// Min-heap of buffered messages with a confirmed watermark
#[derive(Default)]
pub struct ReorderBuffer {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
    /// Highest time tick popped so far
    watermark: u64,
    bytes: usize,
}

impl ReorderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a message until its tick is confirmed.
    ///
    /// Fails when the tick is not above the watermark, since messages at or
    /// below it have already been released.
    pub fn push(&mut self, msg: ImmutableMessage) -> Result<(), ReorderError> {
        let time_tick = msg.time_tick();
        if time_tick <= self.watermark {
            return Err(ReorderError::TimeTickViolation {
                time_tick,
                watermark: self.watermark,
            });
        }
        self.bytes += msg.estimate_size();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry {
            time_tick,
            seq,
            msg,
        }));
        Ok(())
    }

    /// Remove every message with tick at or below `time_tick`, ascending.
    pub fn pop_until_time_tick(&mut self, time_tick: u64) -> Vec<ImmutableMessage> {
        let mut out = Vec::new();
        while let Some(Reverse(top)) = self.heap.peek() {
            if top.time_tick > time_tick {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                self.bytes = self.bytes.saturating_sub(entry.msg.estimate_size());
                out.push(entry.msg);
            }
        }
        self.watermark = self.watermark.max(time_tick);
        out
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Estimated size of buffered messages
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn watermark(&self) -> u64 {
        self.watermark
    }
}

#[cfg(test)]
#[path = "reorder_tests.rs"]
mod tests;
