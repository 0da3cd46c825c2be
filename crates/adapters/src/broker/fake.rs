// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake broker for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::memory::{MemoryReader, MemorySession};
use super::{Broker, BrokerError, BrokerReader, MemoryBroker, ReadRequest, ReadSession};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use ws_core::{DeliverPolicy, ImmutableMessage, MessageId, PChannelInfo};

/// Recorded broker call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    Open {
        channel: String,
    },
    Read {
        channel: String,
        deliver_policy: DeliverPolicy,
        read_ahead_buffer_size: usize,
    },
    CloseReader {
        channel: String,
    },
}

#[derive(Default)]
struct FakeState {
    calls: Vec<BrokerCall>,
    /// Reads still to fail before one succeeds
    failing_reads: usize,
    /// Per-session message budgets; a session fails once its budget is spent
    session_budgets: VecDeque<usize>,
    delivered: usize,
}

/// Fake broker backed by a [`MemoryBroker`], with failure injection
#[derive(Clone, Default)]
pub struct FakeBroker {
    memory: MemoryBroker,
    state: Arc<Mutex<FakeState>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying log, for appending messages
    pub fn memory(&self) -> &MemoryBroker {
        &self.memory
    }

    pub fn append(&self, channel: &str, msg: ImmutableMessage) -> MessageId {
        self.memory.append(channel, msg)
    }

    pub fn append_all(
        &self,
        channel: &str,
        msgs: impl IntoIterator<Item = ImmutableMessage>,
    ) -> Vec<MessageId> {
        self.memory.append_all(channel, msgs)
    }

    /// Make the next `count` read calls fail
    pub fn fail_next_reads(&self, count: usize) {
        self.lock().failing_reads = count;
    }

    /// Make the next opened session fail after delivering `count` messages.
    ///
    /// Calls queue up: each budget applies to one later session.
    pub fn fail_session_after(&self, count: usize) {
        self.lock().session_budgets.push_back(count);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.lock().calls.clone()
    }

    /// Deliver policies of every read attempt, in order
    pub fn read_policies(&self) -> Vec<DeliverPolicy> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BrokerCall::Read { deliver_policy, .. } => Some(*deliver_policy),
                _ => None,
            })
            .collect()
    }

    /// Number of times any reader was closed
    pub fn reader_close_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, BrokerCall::CloseReader { .. }))
            .count()
    }

    /// Messages handed out by all sessions so far
    pub fn delivered_count(&self) -> usize {
        self.lock().delivered
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Broker for FakeBroker {
    fn name(&self) -> &str {
        "fake"
    }

    async fn open(&self, channel: PChannelInfo) -> Result<Box<dyn BrokerReader>, BrokerError> {
        self.lock().calls.push(BrokerCall::Open {
            channel: channel.name.clone(),
        });
        Ok(Box::new(FakeReader {
            inner: self.memory.reader(channel),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeReader {
    inner: MemoryReader,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl BrokerReader for FakeReader {
    fn channel(&self) -> &PChannelInfo {
        self.inner.channel()
    }

    async fn read(&self, request: ReadRequest) -> Result<Box<dyn ReadSession>, BrokerError> {
        let budget = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.calls.push(BrokerCall::Read {
                channel: self.inner.channel().name.clone(),
                deliver_policy: request.deliver_policy,
                read_ahead_buffer_size: request.read_ahead_buffer_size,
            });
            if state.failing_reads > 0 {
                state.failing_reads -= 1;
                return Err(BrokerError::ReadFailed("injected read failure".to_string()));
            }
            state.session_budgets.pop_front()
        };

        Ok(Box::new(FakeSession {
            inner: self.inner.session(&request)?,
            budget,
            state: Arc::clone(&self.state),
        }))
    }

    async fn close(&self) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .push(BrokerCall::CloseReader {
                channel: self.inner.channel().name.clone(),
            });
        self.inner.close().await;
    }
}

struct FakeSession {
    inner: MemorySession,
    budget: Option<usize>,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl ReadSession for FakeSession {
    async fn next(&mut self) -> Result<Option<ImmutableMessage>, BrokerError> {
        if self.budget == Some(0) {
            return Err(BrokerError::ReadFailed("injected session failure".to_string()));
        }
        let msg = self.inner.next().await?;
        if msg.is_some() {
            if let Some(budget) = self.budget.as_mut() {
                *budget -= 1;
            }
            self.state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .delivered += 1;
        }
        Ok(msg)
    }

    async fn close(&mut self) {
        self.inner.close().await;
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
