// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory broker backend.
//!
//! Each channel is an append-only vector of messages. Appended messages are
//! assigned `MessageId::Sequence` ids starting at 1, and open sessions tail
//! new appends.

use super::{Broker, BrokerError, BrokerReader, ReadRequest, ReadSession};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use ws_core::{DeliverPolicy, ImmutableMessage, MessageId, PChannelInfo};

struct MemoryLog {
    messages: Mutex<Vec<ImmutableMessage>>,
    /// Current length, watched by tailing sessions
    len_tx: watch::Sender<usize>,
}

impl MemoryLog {
    fn new() -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            messages: Mutex::new(Vec::new()),
            len_tx,
        }
    }

    fn append(&self, msg: ImmutableMessage) -> MessageId {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        let id = MessageId::Sequence(messages.len() as u64 + 1);
        messages.push(msg.with_id(id));
        self.len_tx.send_replace(messages.len());
        id
    }

    fn start_index(&self, policy: &DeliverPolicy) -> usize {
        let messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        match policy {
            DeliverPolicy::All => 0,
            DeliverPolicy::Latest => messages.len(),
            DeliverPolicy::StartFrom(id) => messages.partition_point(|m| m.id() < *id),
            DeliverPolicy::StartAfter(id) => messages.partition_point(|m| m.id() <= *id),
        }
    }

    fn fill(&self, from: usize, max: usize, out: &mut VecDeque<ImmutableMessage>) {
        let messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        let end = messages.len().min(from + max);
        if from < end {
            out.extend(messages[from..end].iter().cloned());
        }
    }
}

/// In-process broker, shared by clones
#[derive(Clone, Default)]
pub struct MemoryBroker {
    channels: Arc<Mutex<HashMap<String, Arc<MemoryLog>>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self, channel: &str) -> Arc<MemoryLog> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            channels
                .entry(channel.to_string())
                .or_insert_with(|| Arc::new(MemoryLog::new())),
        )
    }

    /// Append a message to a channel, creating the channel if needed
    pub fn append(&self, channel: &str, msg: ImmutableMessage) -> MessageId {
        self.log(channel).append(msg)
    }

    /// Append several messages in order
    pub fn append_all(
        &self,
        channel: &str,
        msgs: impl IntoIterator<Item = ImmutableMessage>,
    ) -> Vec<MessageId> {
        let log = self.log(channel);
        msgs.into_iter().map(|m| log.append(m)).collect()
    }

    /// Snapshot of a channel's messages
    pub fn messages(&self, channel: &str) -> Vec<ImmutableMessage> {
        self.log(channel)
            .messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn reader(&self, channel: PChannelInfo) -> MemoryReader {
        MemoryReader {
            log: self.log(&channel.name),
            channel,
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    fn name(&self) -> &str {
        "memory"
    }

    async fn open(&self, channel: PChannelInfo) -> Result<Box<dyn BrokerReader>, BrokerError> {
        Ok(Box::new(self.reader(channel)))
    }
}

pub(crate) struct MemoryReader {
    log: Arc<MemoryLog>,
    channel: PChannelInfo,
    closed: AtomicBool,
}

impl MemoryReader {
    pub(crate) fn session(&self, request: &ReadRequest) -> Result<MemorySession, BrokerError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrokerError::ReaderClosed(self.channel.name.clone()));
        }
        Ok(MemorySession {
            log: Arc::clone(&self.log),
            len_rx: self.log.len_tx.subscribe(),
            cursor: self.log.start_index(&request.deliver_policy),
            batch: request.read_ahead_buffer_size.max(1),
            buffer: VecDeque::new(),
            closed: false,
        })
    }
}

#[async_trait]
impl BrokerReader for MemoryReader {
    fn channel(&self) -> &PChannelInfo {
        &self.channel
    }

    async fn read(&self, request: ReadRequest) -> Result<Box<dyn ReadSession>, BrokerError> {
        Ok(Box::new(self.session(&request)?))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub(crate) struct MemorySession {
    log: Arc<MemoryLog>,
    len_rx: watch::Receiver<usize>,
    /// Index of the next message to fetch from the log
    cursor: usize,
    batch: usize,
    buffer: VecDeque<ImmutableMessage>,
    closed: bool,
}

#[async_trait]
impl ReadSession for MemorySession {
    async fn next(&mut self) -> Result<Option<ImmutableMessage>, BrokerError> {
        loop {
            if self.closed {
                return Ok(None);
            }
            if let Some(msg) = self.buffer.pop_front() {
                return Ok(Some(msg));
            }
            let len = *self.len_rx.borrow_and_update();
            if self.cursor < len {
                self.log.fill(self.cursor, self.batch, &mut self.buffer);
                self.cursor += self.buffer.len();
                continue;
            }
            if self.len_rx.changed().await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        self.buffer.clear();
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
