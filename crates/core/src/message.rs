// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable WAL messages.
//!
//! Messages are shared, never mutated after construction and cheap to clone,
//! so the same message can sit in a buffer and in flight to a consumer.

use crate::id::MessageId;
use crate::message_type::MessageType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Transaction membership of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxnContext {
    pub txn_id: i64,
    /// How long the transaction may stay open; 0 never expires
    #[serde(default)]
    pub keepalive_ms: u64,
}

impl TxnContext {
    pub fn new(txn_id: i64, keepalive: Duration) -> Self {
        Self {
            txn_id,
            keepalive_ms: keepalive.as_millis() as u64,
        }
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms)
    }
}

/// Origin of a message replicated from another cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplicateHeader {
    pub cluster_id: String,
    pub message_id: MessageId,
    #[serde(default)]
    pub last_confirmed_message_id: Option<MessageId>,
    pub time_tick: u64,
    #[serde(default)]
    pub vchannel: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageInner {
    id: MessageId,
    #[serde(rename = "type")]
    message_type: MessageType,
    time_tick: u64,
    #[serde(default)]
    vchannel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    txn: Option<TxnContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    replicate_header: Option<ReplicateHeader>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    payload: Vec<u8>,
    #[serde(default = "default_persisted")]
    persisted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    members: Vec<ImmutableMessage>,
}

fn default_persisted() -> bool {
    true
}

/// A message read from the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmutableMessage {
    inner: Arc<MessageInner>,
}

impl ImmutableMessage {
    /// Build a committed transaction out of its markers and body.
    ///
    /// The composite takes its id, time tick and vchannel from the commit
    /// marker; members keep their original relative order.
    pub fn txn(
        begin: ImmutableMessage,
        body: Vec<ImmutableMessage>,
        commit: ImmutableMessage,
    ) -> ImmutableMessage {
        let mut members = Vec::with_capacity(body.len() + 2);
        members.push(begin);
        members.extend(body);
        members.push(commit.clone());

        ImmutableMessage {
            inner: Arc::new(MessageInner {
                id: commit.inner.id,
                message_type: MessageType::Txn,
                time_tick: commit.inner.time_tick,
                vchannel: commit.inner.vchannel.clone(),
                txn: commit.inner.txn,
                replicate_header: commit.inner.replicate_header.clone(),
                properties: BTreeMap::new(),
                payload: Vec::new(),
                persisted: true,
                members,
            }),
        }
    }

    pub fn id(&self) -> MessageId {
        self.inner.id
    }

    pub fn message_type(&self) -> MessageType {
        self.inner.message_type
    }

    pub fn time_tick(&self) -> u64 {
        self.inner.time_tick
    }

    /// Logical channel, empty for broadcast messages
    pub fn vchannel(&self) -> &str {
        &self.inner.vchannel
    }

    pub fn txn_context(&self) -> Option<&TxnContext> {
        self.inner.txn.as_ref()
    }

    pub fn replicate_header(&self) -> Option<&ReplicateHeader> {
        self.inner.replicate_header.as_ref()
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.inner.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.inner.properties.get(key).map(String::as_str)
    }

    pub fn payload(&self) -> &[u8] {
        &self.inner.payload
    }

    /// False for time ticks the WAL generated in memory without writing them
    pub fn is_persisted(&self) -> bool {
        self.inner.persisted
    }

    /// Members of a committed transaction, empty for other messages
    pub fn txn_members(&self) -> &[ImmutableMessage] {
        &self.inner.members
    }

    /// Approximate in-memory footprint used for buffer accounting
    pub fn estimate_size(&self) -> usize {
        if self.inner.message_type == MessageType::Txn {
            return self.inner.members.iter().map(|m| m.estimate_size()).sum();
        }
        let properties: usize = self
            .inner
            .properties
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum();
        self.inner.payload.len() + properties
    }

    /// Copy of this message positioned at a different id
    pub fn with_id(&self, id: MessageId) -> ImmutableMessage {
        let mut inner = (*self.inner).clone();
        inner.id = id;
        ImmutableMessage {
            inner: Arc::new(inner),
        }
    }
}

impl Serialize for ImmutableMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ImmutableMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        MessageInner::deserialize(deserializer).map(|inner| ImmutableMessage {
            inner: Arc::new(inner),
        })
    }
}

/// Builder for messages appended to in-process backends and used in tests
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    inner: MessageInner,
}

impl MessageBuilder {
    pub fn new(message_type: MessageType) -> Self {
        Self {
            inner: MessageInner {
                id: MessageId::Sequence(0),
                message_type,
                time_tick: 0,
                vchannel: String::new(),
                txn: None,
                replicate_header: None,
                properties: BTreeMap::new(),
                payload: Vec::new(),
                persisted: true,
                members: Vec::new(),
            },
        }
    }

    /// Time tick message with the given watermark
    pub fn time_tick(time_tick: u64) -> Self {
        Self::new(MessageType::TimeTick).tick(time_tick)
    }

    pub fn id(mut self, id: MessageId) -> Self {
        self.inner.id = id;
        self
    }

    pub fn tick(mut self, time_tick: u64) -> Self {
        self.inner.time_tick = time_tick;
        self
    }

    pub fn vchannel(mut self, vchannel: impl Into<String>) -> Self {
        self.inner.vchannel = vchannel.into();
        self
    }

    pub fn txn(mut self, txn: TxnContext) -> Self {
        self.inner.txn = Some(txn);
        self
    }

    pub fn replicate_header(mut self, header: ReplicateHeader) -> Self {
        self.inner.replicate_header = Some(header);
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.properties.insert(key.into(), value.into());
        self
    }

    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.inner.payload = payload.into();
        self
    }

    pub fn persisted(mut self, persisted: bool) -> Self {
        self.inner.persisted = persisted;
        self
    }

    pub fn build(self) -> ImmutableMessage {
        ImmutableMessage {
            inner: Arc::new(self.inner),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
