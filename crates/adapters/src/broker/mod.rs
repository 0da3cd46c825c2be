// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker reader capability consumed by the scan pipeline

mod file;
mod memory;

pub use file::{FileBroker, FileBrokerConfig};
pub use memory::MemoryBroker;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BrokerCall, FakeBroker};

use async_trait::async_trait;
use thiserror::Error;
use ws_core::{DeliverPolicy, ImmutableMessage, PChannelInfo};

/// Errors from broker operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
    #[error("reader closed: {0}")]
    ReaderClosed(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("decode error at line {line}: {message}")]
    Decode { line: u64, message: String },
    #[error("invalid backend config: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for BrokerError {
    fn from(e: std::io::Error) -> Self {
        BrokerError::Io(e.to_string())
    }
}

/// Parameters of one read session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    /// Name of the reading scanner, for broker-side bookkeeping
    pub name: String,
    pub deliver_policy: DeliverPolicy,
    /// Messages the backend may fetch ahead of the consumer
    pub read_ahead_buffer_size: usize,
}

/// A connected broker backend
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Backend name, as registered
    fn name(&self) -> &str;

    /// Open a reader bound to one physical channel
    async fn open(&self, channel: PChannelInfo) -> Result<Box<dyn BrokerReader>, BrokerError>;
}

/// Per-physical-channel log reader
#[async_trait]
pub trait BrokerReader: Send + Sync + 'static {
    fn channel(&self) -> &PChannelInfo;

    /// Start a read session honoring the request's deliver policy
    async fn read(&self, request: ReadRequest) -> Result<Box<dyn ReadSession>, BrokerError>;

    /// Release the reader; later reads fail with `ReaderClosed`
    async fn close(&self);
}

/// One read over a channel, yielding messages in log order.
///
/// Dropping a pending `next` future abandons the session; callers close it
/// and open a new one instead of resuming.
#[async_trait]
pub trait ReadSession: Send + 'static {
    /// Next message, `Ok(None)` once the session has ended
    async fn next(&mut self) -> Result<Option<ImmutableMessage>, BrokerError>;

    async fn close(&mut self);
}
