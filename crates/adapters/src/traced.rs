// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced broker wrappers for consistent observability

use crate::broker::{Broker, BrokerError, BrokerReader, ReadRequest, ReadSession};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;
use ws_core::PChannelInfo;

/// Wrapper that adds tracing to any broker
#[derive(Clone)]
pub struct TracedBroker {
    inner: Arc<dyn Broker>,
}

impl TracedBroker {
    pub fn new(inner: Arc<dyn Broker>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Broker for TracedBroker {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn open(&self, channel: PChannelInfo) -> Result<Box<dyn BrokerReader>, BrokerError> {
        let span = tracing::info_span!(
            "broker.open",
            backend = self.inner.name(),
            channel = %channel.name,
        );

        async move {
            // Precondition: a reader is always bound to a named channel
            if channel.name.is_empty() {
                tracing::error!("channel name is empty");
                return Err(BrokerError::ChannelNotFound(
                    "empty channel name".to_string(),
                ));
            }

            tracing::info!(access_mode = ?channel.access_mode, "opening reader");
            let start = std::time::Instant::now();
            let result = self.inner.open(channel).await;
            let elapsed = start.elapsed();

            match result {
                Ok(reader) => {
                    tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "reader opened");
                    let traced: Box<dyn BrokerReader> = Box::new(TracedBrokerReader::new(reader));
                    Ok(traced)
                }
                Err(e) => {
                    tracing::error!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %e,
                        "open failed"
                    );
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any broker reader
pub struct TracedBrokerReader {
    inner: Box<dyn BrokerReader>,
}

impl TracedBrokerReader {
    pub fn new(inner: Box<dyn BrokerReader>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl BrokerReader for TracedBrokerReader {
    fn channel(&self) -> &PChannelInfo {
        self.inner.channel()
    }

    async fn read(&self, request: ReadRequest) -> Result<Box<dyn ReadSession>, BrokerError> {
        let span = tracing::info_span!(
            "broker.read",
            channel = %self.inner.channel().name,
            name = %request.name,
            policy = %request.deliver_policy,
        );

        async move {
            tracing::debug!(
                read_ahead = request.read_ahead_buffer_size,
                "starting read session"
            );
            let start = std::time::Instant::now();
            let result = self.inner.read(request).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(_) => tracing::info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "read session started"
                ),
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "read failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn close(&self) {
        let span = tracing::info_span!("broker.close", channel = %self.inner.channel().name);
        async {
            self.inner.close().await;
            tracing::info!("reader closed");
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
