// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner: ordered, transactionally consistent reads of one channel.
//!
//! A scanner runs two tasks. The produce task drives the catchup scanner
//! against the broker reader; the consume task orders what it produces and
//! feeds the message handler. Both stop on one cancellation token.

use crate::backoff::BackoffConfig;
use crate::catchup::CatchupScanner;
use crate::consume::{ConsumeLoop, Ordering};
use crate::error::ScanError;
use crate::handler::{ChanMessageHandler, MessageHandler};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, OnceCell};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use ws_adapters::BrokerReader;
use ws_core::{filter_fn, DeliverFilter, DeliverPolicy, ImmutableMessage, PChannelInfo, ScanLimits};

/// Read-ahead buffer size used when none is configured
pub const DEFAULT_READ_AHEAD_BUFFER_SIZE: i64 = 64;

/// What a scanner reads and where it delivers
#[derive(Default)]
pub struct ReadOption {
    /// Only deliver messages of this vchannel, plus broadcast messages
    pub vchannel: Option<String>,
    pub deliver_policy: DeliverPolicy,
    /// Combined with AND; system messages always pass
    pub filters: Vec<DeliverFilter>,
    /// Custom delivery sink; when absent, messages go to [`Scanner::chan`]
    pub handler: Option<Box<dyn MessageHandler>>,
}

impl ReadOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vchannel(mut self, vchannel: impl Into<String>) -> Self {
        self.vchannel = Some(vchannel.into());
        self
    }

    pub fn deliver_policy(mut self, policy: DeliverPolicy) -> Self {
        self.deliver_policy = policy;
        self
    }

    pub fn filter(mut self, filter: DeliverFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn handler(mut self, handler: impl MessageHandler) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }
}

/// Tuning of a scanner
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    /// Messages the broker may prefetch; negative values mean 0
    pub read_ahead_buffer_size: i64,
    pub backoff: BackoffConfig,
    pub limits: ScanLimits,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            read_ahead_buffer_size: DEFAULT_READ_AHEAD_BUFFER_SIZE,
            backoff: BackoffConfig::default(),
            limits: ScanLimits::default(),
        }
    }
}

impl ScannerConfig {
    /// Fast backoff and a tiny pending threshold
    pub fn for_testing() -> Self {
        Self {
            read_ahead_buffer_size: 4,
            backoff: BackoffConfig::for_testing(),
            limits: ScanLimits::for_testing(),
        }
    }

    pub(crate) fn read_ahead(&self) -> usize {
        usize::try_from(self.read_ahead_buffer_size.max(0)).unwrap_or(usize::MAX)
    }
}

type Finish = Option<Result<(), ScanError>>;

/// An open scan over one physical channel
pub struct Scanner {
    name: String,
    channel: PChannelInfo,
    reader: Arc<dyn BrokerReader>,
    cancel: CancellationToken,
    rx: Option<mpsc::Receiver<ImmutableMessage>>,
    finish: watch::Receiver<Finish>,
    cleanup: Arc<OnceCell<()>>,
}

impl Scanner {
    /// Start scanning. Must be called within a tokio runtime.
    pub fn new(reader: Arc<dyn BrokerReader>, option: ReadOption, config: ScannerConfig) -> Self {
        let channel = reader.channel().clone();
        let name = channel.name.clone();
        let span = tracing::info_span!(
            "scanner",
            component = "scanner",
            name = %name,
            channel = %channel.name,
        );

        let cancel = CancellationToken::new();
        let (raw_tx, raw_rx) = mpsc::channel(config.limits.raw_channel_capacity.max(1));
        let (handler, rx): (Box<dyn MessageHandler>, _) = match option.handler {
            Some(handler) => (handler, None),
            None => {
                let (handler, rx) =
                    ChanMessageHandler::new(config.limits.delivery_channel_capacity);
                (Box::new(handler), Some(rx))
            }
        };
        let (finish_tx, finish) = watch::channel(None);

        let catchup = CatchupScanner::new(
            name.clone(),
            Arc::clone(&reader),
            option.deliver_policy,
            config.read_ahead(),
            config.backoff.clone(),
            raw_tx,
        );
        let produce = {
            let cancel = cancel.clone();
            tokio::spawn(
                async move {
                    tracing::info!("start produce loop of scanner");
                    match catchup.run(cancel.clone()).await {
                        Ok(()) => tracing::info!("the produce loop of scanner is closed"),
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                "the produce loop of scanner is closed with unexpected error"
                            );
                            cancel.cancel();
                        }
                    }
                }
                .instrument(span.clone()),
            )
        };

        let mut consume = ConsumeLoop::new(
            Ordering::new(option.vchannel, filter_fn(&option.filters)),
            handler,
            raw_rx,
            config.limits.clone(),
        );
        {
            let cancel = cancel.clone();
            tokio::spawn(
                async move {
                    tracing::info!("scanner start background task");
                    let result = consume.run(&cancel).await;
                    match &result {
                        Ok(()) => tracing::info!("the consume loop of scanner is closed"),
                        Err(e) => tracing::warn!(
                            error = %e,
                            "the consume loop of scanner is closed with unexpected error"
                        ),
                    }
                    cancel.cancel();
                    consume.close().await;
                    if let Err(e) = produce.await {
                        tracing::warn!(error = %e, "produce task failed");
                    }
                    finish_tx.send_replace(Some(result));
                    tracing::info!("scanner is closed");
                }
                .instrument(span),
            );
        }

        Self {
            name,
            channel,
            reader,
            cancel,
            rx,
            finish,
            cleanup: Arc::new(OnceCell::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel this scanner reads
    pub fn channel(&self) -> &PChannelInfo {
        &self.channel
    }

    /// Ordered message stream, `None` when a custom handler was supplied
    pub fn chan(&mut self) -> Option<&mut mpsc::Receiver<ImmutableMessage>> {
        self.rx.as_mut()
    }

    /// Next ordered message; `None` once the scanner finished or when a
    /// custom handler was supplied
    pub async fn recv(&mut self) -> Option<ImmutableMessage> {
        self.rx.as_mut()?.recv().await
    }

    /// Wait for the scanner to finish without stopping it
    pub async fn done(&self) -> Result<(), ScanError> {
        let mut finish = self.finish.clone();
        let finished = match finish.wait_for(|f| f.is_some()).await {
            Ok(finished) => finished.clone(),
            Err(_) => return Err(ScanError::Aborted),
        };
        finished.unwrap_or(Ok(()))
    }

    /// Stop both loops, release the broker reader and return the terminal
    /// result. Safe to call more than once.
    pub async fn close(&self) -> Result<(), ScanError> {
        self.cancel.cancel();
        let result = self.done().await;
        let reader = Arc::clone(&self.reader);
        self.cleanup
            .get_or_init(|| async move {
                reader.close().await;
                tracing::debug!(channel = %reader.channel().name, "broker reader released");
            })
            .await;
        result
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.cancel.cancel();
        if self.cleanup.initialized() {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let cleanup = Arc::clone(&self.cleanup);
            let reader = Arc::clone(&self.reader);
            handle.spawn(async move {
                cleanup.get_or_init(|| async move { reader.close().await }).await;
            });
        }
    }
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
