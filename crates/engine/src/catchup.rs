// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catchup scanner: the produce loop of a scanner.
//!
//! Opens read sessions on the broker reader and forwards messages in
//! arrival order. Broker failures are retried with backoff until the
//! scanner is cancelled. After the first forwarded message, reconnects
//! resume right after the last forwarded id.

use crate::backoff::{BackoffConfig, BackoffTimer};
use crate::error::ScanError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ws_adapters::{BrokerError, BrokerReader, ReadRequest, ReadSession};
use ws_core::{DeliverPolicy, ImmutableMessage, MessageId};

enum SessionEnd {
    Cancelled,
    /// The consume loop dropped the raw channel
    RawClosed,
    Ended { forwarded: usize },
    Failed { error: BrokerError, forwarded: usize },
}

pub(crate) struct CatchupScanner {
    name: String,
    reader: Arc<dyn BrokerReader>,
    deliver_policy: DeliverPolicy,
    read_ahead_buffer_size: usize,
    backoff: BackoffTimer,
    tx: mpsc::Sender<ImmutableMessage>,
    last_id: Option<MessageId>,
}

impl CatchupScanner {
    pub(crate) fn new(
        name: String,
        reader: Arc<dyn BrokerReader>,
        deliver_policy: DeliverPolicy,
        read_ahead_buffer_size: usize,
        backoff: BackoffConfig,
        tx: mpsc::Sender<ImmutableMessage>,
    ) -> Self {
        Self {
            name,
            reader,
            deliver_policy,
            read_ahead_buffer_size,
            backoff: BackoffTimer::new(backoff),
            tx,
            last_id: None,
        }
    }

    /// Run until cancelled.
    ///
    /// Returns `Ok` on cancellation and `RawChannelClosed` when the consume
    /// loop is gone. Broker errors never end the loop.
    pub(crate) async fn run(mut self, cancel: CancellationToken) -> Result<(), ScanError> {
        self.backoff.enable_backoff();
        loop {
            let Some(mut session) = self.create_session_with_backoff(&cancel).await else {
                return Ok(());
            };
            let end = self.consume_with_session(session.as_mut(), &cancel).await;
            session.close().await;

            let (forwarded, error) = match end {
                SessionEnd::Cancelled => return Ok(()),
                SessionEnd::RawClosed => return Err(ScanError::RawChannelClosed),
                SessionEnd::Ended { forwarded } => (forwarded, None),
                SessionEnd::Failed { error, forwarded } => (forwarded, Some(error)),
            };
            if forwarded > 0 {
                self.backoff.reset();
            }
            match error {
                Some(error) => {
                    let interval = self.backoff.next_interval();
                    tracing::warn!(
                        error = %error,
                        forwarded,
                        next_interval_ms = interval.as_millis() as u64,
                        "read session interrupted, start a backoff"
                    );
                    if !wait(interval, &cancel).await {
                        return Ok(());
                    }
                }
                None if forwarded == 0 => {
                    let interval = self.backoff.next_interval();
                    tracing::info!(
                        next_interval_ms = interval.as_millis() as u64,
                        "read session ended without messages, reopening after backoff"
                    );
                    if !wait(interval, &cancel).await {
                        return Ok(());
                    }
                }
                None => tracing::info!(forwarded, "read session ended, reopening"),
            }
        }
    }

    fn next_policy(&self) -> DeliverPolicy {
        match self.last_id {
            Some(id) => DeliverPolicy::StartAfter(id),
            None => self.deliver_policy,
        }
    }

    /// Open a session, retrying with backoff. `None` once cancelled.
    async fn create_session_with_backoff(
        &mut self,
        cancel: &CancellationToken,
    ) -> Option<Box<dyn ReadSession>> {
        loop {
            let request = ReadRequest {
                name: self.name.clone(),
                deliver_policy: self.next_policy(),
                read_ahead_buffer_size: self.read_ahead_buffer_size,
            };
            let result = tokio::select! {
                _ = cancel.cancelled() => return None,
                result = self.reader.read(request) => result,
            };
            let error = match result {
                Ok(session) => return Some(session),
                Err(error) => error,
            };
            if cancel.is_cancelled() {
                return None;
            }
            let interval = self.backoff.next_interval();
            tracing::warn!(
                error = %error,
                next_interval_ms = interval.as_millis() as u64,
                "create read session failed, start a backoff"
            );
            if !wait(interval, cancel).await {
                return None;
            }
        }
    }

    async fn consume_with_session(
        &mut self,
        session: &mut dyn ReadSession,
        cancel: &CancellationToken,
    ) -> SessionEnd {
        let mut forwarded = 0;
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                next = session.next() => next,
            };
            let msg = match next {
                Ok(Some(msg)) => msg,
                Ok(None) => return SessionEnd::Ended { forwarded },
                Err(error) => return SessionEnd::Failed { error, forwarded },
            };
            let id = msg.id();
            tokio::select! {
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                sent = self.tx.send(msg) => {
                    if sent.is_err() {
                        return SessionEnd::RawClosed;
                    }
                }
            }
            self.last_id = Some(id);
            forwarded += 1;
        }
    }
}

/// Sleep unless cancelled first; false when cancelled
async fn wait(interval: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}

#[cfg(test)]
#[path = "catchup_tests.rs"]
mod tests;
