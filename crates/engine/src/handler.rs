// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message handlers: the delivery sink of a scanner.
//!
//! On every iteration the consume loop hands the handler a cancellation
//! token, the raw upstream (absent while the pending queue is over its
//! threshold) and the pending candidate (absent when nothing is pending).
//! The handler waits for whichever happens first.

use crate::error::HandlerError;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ws_core::ImmutableMessage;

/// Inputs of one handler call
pub struct HandleParam<'a> {
    pub cancel: &'a CancellationToken,
    /// Raw messages from the produce loop, `None` while intake is disabled
    pub upstream: Option<&'a mut mpsc::Receiver<ImmutableMessage>>,
    /// Head of the pending queue, `None` when the queue is empty
    pub candidate: Option<&'a ImmutableMessage>,
}

/// What a handler call achieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// A raw message arrived from upstream
    Incoming(ImmutableMessage),
    /// The candidate was delivered
    MessageHandled,
}

/// Delivery sink driven by the consume loop
#[async_trait]
pub trait MessageHandler: Send + 'static {
    /// Wait for cancellation, an upstream message or delivery of the candidate
    async fn handle(&mut self, param: HandleParam<'_>) -> Result<HandleOutcome, HandlerError>;

    /// Called once when the consume loop exits
    async fn close(&mut self);
}

/// Default handler, delivering into a bounded channel
pub struct ChanMessageHandler {
    tx: Option<mpsc::Sender<ImmutableMessage>>,
}

impl ChanMessageHandler {
    /// Handler plus the receiving end consumers read from
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ImmutableMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }
}

#[async_trait]
impl MessageHandler for ChanMessageHandler {
    async fn handle(&mut self, param: HandleParam<'_>) -> Result<HandleOutcome, HandlerError> {
        let tx = self.tx.as_ref().ok_or(HandlerError::Closed)?;
        let HandleParam {
            cancel,
            upstream,
            candidate,
        } = param;

        // Cancellation wins over an upstream that closed because of it
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HandlerError::Cancelled),
            msg = recv_upstream(upstream) => match msg {
                Some(msg) => Ok(HandleOutcome::Incoming(msg)),
                None => Err(HandlerError::UpstreamClosed),
            },
            permit = tx.reserve(), if candidate.is_some() => match (permit, candidate) {
                (Ok(permit), Some(msg)) => {
                    permit.send(msg.clone());
                    Ok(HandleOutcome::MessageHandled)
                }
                (Ok(_), None) => Err(HandlerError::Custom("no candidate to deliver".to_string())),
                (Err(_), _) => Err(HandlerError::ConsumerClosed),
            },
        }
    }

    async fn close(&mut self) {
        // Dropping the sender ends the consumer's stream
        self.tx.take();
    }
}

async fn recv_upstream(
    upstream: Option<&mut mpsc::Receiver<ImmutableMessage>>,
) -> Option<ImmutableMessage> {
    match upstream {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
