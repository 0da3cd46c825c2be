// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consume loop: ordering and delivery.
//!
//! The ordering buffers are owned by this loop alone. Raw messages are
//! filtered, held in the reorder buffer until a time tick confirms them,
//! grouped by the transaction buffer and queued for the handler.

use crate::error::{HandlerError, ScanError};
use crate::handler::{HandleOutcome, HandleParam, MessageHandler};
use crate::pending::PendingQueue;
use crate::reorder::ReorderBuffer;
use crate::txn::TxnBuffer;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ws_core::{ImmutableMessage, MessageFilter, MessageType, ScanLimits};

/// Ordering state of one scanner
pub(crate) struct Ordering {
    vchannel: Option<String>,
    filter: Option<MessageFilter>,
    reorder: ReorderBuffer,
    txn: TxnBuffer,
    pending: PendingQueue,
}

impl Ordering {
    pub(crate) fn new(vchannel: Option<String>, filter: Option<MessageFilter>) -> Self {
        Self {
            vchannel: vchannel.filter(|v| !v.is_empty()),
            filter,
            reorder: ReorderBuffer::new(),
            txn: TxnBuffer::new(),
            pending: PendingQueue::new(),
        }
    }

    pub(crate) fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// Take one raw message from upstream
    pub(crate) fn handle_upstream(&mut self, msg: ImmutableMessage) {
        if let Some(filter) = &self.filter {
            if !filter(&msg) {
                return;
            }
        }

        if msg.message_type() == MessageType::TimeTick {
            let time_tick = msg.time_tick();
            let confirmed = self.reorder.pop_until_time_tick(time_tick);
            let released = self.txn.handle_immutable_messages(confirmed, time_tick);
            if !released.is_empty() {
                self.pending.add(released);
            }
            // A time tick the consumer would not otherwise see still moves
            // consumers forward while nothing else is queued
            if msg.is_persisted() || self.pending.is_empty() {
                self.pending.add([msg]);
            }
            return;
        }

        // Broadcast messages carry no vchannel and reach every consumer
        if let Some(vchannel) = &self.vchannel {
            if !msg.vchannel().is_empty() && msg.vchannel() != vchannel {
                return;
            }
        }

        let (message_type, time_tick, id) = (msg.message_type(), msg.time_tick(), msg.id());
        match self.reorder.push(msg) {
            Ok(()) => tracing::trace!(
                %message_type,
                time_tick,
                %id,
                "push message into reorder buffer"
            ),
            Err(e) => tracing::warn!(
                %message_type,
                time_tick,
                %id,
                error = %e,
                "failed to push message into reorder buffer"
            ),
        }
    }
}

/// Consume loop of one scanner
pub(crate) struct ConsumeLoop {
    ordering: Ordering,
    handler: Box<dyn MessageHandler>,
    upstream: mpsc::Receiver<ImmutableMessage>,
    limits: ScanLimits,
}

impl ConsumeLoop {
    pub(crate) fn new(
        ordering: Ordering,
        handler: Box<dyn MessageHandler>,
        upstream: mpsc::Receiver<ImmutableMessage>,
        limits: ScanLimits,
    ) -> Self {
        Self {
            ordering,
            handler,
            upstream,
            limits,
        }
    }

    /// Run until cancelled or the handler fails. Cancellation is `Ok`.
    pub(crate) async fn run(&mut self, cancel: &CancellationToken) -> Result<(), ScanError> {
        loop {
            // Stop reading upstream while the pending queue is over its threshold
            let upstream = if self.limits.accepts_upstream(self.ordering.pending.len()) {
                Some(&mut self.upstream)
            } else {
                None
            };
            let param = HandleParam {
                cancel,
                upstream,
                candidate: self.ordering.pending.next(),
            };
            match self.handler.handle(param).await {
                Ok(HandleOutcome::MessageHandled) => self.ordering.pending.advance(),
                Ok(HandleOutcome::Incoming(msg)) => self.ordering.handle_upstream(msg),
                Err(HandlerError::Cancelled) => return Ok(()),
                // Errors raised while closing tears the channels down
                Err(e) if cancel.is_cancelled() => {
                    tracing::debug!(error = %e, "handler error after cancellation ignored");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Release the handler; the consumer sees end of stream
    pub(crate) async fn close(&mut self) {
        self.handler.close().await;
        self.upstream.close();
    }
}

#[cfg(test)]
#[path = "consume_tests.rs"]
mod tests;
