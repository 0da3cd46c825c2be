// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transaction buffer.
//!
//! Holds transactional messages until their commit marker arrives, then
//! releases the whole group as one composite `Txn` message. Rolled back and
//! expired transactions are discarded.

use std::collections::HashMap;
use ws_core::{tso, ImmutableMessage, MessageType};

struct TxnSession {
    begin: ImmutableMessage,
    body: Vec<ImmutableMessage>,
    bytes: usize,
    /// Time tick of the newest member
    last_time_tick: u64,
}

impl TxnSession {
    fn new(begin: ImmutableMessage) -> Self {
        Self {
            bytes: begin.estimate_size(),
            last_time_tick: begin.time_tick(),
            begin,
            body: Vec::new(),
        }
    }

    fn push(&mut self, msg: ImmutableMessage) {
        self.bytes += msg.estimate_size();
        self.last_time_tick = self.last_time_tick.max(msg.time_tick());
        self.body.push(msg);
    }

    /// Physical time after which the transaction is abandoned, if any.
    /// Every member renews the keepalive.
    fn expires_at_ms(&self) -> Option<u64> {
        let keepalive_ms = self.begin.txn_context()?.keepalive_ms;
        if keepalive_ms == 0 {
            return None;
        }
        Some(tso::physical_ms(self.last_time_tick).saturating_add(keepalive_ms))
    }
}

/// Open transactions keyed by txn id
#[derive(Default)]
pub struct TxnBuffer {
    sessions: HashMap<i64, TxnSession>,
}

impl TxnBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route confirmed messages through the buffer.
    ///
    /// Returns, in input order, non-transactional messages and one composite
    /// message per transaction committed in this batch. `time_tick` is the
    /// confirming watermark, used to evict expired transactions.
    pub fn handle_immutable_messages(
        &mut self,
        msgs: Vec<ImmutableMessage>,
        time_tick: u64,
    ) -> Vec<ImmutableMessage> {
        let mut out = Vec::with_capacity(msgs.len());
        for msg in msgs {
            let Some(txn) = msg.txn_context().copied() else {
                out.push(msg);
                continue;
            };
            match msg.message_type() {
                MessageType::Txn => out.push(msg),
                MessageType::BeginTxn => {
                    if self.sessions.contains_key(&txn.txn_id) {
                        tracing::warn!(
                            txn_id = txn.txn_id,
                            time_tick = msg.time_tick(),
                            "duplicate begin for open transaction, dropped"
                        );
                        continue;
                    }
                    tracing::debug!(txn_id = txn.txn_id, "transaction begin");
                    self.sessions.insert(txn.txn_id, TxnSession::new(msg));
                }
                MessageType::CommitTxn => match self.sessions.remove(&txn.txn_id) {
                    Some(session) => {
                        tracing::debug!(
                            txn_id = txn.txn_id,
                            members = session.body.len() + 2,
                            "transaction committed"
                        );
                        out.push(ImmutableMessage::txn(session.begin, session.body, msg));
                    }
                    None => tracing::warn!(
                        txn_id = txn.txn_id,
                        time_tick = msg.time_tick(),
                        "commit without begin, dropped"
                    ),
                },
                MessageType::RollbackTxn => match self.sessions.remove(&txn.txn_id) {
                    Some(session) => tracing::info!(
                        txn_id = txn.txn_id,
                        discarded = session.body.len(),
                        "transaction rolled back"
                    ),
                    None => tracing::warn!(txn_id = txn.txn_id, "rollback without begin, dropped"),
                },
                _ => match self.sessions.get_mut(&txn.txn_id) {
                    Some(session) => session.push(msg),
                    None => tracing::warn!(
                        txn_id = txn.txn_id,
                        message_type = %msg.message_type(),
                        time_tick = msg.time_tick(),
                        "transaction body without begin, dropped"
                    ),
                },
            }
        }
        self.evict_expired(time_tick);
        out
    }

    fn evict_expired(&mut self, time_tick: u64) {
        let now_ms = tso::physical_ms(time_tick);
        self.sessions.retain(|txn_id, session| match session.expires_at_ms() {
            Some(deadline) if now_ms > deadline => {
                tracing::warn!(
                    txn_id,
                    discarded = session.body.len() + 1,
                    "transaction keepalive expired, discarded"
                );
                false
            }
            _ => true,
        });
    }

    /// Number of open transactions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Estimated size of held messages
    pub fn bytes(&self) -> usize {
        self.sessions.values().map(|s| s.bytes).sum()
    }
}

#[cfg(test)]
#[path = "txn_tests.rs"]
mod tests;
