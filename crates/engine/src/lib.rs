// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! WAL scan and ordering pipeline
//!
//! Turns the raw, possibly reordered stream of one physical channel into a
//! time-ordered, transactionally consistent stream for consumers.

mod backoff;
mod catchup;
mod consume;
mod error;
mod handler;
mod pending;
mod reorder;
mod scanner;
mod txn;

pub use backoff::{BackoffConfig, BackoffTimer};
pub use error::{HandlerError, ReorderError, ScanError};
pub use handler::{ChanMessageHandler, HandleOutcome, HandleParam, MessageHandler};
pub use pending::PendingQueue;
pub use reorder::ReorderBuffer;
pub use scanner::{ReadOption, Scanner, ScannerConfig, DEFAULT_READ_AHEAD_BUFFER_SIZE};
pub use txn::TxnBuffer;
