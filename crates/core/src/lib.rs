// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ws-core: message model for the walscan WAL inspection tool
//!
//! This crate provides:
//! - Immutable WAL messages, message ids and message types
//! - Deliver policies and deliver filters for scans
//! - Physical channel identity
//! - Time tick (TSO) helpers and scan limits

pub mod channel;
pub mod id;
pub mod limits;
pub mod message;
pub mod message_type;
pub mod policy;
pub mod tso;

pub use channel::{AccessMode, PChannelInfo};
pub use id::{MessageId, ParseIdError};
pub use limits::ScanLimits;
pub use message::{ImmutableMessage, MessageBuilder, ReplicateHeader, TxnContext};
pub use message_type::MessageType;
pub use policy::{filter_fn, DeliverFilter, DeliverPolicy, MessageFilter};
