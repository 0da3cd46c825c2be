// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for WAL broker backends

pub mod broker;
pub mod registry;
pub mod traced;

pub use broker::{
    Broker, BrokerError, BrokerReader, FileBroker, FileBrokerConfig, MemoryBroker, ReadRequest,
    ReadSession,
};
pub use registry::{BackendBuilder, BackendConfig, BackendRegistry};
pub use traced::{TracedBroker, TracedBrokerReader};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use broker::{BrokerCall, FakeBroker};
