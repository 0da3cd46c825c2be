// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the scan pipeline

use thiserror::Error;

/// Errors returned by a message handler
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("scanner cancelled")]
    Cancelled,
    #[error("upstream channel closed")]
    UpstreamClosed,
    #[error("consumer dropped the receiver")]
    ConsumerClosed,
    #[error("handler already closed")]
    Closed,
    #[error("{0}")]
    Custom(String),
}

/// Errors from the reorder buffer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("time tick {time_tick} is not above the confirmed watermark {watermark}")]
    TimeTickViolation { time_tick: u64, watermark: u64 },
}

/// Terminal errors of a scanner
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
    #[error("raw message channel closed")]
    RawChannelClosed,
    #[error("scanner task aborted")]
    Aborted,
}
