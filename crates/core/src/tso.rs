// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hybrid time tick helpers.
//!
//! A time tick packs a physical unix timestamp in milliseconds into the high
//! bits and an 18-bit logical counter into the low bits.

use chrono::{DateTime, TimeZone, Utc};

/// Number of low bits used by the logical counter
pub const LOGICAL_BITS: u32 = 18;

const LOGICAL_MASK: u64 = (1 << LOGICAL_BITS) - 1;

/// Compose a time tick from physical milliseconds and a logical counter
pub fn compose(physical_ms: u64, logical: u64) -> u64 {
    (physical_ms << LOGICAL_BITS) | (logical & LOGICAL_MASK)
}

/// Physical milliseconds since the unix epoch
pub fn physical_ms(time_tick: u64) -> u64 {
    time_tick >> LOGICAL_BITS
}

/// Logical counter part
pub fn logical(time_tick: u64) -> u64 {
    time_tick & LOGICAL_MASK
}

/// Wall-clock time of a time tick, `None` if out of chrono's range
pub fn physical_time(time_tick: u64) -> Option<DateTime<Utc>> {
    let ms = i64::try_from(physical_ms(time_tick)).ok()?;
    Utc.timestamp_millis_opt(ms).single()
}

/// Time tick for a wall-clock instant with a zero logical part
pub fn from_time(time: DateTime<Utc>) -> u64 {
    compose(time.timestamp_millis().max(0) as u64, 0)
}
