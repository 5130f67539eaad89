// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting for logs and notification bodies.

use chrono::{DateTime, SecondsFormat};

/// Format an epoch-millisecond instant as UTC RFC 3339, e.g.
/// `"2026-01-01T00:00:00.000Z"`.
///
/// Values outside chrono's range (including the `i64::MAX` "never" marker)
/// render as `"never"`.
pub fn format_epoch_ms(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(at) if ms != i64::MAX => at.to_rfc3339_opts(SecondsFormat::Millis, true),
        _ => "never".to_string(),
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
