// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::format_epoch_ms;

#[yare::parameterized(
    epoch       = { 0,                 "1970-01-01T00:00:00.000Z" },
    new_year    = { 1_767_225_600_000, "2026-01-01T00:00:00.000Z" },
    with_millis = { 1_767_225_600_123, "2026-01-01T00:00:00.123Z" },
    never       = { i64::MAX,          "never" },
)]
fn epoch_ms(ms: i64, expected: &str) {
    assert_eq!(format_epoch_ms(ms), expected);
}
