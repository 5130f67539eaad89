// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};

fn utc_ms(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
        .timestamp_millis()
}

#[yare::parameterized(
    years   = { "2y",  2,  PeriodUnit::Years },
    months  = { "1M",  1,  PeriodUnit::Months },
    weeks   = { "3w",  3,  PeriodUnit::Weeks },
    days    = { "1d",  1,  PeriodUnit::Days },
    hours   = { "12h", 12, PeriodUnit::Hours },
    minutes = { "30m", 30, PeriodUnit::Minutes },
    seconds = { "45s", 45, PeriodUnit::Seconds },
)]
fn parses_units(input: &str, count: u32, unit: PeriodUnit) {
    let period: Period = input.parse().unwrap();
    assert_eq!(period.count(), count);
    assert_eq!(period.unit(), unit);
    assert_eq!(period.to_string(), input);
}

#[yare::parameterized(
    bad_unit   = { "5x" },
    no_count   = { "d" },
    zero_count = { "0d" },
    empty      = { "" },
)]
fn rejects_malformed(input: &str) {
    assert!(input.parse::<Period>().is_err(), "{input} should not parse");
}

#[test]
fn none_markers_parse_to_no_period() {
    assert_eq!(Period::parse_optional("n").unwrap(), None);
    assert_eq!(Period::parse_optional("null").unwrap(), None);
    assert_eq!(Period::parse_optional("1h").unwrap(), Some(Period::hours(1)));
}

#[test]
fn day_period_keeps_wall_clock_across_dst() {
    // 2026-03-07 09:00 America/Los_Angeles is 17:00Z (PST); DST starts on the 8th
    let tz: Tz = "America/Los_Angeles".parse().unwrap();
    let start = utc_ms(2026, 3, 7, 17, 0);
    let next = Period::days(1).add_to(start, tz).unwrap();
    // 2026-03-08 09:00 PDT is 16:00Z
    assert_eq!(next, utc_ms(2026, 3, 8, 16, 0));
}

#[test]
fn month_period_clamps_to_month_end() {
    let tz: Tz = "UTC".parse().unwrap();
    let start = utc_ms(2026, 1, 31, 8, 0);
    let next = Period::new(1, PeriodUnit::Months).add_to(start, tz).unwrap();
    assert_eq!(next, utc_ms(2026, 2, 28, 8, 0));
}

#[test]
fn hour_period_is_absolute() {
    let tz: Tz = "Europe/Berlin".parse().unwrap();
    let start = utc_ms(2026, 6, 1, 0, 0);
    assert_eq!(
        Period::hours(5).add_to(start, tz).unwrap(),
        start + 5 * 3_600_000
    );
}

#[test]
fn serde_uses_compact_string() {
    let json = serde_json::to_string(&Period::minutes(15)).unwrap();
    assert_eq!(json, "\"15m\"");
    let back: Period = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Period::minutes(15));
}
