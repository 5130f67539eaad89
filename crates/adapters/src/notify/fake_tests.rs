// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_notify_records_calls() {
    let adapter = FakeNotifyAdapter::new();
    let to = vec!["ops@example.com".to_string()];

    adapter.send(&to, "Missed", "flow a missed").await.unwrap();
    adapter.send(&to, "Missed", "flow b missed").await.unwrap();

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].recipients, to);
    assert_eq!(calls[0].subject, "Missed");
    assert_eq!(calls[1].body, "flow b missed");
}

#[tokio::test]
async fn failing_fake_still_records() {
    let adapter = FakeNotifyAdapter::new();
    adapter.set_failing(true);
    let result = adapter.send(&[], "s", "b").await;
    assert!(matches!(result, Err(NotifyError::SendFailed(_))));
    assert_eq!(adapter.calls().len(), 1);
}
