// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notification adapter using notify-rust.
//!
//! On macOS, `notify-rust` uses `mac-notification-sys` to reach the
//! Notification Center. Its first notification looks up a bundle identifier
//! through AppleScript, which blocks forever in a daemon without Automation
//! permissions, so the identifier is pre-set at construction.

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;

/// Shows each message on the local desktop. Recipients are only logged;
/// the person at the desktop stands in for all of them.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopNotifyAdapter;

impl DesktopNotifyAdapter {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotifyAdapter {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let subject = subject.to_string();
        let body = body.to_string();
        let recipients = recipients.join(", ");
        // Notification::show() is synchronous on macOS; keep it off the
        // async workers.
        tokio::task::spawn_blocking(move || {
            tracing::info!(%subject, %recipients, "sending desktop notification");
            match notify_rust::Notification::new()
                .summary(&subject)
                .body(&body)
                .show()
            {
                Ok(_) => tracing::info!(%subject, "desktop notification sent"),
                Err(e) => tracing::warn!(%subject, error = %e, "desktop notification failed"),
            }
        });
        Ok(())
    }
}
