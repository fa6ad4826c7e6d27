// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notification adapters.
//!
//! The coordinator notifies when a session needs attention (enters
//! `Waiting` or `Error`). Delivery is fire-and-forget: a broken
//! notification daemon must never stall the board.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification send failed: {0}")]
    SendFailed(String),
}

/// Sends user-visible notifications outside the terminal.
#[async_trait]
pub trait Notifier: Clone + Send + Sync + 'static {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notification sink for headless runs and tests that don't care.
#[derive(Clone, Copy, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Desktop notifications via `notify-rust`.
#[derive(Clone, Copy, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            // Pre-set the bundle identifier so mac-notification-sys skips
            // its AppleScript lookup, which blocks in processes without
            // Automation permissions.
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let title = title.to_string();
        let body = body.to_string();
        // show() is synchronous; run it on the blocking pool and don't wait.
        tokio::task::spawn_blocking(move || {
            if let Err(e) = notify_rust::Notification::new()
                .summary(&title)
                .body(&body)
                .show()
            {
                tracing::warn!(%title, error = %e, "desktop notification failed");
            }
        });
        Ok(())
    }
}
