//! In-memory notifier for tests.

use super::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

/// Records every notification it is asked to send.
///
/// Tests read OTPs and verification tokens back out of it. It can also be
/// switched to fail every send, to check that delivery failures never reach
/// the caller.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
    arrived: Notify,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent send.
    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything recorded so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    pub fn sent_to(&self, email: &str) -> Vec<Notification> {
        self.lock()
            .iter()
            .filter(|n| n.recipient() == email)
            .cloned()
            .collect()
    }

    /// Most recent reset code sent to `email`.
    pub fn last_reset_code(&self, email: &str) -> Option<String> {
        self.lock().iter().rev().find_map(|n| match n {
            Notification::PasswordReset { email: to, code, .. } if to == email => {
                Some(code.clone())
            }
            _ => None,
        })
    }

    /// Most recent verification token sent to `email`.
    pub fn last_verification_token(&self, email: &str) -> Option<String> {
        self.lock().iter().rev().find_map(|n| match n {
            Notification::Verification {
                email: to, token, ..
            } if to == email => Some(token.clone()),
            _ => None,
        })
    }

    /// Wait until at least `count` notifications have been recorded.
    ///
    /// Returns false if `timeout` elapses first.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let arrived = self.arrived.notified();
                if self.lock().len() >= count {
                    return;
                }
                arrived.await;
            }
        })
        .await
        .is_ok()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, notification: Notification) -> Result<String, NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Unavailable("memory notifier set to fail".to_string()));
        }

        let id = {
            let mut sent = self.lock();
            sent.push(notification);
            format!("mem-{}", sent.len())
        };
        self.arrived.notify_waiters();
        Ok(id)
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send_welcome(&self, email: &str, name: &str) -> Result<String, NotifyError> {
        self.record(Notification::Welcome {
            email: email.to_string(),
            name: name.to_string(),
        })
    }

    async fn send_verification(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<String, NotifyError> {
        self.record(Notification::Verification {
            email: email.to_string(),
            name: name.to_string(),
            token: token.to_string(),
        })
    }

    async fn send_password_reset(
        &self,
        email: &str,
        name: &str,
        code: &str,
    ) -> Result<String, NotifyError> {
        self.record(Notification::PasswordReset {
            email: email.to_string(),
            name: name.to_string(),
            code: code.to_string(),
        })
    }

    async fn send_password_changed(&self, email: &str, name: &str) -> Result<String, NotifyError> {
        self.record(Notification::PasswordChanged {
            email: email.to_string(),
            name: name.to_string(),
        })
    }
}
