//! Notifier that only writes a log line. Used when no provider is configured.

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use uuid::Uuid;

/// Logs each send instead of delivering it. Codes and tokens are never
/// written; only the kind of message and the recipient.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    fn record(&self, kind: &str, email: &str) -> String {
        let id = format!("log-{}", Uuid::new_v4());
        log::info!("Email ({}) to {} not delivered, no provider configured [{}]", kind, email, id);
        id
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_welcome(&self, email: &str, _name: &str) -> Result<String, NotifyError> {
        Ok(self.record("welcome", email))
    }

    async fn send_verification(
        &self,
        email: &str,
        _name: &str,
        _token: &str,
    ) -> Result<String, NotifyError> {
        Ok(self.record("verification", email))
    }

    async fn send_password_reset(
        &self,
        email: &str,
        _name: &str,
        _code: &str,
    ) -> Result<String, NotifyError> {
        Ok(self.record("password_reset", email))
    }

    async fn send_password_changed(&self, email: &str, _name: &str) -> Result<String, NotifyError> {
        Ok(self.record("password_changed", email))
    }
}
