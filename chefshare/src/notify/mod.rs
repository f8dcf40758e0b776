//! Outbound user notifications (email).
//!
//! Auth flows never call a [`Notifier`] directly. They submit a
//! [`Notification`] to the [`NotificationQueue`], whose worker performs the
//! send and logs failures. A slow or failing provider therefore never
//! delays or fails a request.

pub mod logging;
pub mod memory;
pub mod queue;
pub mod resend;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

pub use logging::LogNotifier;
pub use memory::MemoryNotifier;
pub use queue::NotificationQueue;
pub use resend::{ResendConfig, ResendNotifier};

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport failure talking to the provider
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider rejected message ({status}): {body}")]
    Provider { status: u16, body: String },

    /// Notifier refused the send (tests, misconfiguration)
    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// Email collaborator. Each send returns the provider's message id.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_welcome(&self, email: &str, name: &str) -> Result<String, NotifyError>;

    async fn send_verification(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<String, NotifyError>;

    async fn send_password_reset(
        &self,
        email: &str,
        name: &str,
        code: &str,
    ) -> Result<String, NotifyError>;

    async fn send_password_changed(&self, email: &str, name: &str) -> Result<String, NotifyError>;
}

/// A queued message.
#[derive(Clone, PartialEq, Eq)]
pub enum Notification {
    Welcome {
        email: String,
        name: String,
    },
    Verification {
        email: String,
        name: String,
        token: String,
    },
    PasswordReset {
        email: String,
        name: String,
        code: String,
    },
    PasswordChanged {
        email: String,
        name: String,
    },
}

impl Notification {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "welcome",
            Notification::Verification { .. } => "verification",
            Notification::PasswordReset { .. } => "password_reset",
            Notification::PasswordChanged { .. } => "password_changed",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Notification::Welcome { email, .. }
            | Notification::Verification { email, .. }
            | Notification::PasswordReset { email, .. }
            | Notification::PasswordChanged { email, .. } => email,
        }
    }

    /// Hand this message to `notifier`.
    pub async fn deliver(&self, notifier: &dyn Notifier) -> Result<String, NotifyError> {
        match self {
            Notification::Welcome { email, name } => notifier.send_welcome(email, name).await,
            Notification::Verification { email, name, token } => {
                notifier.send_verification(email, name, token).await
            }
            Notification::PasswordReset { email, name, code } => {
                notifier.send_password_reset(email, name, code).await
            }
            Notification::PasswordChanged { email, name } => {
                notifier.send_password_changed(email, name).await
            }
        }
    }
}

// Codes and tokens are credentials; keep them out of debug output.
impl std::fmt::Debug for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notification")
            .field("kind", &self.kind())
            .field("recipient", &self.recipient())
            .finish_non_exhaustive()
    }
}
