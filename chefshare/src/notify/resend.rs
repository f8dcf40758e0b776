//! Delivery through the Resend HTTP API.

use super::{Notifier, NotifyError, templates};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.resend.com/emails";

/// Resend configuration
#[derive(Clone)]
pub struct ResendConfig {
    pub api_key: String,
    /// `From` header, e.g. `Chefshare <no-reply@chefshare.app>`
    pub from: String,
    pub reply_to: Option<String>,
    /// Base of the verification link
    pub frontend_url: String,
    /// Stated in the reset email
    pub otp_ttl_minutes: i64,
    /// Stated in the verification email
    pub verification_ttl_hours: i64,
    pub api_url: String,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from: "Chefshare <no-reply@chefshare.app>".to_string(),
            reply_to: None,
            frontend_url: "http://localhost:3000".to_string(),
            otp_ttl_minutes: 15,
            verification_ttl_hours: 48,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl std::fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendConfig")
            .field("from", &self.from)
            .field("reply_to", &self.reply_to)
            .field("frontend_url", &self.frontend_url)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Sends rendered templates through Resend.
#[derive(Debug, Clone)]
pub struct ResendNotifier {
    client: reqwest::Client,
    config: ResendConfig,
}

impl ResendNotifier {
    pub fn new(config: ResendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn send(
        &self,
        to: &str,
        content: templates::EmailContent,
    ) -> Result<String, NotifyError> {
        let request = SendEmailRequest {
            from: &self.config.from,
            to: [to],
            subject: content.subject,
            html: &content.html,
            text: &content.text,
            reply_to: self.config.reply_to.as_deref(),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            return Err(NotifyError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendEmailResponse = response.json().await?;
        Ok(sent.id)
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send_welcome(&self, email: &str, name: &str) -> Result<String, NotifyError> {
        self.send(email, templates::welcome(name)).await
    }

    async fn send_verification(
        &self,
        email: &str,
        name: &str,
        token: &str,
    ) -> Result<String, NotifyError> {
        let link = templates::verification_link(&self.config.frontend_url, token);
        self.send(
            email,
            templates::verification(name, &link, self.config.verification_ttl_hours),
        )
        .await
    }

    async fn send_password_reset(
        &self,
        email: &str,
        name: &str,
        code: &str,
    ) -> Result<String, NotifyError> {
        self.send(
            email,
            templates::password_reset(name, code, self.config.otp_ttl_minutes),
        )
        .await
    }

    async fn send_password_changed(&self, email: &str, name: &str) -> Result<String, NotifyError> {
        self.send(email, templates::password_changed(name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = SendEmailRequest {
            from: "Chefshare <no-reply@chefshare.app>",
            to: ["alice@example.com"],
            subject: templates::WELCOME_SUBJECT,
            html: "<p>hi</p>",
            text: "hi",
            reply_to: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"], serde_json::json!(["alice@example.com"]));
        assert!(json.get("reply_to").is_none());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = ResendConfig::new("re_live_secret_key");
        assert!(!format!("{:?}", config).contains("re_live_secret_key"));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_an_error() {
        let mut config = ResendConfig::new("key");
        config.api_url = "http://127.0.0.1:1/emails".to_string();
        let notifier = ResendNotifier::new(config);

        let err = notifier
            .send_welcome("alice@example.com", "Alice")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Http(_)));
    }
}
