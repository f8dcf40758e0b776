//! Email subjects and bodies.

use chrono::{Datelike, Utc};

pub const WELCOME_SUBJECT: &str = "Welcome to Chefshare!";
pub const VERIFICATION_SUBJECT: &str = "Verify Your Email Address - Chefshare";
pub const PASSWORD_RESET_SUBJECT: &str = "Password Reset Code - Chefshare";
pub const PASSWORD_CHANGED_SUBJECT: &str = "Your Password Has Been Changed - Chefshare";

/// Rendered message ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: &'static str,
    pub html: String,
    pub text: String,
}

/// Link the user follows to confirm their address.
pub fn verification_link(frontend_url: &str, token: &str) -> String {
    format!(
        "{}/verify-email?token={}",
        frontend_url.trim_end_matches('/'),
        token
    )
}

pub fn welcome(name: &str) -> EmailContent {
    render(
        WELCOME_SUBJECT,
        "Welcome to Chefshare",
        name,
        &[
            "Thanks for signing up. Chefshare is your space to create, manage, and explore recipes shared by cooks like you.".to_string(),
            "You can start by uploading your first recipe or discovering what others are cooking.".to_string(),
        ],
        None,
    )
}

pub fn verification(name: &str, link: &str, ttl_hours: i64) -> EmailContent {
    render(
        VERIFICATION_SUBJECT,
        "Verify Your Email Address",
        name,
        &[
            "Thank you for registering with Chefshare. Please verify your email address to activate your account.".to_string(),
            format!("This verification link will expire in {} hours.", ttl_hours),
            "If you didn't create this account, you can safely ignore this email.".to_string(),
        ],
        Some(("Verify Email Address", link)),
    )
}

pub fn password_reset(name: &str, code: &str, ttl_minutes: i64) -> EmailContent {
    render(
        PASSWORD_RESET_SUBJECT,
        "Password Reset Code",
        name,
        &[
            "We received a request to reset your Chefshare password. Use the code below to continue.".to_string(),
            format!("Your code: {}", code),
            format!("This code will expire in {} minutes and can only be used once.", ttl_minutes),
            "If you didn't request a password reset, you can safely ignore this email.".to_string(),
        ],
        None,
    )
}

pub fn password_changed(name: &str) -> EmailContent {
    render(
        PASSWORD_CHANGED_SUBJECT,
        "Your Password Has Been Changed",
        name,
        &[
            "The password for your Chefshare account was just changed, and you have been signed out of all devices.".to_string(),
            "If you made this change, no further action is needed.".to_string(),
            "If you did not, reset your password immediately and reply to this email.".to_string(),
        ],
        None,
    )
}

fn render(
    subject: &'static str,
    heading: &str,
    name: &str,
    paragraphs: &[String],
    action: Option<(&str, &str)>,
) -> EmailContent {
    let year = Utc::now().year();

    let mut html = format!(
        "<!DOCTYPE html><html lang=\"en\"><body style=\"font-family:Arial,sans-serif\">\
         <h2>{}</h2><p>Hi {},</p>",
        heading,
        escape(name)
    );
    let mut text = format!("{}\n\nHi {},\n\n", heading, name);

    for paragraph in paragraphs {
        html.push_str(&format!("<p>{}</p>", escape(paragraph)));
        text.push_str(paragraph);
        text.push_str("\n\n");
    }

    if let Some((label, href)) = action {
        html.push_str(&format!(
            "<p><a href=\"{}\">{}</a></p>",
            escape(href),
            escape(label)
        ));
        text.push_str(&format!("{}: {}\n\n", label, href));
    }

    html.push_str(&format!(
        "<p>Happy cooking!</p><hr><p style=\"color:#7f8c8d;font-size:12px\">\
         This is an automated message, please do not reply directly.<br>\
         &copy; {} Chefshare. All rights reserved.</p></body></html>",
        year
    ));
    text.push_str(&format!("Happy cooking!\n\n(c) {} Chefshare", year));

    EmailContent {
        subject,
        html,
        text,
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_link() {
        assert_eq!(
            verification_link("http://localhost:3000", "abc_DEF-123"),
            "http://localhost:3000/verify-email?token=abc_DEF-123"
        );
        assert_eq!(
            verification_link("https://chefshare.app/", "t"),
            "https://chefshare.app/verify-email?token=t"
        );
    }

    #[test]
    fn test_subjects() {
        assert_eq!(welcome("Alice").subject, "Welcome to Chefshare!");
        assert_eq!(
            verification("Alice", "http://x/verify-email?token=t", 48).subject,
            "Verify Your Email Address - Chefshare"
        );
        assert_eq!(
            password_reset("Alice", "123456", 15).subject,
            "Password Reset Code - Chefshare"
        );
        assert_eq!(
            password_changed("Alice").subject,
            "Your Password Has Been Changed - Chefshare"
        );
    }

    #[test]
    fn test_reset_body_carries_code_and_expiry() {
        let content = password_reset("Alice", "482913", 15);
        assert!(content.text.contains("482913"));
        assert!(content.html.contains("482913"));
        assert!(content.text.contains("15 minutes"));
    }

    #[test]
    fn test_names_are_escaped_in_html() {
        let content = welcome("<script>alert(1)</script>");
        assert!(!content.html.contains("<script>"));
        assert!(content.html.contains("&lt;script&gt;"));
    }
}
