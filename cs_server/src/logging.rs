//! Structured logging setup and security event helper.
//!
//! The library crate logs through the `log` facade; installing the subscriber
//! here also routes those records into tracing.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Security events recorded through [`log_security_event`].
pub mod events {
    pub const FAILED_LOGIN: &str = "failed_login";
    pub const REFRESH_REPLAY: &str = "refresh_replay";
    pub const PASSWORD_RESET_COMPLETED: &str = "password_reset_completed";
    pub const PASSWORD_CHANGED: &str = "password_changed";
    pub const RATE_LIMITED: &str = "rate_limited";
}

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use cs_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// Callers pass identifiers only. Passwords, codes and token strings never go
/// through here.
///
/// # Example
///
/// ```
/// use cs_server::logging::{events, log_security_event};
///
/// log_security_event(
///     events::FAILED_LOGIN,
///     None,
///     Some("192.168.1.1"),
///     "invalid credentials for cook@example.com",
/// );
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<&str>,
    ip_address: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        ip_address = ip_address,
        "SECURITY: {}",
        message
    );
}
