//! # Chefshare
//!
//! Authentication and session core for the Chefshare recipe platform.
//!
//! The crate issues short-lived signed access tokens and single-use rotating
//! refresh tokens, and runs the one-time-code flows for password reset and
//! email verification. All durable state lives in PostgreSQL; multi-step
//! mutations run inside one transaction so they never half-apply.
//!
//! ## Core Modules
//!
//! - [`auth`]: Token service, flow orchestrator, validation and hashing
//! - [`db`]: Connection pool, unit of work and the credential/ledger stores
//! - [`notify`]: Email notifier trait, providers and the delivery queue
//! - [`security`]: Sliding-window rate limiters
//! - [`maintenance`]: Periodic sweeps of expired rows and limiter keys
//!
//! ## Example
//!
//! ```
//! use chefshare::auth::validation::{normalize_email, validate_password};
//!
//! assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
//! assert!(validate_password("Passw0rd!").is_ok());
//! ```

/// Authentication, tokens and account flows.
pub mod auth;

/// Database connection and stores.
pub mod db;

/// Background cleanup tasks.
pub mod maintenance;

/// Outbound email notifications.
pub mod notify;

/// Rate limiting.
pub mod security;

pub use auth::{AuthError, AuthResult, AuthService, TokenService};
pub use db::{Database, DatabaseConfig};
