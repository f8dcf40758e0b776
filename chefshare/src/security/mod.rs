//! Admission control for enumeration- and brute-force-sensitive flows.
//!
//! Limiters are constructed explicitly at startup and injected where they
//! are needed; there is no global limiter state.
//!
//! ## Example
//!
//! ```
//! use chefshare::security::{RateLimit, RateLimitConfig, SlidingWindowLimiter};
//!
//! let per_email = SlidingWindowLimiter::new(RateLimitConfig::per_email());
//! for _ in 0..3 {
//!     assert!(per_email.allow("alice@example.com"));
//! }
//! assert!(!per_email.allow("alice@example.com"));
//! ```

pub mod rate_limiter;

pub use rate_limiter::{NoopRateLimiter, RateLimit, RateLimitConfig, SlidingWindowLimiter};
