//! In-process admission control.
//!
//! Each limiter keeps a sliding window of request instants per key (client IP
//! or normalized email). State is process-local; several server instances
//! would each enforce their own limits.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default IP gate: 5 requests per 10 minutes.
pub const DEFAULT_IP_MAX_REQUESTS: usize = 5;
pub const DEFAULT_IP_WINDOW_SECS: u64 = 600;

/// Default email gate: 3 requests per hour.
pub const DEFAULT_EMAIL_MAX_REQUESTS: usize = 3;
pub const DEFAULT_EMAIL_WINDOW_SECS: u64 = 3600;

/// Admission-control gate keyed by an arbitrary string.
pub trait RateLimit: Send + Sync {
    /// Record an attempt for `key` and report whether it is admitted.
    fn allow(&self, key: &str) -> bool;

    /// Drop keys with no attempts left inside the window. Returns how many.
    fn sweep(&self) -> usize;
}

/// Limit and window for one limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum attempts admitted per window
    pub max_requests: usize,
    /// Window length
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Coarse per-IP gate on enumeration-sensitive routes.
    pub fn per_ip() -> Self {
        Self::new(
            DEFAULT_IP_MAX_REQUESTS,
            Duration::from_secs(DEFAULT_IP_WINDOW_SECS),
        )
    }

    /// Per-identity gate on reset and verification flows.
    pub fn per_email() -> Self {
        Self::new(
            DEFAULT_EMAIL_MAX_REQUESTS,
            Duration::from_secs(DEFAULT_EMAIL_WINDOW_SECS),
        )
    }
}

/// Sliding-window limiter over many keys behind one mutex.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Attempts still admitted for `key` in the current window.
    pub fn remaining(&self, key: &str) -> usize {
        let now = Instant::now();
        let mut windows = self.lock();
        let used = windows
            .get_mut(key)
            .map(|window| {
                prune(window, now, self.config.window);
                window.len()
            })
            .unwrap_or(0);
        self.config.max_requests.saturating_sub(used)
    }

    /// Forget every key.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    // A panic while holding the lock leaves the map consistent (every
    // mutation is a single push or pop), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn prune(window: &mut VecDeque<Instant>, now: Instant, span: Duration) {
    while let Some(ts) = window.front() {
        if now.duration_since(*ts) >= span {
            window.pop_front();
        } else {
            break;
        }
    }
}

impl RateLimit for SlidingWindowLimiter {
    fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.lock();
        let window = windows.entry(key.to_string()).or_default();

        prune(window, now, self.config.window);

        if window.len() >= self.config.max_requests {
            return false;
        }

        window.push_back(now);
        true
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let span = self.config.window;
        let mut windows = self.lock();
        let before = windows.len();

        windows.retain(|_, window| {
            prune(window, now, span);
            !window.is_empty()
        });

        before - windows.len()
    }
}

/// Admits everything. For tests and for disabling a gate.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRateLimiter;

impl RateLimit for NoopRateLimiter {
    fn allow(&self, _key: &str) -> bool {
        true
    }

    fn sweep(&self) -> usize {
        0
    }
}
