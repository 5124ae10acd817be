//! In-memory window counter behind the contact-submission gate.
//!
//! State lives in this process only; a multi-process deployment gives each
//! process its own independent quota. That is a documented operating limit,
//! not something this module tries to correct.

use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded: {requests} requests in window, limit is {limit}")]
    LimitExceeded {
        requests: i64,
        limit: i64,
        retry_after_seconds: i64,
    },
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: i64,
    pub window_seconds: i64,
    pub cleanup_interval_seconds: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 1,
            window_seconds: 600, // 10 minutes
            cleanup_interval_seconds: 600,
        }
    }
}

/// A client's current window: anchored at its first request, counting every
/// request since, accepted or not.
#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: i64,
    count: i64,
}

/// Quota snapshot returned for an accepted request, used to fill the
/// standard rate-limit response headers.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub used: i64,
    pub limit: i64,
    pub reset_after_seconds: i64,
}

#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    /// Record a request from `identifier` and decide whether it may pass.
    ///
    /// The map entry is held exclusively for the duration of the update, so
    /// two simultaneous requests from the same client cannot both be counted
    /// as the window's first.
    pub fn check_and_increment(&self, identifier: &str) -> Result<Quota, RateLimitError> {
        let now = current_timestamp();
        let mut window = self
            .windows
            .entry(identifier.to_string())
            .or_insert(Window {
                started_at: now,
                count: 0,
            });

        if now - window.started_at >= self.config.window_seconds {
            *window = Window {
                started_at: now,
                count: 0,
            };
        }

        window.count += 1;
        let reset_after_seconds = window.started_at + self.config.window_seconds - now;

        debug!(
            "Rate limit check for '{}': {}/{} requests in current window",
            identifier, window.count, self.config.max_requests
        );

        if window.count > self.config.max_requests {
            return Err(RateLimitError::LimitExceeded {
                requests: window.count,
                limit: self.config.max_requests,
                retry_after_seconds: reset_after_seconds,
            });
        }

        Ok(Quota {
            used: window.count,
            limit: self.config.max_requests,
            reset_after_seconds,
        })
    }

    /// Requests counted in `identifier`'s live window, if it has one.
    pub fn current_usage(&self, identifier: &str) -> Option<i64> {
        let now = current_timestamp();
        self.windows
            .get(identifier)
            .filter(|window| now - window.started_at < self.config.window_seconds)
            .map(|window| window.count)
    }

    /// Forget `identifier`'s window entirely.
    pub fn reset(&self, identifier: &str) {
        self.windows.remove(identifier);
        debug!("Reset rate limit for identifier '{}'", identifier);
    }

    /// Drop every elapsed window so the map stays bounded by the number of
    /// clients seen in the last window span. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = current_timestamp();
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now - window.started_at < self.config.window_seconds);
        let removed = before.saturating_sub(self.windows.len());

        if removed > 0 {
            debug!("Cleaned up {} expired rate limit windows", removed);
        }
        removed
    }

    pub fn max_requests(&self) -> i64 {
        self.config.max_requests
    }

    pub fn window_seconds(&self) -> i64 {
        self.config.window_seconds
    }
}

pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limiter(max_requests: i64, window_seconds: i64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window_seconds,
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn test_first_request_is_allowed() {
        let limiter = limiter(1, 600);
        let quota = limiter.check_and_increment("client-a").unwrap();
        assert_eq!(quota.used, 1);
        assert_eq!(quota.limit, 1);
        assert!(quota.reset_after_seconds <= 600);
    }

    #[test]
    fn test_second_request_in_window_is_rejected() {
        let limiter = limiter(1, 600);
        limiter.check_and_increment("client-a").unwrap();

        let result = limiter.check_and_increment("client-a");
        match result {
            Err(RateLimitError::LimitExceeded {
                requests,
                limit,
                retry_after_seconds,
            }) => {
                assert_eq!(requests, 2);
                assert_eq!(limit, 1);
                assert!(retry_after_seconds <= 600);
            }
            other => panic!("expected LimitExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_identifiers_are_independent() {
        let limiter = limiter(1, 600);
        limiter.check_and_increment("client-a").unwrap();
        assert!(limiter.check_and_increment("client-b").is_ok());
        assert!(limiter.check_and_increment("client-a").is_err());
    }

    #[test]
    fn test_window_elapse_admits_again() {
        let limiter = limiter(1, 1);
        limiter.check_and_increment("client-a").unwrap();
        assert!(limiter.check_and_increment("client-a").is_err());

        std::thread::sleep(Duration::from_millis(1100));

        assert!(limiter.check_and_increment("client-a").is_ok());
    }

    #[test]
    fn test_rejected_requests_still_count() {
        let limiter = limiter(1, 600);
        limiter.check_and_increment("client-a").unwrap();
        let _ = limiter.check_and_increment("client-a");
        let _ = limiter.check_and_increment("client-a");
        assert_eq!(limiter.current_usage("client-a"), Some(3));
    }

    #[test]
    fn test_reset_allows_again() {
        let limiter = limiter(1, 600);
        limiter.check_and_increment("client-a").unwrap();
        assert!(limiter.check_and_increment("client-a").is_err());

        limiter.reset("client-a");
        assert!(limiter.check_and_increment("client-a").is_ok());
    }

    #[test]
    fn test_cleanup_removes_only_expired_windows() {
        let limiter = limiter(1, 1);
        limiter.check_and_increment("expired-client").unwrap();

        std::thread::sleep(Duration::from_millis(1100));
        limiter.check_and_increment("live-client").unwrap();

        let removed = limiter.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(limiter.current_usage("expired-client"), None);
        assert_eq!(limiter.current_usage("live-client"), Some(1));
    }

    #[test]
    fn test_concurrent_requests_cannot_both_pass() {
        use std::sync::Arc;

        let limiter = Arc::new(limiter(1, 600));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.check_and_increment("client-a").is_ok())
            })
            .collect();

        let passed = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|allowed| *allowed)
            .count();
        assert_eq!(passed, 1);
    }
}
