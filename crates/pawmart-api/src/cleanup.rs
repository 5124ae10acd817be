use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::interval};
use tracing::{debug, info, warn};

use crate::rate_limiter::RateLimiter;

/// Periodically prunes elapsed windows out of the gate's in-memory map so it
/// stays bounded over the life of the process.
pub struct CleanupService {
    rate_limiter: Arc<RateLimiter>,
    cleanup_interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl CleanupService {
    pub fn new(rate_limiter: Arc<RateLimiter>, cleanup_interval_seconds: u64) -> Self {
        Self {
            rate_limiter,
            cleanup_interval: Duration::from_secs(cleanup_interval_seconds),
            handle: None,
        }
    }

    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("Cleanup service is already running");
            return;
        }

        let rate_limiter = Arc::clone(&self.rate_limiter);
        let interval_duration = self.cleanup_interval;

        let handle = tokio::spawn(async move {
            info!(
                "Starting cleanup service with interval: {:?}",
                interval_duration
            );

            let mut cleanup_interval = interval(interval_duration);

            loop {
                let removed = rate_limiter.cleanup_expired();
                if removed > 0 {
                    info!("Cleaned up {} expired rate limit windows", removed);
                } else {
                    debug!("No expired rate limit windows to clean up");
                }

                cleanup_interval.tick().await;
            }
        });

        self.handle = Some(handle);
        info!("Cleanup service started successfully");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Cleanup service stopped");
        } else {
            debug!("Cleanup service is not running");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for CleanupService {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limiter::RateLimitConfig;
    use tokio::time::{Duration, sleep};

    #[tokio::test]
    async fn test_cleanup_service_lifecycle() {
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
        let mut cleanup_service = CleanupService::new(rate_limiter, 1);

        // Service should not be running initially
        assert!(!cleanup_service.is_running());

        cleanup_service.start();
        assert!(cleanup_service.is_running());

        // Starting again should warn but not create a duplicate task
        cleanup_service.start();
        assert!(cleanup_service.is_running());

        cleanup_service.stop();

        // Give a moment for the task to be aborted
        sleep(Duration::from_millis(10)).await;
        assert!(!cleanup_service.is_running());

        // Stopping again should be safe
        cleanup_service.stop();
        assert!(!cleanup_service.is_running());
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_windows() {
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window_seconds: 1,
            cleanup_interval_seconds: 1,
        }));

        rate_limiter.check_and_increment("expired-client").unwrap();
        sleep(Duration::from_millis(1100)).await;

        let mut cleanup_service = CleanupService::new(Arc::clone(&rate_limiter), 1);
        cleanup_service.start();

        // Wait for the first cleanup pass to run
        sleep(Duration::from_millis(200)).await;

        assert_eq!(rate_limiter.current_usage("expired-client"), None);
        cleanup_service.stop();
    }
}
