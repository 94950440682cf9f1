//! Sliding-window rate limiter for chat messages

use chrono::{DateTime, Duration, Utc};
use common::clock::Clock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Above this many tracked keys, idle ones are dropped on the next check
const SWEEP_THRESHOLD: usize = 10_000;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of events allowed inside one window
    pub max_events: usize,
    /// Rolling window length
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_events: 10,
            window: Duration::seconds(60),
        }
    }
}

/// Rejection carrying how long until the oldest event leaves the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: Duration,
}

/// Rate limiter keyed by arbitrary strings
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    entries: Arc<Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an event for `key` if the window has room
    pub async fn check(&self, key: &str) -> Result<(), RateLimited> {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();
        let window_start = now - self.config.window;

        if entries.len() > SWEEP_THRESHOLD {
            entries.retain(|_, events| events.back().is_some_and(|last| *last > window_start));
        }

        let events = entries.entry(key.to_string()).or_default();
        while events.front().is_some_and(|oldest| *oldest <= window_start) {
            events.pop_front();
        }

        if events.len() >= self.config.max_events {
            let retry_after = events
                .front()
                .map(|oldest| *oldest + self.config.window - now)
                .unwrap_or(self.config.window);
            info!("Rate limit hit for {}", key);
            return Err(RateLimited { retry_after });
        }

        events.push_back(now);
        Ok(())
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::clock::ManualClock;

    fn limiter() -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        (RateLimiter::new(RateLimiterConfig::default(), clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_tenth_accepted_eleventh_rejected() {
        let (limiter, clock) = limiter();

        for _ in 0..10 {
            assert!(limiter.check("user:event:1").await.is_ok());
            clock.advance(Duration::seconds(1));
        }

        let err = limiter.check("user:event:1").await.unwrap_err();
        assert_eq!(err.retry_after, Duration::seconds(50));
    }

    #[tokio::test]
    async fn test_window_slides() {
        let (limiter, clock) = limiter();

        for _ in 0..10 {
            limiter.check("k").await.unwrap();
        }
        assert!(limiter.check("k").await.is_err());

        clock.advance(Duration::seconds(59));
        assert!(limiter.check("k").await.is_err());

        clock.advance(Duration::seconds(1));
        assert!(limiter.check("k").await.is_ok());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (limiter, _clock) = limiter();

        for _ in 0..10 {
            limiter.check("user-a:event:1").await.unwrap();
        }

        assert!(limiter.check("user-a:event:1").await.is_err());
        assert!(limiter.check("user-a:event:2").await.is_ok());
        assert!(limiter.check("user-b:event:1").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejections_do_not_extend_window() {
        let (limiter, clock) = limiter();

        for _ in 0..10 {
            limiter.check("k").await.unwrap();
        }
        for _ in 0..5 {
            clock.advance(Duration::seconds(10));
            assert!(limiter.check("k").await.is_err());
        }

        clock.advance(Duration::seconds(10));
        assert!(limiter.check("k").await.is_ok());
    }
}
