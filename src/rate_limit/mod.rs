// src/rate_limit/mod.rs
//! Fixed-window admission control per caller/token key, protecting upstream
//! data providers from refresh stampedes. The counter never exceeds the
//! ceiling within an active window, and denials carry a deterministic
//! retry-after hint: the remainder of the current window.

use dashmap::DashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub ceiling: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ceiling: 30,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Allowed,
    Denied { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Admission check. Increments the active window's counter on `Allowed`;
    /// the entry guard holds the shard lock across check-and-increment, so the
    /// ceiling holds under concurrent callers.
    pub fn admit(&self, key: &str) -> Admission {
        let now = Instant::now();
        let mut window = self.windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        let elapsed = now.duration_since(window.started_at);
        if elapsed >= self.config.window {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.config.ceiling {
            let retry_after = self.config.window - now.duration_since(window.started_at);
            debug!(
                "Rate limit denied for {}: {}/{} in window, retry after {:?}",
                key, window.count, self.config.ceiling, retry_after
            );
            return Admission::Denied { retry_after };
        }

        window.count += 1;
        Admission::Allowed
    }

    /// Requests counted against the active window for a key.
    pub fn current_count(&self, key: &str) -> u32 {
        let now = Instant::now();
        self.windows
            .get(key)
            .filter(|w| now.duration_since(w.started_at) < self.config.window)
            .map(|w| w.count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(ceiling: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            ceiling,
            window: Duration::from_millis(window_ms),
        })
    }

    #[test]
    fn sixth_call_in_a_window_of_five_is_denied() {
        let limiter = limiter(5, 60_000);
        for _ in 0..5 {
            assert_eq!(limiter.admit("token-a"), Admission::Allowed);
        }
        match limiter.admit("token-a") {
            Admission::Denied { retry_after } => assert!(retry_after > Duration::ZERO),
            Admission::Allowed => panic!("6th call must be denied"),
        }
        assert_eq!(limiter.current_count("token-a"), 5);
    }

    #[test]
    fn keys_have_independent_windows() {
        let limiter = limiter(1, 60_000);
        assert_eq!(limiter.admit("token-a"), Admission::Allowed);
        assert_eq!(limiter.admit("token-b"), Admission::Allowed);
        assert!(matches!(limiter.admit("token-a"), Admission::Denied { .. }));
    }

    #[test]
    fn window_rollover_resets_the_count() {
        let limiter = limiter(1, 30);
        assert_eq!(limiter.admit("token-a"), Admission::Allowed);
        assert!(matches!(limiter.admit("token-a"), Admission::Denied { .. }));

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(limiter.admit("token-a"), Admission::Allowed);
    }

    #[test]
    fn retry_after_never_exceeds_the_window() {
        let limiter = limiter(1, 60_000);
        limiter.admit("token-a");
        if let Admission::Denied { retry_after } = limiter.admit("token-a") {
            assert!(retry_after <= Duration::from_secs(60));
        } else {
            panic!("expected denial");
        }
    }
}
