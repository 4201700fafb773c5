//! Per-client limiting of failed attempts, to slow down guessing of invitation codes and admin
//! passwords.
//!
//! Failures are counted per key (the client's IP address) within a fixed time window, starting at
//! the first failure. Once `max_failures` failures have been recorded in the current window, the
//! key is blocked until the window ends.

use log::warn;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct AttemptLimiter {
    max_failures: u32,
    window: Duration,
    failures: Mutex<HashMap<String, FailureWindow>>,
}

struct FailureWindow {
    count: u32,
    started_at: Instant,
}

impl AttemptLimiter {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            max_failures,
            window,
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_blocked(&self, key: &str) -> bool {
        self.is_blocked_at(key, Instant::now())
    }

    /// Count a failed attempt of the given client.
    pub fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Instant::now())
    }

    fn is_blocked_at(&self, key: &str, now: Instant) -> bool {
        let failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        failures.get(key).is_some_and(|w| {
            now.duration_since(w.started_at) < self.window && w.count >= self.max_failures
        })
    }

    fn record_failure_at(&self, key: &str, now: Instant) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        failures.retain(|_, w| now.duration_since(w.started_at) < self.window);
        let entry = failures.entry(key.to_owned()).or_insert(FailureWindow {
            count: 0,
            started_at: now,
        });
        entry.count += 1;
        if entry.count == self.max_failures {
            warn!(
                "Blocking client {} after {} failed attempts.",
                key, entry.count
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_after_max_failures() {
        let limiter = AttemptLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..2 {
            limiter.record_failure_at("10.0.0.1", now);
        }
        assert!(!limiter.is_blocked_at("10.0.0.1", now));
        limiter.record_failure_at("10.0.0.1", now);
        assert!(limiter.is_blocked_at("10.0.0.1", now));
        assert!(!limiter.is_blocked_at("10.0.0.2", now));
    }

    #[test]
    fn test_block_ends_with_window() {
        let limiter = AttemptLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        limiter.record_failure_at("10.0.0.1", now);
        assert!(limiter.is_blocked_at("10.0.0.1", now + Duration::from_secs(59)));
        assert!(!limiter.is_blocked_at("10.0.0.1", now + Duration::from_secs(60)));

        // A new failure after the window starts counting from scratch
        limiter.record_failure_at("10.0.0.1", now + Duration::from_secs(61));
        limiter.record_failure_at("10.0.0.2", now + Duration::from_secs(61));
        let failures = limiter.failures.lock().unwrap();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures["10.0.0.1"].count, 1);
    }
}
