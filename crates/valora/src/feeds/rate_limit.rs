use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Fixed-window request counter keyed by caller identity.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, RateBucket>>,
}

#[derive(Debug, Clone, Copy)]
struct RateBucket {
    count: u32,
    window_start: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Rate limit exceeded")]
pub struct RateLimitExceeded;

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, identifier: &str) -> Result<(), RateLimitExceeded> {
        self.check_at(identifier, Instant::now())
    }

    /// Counts one request for `identifier` observed at `now`.
    ///
    /// A missing or elapsed window restarts at one; a full window rejects without
    /// incrementing.
    pub fn check_at(&self, identifier: &str, now: Instant) -> Result<(), RateLimitExceeded> {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        match buckets.get_mut(identifier) {
            Some(bucket) if now.saturating_duration_since(bucket.window_start) < self.window => {
                if bucket.count >= self.limit {
                    return Err(RateLimitExceeded);
                }
                bucket.count += 1;
            }
            _ => {
                buckets.insert(
                    identifier.to_string(),
                    RateBucket {
                        count: 1,
                        window_start: now,
                    },
                );
            }
        }
        Ok(())
    }
}
