//! Admission control for alerts: a rolling-hour budget and a dedup window.
//!
//! State lives in process memory only and starts empty after a restart.

use super::models::Priority;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

pub type AlertKey = (Priority, String);

/// Hourly alert budget. The counter resets once an hour has elapsed since the
/// previous reset.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_hour: u32,
    count: u32,
    last_reset: DateTime<Utc>,
}

impl RateLimiter {
    pub fn new(max_per_hour: u32, now: DateTime<Utc>) -> Self {
        Self {
            max_per_hour,
            count: 0,
            last_reset: now,
        }
    }

    /// Consume one unit of budget. `false` means the alert must be dropped.
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.last_reset >= Duration::hours(1) {
            self.count = 0;
            self.last_reset = now;
        }
        if self.count >= self.max_per_hour {
            return false;
        }
        self.count += 1;
        true
    }

    pub fn remaining(&self) -> u32 {
        self.max_per_hour.saturating_sub(self.count)
    }
}

/// Remembers when each `(priority, title)` was last dispatched.
#[derive(Debug)]
pub struct Deduplicator {
    window: Duration,
    last_sent: HashMap<AlertKey, DateTime<Utc>>,
}

impl Deduplicator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_sent: HashMap::new(),
        }
    }

    pub fn is_duplicate(&self, key: &AlertKey, now: DateTime<Utc>) -> bool {
        match self.last_sent.get(key) {
            Some(sent) => now - *sent < self.window,
            None => false,
        }
    }

    pub fn record(&mut self, key: AlertKey, now: DateTime<Utc>) {
        let window = self.window;
        self.last_sent.retain(|_, sent| now - *sent < window);
        self.last_sent.insert(key, now);
    }

    pub fn tracked(&self) -> usize {
        self.last_sent.len()
    }
}

/// Why an alert was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Duplicate,
    RateLimited,
}

#[derive(Debug)]
pub struct Admission {
    limiter: RateLimiter,
    dedup: Deduplicator,
}

impl Admission {
    pub fn new(max_per_hour: u32, dedup_window: Duration, now: DateTime<Utc>) -> Self {
        Self {
            limiter: RateLimiter::new(max_per_hour, now),
            dedup: Deduplicator::new(dedup_window),
        }
    }

    /// Duplicates are rejected before they can consume hourly budget.
    pub fn admit(&mut self, key: AlertKey, now: DateTime<Utc>) -> Result<(), Rejection> {
        if self.dedup.is_duplicate(&key, now) {
            return Err(Rejection::Duplicate);
        }
        if !self.limiter.try_acquire(now) {
            return Err(Rejection::RateLimited);
        }
        self.dedup.record(key, now);
        Ok(())
    }

    pub fn remaining_budget(&self) -> u32 {
        self.limiter.remaining()
    }
}
