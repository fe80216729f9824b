//! Fixed-window call counter shared by every operation of a client.

use crate::domain::ports::{Clock, RateLimiter, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Window shared by every BRT operation.
pub const GLOBAL_WINDOW: &str = "brt:soap:global";
pub const DEFAULT_CALLS_PER_MINUTE: u32 = 250;
pub const WINDOW_DURATION: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    started_at: Instant,
}

#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl FixedWindowRateLimiter {
    pub fn new(limit: u32) -> Self {
        Self::with_clock(limit, WINDOW_DURATION, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            window,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Calls still allowed in the current window of `window_key`.
    pub fn remaining(&self, window_key: &str) -> u32 {
        let now = self.clock.now();
        let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        match windows.get(window_key) {
            Some(w) if now.duration_since(w.started_at) < self.window => {
                self.limit.saturating_sub(w.count)
            }
            _ => self.limit,
        }
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn try_acquire(&self, window_key: &str) -> bool {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = windows.entry(window_key.to_string()).or_insert(RateWindow {
            count: 0,
            started_at: now,
        });

        if now.duration_since(window.started_at) >= self.window {
            window.count = 0;
            window.started_at = now;
        }

        // rejected attempts are not counted
        if window.count >= self.limit {
            return false;
        }
        window.count += 1;
        true
    }
}
