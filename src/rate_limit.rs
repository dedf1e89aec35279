// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-key fixed-window rate limiting.
//!
//! State is process-local and in-memory: it resets on restart and is not
//! shared across instances. That weaker guarantee is the documented baseline
//! for this service; the limiter is injected through `AppState` so a shared
//! store can replace it without touching call sites.
//!
//! Windows reset lazily on first touch after expiry. A sweep runs at most
//! once per [`SWEEP_INTERVAL`], from whichever request crosses the interval,
//! and drops entries idle for several window-durations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default requests allowed per key per window.
pub const DEFAULT_MAX: u32 = 30;

/// Shared bucket for unauthenticated traffic.
pub const ANONYMOUS_KEY: &str = "anonymous";

/// Ceiling applied to the anonymous bucket regardless of the caller's `max`.
pub const ANONYMOUS_MAX: u32 = 10;

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Entries idle longer than this many windows are dropped by the sweep.
const SWEEP_RETENTION_WINDOWS: u32 = 3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("RATE_LIMIT_EXCEEDED")]
pub struct RateLimitError;

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

pub struct RateLimiter {
    window: Duration,
    sweep_interval: Duration,
    entries: Mutex<HashMap<String, WindowEntry>>,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_WINDOW, SWEEP_INTERVAL)
    }

    /// Limiter with custom window and sweep timings.
    pub fn with_config(window: Duration, sweep_interval: Duration) -> Self {
        Self {
            window,
            sweep_interval,
            entries: Mutex::new(HashMap::new()),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Consume one unit for `key`, up to `max` per window.
    ///
    /// `None` routes the caller to the shared anonymous bucket with the
    /// stricter of `max` and [`ANONYMOUS_MAX`], so one anonymous burst cannot
    /// exhaust capacity meant for identified users.
    pub fn check(&self, key: Option<&str>, max: u32) -> Result<(), RateLimitError> {
        let (key, max) = match key {
            Some(k) => (k, max),
            None => (ANONYMOUS_KEY, max.min(ANONYMOUS_MAX)),
        };

        self.maybe_sweep();

        let now = Instant::now();
        let mut entries = lock_unpoisoned(&self.entries);

        match entries.get_mut(key) {
            None => {
                entries.insert(
                    key.to_string(),
                    WindowEntry {
                        count: 1,
                        window_start: now,
                    },
                );
                Ok(())
            }
            Some(entry) if now.duration_since(entry.window_start) > self.window => {
                entry.count = 1;
                entry.window_start = now;
                Ok(())
            }
            Some(entry) => {
                if entry.count >= max {
                    tracing::warn!(key, max, "rate limit exceeded");
                    return Err(RateLimitError);
                }
                entry.count += 1;
                Ok(())
            }
        }
    }

    /// Units still available for `key` in the current window.
    pub fn remaining(&self, key: &str, max: u32) -> u32 {
        let entries = lock_unpoisoned(&self.entries);
        match entries.get(key) {
            Some(entry) if Instant::now().duration_since(entry.window_start) <= self.window => {
                max.saturating_sub(entry.count)
            }
            _ => max,
        }
    }

    /// Drop long-idle windows, at most once per sweep interval.
    fn maybe_sweep(&self) {
        let now = Instant::now();
        {
            let mut last = lock_unpoisoned(&self.last_sweep);
            if now.duration_since(*last) < self.sweep_interval {
                return;
            }
            *last = now;
        }

        let cutoff = self.window * SWEEP_RETENTION_WINDOWS;
        let mut entries = lock_unpoisoned(&self.entries);
        entries.retain(|_, entry| now.duration_since(entry.window_start) <= cutoff);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_unpoisoned<'a, T>(mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
