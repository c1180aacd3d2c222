//! Fixed-window pacing for embedding calls.
//!
//! Hosted embedding APIs enforce a requests-per-minute quota. The window
//! counts calls; once `calls_per_window` calls have been made, the next call
//! first sleeps for `pause` and the count restarts at zero. A run never
//! sleeps after its last call.
//! A window is created per pipeline run and never shared.

use std::time::Duration;

use tracing::info;

/// How many calls may be made before pausing, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    calls_per_window: u32,
    pause: Duration,
}

impl RateLimitPolicy {
    /// Builds a policy. A window of zero calls is treated as one.
    pub fn new(calls_per_window: u32, pause: Duration) -> Self {
        Self {
            calls_per_window: calls_per_window.max(1),
            pause,
        }
    }

    pub fn calls_per_window(&self) -> u32 {
        self.calls_per_window
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }
}

impl Default for RateLimitPolicy {
    /// 60 calls, then a 60 second pause.
    fn default() -> Self {
        Self::new(60, Duration::from_secs(60))
    }
}

/// Call counter for one pipeline run.
#[derive(Debug)]
pub struct RateLimitWindow {
    policy: RateLimitPolicy,
    in_window: u32,
    pauses: usize,
}

impl RateLimitWindow {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            in_window: 0,
            pauses: 0,
        }
    }

    /// Waits until another call may be made, pausing first when the current
    /// window is full.
    pub async fn acquire(&mut self) {
        if self.in_window >= self.policy.calls_per_window {
            self.pause().await;
            self.in_window = 0;
        }
        self.in_window += 1;
    }

    /// Sleeps for the configured pause and counts it.
    async fn pause(&mut self) {
        self.pauses += 1;
        info!(
            pause_secs = self.policy.pause.as_secs_f64(),
            pauses = self.pauses,
            "rate limit window full, pausing"
        );
        tokio::time::sleep(self.policy.pause).await;
    }

    /// Calls made since the last reset.
    pub fn in_window(&self) -> u32 {
        self.in_window
    }

    /// Pauses taken so far in this run.
    pub fn pauses(&self) -> usize {
        self.pauses
    }
}
