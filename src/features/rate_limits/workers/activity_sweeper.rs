use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::features::rate_limits::services::RateLimiter;

/// Background worker that evicts identities with no request left in the window
pub struct ActivitySweeper {
    rate_limiter: Arc<RateLimiter>,
    every: Duration,
}

impl ActivitySweeper {
    pub fn new(rate_limiter: Arc<RateLimiter>, every: Duration) -> Self {
        Self {
            rate_limiter,
            every,
        }
    }

    /// Run the sweeper in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting activity sweeper (every {}s)",
            self.every.as_secs()
        );

        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; nothing to sweep yet
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.sweep_once();
        }
    }

    fn sweep_once(&self) -> usize {
        let removed = self.rate_limiter.sweep(Instant::now());
        if removed > 0 {
            tracing::info!(
                "Evicted {} idle clients from activity log ({} still tracked)",
                removed,
                self.rate_limiter.tracked_clients()
            );
        }
        removed
    }
}
