use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::core::config::RateLimitConfig;
use crate::features::rate_limits::models::ActivityLog;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Recorded; `requests_in_window` includes this request
    Admitted { requests_in_window: usize },
    /// Not recorded; the oldest counted request leaves the window after `retry_after`
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

/// Read-only view of a client's window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub requests_in_window: usize,
    pub max_requests: usize,
    pub window: Duration,
    /// `Some` when the next request would be rejected
    pub retry_after: Option<Duration>,
}

impl RateLimitStatus {
    pub fn requests_remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.requests_in_window)
    }
}

/// Sliding-window admission control per client identity
pub struct RateLimiter {
    config: RateLimitConfig,
    log: ActivityLog,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, log: ActivityLog) -> Self {
        Self { config, log }
    }

    /// Drop timestamps that are `window` or more older than `now`
    fn prune(history: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        history.retain(|&at| now.saturating_duration_since(at) < window);
    }

    fn retry_after(history: &VecDeque<Instant>, now: Instant, window: Duration) -> Duration {
        history
            .iter()
            .min()
            .map(|&oldest| (oldest + window).saturating_duration_since(now))
            .unwrap_or(window)
    }

    /// Admit and record a request from `identity` at `now`, or reject it.
    ///
    /// The pruned history is kept on rejection too, so stale timestamps do
    /// not pile up for a client that keeps hammering.
    pub fn check_and_record(&self, identity: &str, now: Instant) -> Admission {
        let RateLimitConfig {
            max_requests,
            window,
            ..
        } = self.config;

        self.log.update(identity, |history| {
            Self::prune(history, now, window);

            if history.len() >= max_requests {
                return Admission::Rejected {
                    retry_after: Self::retry_after(history, now, window),
                };
            }

            history.push_back(now);
            Admission::Admitted {
                requests_in_window: history.len(),
            }
        })
    }

    /// Current window for `identity` without recording anything
    pub fn status(&self, identity: &str, now: Instant) -> RateLimitStatus {
        let RateLimitConfig {
            max_requests,
            window,
            ..
        } = self.config;

        let (requests_in_window, retry_after) = self
            .log
            .update_existing(identity, |history| {
                Self::prune(history, now, window);
                let retry_after = (history.len() >= max_requests)
                    .then(|| Self::retry_after(history, now, window));
                (history.len(), retry_after)
            })
            .unwrap_or((0, None));

        RateLimitStatus {
            requests_in_window,
            max_requests,
            window,
            retry_after,
        }
    }

    pub fn requests_in_window(&self, identity: &str, now: Instant) -> usize {
        self.status(identity, now).requests_in_window
    }

    /// Forget identities with no request inside the window; returns how many were removed
    pub fn sweep(&self, now: Instant) -> usize {
        let window = self.config.window;
        self.log.retain(|history| {
            Self::prune(history, now, window);
            !history.is_empty()
        })
    }

    /// Number of identities currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.log.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::IPv4;
    use fake::Fake;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn limiter(max_requests: usize, window_secs: u64) -> RateLimiter {
        RateLimiter::new(
            RateLimitConfig::new(max_requests, window_secs),
            ActivityLog::new(),
        )
    }

    #[test]
    fn test_first_request_is_admitted() {
        let limiter = limiter(5, 60);
        assert_eq!(
            limiter.check_and_record("1.2.3.4", Instant::now()),
            Admission::Admitted {
                requests_in_window: 1
            }
        );
    }

    #[test]
    fn test_rejects_request_over_limit() {
        let limiter = limiter(5, 60);
        let start = Instant::now();

        for i in 0..5u64 {
            let admission = limiter.check_and_record("1.2.3.4", start + Duration::from_secs(i * 2));
            assert!(admission.is_admitted(), "request {} should be admitted", i + 1);
        }

        let sixth = limiter.check_and_record("1.2.3.4", start + Duration::from_secs(10));
        assert_eq!(
            sixth,
            Admission::Rejected {
                retry_after: Duration::from_secs(50)
            }
        );
    }

    #[test]
    fn test_admits_again_after_window_passes() {
        let limiter = limiter(5, 60);
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_and_record("1.2.3.4", start).is_admitted());
        }
        assert!(!limiter.check_and_record("1.2.3.4", start).is_admitted());

        let later = start + Duration::from_secs(61);
        assert_eq!(
            limiter.check_and_record("1.2.3.4", later),
            Admission::Admitted {
                requests_in_window: 1
            }
        );
    }

    #[test]
    fn test_entry_exactly_window_old_is_not_counted() {
        let limiter = limiter(1, 60);
        let start = Instant::now();

        assert!(limiter.check_and_record("a", start).is_admitted());
        assert!(!limiter
            .check_and_record("a", start + Duration::from_secs(59))
            .is_admitted());
        assert!(limiter
            .check_and_record("a", start + Duration::from_secs(60))
            .is_admitted());
    }

    #[test]
    fn test_pruning_is_partial() {
        let limiter = limiter(3, 60);
        let start = Instant::now();

        limiter.check_and_record("a", start);
        limiter.check_and_record("a", start + Duration::from_secs(30));
        limiter.check_and_record("a", start + Duration::from_secs(40));

        // Only the first request has aged out
        assert_eq!(
            limiter.check_and_record("a", start + Duration::from_secs(65)),
            Admission::Admitted {
                requests_in_window: 3
            }
        );
    }

    #[test]
    fn test_rejection_still_prunes_history() {
        let limiter = limiter(2, 60);
        let start = Instant::now();

        limiter.check_and_record("a", start);
        limiter.check_and_record("a", start + Duration::from_secs(50));
        let rejected = limiter.check_and_record("a", start + Duration::from_secs(55));
        assert!(!rejected.is_admitted());

        let status = limiter.status("a", start + Duration::from_secs(70));
        assert_eq!(status.requests_in_window, 1);
        assert_eq!(status.requests_remaining(), 1);
        assert!(status.retry_after.is_none());
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(limiter.check_and_record("a", now).is_admitted());
        assert!(!limiter.check_and_record("a", now).is_admitted());
        assert!(limiter.check_and_record("b", now).is_admitted());
    }

    #[test]
    fn test_status_does_not_record_or_create() {
        let limiter = limiter(2, 60);
        let now = Instant::now();

        let status = limiter.status("ghost", now);
        assert_eq!(status.requests_in_window, 0);
        assert_eq!(status.max_requests, 2);
        assert_eq!(limiter.tracked_clients(), 0);

        limiter.check_and_record("a", now);
        limiter.check_and_record("a", now);
        let status = limiter.status("a", now + Duration::from_secs(15));
        assert_eq!(status.requests_in_window, 2);
        assert_eq!(status.retry_after, Some(Duration::from_secs(45)));
    }

    #[test]
    fn test_sweep_removes_idle_clients() {
        let limiter = limiter(5, 60);
        let start = Instant::now();

        limiter.check_and_record("old", start);
        limiter.check_and_record("fresh", start + Duration::from_secs(50));

        assert_eq!(limiter.sweep(start + Duration::from_secs(70)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.requests_in_window("fresh", start + Duration::from_secs(70)), 1);
    }

    #[test]
    fn test_many_generated_clients_each_get_their_quota() {
        let limiter = limiter(2, 60);
        let now = Instant::now();
        let clients: HashSet<String> = (0..20).map(|_| IPv4().fake()).collect();

        for client in &clients {
            assert!(limiter.check_and_record(client, now).is_admitted());
            assert!(limiter.check_and_record(client, now).is_admitted());
            assert!(!limiter.check_and_record(client, now).is_admitted());
        }
        assert_eq!(limiter.tracked_clients(), clients.len());
    }

    #[test]
    fn test_concurrent_requests_never_exceed_limit() {
        let limiter = Arc::new(limiter(5, 60));
        let now = Instant::now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.check_and_record("1.2.3.4", now).is_admitted())
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();

        assert_eq!(admitted, 5);
    }
}
