use std::collections::VecDeque;

use dashmap::DashMap;
use tokio::time::Instant;

/// Per-client request timestamps, oldest first.
///
/// Each identity's sequence is mutated under its shard lock, so a
/// check-then-append on one identity is atomic while different identities
/// proceed independently. Only the rate limiter touches the sequences.
#[derive(Debug, Default)]
pub struct ActivityLog {
    clients: DashMap<String, VecDeque<Instant>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities currently tracked
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Run `f` on the identity's history, creating an empty one if absent
    pub(in crate::features::rate_limits) fn update<R>(
        &self,
        identity: &str,
        f: impl FnOnce(&mut VecDeque<Instant>) -> R,
    ) -> R {
        let mut history = self.clients.entry(identity.to_string()).or_default();
        f(history.value_mut())
    }

    /// Run `f` on the identity's history only if it is already tracked
    pub(in crate::features::rate_limits) fn update_existing<R>(
        &self,
        identity: &str,
        f: impl FnOnce(&mut VecDeque<Instant>) -> R,
    ) -> Option<R> {
        self.clients
            .get_mut(identity)
            .map(|mut history| f(history.value_mut()))
    }

    /// Keep only identities for which `keep` returns true; returns how many were dropped
    pub(in crate::features::rate_limits) fn retain(
        &self,
        mut keep: impl FnMut(&mut VecDeque<Instant>) -> bool,
    ) -> usize {
        let mut removed = 0;
        self.clients.retain(|_, history| {
            let kept = keep(history);
            if !kept {
                removed += 1;
            }
            kept
        });
        removed
    }
}
