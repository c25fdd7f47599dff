//! Deadline index - pending timers keyed by order
//!
//! Derived structure that lets the sweeper find due orders without
//! scanning the whole repository. It may lag behind the repository: a
//! stale entry only costs one no-op evaluation, after which the sweeper
//! prunes it; the state machine guards remain the source of truth.

use dashmap::DashMap;
use shared::order::{DeadlineKind, EscrowOrder};

/// One pending deadline per order at most
#[derive(Debug, Default)]
pub struct DeadlineIndex {
    deadlines: DashMap<String, (DeadlineKind, i64)>,
}

impl DeadlineIndex {
    pub fn new() -> Self {
        Self {
            deadlines: DashMap::new(),
        }
    }

    /// Sync the index entry from the aggregate's live timer.
    ///
    /// Called after every persisted write: inserts/replaces the entry
    /// while a timer is live, removes it once none is.
    pub fn track(&self, order: &EscrowOrder) {
        match order.live_deadline() {
            Some((kind, at)) => {
                self.deadlines.insert(order.id.clone(), (kind, at));
            }
            None => {
                self.deadlines.remove(&order.id);
            }
        }
    }

    /// Drop the entry for an order (stale-entry pruning).
    pub fn remove(&self, order_id: &str) {
        self.deadlines.remove(order_id);
    }

    /// All orders whose deadline is at or before `now`.
    pub fn due(&self, now: i64) -> Vec<(String, DeadlineKind)> {
        self.deadlines
            .iter()
            .filter(|entry| entry.value().1 <= now)
            .map(|entry| (entry.key().clone(), entry.value().0))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
