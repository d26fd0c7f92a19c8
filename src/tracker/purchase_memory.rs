use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Bounded set of storefront app ids already seen for one account.
///
/// Entries are kept in insertion order. Whenever a batch leaves the memory
/// above `cap`, the oldest entries are dropped until only `cap / 2` remain.
#[derive(Debug, Clone)]
pub struct PurchaseMemory {
    cap: usize,
    order: VecDeque<u64>,
    seen: HashSet<u64>,
}

impl PurchaseMemory {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            order: VecDeque::with_capacity(cap + 1),
            seen: HashSet::with_capacity(cap + 1),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, app_id: u64) -> bool {
        self.seen.contains(&app_id)
    }

    /// Retained ids, oldest first
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.order.iter().copied()
    }

    /// Record one tick's titles in order and report, per title, whether it
    /// was absent before this call. A repeated id within the batch is only
    /// new the first time. The cap is enforced once the batch is in.
    pub fn observe(&mut self, app_ids: &[u64]) -> Vec<bool> {
        let fresh = app_ids.iter().map(|id| self.insert(*id)).collect();
        let evicted = self.enforce_cap();
        if evicted > 0 {
            debug!("Purchase memory over cap {}, evicted {} oldest", self.cap, evicted);
        }
        fresh
    }

    fn insert(&mut self, app_id: u64) -> bool {
        if !self.seen.insert(app_id) {
            return false;
        }
        self.order.push_back(app_id);
        true
    }

    fn enforce_cap(&mut self) -> usize {
        if self.order.len() <= self.cap {
            return 0;
        }

        let keep = self.cap / 2;
        let mut evicted = 0;
        while self.order.len() > keep {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
                evicted += 1;
            }
        }
        evicted
    }
}
