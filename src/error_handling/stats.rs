//! Gateway outcome statistics.
//!
//! This module provides thread-safe counters for the caller-visible outcome of
//! every ingress request.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::OutcomeType;

/// Thread-safe outcome tracker.
///
/// Every `OutcomeType` is initialized to zero on creation, so increments never
/// allocate and can be shared across tasks behind an `Arc`.
pub struct GatewayStats {
    outcomes: HashMap<OutcomeType, AtomicUsize>,
}

impl GatewayStats {
    pub fn new() -> Self {
        let mut outcomes = HashMap::new();
        for outcome in OutcomeType::iter() {
            outcomes.insert(outcome, AtomicUsize::new(0));
        }
        GatewayStats { outcomes }
    }

    /// Increment an outcome counter.
    pub fn increment(&self, outcome: OutcomeType) {
        if let Some(counter) = self.outcomes.get(&outcome) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment outcome counter for {:?} which is not in the map",
                outcome
            );
        }
    }

    pub fn get(&self, outcome: OutcomeType) -> usize {
        self.outcomes
            .get(&outcome)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Total number of requests handled.
    pub fn total(&self) -> usize {
        self.outcomes
            .values()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Snapshot keyed by outcome name, in stable order.
    pub fn snapshot(&self) -> BTreeMap<&'static str, usize> {
        OutcomeType::iter()
            .map(|outcome| (outcome.as_str(), self.get(outcome)))
            .collect()
    }
}

impl Default for GatewayStats {
    fn default() -> Self {
        Self::new()
    }
}
