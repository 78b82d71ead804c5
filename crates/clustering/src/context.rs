//! Per-run clustering context: cancellation and counters

use crate::identifiers::Strategy;
use modmap_core::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Counters for one top-level run
#[derive(Debug, Default)]
pub struct ClusteringStats {
    oracle_calls: AtomicUsize,
    oracle_failures: AtomicUsize,
    malformed_responses: AtomicUsize,
    degenerate_levels: AtomicUsize,
    levels_within_budget: AtomicUsize,
    unresolved_tokens: AtomicUsize,
    resolved_by_strategy: [AtomicUsize; Strategy::ALL.len()],
}

impl ClusteringStats {
    pub(crate) fn record_oracle_call(&self) {
        self.oracle_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_oracle_failure(&self) {
        self.oracle_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_degenerate(&self) {
        self.degenerate_levels.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_within_budget(&self) {
        self.levels_within_budget.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resolved(&self, strategy: Strategy) {
        let slot = Strategy::ALL
            .iter()
            .position(|s| *s == strategy)
            .unwrap_or_default();
        self.resolved_by_strategy[slot].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unresolved(&self) {
        self.unresolved_tokens.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let resolved_by_strategy: BTreeMap<Strategy, usize> = Strategy::ALL
            .iter()
            .zip(&self.resolved_by_strategy)
            .map(|(strategy, count)| (*strategy, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();
        StatsSnapshot {
            oracle_calls: self.oracle_calls.load(Ordering::Relaxed),
            oracle_failures: self.oracle_failures.load(Ordering::Relaxed),
            malformed_responses: self.malformed_responses.load(Ordering::Relaxed),
            degenerate_levels: self.degenerate_levels.load(Ordering::Relaxed),
            levels_within_budget: self.levels_within_budget.load(Ordering::Relaxed),
            resolved_tokens: resolved_by_strategy.values().sum(),
            unresolved_tokens: self.unresolved_tokens.load(Ordering::Relaxed),
            resolved_by_strategy,
        }
    }
}

/// Point-in-time copy of [`ClusteringStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub oracle_calls: usize,
    pub oracle_failures: usize,
    pub malformed_responses: usize,
    pub degenerate_levels: usize,
    pub levels_within_budget: usize,
    pub resolved_tokens: usize,
    pub unresolved_tokens: usize,
    pub resolved_by_strategy: BTreeMap<Strategy, usize>,
}

/// State scoped to one top-level run, shared by every recursive call.
///
/// Cloning is cheap; clones share the cancellation token and the counters.
#[derive(Debug, Clone, Default)]
pub struct ClusteringContext {
    cancel_token: CancellationToken,
    stats: Arc<ClusteringStats>,
}

impl ClusteringContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context cancelled together with `token`
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel_token: token,
            stats: Arc::default(),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// `Err(Cancelled)` once the run has been cancelled
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn stats(&self) -> &ClusteringStats {
        &self.stats
    }
}
