//! Transaction coordinator for managing transaction lifecycle
//!
//! Allocates transaction ids and keeps lifecycle metrics (started,
//! committed, aborted). Validation itself happens in the store; the
//! coordinator only records the outcome.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

/// Transaction coordinator for the store
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering. They are observational only and
/// do not synchronize any other memory operations.
#[derive(Debug)]
pub struct TransactionCoordinator {
    next_txn_id: AtomicU64,
    active_count: AtomicU64,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_aborted: AtomicU64,
}

impl TransactionCoordinator {
    /// Create a coordinator with no history
    pub fn new() -> Self {
        Self {
            next_txn_id: AtomicU64::new(1),
            active_count: AtomicU64::new(0),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
        }
    }

    /// Allocate an id for a new transaction and record its start
    pub fn start(&self) -> u64 {
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::Relaxed);
        self.active_count.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
        debug!(target: "authbridge::txn", txn_id, "Transaction started");
        txn_id
    }

    /// Record transaction commit
    pub fn record_commit(&self, txn_id: u64) {
        self.decrement_active();
        self.total_committed.fetch_add(1, Ordering::Relaxed);
        info!(target: "authbridge::txn", txn_id, "Transaction committed");
    }

    /// Record transaction abort (rollback or failed validation)
    pub fn record_abort(&self, txn_id: u64, reason: &str) {
        self.decrement_active();
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
        warn!(target: "authbridge::txn", txn_id, reason, "Transaction aborted");
    }

    fn decrement_active(&self) {
        // saturating: a stray double record must not wrap
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
    }

    /// Current active transaction count
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Snapshot of transaction statistics
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            active_count: self.active_count.load(Ordering::Relaxed),
            total_started: started,
            total_committed: committed,
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for TransactionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Transaction metrics
#[derive(Debug, Clone)]
pub struct TransactionMetrics {
    /// Number of currently active transactions
    pub active_count: u64,
    /// Total number of transactions started
    pub total_started: u64,
    /// Total number of transactions committed
    pub total_committed: u64,
    /// Total number of transactions aborted
    pub total_aborted: u64,
    /// Commit success rate (committed / started)
    pub commit_rate: f64,
}

impl TransactionMetrics {
    /// Total transactions that completed (committed + aborted)
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_aborted
    }
}
