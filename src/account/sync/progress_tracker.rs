//! Progress tracking for synchronization cycles.
//!
//! The `CycleProgressTracker` records the outcome of every account processed in a cycle and
//! turns them into a `CycleReport` once the cycle completes. `run_cycle` returns the report.

use crate::account::{AccountId, AccountSyncError, ClientId, SyncStage};
use chrono::{DateTime, Utc};

/// Result of synchronizing one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    Synced {
        account_id: AccountId,
        fetched: usize,
        logged: usize,
        new_transactions: usize,
    },
    Failed {
        account_id: AccountId,
        stage: SyncStage,
        error: String,
    },
}

impl AccountOutcome {
    pub fn account_id(&self) -> AccountId {
        match self {
            AccountOutcome::Synced { account_id, .. } | AccountOutcome::Failed { account_id, .. } => {
                *account_id
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AccountOutcome::Failed { .. })
    }
}

/// Collects account outcomes while a cycle runs
#[derive(Debug, Clone)]
pub struct CycleProgressTracker {
    client_id: ClientId,
    started_at: DateTime<Utc>,
    outcomes: Vec<AccountOutcome>,
}

impl CycleProgressTracker {
    pub fn new(client_id: ClientId, started_at: DateTime<Utc>) -> Self {
        Self {
            client_id,
            started_at,
            outcomes: Vec::new(),
        }
    }

    pub fn record_synced(
        &mut self,
        account_id: AccountId,
        fetched: usize,
        logged: usize,
        new_transactions: usize,
    ) {
        self.outcomes.push(AccountOutcome::Synced {
            account_id,
            fetched,
            logged,
            new_transactions,
        });
    }

    pub fn record_failed(&mut self, account_id: AccountId, error: &AccountSyncError) {
        self.outcomes.push(AccountOutcome::Failed {
            account_id,
            stage: error.stage(),
            error: error.to_string(),
        });
    }

    /// Close the cycle, noting how many transactions were handed to booking.
    pub fn finish(self, booked_transactions: usize) -> CycleReport {
        CycleReport {
            client_id: self.client_id,
            started_at: self.started_at,
            outcomes: self.outcomes,
            booked_transactions,
        }
    }
}

/// Summary of one client's synchronization cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub client_id: ClientId,
    pub started_at: DateTime<Utc>,
    /// One outcome per account, in processing order
    pub outcomes: Vec<AccountOutcome>,
    pub booked_transactions: usize,
}

impl CycleReport {
    pub fn synced_accounts(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failure()).count()
    }

    pub fn failed_accounts(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(AccountOutcome::is_failure)
    }

    pub fn fetched_records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                AccountOutcome::Synced { fetched, .. } => *fetched,
                AccountOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Get a human-readable summary of the cycle
    pub fn summary(&self) -> String {
        format!(
            "Client {}: {} accounts synced, {} records fetched, {} new transactions booked{}",
            self.client_id,
            self.synced_accounts(),
            self.fetched_records(),
            self.booked_transactions,
            if self.has_failures() {
                format!(" ({} accounts failed)", self.failed_accounts())
            } else {
                String::new()
            }
        )
    }
}
