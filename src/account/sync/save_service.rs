//! Deduplicating save of fetched transactions.
//!
//! Statement fetch windows overlap from one cycle to the next, so most of what the bank returns
//! has been stored before. At the same time, two identical movements on the same day (two equal
//! card payments to the same shop, say) are legitimate and must both be kept. Deduplication is
//! therefore a multiset difference: for every field-equality key, only the number of incoming
//! occurrences exceeding the stored occurrences is new.

use crate::account::sync::repositories::TransactionRepository;
use crate::account::{
    AccountConfig, AccountId, ClientId, RepositoryError, Transaction, TransactionKey,
};

use itertools::Itertools;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

type AccountLocks = HashMap<(ClientId, AccountId), Arc<Mutex<()>>>;

/// Persists the genuinely new part of a candidate batch.
///
/// Saves for the same account are serialized, so the history read and the insert based on it
/// are never interleaved with another save of that account. Clones share the locks.
#[derive(Clone)]
pub struct TransactionSaveService {
    transaction_repo: Arc<dyn TransactionRepository>,
    account_locks: Arc<Mutex<AccountLocks>>,
}

impl TransactionSaveService {
    pub fn new(transaction_repo: Arc<dyn TransactionRepository>) -> Self {
        Self {
            transaction_repo,
            account_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn account_lock(&self, client_id: ClientId, account_id: AccountId) -> Arc<Mutex<()>> {
        self.account_locks
            .lock()
            .await
            .entry((client_id, account_id))
            .or_default()
            .clone()
    }

    /// Save the candidates not yet recorded for the account and return them in batch order.
    ///
    /// The comparison universe is the account's full stored history.
    pub async fn save_new_transactions(
        &self,
        account_config: &AccountConfig,
        candidates: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let lock = self
            .account_lock(account_config.client_id, account_config.id)
            .await;
        let _guard = lock.lock().await;

        let existing = self
            .transaction_repo
            .find_by_account(account_config.client_id, account_config.id)
            .await?;

        let candidate_count = candidates.len();
        let new_transactions = select_new_transactions(&existing, candidates);

        info!(
            "Account {}: {} of {} fetched transactions are new ({} already stored)",
            account_config.id,
            new_transactions.len(),
            candidate_count,
            existing.len()
        );

        if new_transactions.is_empty() {
            return Ok(new_transactions);
        }

        self.transaction_repo.create_all(new_transactions).await
    }
}

/// Select the candidates that are new with respect to `existing`.
///
/// For each key the first `max(0, incoming - existing)` candidates bearing it are selected, so
/// the result preserves the relative order of `candidates`.
pub fn select_new_transactions(
    existing: &[Transaction],
    candidates: Vec<Transaction>,
) -> Vec<Transaction> {
    let selected: Vec<bool> = {
        let existing_counts = existing.iter().map(Transaction::key).counts();
        let incoming_counts = candidates.iter().map(Transaction::key).counts();
        let mut admitted: HashMap<TransactionKey<'_>, usize> = HashMap::new();

        candidates
            .iter()
            .map(|candidate| {
                let key = candidate.key();
                let stored = existing_counts.get(&key).copied().unwrap_or(0);
                let excess = incoming_counts[&key].saturating_sub(stored);
                let taken = admitted.entry(key).or_insert(0);
                if *taken < excess {
                    *taken += 1;
                    true
                } else {
                    false
                }
            })
            .collect()
    };

    let skipped = selected.iter().filter(|s| !**s).count();
    if skipped > 0 {
        debug!("Skipping {} already stored transactions", skipped);
    }

    candidates
        .into_iter()
        .zip(selected)
        .filter_map(|(candidate, is_new)| is_new.then_some(candidate))
        .collect()
}
