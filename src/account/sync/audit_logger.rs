//! Audit trail of raw statement data.
//!
//! Every record the bank returns is written verbatim to the transaction log before any
//! deduplication decision is made, so the log always shows what the bank reported, regardless
//! of which transactions turned out to be new.

use crate::account::sync::repositories::TransactionLogRepository;
use crate::account::{AccountConfig, RepositoryError, TransactionLogEntry};
use crate::statement::RawStatementRecord;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Writes fetched raw records to the transaction log.
#[derive(Clone)]
pub struct AuditLogger {
    log_repo: Arc<dyn TransactionLogRepository>,
}

impl AuditLogger {
    pub fn new(log_repo: Arc<dyn TransactionLogRepository>) -> Self {
        Self { log_repo }
    }

    /// Log all raw records of one fetch as a single batch, returning how many were written.
    ///
    /// Errors are returned to the caller; a failed audit write must stop that account's cycle.
    pub async fn log(
        &self,
        now: DateTime<Utc>,
        account_config: &AccountConfig,
        records: &[RawStatementRecord],
    ) -> Result<usize, RepositoryError> {
        if records.is_empty() {
            return Ok(0);
        }

        let entries: Vec<TransactionLogEntry> = records
            .iter()
            .map(|record| TransactionLogEntry {
                client_id: account_config.client_id,
                account_id: account_config.id,
                time: now,
                raw: record.raw.clone(),
            })
            .collect();
        let count = entries.len();

        self.log_repo.create_all(entries).await?;

        debug!(
            "Logged {} raw records for account {}",
            count, account_config.id
        );
        Ok(count)
    }
}
