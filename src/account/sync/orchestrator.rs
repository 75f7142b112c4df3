//! Account sync orchestrator and integration point for all sync services.
//!
//! This module defines the `AccountSyncOrchestrator`, which runs one synchronization cycle for a
//! client. For every configured account it fetches the bank statement, writes the raw records to
//! the audit trail, converts them into transaction candidates and stores the ones that are new.
//! The new transactions of all accounts are then handed to the booking engine in one call.
//!
//! The orchestrator is responsible for:
//! - Wiring together the statement source, audit logger, processor, save service and booking
//! - Keeping a failing account from affecting the others
//! - Dispatching sync events and tracking per-account outcomes
//!
//! Accounts are processed sequentially, in the order the config repository returns them.

use crate::account::sync::{
    audit_logger::AuditLogger,
    booking::BookingService,
    events::{EventDispatcher, LoggingEventHandler, SyncEvent, SyncEventHandler},
    progress_tracker::{CycleProgressTracker, CycleReport},
    repositories::{AccountConfigRepository, TransactionLogRepository, TransactionRepository},
    save_service::TransactionSaveService,
    transaction_processor::TransactionProcessor,
};
use crate::account::{AccountConfig, AccountSyncError, ClientId, SyncError, Transaction};
use crate::statement::{StatementRequest, StatementSource, StatementWindow};

use chrono::{DateTime, Days, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration for a synchronization cycle
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Days of history to request from the bank, ending today. `None` lets the source decide.
    ///
    /// Only narrows the fetch; deduplication always compares against the full stored history.
    pub lookback_days: Option<u32>,
}

impl SyncConfig {
    /// Fetch window for a cycle running at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> Option<StatementWindow> {
        let to = now.date_naive();
        let days = self.lookback_days?;
        to.checked_sub_days(Days::new(u64::from(days)))
            .map(|from| StatementWindow { from, to })
    }
}

/// What one account contributed to a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSyncResult {
    pub fetched: usize,
    pub logged: usize,
    /// Newly stored transactions, with ids, in statement order
    pub new_transactions: Vec<Transaction>,
}

/// Main account sync orchestrator that coordinates all sync components.
///
/// Collaborators are shared trait objects, so one orchestrator can run cycles for several
/// clients concurrently.
pub struct AccountSyncOrchestrator {
    account_config_repo: Arc<dyn AccountConfigRepository>,
    statement_source: Arc<dyn StatementSource>,
    booking_service: Arc<dyn BookingService>,

    // Services
    audit_logger: AuditLogger,
    transaction_processor: TransactionProcessor,
    save_service: TransactionSaveService,
    event_dispatcher: EventDispatcher,

    // Configuration
    config: SyncConfig,
}

impl AccountSyncOrchestrator {
    /// Create a new orchestrator. A `LoggingEventHandler` is registered by default.
    pub fn new(
        account_config_repo: Arc<dyn AccountConfigRepository>,
        statement_source: Arc<dyn StatementSource>,
        log_repo: Arc<dyn TransactionLogRepository>,
        transaction_repo: Arc<dyn TransactionRepository>,
        booking_service: Arc<dyn BookingService>,
        config: SyncConfig,
    ) -> Self {
        let mut event_dispatcher = EventDispatcher::new();
        event_dispatcher.register_handler(Arc::new(LoggingEventHandler));

        Self {
            account_config_repo,
            statement_source,
            booking_service,
            audit_logger: AuditLogger::new(log_repo),
            transaction_processor: TransactionProcessor::new(),
            save_service: TransactionSaveService::new(transaction_repo),
            event_dispatcher,
            config,
        }
    }

    /// Register an additional event handler.
    pub fn with_event_handler(mut self, handler: Arc<dyn SyncEventHandler>) -> Self {
        self.event_dispatcher.register_handler(handler);
        self
    }

    /// Run one synchronization cycle for a client.
    ///
    /// Account failures are reported in the returned `CycleReport`. The cycle itself only fails
    /// when the client's account configs cannot be loaded or the booking submission fails; in
    /// the latter case transactions stored during the cycle remain stored.
    pub async fn run_cycle(
        &self,
        now: DateTime<Utc>,
        client_id: ClientId,
    ) -> Result<CycleReport, SyncError> {
        let account_configs = match self.account_config_repo.find_by_client(client_id).await {
            Ok(configs) => configs,
            Err(source) => {
                let error = SyncError::AccountConfigLoad { client_id, source };
                self.dispatch_cycle_failed(client_id, &error).await;
                return Err(error);
            }
        };

        self.event_dispatcher
            .dispatch(&SyncEvent::CycleStarted {
                client_id,
                account_count: account_configs.len(),
            })
            .await;

        let mut tracker = CycleProgressTracker::new(client_id, now);
        let mut new_transactions = Vec::new();

        for account_config in &account_configs {
            match self.sync_account(now, account_config).await {
                Ok(result) => {
                    tracker.record_synced(
                        account_config.id,
                        result.fetched,
                        result.logged,
                        result.new_transactions.len(),
                    );
                    self.event_dispatcher
                        .dispatch(&SyncEvent::AccountSynced {
                            client_id,
                            account_id: account_config.id,
                            fetched: result.fetched,
                            new_transactions: result.new_transactions.len(),
                        })
                        .await;
                    new_transactions.extend(result.new_transactions);
                }
                Err(e) => {
                    tracker.record_failed(account_config.id, &e);
                    self.event_dispatcher
                        .dispatch(&SyncEvent::AccountFailed {
                            client_id,
                            account_id: account_config.id,
                            stage: e.stage(),
                            error: e.to_string(),
                        })
                        .await;
                }
            }
        }

        if let Err(source) = self
            .booking_service
            .create_and_save_bookings(client_id, &new_transactions, now)
            .await
        {
            let error = SyncError::Booking {
                client_id,
                source,
                report: Box::new(tracker.finish(0)),
            };
            self.dispatch_cycle_failed(client_id, &error).await;
            return Err(error);
        }

        self.event_dispatcher
            .dispatch(&SyncEvent::BookingSubmitted {
                client_id,
                transactions: new_transactions.len(),
            })
            .await;

        let report = tracker.finish(new_transactions.len());
        self.event_dispatcher
            .dispatch(&SyncEvent::CycleCompleted {
                client_id,
                synced_accounts: report.synced_accounts(),
                failed_accounts: report.failed_accounts(),
                new_transactions: report.booked_transactions,
            })
            .await;

        info!("{}", report.summary());
        Ok(report)
    }

    /// Fetch, log, convert and save one account.
    ///
    /// The audit write happens before deduplication; if it fails nothing is saved for the
    /// account.
    pub async fn sync_account(
        &self,
        now: DateTime<Utc>,
        account_config: &AccountConfig,
    ) -> Result<AccountSyncResult, AccountSyncError> {
        let request = StatementRequest {
            routing_code: account_config.routing_code.clone(),
            endpoint_url: account_config.endpoint_url.clone(),
            user: account_config.user.clone(),
            password: account_config.password.clone(),
            window: self.config.window(now),
        };
        debug!("Fetching statements: {:?}", request);

        let records = self.statement_source.fetch_statements(&request).await?;

        let logged = self
            .audit_logger
            .log(now, account_config, &records)
            .await
            .map_err(AccountSyncError::AuditWriteError)?;

        let candidates = self
            .transaction_processor
            .process_records(account_config, &records);

        let new_transactions = self
            .save_service
            .save_new_transactions(account_config, candidates)
            .await
            .map_err(AccountSyncError::PersistenceError)?;

        Ok(AccountSyncResult {
            fetched: records.len(),
            logged,
            new_transactions,
        })
    }

    async fn dispatch_cycle_failed(&self, client_id: ClientId, error: &SyncError) {
        self.event_dispatcher
            .dispatch(&SyncEvent::CycleFailed {
                client_id,
                error: error.to_string(),
            })
            .await;
    }
}
