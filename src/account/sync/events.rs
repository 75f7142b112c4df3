//! Event system for account synchronization.
//!
//! The orchestrator reports what happens during a cycle (accounts synced or failed, bookings
//! submitted) as `SyncEvent`s. Handlers registered with the `EventDispatcher` decide how to
//! surface them to an operator.

use crate::account::{AccountId, ClientId, SyncStage};
use tracing::{info, warn};

/// Events that occur during a synchronization cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A cycle started for a client
    CycleStarted {
        client_id: ClientId,
        account_count: usize,
    },
    /// One account was fetched, logged and deduplicated
    AccountSynced {
        client_id: ClientId,
        account_id: AccountId,
        fetched: usize,
        new_transactions: usize,
    },
    /// One account failed; the cycle continues with the next account
    AccountFailed {
        client_id: ClientId,
        account_id: AccountId,
        stage: SyncStage,
        error: String,
    },
    /// The aggregated new transactions were handed to the booking engine
    BookingSubmitted {
        client_id: ClientId,
        transactions: usize,
    },
    /// The cycle finished
    CycleCompleted {
        client_id: ClientId,
        synced_accounts: usize,
        failed_accounts: usize,
        new_transactions: usize,
    },
    /// The cycle aborted with a terminal error
    CycleFailed { client_id: ClientId, error: String },
}

/// Error returned by an event handler.
#[derive(Debug, thiserror::Error)]
#[error("Event handler error: {0}")]
pub struct EventHandlerError(pub String);

/// Trait for handling sync events.
#[async_trait::async_trait]
pub trait SyncEventHandler: Send + Sync {
    /// Handle a sync event.
    async fn handle(&self, event: &SyncEvent) -> Result<(), EventHandlerError>;

    /// Get the name of this handler for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Event dispatcher that manages multiple event handlers.
///
/// Handlers are called in registration order. A failing handler is logged and does not stop
/// the others, nor the cycle that emitted the event.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<std::sync::Arc<dyn SyncEventHandler>>,
}

impl EventDispatcher {
    /// Create a new, empty event dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register a new event handler.
    pub fn register_handler(&mut self, handler: std::sync::Arc<dyn SyncEventHandler>) {
        self.handlers.push(handler);
    }

    /// Dispatch an event to all registered handlers.
    pub async fn dispatch(&self, event: &SyncEvent) {
        for handler in &self.handlers {
            if let Err(e) = handler.handle(event).await {
                tracing::error!("Handler {} failed to process event: {}", handler.name(), e);
            }
        }
    }
}

/// Writes every event to the tracing log.
pub struct LoggingEventHandler;

#[async_trait::async_trait]
impl SyncEventHandler for LoggingEventHandler {
    async fn handle(&self, event: &SyncEvent) -> Result<(), EventHandlerError> {
        match event {
            SyncEvent::CycleStarted {
                client_id,
                account_count,
            } => {
                info!(
                    "Starting synchronization for client {} ({} accounts)",
                    client_id, account_count
                );
            }
            SyncEvent::AccountSynced {
                client_id,
                account_id,
                fetched,
                new_transactions,
            } => {
                info!(
                    "Client {} account {}: fetched {}, {} new",
                    client_id, account_id, fetched, new_transactions
                );
            }
            SyncEvent::AccountFailed {
                client_id,
                account_id,
                stage,
                error,
            } => {
                warn!(
                    "Client {} account {} failed during {}: {}",
                    client_id, account_id, stage, error
                );
            }
            SyncEvent::BookingSubmitted {
                client_id,
                transactions,
            } => {
                info!(
                    "Submitted {} new transactions of client {} for booking",
                    transactions, client_id
                );
            }
            SyncEvent::CycleCompleted {
                client_id,
                synced_accounts,
                failed_accounts,
                new_transactions,
            } => {
                info!(
                    "Synchronization for client {} completed: {} accounts synced, {} failed, {} new transactions",
                    client_id, synced_accounts, failed_accounts, new_transactions
                );
            }
            SyncEvent::CycleFailed { client_id, error } => {
                tracing::error!("Synchronization for client {} failed: {}", client_id, error);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LoggingEventHandler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::sync::test_support::RecordingEventHandler;
    use std::sync::Arc;

    struct FailingHandler;

    #[async_trait::async_trait]
    impl SyncEventHandler for FailingHandler {
        async fn handle(&self, _event: &SyncEvent) -> Result<(), EventHandlerError> {
            Err(EventHandlerError("alert channel unavailable".to_string()))
        }

        fn name(&self) -> &'static str {
            "FailingHandler"
        }
    }

    #[tokio::test]
    async fn failing_handler_does_not_stop_later_handlers() {
        let recorder = Arc::new(RecordingEventHandler::default());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(Arc::new(FailingHandler));
        dispatcher.register_handler(Arc::new(LoggingEventHandler));
        dispatcher.register_handler(recorder.clone());

        let event = SyncEvent::AccountFailed {
            client_id: 1,
            account_id: 2,
            stage: SyncStage::Fetch,
            error: "TAN required by bank".to_string(),
        };
        dispatcher.dispatch(&event).await;

        assert_eq!(recorder.events(), vec![event]);
    }
}
