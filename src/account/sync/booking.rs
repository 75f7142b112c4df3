//! Seam to the downstream booking engine.

use crate::account::{BookingError, ClientId, Transaction};
use crate::utils::format_amount;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Decimal places of the minor currency unit used for amounts
pub const AMOUNT_DECIMALS: u32 = 2;

/// Receives the new transactions of a cycle, aggregated across all of a client's accounts.
///
/// Called exactly once per cycle, also when the batch is empty.
#[async_trait::async_trait]
pub trait BookingService: Send + Sync {
    async fn create_and_save_bookings(
        &self,
        client_id: ClientId,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> Result<(), BookingError>;
}

/// Booking service that only reports what it would book.
///
/// Used by the binary until a real booking engine is wired in.
#[derive(Debug, Clone, Default)]
pub struct LoggingBookingService;

#[async_trait::async_trait]
impl BookingService for LoggingBookingService {
    async fn create_and_save_bookings(
        &self,
        client_id: ClientId,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        info!(
            "Client {}: {} new transactions ready for booking at {}",
            client_id,
            transactions.len(),
            now.to_rfc3339()
        );
        for transaction in transactions {
            debug!(
                "  account {} | {} | {} | {}",
                transaction.account_id,
                transaction
                    .date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                transaction.name.as_deref().unwrap_or("-"),
                transaction
                    .amount
                    .map(|a| format_amount(a, AMOUNT_DECIMALS))
                    .unwrap_or_else(|| "-".to_string())
            );
        }
        Ok(())
    }
}
