//! Types for the statement gateway integration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One line item as reported by the bank.
///
/// The raw payload is kept verbatim for the audit trail; the parsed fields are optional because
/// banks regularly omit counterparty details (cash withdrawals, fees, interest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatementRecord {
    /// The unparsed statement line exactly as the bank returned it.
    pub raw: String,
    /// Booking date of the movement.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Counterparty name.
    #[serde(default)]
    pub name: Option<String>,
    /// Counterparty IBAN.
    #[serde(default)]
    pub iban: Option<String>,
    /// Counterparty BIC.
    #[serde(default)]
    pub bic: Option<String>,
    /// Free-text memo (purpose of payment).
    #[serde(default)]
    pub text: Option<String>,
    /// Signed amount in minor currency units.
    #[serde(default)]
    pub amount: Option<i64>,
}

/// Everything the statement source needs to fetch one account's statements.
#[derive(Clone)]
pub struct StatementRequest {
    /// Bank routing code (BLZ).
    pub routing_code: String,
    /// Endpoint the bank exposes for statement retrieval.
    pub endpoint_url: String,
    pub user: String,
    pub password: String,
    /// Optional fetch window. When absent the source uses its own default range.
    pub window: Option<StatementWindow>,
}

impl std::fmt::Debug for StatementRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementRequest")
            .field("routing_code", &self.routing_code)
            .field("endpoint_url", &self.endpoint_url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("window", &self.window)
            .finish()
    }
}

/// Inclusive date range of statements to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Request body sent to the statement gateway.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatementQuery<'a> {
    pub routing_code: &'a str,
    pub user: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

/// Response body returned by the statement gateway.
#[derive(Debug, Deserialize)]
pub(crate) struct StatementResponse {
    #[serde(default)]
    pub transactions: Vec<RawStatementRecord>,
}

/// Error types for statement retrieval
#[derive(Debug, thiserror::Error)]
pub enum StatementSourceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication failed with status {0}")]
    Authentication(u16),

    #[error("TAN required by bank")]
    TanRequired,

    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl StatementSourceError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StatementSourceError::Transport(_))
    }
}
