//! Statement source integration
//!
//! This module defines the seam through which bank statements enter the system, together with
//! an HTTP client for a JSON statement gateway. The gateway fronts the actual banking protocol;
//! nothing here speaks that protocol directly.

/// HTTP client for the statement gateway
mod client;
/// Type definitions for statement records and requests
mod types;

pub use client::{HttpStatementSource, StatementClientConfig};
pub use types::*;

/// Source of raw bank statement records.
#[async_trait::async_trait]
pub trait StatementSource: Send + Sync {
    /// Fetch all statement records the bank reports for the given account and window.
    async fn fetch_statements(
        &self,
        request: &StatementRequest,
    ) -> Result<Vec<RawStatementRecord>, StatementSourceError>;
}
