use crate::account::sync::progress_tracker::CycleReport;
use crate::statement::StatementSourceError;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type ClientId = u64;
pub type AccountId = u64;

/// Bank account to synchronize, owned by a client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
	pub id: AccountId,
	pub client_id: ClientId,
	#[serde(default)]
	pub name: Option<String>,
	/// Bank routing code (BLZ)
	pub routing_code: String,
	pub endpoint_url: String,
	pub user: String,
	pub password: String,
	/// Last error reported by the bank for this account, e.g. a pending TAN challenge
	#[serde(default)]
	pub last_error: Option<String>,
}

impl std::fmt::Debug for AccountConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccountConfig")
			.field("id", &self.id)
			.field("client_id", &self.client_id)
			.field("name", &self.name)
			.field("routing_code", &self.routing_code)
			.field("endpoint_url", &self.endpoint_url)
			.field("user", &self.user)
			.field("password", &"<redacted>")
			.field("last_error", &self.last_error)
			.finish()
	}
}

/// A candidate or persisted account movement
///
/// `id` is assigned by the store and is not part of field equality; compare transactions
/// through [`Transaction::key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	#[serde(default)]
	pub id: Option<u64>,
	pub client_id: ClientId,
	pub account_id: AccountId,
	pub date: Option<NaiveDate>,
	pub iban: Option<String>,
	pub bic: Option<String>,
	pub name: Option<String>,
	pub text: Option<String>,
	/// Amount in minor currency units
	pub amount: Option<i64>,
}

impl Transaction {
	/// Field-equality key: two transactions describe the same movement iff their keys are equal.
	pub fn key(&self) -> TransactionKey<'_> {
		TransactionKey {
			date: self.date,
			iban: self.iban.as_deref(),
			bic: self.bic.as_deref(),
			name: self.name.as_deref(),
			text: self.text.as_deref(),
			amount: self.amount,
		}
	}
}

/// Borrowed view of the fields that identify a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionKey<'a> {
	pub date: Option<NaiveDate>,
	pub iban: Option<&'a str>,
	pub bic: Option<&'a str>,
	pub name: Option<&'a str>,
	pub text: Option<&'a str>,
	pub amount: Option<i64>,
}

/// Immutable audit record of one raw statement line as fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLogEntry {
	pub client_id: ClientId,
	pub account_id: AccountId,
	pub time: DateTime<Utc>,
	pub raw: String,
}

/// Persistence failures
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("Storage error: {0}")]
	StorageError(String),
}

/// Failure reported by the downstream booking engine
#[derive(Debug, thiserror::Error)]
#[error("Booking error: {0}")]
pub struct BookingError(pub String);

/// Stage of a single account's synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
	Fetch,
	AuditLog,
	Save,
}

impl std::fmt::Display for SyncStage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			SyncStage::Fetch => "fetch",
			SyncStage::AuditLog => "audit_log",
			SyncStage::Save => "save",
		};
		f.write_str(name)
	}
}

/// Failure of one account within a cycle; never aborts the other accounts
#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum AccountSyncError {
	#[error("Fetch error: {0}")]
	FetchError(#[from] StatementSourceError),

	#[error("Audit write error: {0}")]
	AuditWriteError(#[source] RepositoryError),

	#[error("Persistence error: {0}")]
	PersistenceError(#[source] RepositoryError),
}

impl AccountSyncError {
	pub fn stage(&self) -> SyncStage {
		match self {
			AccountSyncError::FetchError(_) => SyncStage::Fetch,
			AccountSyncError::AuditWriteError(_) => SyncStage::AuditLog,
			AccountSyncError::PersistenceError(_) => SyncStage::Save,
		}
	}
}

/// Terminal failure of a synchronization cycle
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error("Failed to load account configs for client {client_id}: {source}")]
	AccountConfigLoad {
		client_id: ClientId,
		#[source]
		source: RepositoryError,
	},

	#[error(
		"Booking failed for client {client_id} ({} of {} accounts failed): {source}",
		.report.failed_accounts(),
		.report.outcomes.len()
	)]
	Booking {
		client_id: ClientId,
		#[source]
		source: BookingError,
		/// Outcomes of the accounts processed before the booking attempt
		report: Box<CycleReport>,
	},
}
