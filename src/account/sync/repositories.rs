use crate::account::{
	AccountConfig, AccountId, ClientId, RepositoryError, Transaction, TransactionLogEntry,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Repository for the accounts a client has configured
#[async_trait::async_trait]
pub trait AccountConfigRepository: Send + Sync {
	async fn find_by_client(
		&self,
		client_id: ClientId,
	) -> Result<Vec<AccountConfig>, RepositoryError>;
}

/// Repository for persisted account transactions
#[async_trait::async_trait]
pub trait TransactionRepository: Send + Sync {
	/// Load the full transaction history of one account.
	async fn find_by_account(
		&self,
		client_id: ClientId,
		account_id: AccountId,
	) -> Result<Vec<Transaction>, RepositoryError>;

	/// Persist a batch, assigning ids. The returned transactions keep the batch order.
	async fn create_all(
		&self,
		transactions: Vec<Transaction>,
	) -> Result<Vec<Transaction>, RepositoryError>;
}

/// Append-only repository for the raw statement audit trail
#[async_trait::async_trait]
pub trait TransactionLogRepository: Send + Sync {
	async fn create_all(&self, entries: Vec<TransactionLogEntry>) -> Result<(), RepositoryError>;
}

fn assign_ids(stored: &[Transaction], batch: Vec<Transaction>) -> Vec<Transaction> {
	let mut next_id = stored.iter().filter_map(|t| t.id).max().unwrap_or(0) + 1;
	batch
		.into_iter()
		.map(|mut transaction| {
			transaction.id = Some(next_id);
			next_id += 1;
			transaction
		})
		.collect()
}

/// File-based store
///
/// Account configs and transactions are JSON arrays, rewritten atomically through a temporary
/// file. The audit log is newline-delimited JSON and only ever appended to.
pub struct FileStore {
	data_dir: PathBuf,
	write_lock: Mutex<()>,
}

impl FileStore {
	pub fn new(data_dir: PathBuf) -> Self {
		Self {
			data_dir,
			write_lock: Mutex::new(()),
		}
	}

	/// Create the data directory if it does not exist yet.
	pub async fn init(&self) -> Result<(), RepositoryError> {
		tokio::fs::create_dir_all(&self.data_dir).await?;
		info!("Using data directory {:?}", self.data_dir);
		Ok(())
	}

	fn account_configs_path(&self) -> PathBuf {
		self.data_dir.join("account_configs.json")
	}

	fn transactions_path(&self) -> PathBuf {
		self.data_dir.join("transactions.json")
	}

	fn transaction_log_path(&self) -> PathBuf {
		self.data_dir.join("transaction_log.jsonl")
	}

	/// Replace all stored account configs.
	pub async fn save_account_configs(
		&self,
		configs: &[AccountConfig],
	) -> Result<(), RepositoryError> {
		let _guard = self.write_lock.lock().await;
		write_json_array(&self.account_configs_path(), configs).await
	}

	/// Read back the whole audit trail.
	pub async fn load_log_entries(&self) -> Result<Vec<TransactionLogEntry>, RepositoryError> {
		let content = match tokio::fs::read_to_string(self.transaction_log_path()).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(e.into()),
		};

		content
			.lines()
			.filter(|line| !line.trim().is_empty())
			.map(|line| serde_json::from_str(line).map_err(RepositoryError::from))
			.collect()
	}
}

async fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, RepositoryError> {
	match tokio::fs::read_to_string(path).await {
		Ok(content) => Ok(serde_json::from_str(&content)?),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
		Err(e) => Err(e.into()),
	}
}

async fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), RepositoryError> {
	let content = serde_json::to_string_pretty(items)?;
	let tmp_path = path.with_extension("json.tmp");
	let mut file = tokio::fs::File::create(&tmp_path).await?;
	file.write_all(content.as_bytes()).await?;
	// Contents must be on disk before the rename makes them visible.
	file.sync_all().await?;
	drop(file);
	tokio::fs::rename(&tmp_path, path).await?;
	Ok(())
}

#[async_trait::async_trait]
impl AccountConfigRepository for FileStore {
	async fn find_by_client(
		&self,
		client_id: ClientId,
	) -> Result<Vec<AccountConfig>, RepositoryError> {
		let configs: Vec<AccountConfig> = read_json_array(&self.account_configs_path()).await?;
		Ok(configs
			.into_iter()
			.filter(|config| config.client_id == client_id)
			.collect())
	}
}

#[async_trait::async_trait]
impl TransactionRepository for FileStore {
	async fn find_by_account(
		&self,
		client_id: ClientId,
		account_id: AccountId,
	) -> Result<Vec<Transaction>, RepositoryError> {
		let transactions: Vec<Transaction> = read_json_array(&self.transactions_path()).await?;
		Ok(transactions
			.into_iter()
			.filter(|t| t.client_id == client_id && t.account_id == account_id)
			.collect())
	}

	async fn create_all(
		&self,
		transactions: Vec<Transaction>,
	) -> Result<Vec<Transaction>, RepositoryError> {
		if transactions.is_empty() {
			return Ok(Vec::new());
		}

		let _guard = self.write_lock.lock().await;
		let path = self.transactions_path();
		let mut stored: Vec<Transaction> = read_json_array(&path).await?;
		let created = assign_ids(&stored, transactions);
		stored.extend(created.iter().cloned());
		write_json_array(&path, &stored).await?;

		debug!(
			"Wrote {} transactions to {:?} ({} total)",
			created.len(),
			path,
			stored.len()
		);
		Ok(created)
	}
}

#[async_trait::async_trait]
impl TransactionLogRepository for FileStore {
	async fn create_all(&self, entries: Vec<TransactionLogEntry>) -> Result<(), RepositoryError> {
		if entries.is_empty() {
			return Ok(());
		}

		let mut buffer = String::new();
		for entry in &entries {
			buffer.push_str(&serde_json::to_string(entry)?);
			buffer.push('\n');
		}

		let _guard = self.write_lock.lock().await;
		let path = self.transaction_log_path();
		let mut file = tokio::fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(&path)
			.await?;
		file.write_all(buffer.as_bytes()).await?;
		file.flush().await?;

		debug!("Appended {} entries to {:?}", entries.len(), path);
		Ok(())
	}
}

/// In-memory store, for embedding and tests
#[derive(Default)]
pub struct InMemoryStore {
	state: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
	account_configs: Vec<AccountConfig>,
	transactions: Vec<Transaction>,
	log_entries: Vec<TransactionLogEntry>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_account_configs(account_configs: Vec<AccountConfig>) -> Self {
		Self {
			state: Mutex::new(InMemoryState {
				account_configs,
				..InMemoryState::default()
			}),
		}
	}

	/// Snapshot of every stored transaction, in insertion order.
	pub async fn transactions(&self) -> Vec<Transaction> {
		self.state.lock().await.transactions.clone()
	}

	/// Snapshot of the audit trail, in insertion order.
	pub async fn log_entries(&self) -> Vec<TransactionLogEntry> {
		self.state.lock().await.log_entries.clone()
	}
}

#[async_trait::async_trait]
impl AccountConfigRepository for InMemoryStore {
	async fn find_by_client(
		&self,
		client_id: ClientId,
	) -> Result<Vec<AccountConfig>, RepositoryError> {
		let state = self.state.lock().await;
		Ok(state
			.account_configs
			.iter()
			.filter(|config| config.client_id == client_id)
			.cloned()
			.collect())
	}
}

#[async_trait::async_trait]
impl TransactionRepository for InMemoryStore {
	async fn find_by_account(
		&self,
		client_id: ClientId,
		account_id: AccountId,
	) -> Result<Vec<Transaction>, RepositoryError> {
		let state = self.state.lock().await;
		Ok(state
			.transactions
			.iter()
			.filter(|t| t.client_id == client_id && t.account_id == account_id)
			.cloned()
			.collect())
	}

	async fn create_all(
		&self,
		transactions: Vec<Transaction>,
	) -> Result<Vec<Transaction>, RepositoryError> {
		let mut state = self.state.lock().await;
		let created = assign_ids(&state.transactions, transactions);
		state.transactions.extend(created.iter().cloned());
		Ok(created)
	}
}

#[async_trait::async_trait]
impl TransactionLogRepository for InMemoryStore {
	async fn create_all(&self, entries: Vec<TransactionLogEntry>) -> Result<(), RepositoryError> {
		self.state.lock().await.log_entries.extend(entries);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::account::sync::test_support::{account_config, transaction};
	use chrono::{TimeZone, Utc};

	#[tokio::test]
	async fn file_store_reads_missing_files_as_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path().join("data"));
		store.init().await.unwrap();

		assert!(store.find_by_client(1).await.unwrap().is_empty());
		assert!(store.find_by_account(1, 1).await.unwrap().is_empty());
		assert!(store.load_log_entries().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn file_store_filters_account_configs_by_client() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path().to_path_buf());
		store
			.save_account_configs(&[account_config(1, 10), account_config(2, 20), account_config(3, 10)])
			.await
			.unwrap();

		let configs = store.find_by_client(10).await.unwrap();

		assert_eq!(configs.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3]);
	}

	#[tokio::test]
	async fn file_store_assigns_sequential_ids_across_batches() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path().to_path_buf());

		let first = TransactionRepository::create_all(
			&store,
			vec![transaction(2, 1, "2019-04-13", 1000), transaction(2, 1, "2019-04-14", 500)],
		)
		.await
		.unwrap();
		let second =
			TransactionRepository::create_all(&store, vec![transaction(2, 7, "2019-04-15", 300)])
				.await
				.unwrap();

		assert_eq!(first.iter().map(|t| t.id).collect::<Vec<_>>(), vec![Some(1), Some(2)]);
		assert_eq!(second[0].id, Some(3));
		assert_eq!(store.find_by_account(2, 1).await.unwrap().len(), 2);
		assert_eq!(store.find_by_account(2, 7).await.unwrap(), second);
	}

	#[tokio::test]
	async fn file_store_rewrites_leave_no_temporary_file() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path().to_path_buf());

		TransactionRepository::create_all(&store, vec![transaction(2, 1, "2019-04-13", 1000)])
			.await
			.unwrap();
		TransactionRepository::create_all(&store, vec![transaction(2, 1, "2019-04-14", 500)])
			.await
			.unwrap();

		let content = std::fs::read_to_string(dir.path().join("transactions.json")).unwrap();
		let stored: Vec<Transaction> = serde_json::from_str(&content).unwrap();
		assert_eq!(stored.len(), 2);
		assert!(!dir.path().join("transactions.json.tmp").exists());
	}

	#[tokio::test]
	async fn file_store_appends_audit_entries() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path().to_path_buf());
		let time = Utc.with_ymd_and_hms(2019, 4, 11, 6, 0, 0).unwrap();
		let entry = |raw: &str| TransactionLogEntry {
			client_id: 2,
			account_id: 1,
			time,
			raw: raw.to_string(),
		};

		TransactionLogRepository::create_all(&store, vec![entry("line1"), entry("line2")])
			.await
			.unwrap();
		TransactionLogRepository::create_all(&store, vec![entry("line1")])
			.await
			.unwrap();

		let entries = store.load_log_entries().await.unwrap();
		assert_eq!(
			entries.iter().map(|e| e.raw.as_str()).collect::<Vec<_>>(),
			vec!["line1", "line2", "line1"]
		);
		assert_eq!(entries[0].time, time);
	}

	#[tokio::test]
	async fn in_memory_store_keeps_batch_order() {
		let store = InMemoryStore::new();
		let batch = vec![
			transaction(2, 1, "2019-04-14", 1000),
			transaction(2, 1, "2019-04-13", 1000),
		];

		let created = TransactionRepository::create_all(&store, batch).await.unwrap();

		assert_eq!(created[0].id, Some(1));
		assert_eq!(created[0].date, chrono::NaiveDate::from_ymd_opt(2019, 4, 14));
		assert_eq!(created[1].id, Some(2));
		assert_eq!(store.transactions().await, created);
	}
}
