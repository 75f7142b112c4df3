//! Fixtures and test doubles shared by the sync tests.

use crate::account::sync::booking::BookingService;
use crate::account::sync::events::{EventHandlerError, SyncEvent, SyncEventHandler};
use crate::account::sync::repositories::{
    AccountConfigRepository, TransactionLogRepository, TransactionRepository,
};
use crate::account::{
    AccountConfig, AccountId, BookingError, ClientId, RepositoryError, Transaction,
    TransactionLogEntry,
};
use crate::statement::{
    RawStatementRecord, StatementRequest, StatementSource, StatementSourceError,
};

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

/// Account config whose routing code is `blz<id>`, so stubs can tell accounts apart.
pub fn account_config(id: AccountId, client_id: ClientId) -> AccountConfig {
    AccountConfig {
        id,
        client_id,
        name: None,
        routing_code: format!("blz{}", id),
        endpoint_url: "url".to_string(),
        user: "user".to_string(),
        password: "password".to_string(),
        last_error: None,
    }
}

pub fn transaction(
    client_id: ClientId,
    account_id: AccountId,
    date_str: &str,
    amount: i64,
) -> Transaction {
    Transaction {
        id: None,
        client_id,
        account_id,
        date: Some(date(date_str)),
        iban: Some("IBAN".to_string()),
        bic: Some("BIC".to_string()),
        name: Some("NAME".to_string()),
        text: Some("text".to_string()),
        amount: Some(amount),
    }
}

pub fn raw_record(raw: &str, date_str: &str, name: &str, amount: i64) -> RawStatementRecord {
    RawStatementRecord {
        raw: raw.to_string(),
        date: Some(date(date_str)),
        name: Some(name.to_string()),
        iban: Some("IBAN".to_string()),
        bic: Some("BIC".to_string()),
        text: Some("text".to_string()),
        amount: Some(amount),
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

fn storage_down() -> RepositoryError {
    RepositoryError::StorageError("storage unavailable".to_string())
}

#[async_trait::async_trait]
impl AccountConfigRepository for FailingStore {
    async fn find_by_client(
        &self,
        _client_id: ClientId,
    ) -> Result<Vec<AccountConfig>, RepositoryError> {
        Err(storage_down())
    }
}

#[async_trait::async_trait]
impl TransactionRepository for FailingStore {
    async fn find_by_account(
        &self,
        _client_id: ClientId,
        _account_id: AccountId,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        Err(storage_down())
    }

    async fn create_all(
        &self,
        _transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        Err(storage_down())
    }
}

#[async_trait::async_trait]
impl TransactionLogRepository for FailingStore {
    async fn create_all(&self, _entries: Vec<TransactionLogEntry>) -> Result<(), RepositoryError> {
        Err(storage_down())
    }
}

enum StubResponse {
    Records(Vec<RawStatementRecord>),
    TanRequired,
}

/// Statement source answering by routing code and recording every request.
///
/// Unknown routing codes return no records.
#[derive(Default)]
pub struct StubStatementSource {
    responses: Mutex<HashMap<String, StubResponse>>,
    requests: Mutex<Vec<StatementRequest>>,
}

impl StubStatementSource {
    pub fn with_records(self, routing_code: &str, records: Vec<RawStatementRecord>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(routing_code.to_string(), StubResponse::Records(records));
        self
    }

    pub fn with_tan_required(self, routing_code: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(routing_code.to_string(), StubResponse::TanRequired);
        self
    }

    pub fn requests(&self) -> Vec<StatementRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StatementSource for StubStatementSource {
    async fn fetch_statements(
        &self,
        request: &StatementRequest,
    ) -> Result<Vec<RawStatementRecord>, StatementSourceError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.responses.lock().unwrap().get(&request.routing_code) {
            Some(StubResponse::Records(records)) => Ok(records.clone()),
            Some(StubResponse::TanRequired) => Err(StatementSourceError::TanRequired),
            None => Ok(Vec::new()),
        }
    }
}

/// One recorded booking submission.
#[derive(Debug, Clone)]
pub struct BookingCall {
    pub client_id: ClientId,
    pub transactions: Vec<Transaction>,
    pub now: DateTime<Utc>,
}

/// Booking service recording its calls, optionally failing after recording.
#[derive(Default)]
pub struct RecordingBookingService {
    calls: Mutex<Vec<BookingCall>>,
    fail: bool,
}

impl RecordingBookingService {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<BookingCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BookingService for RecordingBookingService {
    async fn create_and_save_bookings(
        &self,
        client_id: ClientId,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        self.calls.lock().unwrap().push(BookingCall {
            client_id,
            transactions: transactions.to_vec(),
            now,
        });
        if self.fail {
            return Err(BookingError("booking engine unavailable".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingEventHandler {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingEventHandler {
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SyncEventHandler for RecordingEventHandler {
    async fn handle(&self, event: &SyncEvent) -> Result<(), EventHandlerError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "RecordingEventHandler"
    }
}
