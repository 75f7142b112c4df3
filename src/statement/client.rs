//!
//! HTTP client for a JSON statement gateway.
//!
//! The gateway receives an account's routing code and credentials, talks to the bank on our
//! behalf and returns the statement lines it received. Transient failures (connection errors,
//! timeouts, 5xx) are retried with exponential backoff; credential and protocol problems are
//! returned immediately.

use super::StatementSource;
use super::types::*;
use backoff::{ExponentialBackoff, future::retry};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timeouts and retry limits for the statement gateway client.
#[derive(Debug, Clone)]
pub struct StatementClientConfig {
	/// Timeout for a single HTTP request.
	pub request_timeout: Duration,
	/// Give up retrying transient failures after this much time.
	pub max_retry_elapsed: Duration,
}

impl Default for StatementClientConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(30),
			max_retry_elapsed: Duration::from_secs(60),
		}
	}
}

/// Statement gateway client
#[derive(Clone)]
pub struct HttpStatementSource {
	/// The underlying HTTP client.
	http_client: Client,
	config: StatementClientConfig,
}

impl HttpStatementSource {
	/// Create a new gateway client.
	///
	/// # Errors
	/// Returns `StatementSourceError::Transport` if the HTTP client cannot be constructed.
	pub fn new(config: StatementClientConfig) -> Result<Self, StatementSourceError> {
		let http_client = Client::builder()
			.timeout(config.request_timeout)
			.build()
			.map_err(|e| {
				StatementSourceError::Transport(format!("Failed to create HTTP client: {}", e))
			})?;

		Ok(Self {
			http_client,
			config,
		})
	}

	/// Perform a single fetch without retrying.
	async fn fetch_once(
		&self,
		request: &StatementRequest,
	) -> Result<Vec<RawStatementRecord>, StatementSourceError> {
		let query = StatementQuery {
			routing_code: &request.routing_code,
			user: &request.user,
			password: &request.password,
			from: request.window.map(|w| w.from),
			to: request.window.map(|w| w.to),
		};

		let response = self
			.http_client
			.post(&request.endpoint_url)
			.header("Content-Type", "application/json")
			.json(&query)
			.send()
			.await
			.map_err(|e| StatementSourceError::Transport(e.to_string()))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| StatementSourceError::Transport(e.to_string()))?;

		if let Some(error) = classify_status(status, &body) {
			return Err(error);
		}

		parse_statement_response(&body)
	}
}

#[async_trait::async_trait]
impl StatementSource for HttpStatementSource {
	async fn fetch_statements(
		&self,
		request: &StatementRequest,
	) -> Result<Vec<RawStatementRecord>, StatementSourceError> {
		debug!(
			"Fetching statements from {} for routing code {}",
			request.endpoint_url, request.routing_code
		);

		let policy = ExponentialBackoff {
			max_elapsed_time: Some(self.config.max_retry_elapsed),
			..ExponentialBackoff::default()
		};

		let records = retry(policy, || async move {
			self.fetch_once(request).await.map_err(|e| {
				if e.is_transient() {
					warn!("Statement fetch from {} failed, retrying: {}", request.endpoint_url, e);
					backoff::Error::transient(e)
				} else {
					backoff::Error::permanent(e)
				}
			})
		})
		.await?;

		info!(
			"Fetched {} statement records from {}",
			records.len(),
			request.endpoint_url
		);
		Ok(records)
	}
}

/// Map a non-success gateway status to an error. Returns `None` for 2xx.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> Option<StatementSourceError> {
	if status.is_success() {
		return None;
	}

	let error = match status {
		StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
			StatementSourceError::Authentication(status.as_u16())
		}
		StatusCode::PRECONDITION_REQUIRED => StatementSourceError::TanRequired,
		StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
			StatementSourceError::Transport(format!("Gateway returned {}", status))
		}
		s if s.is_server_error() => {
			StatementSourceError::Transport(format!("Gateway returned {}", s))
		}
		s => StatementSourceError::Rejected {
			status: s.as_u16(),
			message: body.trim().to_string(),
		},
	};

	Some(error)
}

pub(crate) fn parse_statement_response(
	body: &str,
) -> Result<Vec<RawStatementRecord>, StatementSourceError> {
	serde_json::from_str::<StatementResponse>(body)
		.map(|response| response.transactions)
		.map_err(|e| StatementSourceError::MalformedResponse(e.to_string()))
}
