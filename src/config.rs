//! Runtime configuration read from the environment.

use crate::account::ClientId;
use crate::account::sync::SyncConfig;
use crate::statement::StatementClientConfig;

use itertools::Itertools;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DATA_DIR_VAR: &str = "STATEMENT_SYNC_DATA_DIR";
pub const CLIENT_IDS_VAR: &str = "STATEMENT_SYNC_CLIENT_IDS";
pub const INTERVAL_VAR: &str = "STATEMENT_SYNC_INTERVAL_SECS";
pub const LOOKBACK_VAR: &str = "STATEMENT_SYNC_LOOKBACK_DAYS";
pub const HTTP_TIMEOUT_VAR: &str = "STATEMENT_SYNC_HTTP_TIMEOUT_SECS";
pub const MAX_RETRY_VAR: &str = "STATEMENT_SYNC_MAX_RETRY_SECS";

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("Missing required environment variable {0}")]
	Missing(&'static str),

	#[error("Invalid value {value:?} for {var}: {reason}")]
	Invalid {
		var: &'static str,
		value: String,
		reason: String,
	},
}

/// Settings of the sync binary
#[derive(Debug, Clone)]
pub struct AppConfig {
	pub data_dir: PathBuf,
	pub client_ids: Vec<ClientId>,
	/// Repeat interval between cycles; `None` runs a single cycle per client
	pub interval: Option<Duration>,
	pub sync: SyncConfig,
	pub statement_client: StatementClientConfig,
}

impl AppConfig {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|var| std::env::var(var).ok())
	}

	/// Build the config from an arbitrary variable lookup. Empty values count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

		let data_dir = get(DATA_DIR_VAR)
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

		let raw_ids = get(CLIENT_IDS_VAR).ok_or(ConfigError::Missing(CLIENT_IDS_VAR))?;
		let client_ids = raw_ids
			.split(',')
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.map(|id| parse_value::<ClientId>(CLIENT_IDS_VAR, id))
			.collect::<Result<Vec<_>, _>>()?;
		let parsed_count = client_ids.len();
		// Two cycles for one client must never run side by side.
		let client_ids: Vec<ClientId> = client_ids.into_iter().unique().collect();
		if client_ids.len() < parsed_count {
			warn!("Ignoring repeated client ids in {}: {}", CLIENT_IDS_VAR, raw_ids);
		}
		if client_ids.is_empty() {
			return Err(ConfigError::Invalid {
				var: CLIENT_IDS_VAR,
				value: raw_ids,
				reason: "no client ids given".to_string(),
			});
		}

		let interval = get(INTERVAL_VAR)
			.map(|v| parse_secs(INTERVAL_VAR, &v))
			.transpose()?;
		let lookback_days = get(LOOKBACK_VAR)
			.map(|v| parse_value::<u32>(LOOKBACK_VAR, &v))
			.transpose()?;

		let defaults = StatementClientConfig::default();
		let request_timeout = get(HTTP_TIMEOUT_VAR)
			.map(|v| parse_secs(HTTP_TIMEOUT_VAR, &v))
			.transpose()?
			.unwrap_or(defaults.request_timeout);
		let max_retry_elapsed = get(MAX_RETRY_VAR)
			.map(|v| parse_secs(MAX_RETRY_VAR, &v))
			.transpose()?
			.unwrap_or(defaults.max_retry_elapsed);

		Ok(Self {
			data_dir,
			client_ids,
			interval,
			sync: SyncConfig { lookback_days },
			statement_client: StatementClientConfig {
				request_timeout,
				max_retry_elapsed,
			},
		})
	}
}

fn parse_value<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
		var,
		value: value.to_string(),
		reason: e.to_string(),
	})
}

fn parse_secs(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
	let secs = parse_value::<u64>(var, value)?;
	if secs == 0 {
		return Err(ConfigError::Invalid {
			var,
			value: value.to_string(),
			reason: "must be greater than zero".to_string(),
		});
	}
	Ok(Duration::from_secs(secs))
}
