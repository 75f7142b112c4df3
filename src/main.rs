use std::process::ExitCode;
use std::sync::Arc;

use bank_statement_sync::account::ClientId;
use bank_statement_sync::account::sync::AccountSyncOrchestrator;
use bank_statement_sync::account::sync::booking::LoggingBookingService;
use bank_statement_sync::account::sync::repositories::FileStore;
use bank_statement_sync::config::AppConfig;
use bank_statement_sync::statement::HttpStatementSource;
use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	// Initialize tracing subscriber with debug logging for this crate
	let mut filter =
		tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
	if let Ok(directive) = "bank_statement_sync=debug".parse() {
		filter = filter.add_directive(directive);
	}
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	info!("Starting statement sync service");

	let config = match AppConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			error!("Invalid configuration: {}", e);
			return ExitCode::FAILURE;
		}
	};

	let store = Arc::new(FileStore::new(config.data_dir.clone()));
	if let Err(e) = store.init().await {
		error!(
			"Failed to initialize data directory {}: {}",
			config.data_dir.display(),
			e
		);
		return ExitCode::FAILURE;
	}

	let statement_source = match HttpStatementSource::new(config.statement_client.clone()) {
		Ok(source) => source,
		Err(e) => {
			error!("Failed to create statement client: {}", e);
			return ExitCode::FAILURE;
		}
	};

	info!("Created statement client");

	let orchestrator = AccountSyncOrchestrator::new(
		store.clone(),
		Arc::new(statement_source),
		store.clone(),
		store.clone(),
		Arc::new(LoggingBookingService),
		config.sync.clone(),
	);

	let Some(period) = config.interval else {
		return if run_all(&orchestrator, &config.client_ids).await {
			ExitCode::SUCCESS
		} else {
			ExitCode::FAILURE
		};
	};

	info!("Running a cycle every {} seconds", period.as_secs());
	let mut ticker = tokio::time::interval(period);
	loop {
		tokio::select! {
			_ = ticker.tick() => {
				run_all(&orchestrator, &config.client_ids).await;
			}
			_ = tokio::signal::ctrl_c() => {
				info!("Shutting down");
				return ExitCode::SUCCESS;
			}
		}
	}
}

/// Run one cycle per client concurrently. Returns whether every cycle completed.
async fn run_all(orchestrator: &AccountSyncOrchestrator, client_ids: &[ClientId]) -> bool {
	let now = Utc::now();
	let results = join_all(
		client_ids
			.iter()
			.map(|&client_id| orchestrator.run_cycle(now, client_id)),
	)
	.await;

	let mut all_ok = true;
	for result in results {
		if let Err(e) = result {
			error!("{}", e);
			all_ok = false;
		}
	}
	all_ok
}
