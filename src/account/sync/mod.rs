//! Account Synchronization Module
//!
//! This module provides the services that bring bank statement data into the transaction store
//! and hand newly seen movements to the booking engine. Each submodule covers one step:
//!
//! - `orchestrator`: Runs a cycle for one client, account by account, and submits bookings.
//! - `audit_logger`: Writes every fetched raw record to the append-only transaction log.
//! - `transaction_processor`: Converts raw records into transaction candidates for an account.
//! - `save_service`: Multiset deduplication of candidates against stored history.
//! - `booking`: Seam to the downstream booking engine.
//! - `events`: Sync events and the handlers that surface them.
//! - `progress_tracker`: Per-account outcomes and the cycle report.
//! - `repositories`: Storage traits with file-backed and in-memory implementations.
//!
//! A failure in one account never stops the others. Only a failed account config load or a
//! failed booking submission aborts a cycle.

/// Audit trail of raw statement records
pub mod audit_logger;
/// Booking engine seam
pub mod booking;
/// Event system for decoupled reporting during sync
pub mod events;
/// Main coordinator for a client's synchronization cycle
pub mod orchestrator;
/// Tracks per-account outcomes and cycle statistics
pub mod progress_tracker;
/// Storage traits and implementations
pub mod repositories;
/// Deduplicating persistence of transaction candidates
pub mod save_service;
/// Raw record to transaction conversion
pub mod transaction_processor;

#[cfg(test)]
pub(crate) mod test_support;

pub use orchestrator::*;
