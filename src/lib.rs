//! Bank statement synchronization.
//!
//! Fetches account statements through a [`statement::StatementSource`], keeps a raw audit trail,
//! stores transactions the store has not seen yet (multiset deduplication) and hands them to a
//! booking engine, one cycle per client.

pub mod account;
pub mod config;
pub mod statement;
pub mod utils;
