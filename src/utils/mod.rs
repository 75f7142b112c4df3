//!
//! Utility module for statement synchronization.
//!
//! Re-exports formatting helpers for use throughout the codebase.
/// Amount formatting for display
pub mod amount;

pub use amount::format_amount;
