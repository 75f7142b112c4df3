/// Account statement synchronization and deduplication
pub mod sync;
/// Domain types and error types
mod types;

pub use types::*;
