//! Storage backends implementing [`LedgerBackend`](crate::LedgerBackend).
//!
//! - [`MemoryBackend`] -- in-process collections for tests and embedding
//! - [`JsonFileBackend`] -- the whole ledger in one local JSON file
//! - [`RestBackend`] -- a hosted PostgREST-style data service

mod file;
mod memory;
mod rest;
mod tables;

pub use file::JsonFileBackend;
pub use memory::{MemoryBackend, RowCounts};
pub use rest::{RestBackend, RestConfig};
