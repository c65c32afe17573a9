//! Ledger store for Debtbook.
//!
//! [`LedgerStore`] keeps an observable, most-recent-first view of every
//! debtor with its debts and payments, and keeps that view consistent with
//! a storage collaborator behind the [`LedgerBackend`] trait.
//!
//! # Key Types
//!
//! - [`LedgerStore`]: load, create, and delete operations over the view
//! - [`LedgerView`] / [`Phase`]: the published state and its lifecycle
//! - [`LedgerBackend`]: the collaborator seam
//! - [`MemoryBackend`], [`JsonFileBackend`], [`RestBackend`]: implementations
//! - [`LedgerError`] / [`StorageError`]: validation, not-found, and storage failures

pub mod backend;
pub mod config;
pub mod error;
pub mod store;
pub mod traits;
pub mod view;

pub use backend::{JsonFileBackend, MemoryBackend, RestBackend, RestConfig, RowCounts};
pub use config::StoreConfig;
pub use error::{ErrorKind, LedgerError, LedgerResult, StorageError, StorageResult};
pub use store::LedgerStore;
pub use traits::LedgerBackend;
pub use view::{LedgerView, Phase};
