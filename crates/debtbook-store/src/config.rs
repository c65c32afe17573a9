use std::time::Duration;

use debtbook_types::OwnerRef;

/// Configuration for a [`LedgerStore`](crate::LedgerStore).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Upper bound on every collaborator call. An elapsed call is reported
    /// as [`StorageError::Timeout`](crate::StorageError::Timeout).
    pub call_timeout: Duration,
    /// Tenant whose debtors this store manages. `None` for a single-user
    /// collaborator.
    pub owner: Option<OwnerRef>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            owner: None,
        }
    }
}

impl StoreConfig {
    pub fn with_owner(owner: OwnerRef) -> Self {
        Self {
            owner: Some(owner),
            ..Default::default()
        }
    }
}
