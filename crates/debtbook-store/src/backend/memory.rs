//! In-memory ledger backend for tests, demos, and embedding.
//!
//! [`MemoryBackend`] keeps the three collections behind a `RwLock`. It can
//! be switched offline or given artificial latency so failure paths of the
//! store can be exercised without a network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use debtbook_types::{
    DebtId, DebtRow, DebtorId, DebtorRow, NewDebt, NewDebtor, NewPayment, OwnerRef, PaymentId,
    PaymentRow,
};

use crate::backend::tables::Tables;
use crate::error::{StorageError, StorageResult};
use crate::traits::LedgerBackend;

/// Row counts per collection, for orphan checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub debtors: usize,
    pub debts: usize,
    pub payments: usize,
}

/// An in-memory implementation of [`LedgerBackend`].
///
/// Data is lost when the backend is dropped.
#[derive(Debug)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
    cascades: bool,
    offline: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl MemoryBackend {
    /// Create an empty backend that cascades debtor deletes.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            cascades: true,
            offline: AtomicBool::new(false),
            latency: Mutex::new(None),
        }
    }

    /// Create an empty backend that leaves debts and payments behind when a
    /// debtor is deleted, like a table set without foreign-key cascades.
    pub fn without_cascade() -> Self {
        Self {
            cascades: false,
            ..Self::new()
        }
    }

    /// While offline every call fails with [`StorageError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut guard) = self.latency.lock() {
            *guard = latency;
        }
    }

    pub fn row_counts(&self) -> StorageResult<RowCounts> {
        let tables = self.read()?;
        Ok(RowCounts {
            debtors: tables.debtors.len(),
            debts: tables.debts.len(),
            payments: tables.payments.len(),
        })
    }

    async fn enter(&self) -> StorageResult<()> {
        let latency = self.latency.lock().ok().and_then(|guard| *guard);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory backend is offline".into()));
        }
        Ok(())
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerBackend for MemoryBackend {
    async fn select_debtors(&self, owner: Option<&OwnerRef>) -> StorageResult<Vec<DebtorRow>> {
        self.enter().await?;
        Ok(self.read()?.select_debtors(owner))
    }

    async fn select_debts(&self, debtor_id: &DebtorId) -> StorageResult<Vec<DebtRow>> {
        self.enter().await?;
        Ok(self.read()?.select_debts(debtor_id))
    }

    async fn select_payments(&self, debtor_id: &DebtorId) -> StorageResult<Vec<PaymentRow>> {
        self.enter().await?;
        Ok(self.read()?.select_payments(debtor_id))
    }

    async fn insert_debtor(&self, debtor: &NewDebtor) -> StorageResult<DebtorRow> {
        self.enter().await?;
        Ok(self.write()?.insert_debtor(debtor))
    }

    async fn insert_debt(&self, debt: &NewDebt) -> StorageResult<DebtRow> {
        self.enter().await?;
        Ok(self.write()?.insert_debt(debt))
    }

    async fn insert_payment(&self, payment: &NewPayment) -> StorageResult<PaymentRow> {
        self.enter().await?;
        Ok(self.write()?.insert_payment(payment))
    }

    async fn delete_debtor(&self, id: &DebtorId) -> StorageResult<bool> {
        self.enter().await?;
        Ok(self.write()?.delete_debtor(id, self.cascades))
    }

    async fn delete_debt(&self, id: &DebtId) -> StorageResult<bool> {
        self.enter().await?;
        Ok(self.write()?.delete_debt(id))
    }

    async fn delete_payment(&self, id: &PaymentId) -> StorageResult<bool> {
        self.enter().await?;
        Ok(self.write()?.delete_payment(id))
    }

    fn cascades_deletes(&self) -> bool {
        self.cascades
    }
}
