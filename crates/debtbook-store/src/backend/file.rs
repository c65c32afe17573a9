//! Local persisted ledger: all three collections in one JSON document.
//!
//! Every call reads the document, applies the operation, and (for writes)
//! replaces the file atomically through a temporary file in the same
//! directory. A missing file is an empty ledger. File I/O runs on tokio's
//! blocking pool, one operation at a time.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use debtbook_types::{
    DebtId, DebtRow, DebtorId, DebtorRow, NewDebt, NewDebtor, NewPayment, OwnerRef, PaymentId,
    PaymentRow,
};
use tracing::debug;

use crate::backend::tables::Tables;
use crate::error::{StorageError, StorageResult};
use crate::traits::LedgerBackend;

/// A [`LedgerBackend`] persisted to a single JSON file.
///
/// Clones share the same file lock.
#[derive(Clone, Debug)]
pub struct JsonFileBackend {
    file: Arc<LedgerFile>,
}

#[derive(Debug)]
struct LedgerFile {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Arc::new(LedgerFile {
                path: path.into(),
                guard: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    async fn query<T>(&self, op: impl FnOnce(&Tables) -> T + Send + 'static) -> StorageResult<T>
    where
        T: Send + 'static,
    {
        let file = Arc::clone(&self.file);
        blocking(move || file.query(op)).await
    }

    async fn update<T>(
        &self,
        op: impl FnOnce(&mut Tables) -> T + Send + 'static,
    ) -> StorageResult<T>
    where
        T: Send + 'static,
    {
        let file = Arc::clone(&self.file);
        blocking(move || file.update(op)).await
    }
}

impl LedgerFile {
    fn load(&self) -> StorageResult<Tables> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Tables::default()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Tables::default());
        }
        serde_json::from_slice(&bytes).map_err(|e| StorageError::malformed("ledger file", e))
    }

    fn save(&self, tables: &Tables) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let encoded = serde_json::to_vec_pretty(tables)
            .map_err(|e| StorageError::malformed("ledger file", e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&encoded)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;
        debug!(path = %self.path.display(), bytes = encoded.len(), "ledger file written");
        Ok(())
    }

    fn query<T>(&self, op: impl FnOnce(&Tables) -> T) -> StorageResult<T> {
        let _guard = self
            .guard
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))?;
        let tables = self.load()?;
        Ok(op(&tables))
    }

    fn update<T>(&self, op: impl FnOnce(&mut Tables) -> T) -> StorageResult<T> {
        let _guard = self
            .guard
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("lock poisoned: {e}")))?;
        let mut tables = self.load()?;
        let out = op(&mut tables);
        self.save(&tables)?;
        Ok(out)
    }
}

async fn blocking<T, F>(task: F) -> StorageResult<T>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StorageError::Unavailable(format!("ledger file task failed: {e}")))?
}

#[async_trait]
impl LedgerBackend for JsonFileBackend {
    async fn select_debtors(&self, owner: Option<&OwnerRef>) -> StorageResult<Vec<DebtorRow>> {
        let owner = owner.cloned();
        self.query(move |t| t.select_debtors(owner.as_ref())).await
    }

    async fn select_debts(&self, debtor_id: &DebtorId) -> StorageResult<Vec<DebtRow>> {
        let debtor_id = debtor_id.clone();
        self.query(move |t| t.select_debts(&debtor_id)).await
    }

    async fn select_payments(&self, debtor_id: &DebtorId) -> StorageResult<Vec<PaymentRow>> {
        let debtor_id = debtor_id.clone();
        self.query(move |t| t.select_payments(&debtor_id)).await
    }

    async fn insert_debtor(&self, debtor: &NewDebtor) -> StorageResult<DebtorRow> {
        let debtor = debtor.clone();
        self.update(move |t| t.insert_debtor(&debtor)).await
    }

    async fn insert_debt(&self, debt: &NewDebt) -> StorageResult<DebtRow> {
        let debt = debt.clone();
        self.update(move |t| t.insert_debt(&debt)).await
    }

    async fn insert_payment(&self, payment: &NewPayment) -> StorageResult<PaymentRow> {
        let payment = payment.clone();
        self.update(move |t| t.insert_payment(&payment)).await
    }

    async fn delete_debtor(&self, id: &DebtorId) -> StorageResult<bool> {
        let id = id.clone();
        self.update(move |t| t.delete_debtor(&id, true)).await
    }

    async fn delete_debt(&self, id: &DebtId) -> StorageResult<bool> {
        let id = id.clone();
        self.update(move |t| t.delete_debt(&id)).await
    }

    async fn delete_payment(&self, id: &PaymentId) -> StorageResult<bool> {
        let id = id.clone();
        self.update(move |t| t.delete_payment(&id)).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn temp_backend() -> (tempfile::TempDir, JsonFileBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("ledger.json"));
        (dir, backend)
    }

    #[tokio::test]
    async fn missing_file_is_empty_ledger() {
        let (_dir, backend) = temp_backend();
        assert!(backend.select_debtors(None).await.unwrap().is_empty());
        assert!(!backend.path().exists());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let (dir, backend) = temp_backend();
        let debtor = backend
            .insert_debtor(&NewDebtor {
                name: "Alice".into(),
                owner_ref: None,
            })
            .await
            .unwrap();
        backend
            .insert_debt(&NewDebt {
                debtor_id: debtor.id.clone(),
                description: "loan".into(),
                amount: 100.0,
            })
            .await
            .unwrap();
        backend
            .insert_payment(&NewPayment {
                debtor_id: debtor.id.clone(),
                amount: 40.0,
                date: Utc::now(),
                notes: None,
            })
            .await
            .unwrap();

        let reopened = JsonFileBackend::new(dir.path().join("ledger.json"));
        assert_eq!(reopened.select_debtors(None).await.unwrap(), vec![debtor.clone()]);
        assert_eq!(reopened.select_debts(&debtor.id).await.unwrap().len(), 1);
        assert_eq!(reopened.select_payments(&debtor.id).await.unwrap()[0].amount, 40.0);
    }

    #[tokio::test]
    async fn delete_debtor_cascades_on_disk() {
        let (_dir, backend) = temp_backend();
        let debtor = backend
            .insert_debtor(&NewDebtor {
                name: "Bob".into(),
                owner_ref: None,
            })
            .await
            .unwrap();
        backend
            .insert_debt(&NewDebt {
                debtor_id: debtor.id.clone(),
                description: "rent".into(),
                amount: 10.0,
            })
            .await
            .unwrap();

        assert!(backend.delete_debtor(&debtor.id).await.unwrap());
        assert!(!backend.delete_debtor(&debtor.id).await.unwrap());
        assert!(backend.select_debts(&debtor.id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_do_not_lose_rows() {
        let (_dir, backend) = temp_backend();
        let mut tasks = Vec::new();
        for i in 0..16 {
            let backend = backend.clone();
            tasks.push(tokio::spawn(async move {
                backend
                    .insert_debtor(&NewDebtor {
                        name: format!("debtor {i}"),
                        owner_ref: None,
                    })
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(backend.select_debtors(None).await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn corrupt_file_is_malformed() {
        let (_dir, backend) = temp_backend();
        std::fs::write(backend.path(), b"{ not json").unwrap();
        let err = backend.select_debtors(None).await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[tokio::test]
    async fn record_missing_amount_is_malformed() {
        let (_dir, backend) = temp_backend();
        let doc = r#"{
            "debtors": [{"id": "d", "name": "A", "created_at": "2025-10-07T08:30:00Z"}],
            "debts": [{"id": "x", "debtor_id": "d", "description": "loan", "created_at": "2025-10-07T08:30:00Z"}]
        }"#;
        std::fs::write(backend.path(), doc).unwrap();
        let err = backend.select_debts(&DebtorId::new("d")).await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed { collection: "ledger file", .. }));
    }
}
