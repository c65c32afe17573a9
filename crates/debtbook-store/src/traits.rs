use async_trait::async_trait;
use debtbook_types::{
    DebtId, DebtRow, DebtorId, DebtorRow, NewDebt, NewDebtor, NewPayment, OwnerRef, PaymentId,
    PaymentRow,
};

use crate::error::StorageResult;

/// Durable storage collaborator for the ledger.
///
/// Implementations keep three collections (`debtors`, `debts`, `payments`)
/// and must satisfy these rules:
/// - Inserts assign the `id` and `created_at` of the new row and return it.
/// - Selects return rows most recent first: debtors and debts by
///   `created_at`, payments by `date`. Rows sharing a timestamp are
///   returned newest insert first.
/// - Deletes are by id and report whether a row existed. Deleting a missing
///   id is not an error.
/// - Errors are propagated, never swallowed.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// All debtors, optionally restricted to one owner.
    async fn select_debtors(&self, owner: Option<&OwnerRef>) -> StorageResult<Vec<DebtorRow>>;

    async fn select_debts(&self, debtor_id: &DebtorId) -> StorageResult<Vec<DebtRow>>;

    async fn select_payments(&self, debtor_id: &DebtorId) -> StorageResult<Vec<PaymentRow>>;

    async fn insert_debtor(&self, debtor: &NewDebtor) -> StorageResult<DebtorRow>;

    async fn insert_debt(&self, debt: &NewDebt) -> StorageResult<DebtRow>;

    async fn insert_payment(&self, payment: &NewPayment) -> StorageResult<PaymentRow>;

    async fn delete_debtor(&self, id: &DebtorId) -> StorageResult<bool>;

    async fn delete_debt(&self, id: &DebtId) -> StorageResult<bool>;

    async fn delete_payment(&self, id: &PaymentId) -> StorageResult<bool>;

    /// Whether deleting a debtor also deletes its debts and payments.
    ///
    /// When `false` the store removes the children itself before deleting
    /// the debtor.
    fn cascades_deletes(&self) -> bool {
        true
    }
}
