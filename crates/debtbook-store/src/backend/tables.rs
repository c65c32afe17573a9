//! Collection logic shared by the local backends.

use chrono::{DateTime, Utc};
use debtbook_types::{
    DebtId, DebtRow, DebtorId, DebtorRow, NewDebt, NewDebtor, NewPayment, OwnerRef, PaymentId,
    PaymentRow,
};
use serde::{Deserialize, Serialize};

/// The three ledger collections, rows kept in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Tables {
    #[serde(default)]
    pub debtors: Vec<DebtorRow>,
    #[serde(default)]
    pub debts: Vec<DebtRow>,
    #[serde(default)]
    pub payments: Vec<PaymentRow>,
}

impl Tables {
    pub fn select_debtors(&self, owner: Option<&OwnerRef>) -> Vec<DebtorRow> {
        let rows = self
            .debtors
            .iter()
            .filter(|row| owner.map_or(true, |o| row.owner_ref.as_ref() == Some(o)))
            .cloned()
            .collect();
        newest_first(rows, |row| row.created_at)
    }

    pub fn select_debts(&self, debtor_id: &DebtorId) -> Vec<DebtRow> {
        let rows = self
            .debts
            .iter()
            .filter(|row| &row.debtor_id == debtor_id)
            .cloned()
            .collect();
        newest_first(rows, |row| row.created_at)
    }

    pub fn select_payments(&self, debtor_id: &DebtorId) -> Vec<PaymentRow> {
        let rows = self
            .payments
            .iter()
            .filter(|row| &row.debtor_id == debtor_id)
            .cloned()
            .collect();
        newest_first(rows, |row| row.date)
    }

    pub fn insert_debtor(&mut self, debtor: &NewDebtor) -> DebtorRow {
        let row = DebtorRow {
            id: DebtorId::generate(),
            name: debtor.name.clone(),
            created_at: Utc::now(),
            owner_ref: debtor.owner_ref.clone(),
        };
        self.debtors.push(row.clone());
        row
    }

    pub fn insert_debt(&mut self, debt: &NewDebt) -> DebtRow {
        let row = DebtRow {
            id: DebtId::generate(),
            debtor_id: debt.debtor_id.clone(),
            description: debt.description.clone(),
            amount: debt.amount,
            created_at: Utc::now(),
        };
        self.debts.push(row.clone());
        row
    }

    pub fn insert_payment(&mut self, payment: &NewPayment) -> PaymentRow {
        let row = PaymentRow {
            id: PaymentId::generate(),
            debtor_id: payment.debtor_id.clone(),
            amount: payment.amount,
            date: payment.date,
            notes: payment.notes.clone(),
            created_at: Utc::now(),
        };
        self.payments.push(row.clone());
        row
    }

    /// Delete a debtor, and its debts and payments when `cascade` is set.
    pub fn delete_debtor(&mut self, id: &DebtorId, cascade: bool) -> bool {
        let before = self.debtors.len();
        self.debtors.retain(|row| &row.id != id);
        let existed = self.debtors.len() != before;
        if cascade {
            self.debts.retain(|row| &row.debtor_id != id);
            self.payments.retain(|row| &row.debtor_id != id);
        }
        existed
    }

    pub fn delete_debt(&mut self, id: &DebtId) -> bool {
        let before = self.debts.len();
        self.debts.retain(|row| &row.id != id);
        self.debts.len() != before
    }

    pub fn delete_payment(&mut self, id: &PaymentId) -> bool {
        let before = self.payments.len();
        self.payments.retain(|row| &row.id != id);
        self.payments.len() != before
    }
}

/// Reverse insertion order, then a stable sort by timestamp descending, so
/// equal timestamps come out newest insert first.
fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.reverse();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}
