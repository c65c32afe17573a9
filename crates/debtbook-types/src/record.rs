use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::{DebtId, DebtorId, OwnerRef, PaymentId};

/// A person who owes money.
///
/// Debts are kept ordered by `created_at` descending and payments by `date`
/// descending (most recent first). The ordering is for display only; the
/// arithmetic in `debtbook-stats` does not depend on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Debtor {
    pub id: DebtorId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerRef>,
    #[serde(default)]
    pub debts: Vec<Debt>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

/// A single owed-amount line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: DebtId,
    pub description: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// A single payment received from a debtor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub amount: f64,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Debtor {
    /// A debtor with no debts or payments yet.
    pub fn new(
        id: DebtorId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        owner: Option<OwnerRef>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
            owner,
            debts: Vec::new(),
            payments: Vec::new(),
        }
    }

    pub fn debt(&self, id: &DebtId) -> Option<&Debt> {
        self.debts.iter().find(|d| &d.id == id)
    }

    pub fn payment(&self, id: &PaymentId) -> Option<&Payment> {
        self.payments.iter().find(|p| &p.id == id)
    }

    /// Insert a debt at its display position, ahead of older debts and of
    /// debts sharing the same timestamp.
    pub fn insert_debt(&mut self, debt: Debt) {
        let at = self
            .debts
            .partition_point(|d| d.created_at > debt.created_at);
        self.debts.insert(at, debt);
    }

    /// Insert a payment at its display position (by payment date).
    pub fn insert_payment(&mut self, payment: Payment) {
        let at = self.payments.partition_point(|p| p.date > payment.date);
        self.payments.insert(at, payment);
    }

    /// Remove a debt. Returns `true` if it was present.
    pub fn remove_debt(&mut self, id: &DebtId) -> bool {
        let before = self.debts.len();
        self.debts.retain(|d| &d.id != id);
        self.debts.len() != before
    }

    /// Remove a payment. Returns `true` if it was present.
    pub fn remove_payment(&mut self, id: &PaymentId) -> bool {
        let before = self.payments.len();
        self.payments.retain(|p| &p.id != id);
        self.payments.len() != before
    }

    /// Insert `debtor` into a most-recent-first list of debtors.
    pub fn insert_into(debtors: &mut Vec<Debtor>, debtor: Debtor) {
        let at = debtors.partition_point(|d| d.created_at > debtor.created_at);
        debtors.insert(at, debtor);
    }
}

/// Trim a debtor name and reject it if nothing is left.
pub fn validate_name(name: &str) -> Result<String, TypeError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TypeError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Trim a debt description and reject it if nothing is left.
pub fn validate_description(description: &str) -> Result<String, TypeError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(TypeError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

/// Amounts must be finite and non-negative. Zero is allowed.
pub fn validate_amount(amount: f64) -> Result<f64, TypeError> {
    if !amount.is_finite() {
        return Err(TypeError::NonFiniteAmount);
    }
    if amount < 0.0 {
        return Err(TypeError::NegativeAmount(amount));
    }
    Ok(amount)
}
