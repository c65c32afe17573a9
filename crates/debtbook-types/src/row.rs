//! Row shapes exchanged with the storage collaborator.
//!
//! These mirror the three collections the collaborator keeps:
//! `debtors(id, name, created_at, owner_ref)`,
//! `debts(id, debtor_id, description, amount, created_at)` and
//! `payments(id, debtor_id, amount, date, notes, created_at)`.
//!
//! Every field except `owner_ref` and `notes` is required. A payload that
//! lacks one fails to deserialize instead of being defaulted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::{DebtId, DebtorId, OwnerRef, PaymentId};
use crate::record::{validate_amount, validate_name, Debt, Debtor, Payment};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebtorRow {
    pub id: DebtorId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<OwnerRef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebtRow {
    pub id: DebtId,
    pub debtor_id: DebtorId,
    pub description: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    pub id: PaymentId,
    pub debtor_id: DebtorId,
    pub amount: f64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the `debtors` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewDebtor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<OwnerRef>,
}

/// Insert payload for the `debts` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewDebt {
    pub debtor_id: DebtorId,
    pub description: String,
    pub amount: f64,
}

/// Insert payload for the `payments` collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub debtor_id: DebtorId,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl TryFrom<DebtorRow> for Debtor {
    type Error = TypeError;

    fn try_from(row: DebtorRow) -> Result<Self, Self::Error> {
        if row.id.is_empty() {
            return Err(TypeError::EmptyId {
                collection: "debtors",
            });
        }
        let name = validate_name(&row.name)?;
        Ok(Debtor::new(row.id, name, row.created_at, row.owner_ref))
    }
}

impl TryFrom<DebtRow> for Debt {
    type Error = TypeError;

    fn try_from(row: DebtRow) -> Result<Self, Self::Error> {
        if row.id.is_empty() {
            return Err(TypeError::EmptyId { collection: "debts" });
        }
        Ok(Debt {
            id: row.id,
            description: row.description,
            amount: validate_amount(row.amount)?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = TypeError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        if row.id.is_empty() {
            return Err(TypeError::EmptyId {
                collection: "payments",
            });
        }
        Ok(Payment {
            id: row.id,
            amount: validate_amount(row.amount)?,
            date: row.date,
            notes: row.notes.filter(|n| !n.trim().is_empty()),
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_row_without_notes_parses() {
        let json = r#"{
            "id": "p-1",
            "debtor_id": "d-1",
            "amount": 40,
            "date": "2025-10-07T08:30:00Z",
            "created_at": "2025-10-07T08:30:00Z"
        }"#;
        let row: PaymentRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.notes, None);
        assert_eq!(row.amount, 40.0);
    }

    #[test]
    fn debt_row_missing_amount_is_rejected() {
        let json = r#"{
            "id": "x",
            "debtor_id": "d-1",
            "description": "loan",
            "created_at": "2025-10-07T08:30:00Z"
        }"#;
        assert!(serde_json::from_str::<DebtRow>(json).is_err());
    }

    #[test]
    fn payment_row_keyed_by_payment_date_is_rejected() {
        let json = r#"{
            "id": "p-1",
            "debtor_id": "d-1",
            "amount": 40,
            "payment_date": "2025-10-07T08:30:00Z",
            "created_at": "2025-10-07T08:30:00Z"
        }"#;
        assert!(serde_json::from_str::<PaymentRow>(json).is_err());
    }

    #[test]
    fn negative_amount_row_fails_conversion() {
        let row = DebtRow {
            id: DebtId::new("x"),
            debtor_id: DebtorId::new("d"),
            description: "loan".into(),
            amount: -3.0,
            created_at: Utc::now(),
        };
        assert_eq!(Debt::try_from(row), Err(TypeError::NegativeAmount(-3.0)));
    }

    #[test]
    fn empty_id_row_fails_conversion() {
        let row = DebtorRow {
            id: DebtorId::new(""),
            name: "Alice".into(),
            created_at: Utc::now(),
            owner_ref: None,
        };
        assert_eq!(
            Debtor::try_from(row),
            Err(TypeError::EmptyId {
                collection: "debtors"
            })
        );
    }

    #[test]
    fn blank_name_row_fails_conversion() {
        for name in ["", "   "] {
            let row = DebtorRow {
                id: DebtorId::new("d"),
                name: name.into(),
                created_at: Utc::now(),
                owner_ref: None,
            };
            assert_eq!(Debtor::try_from(row), Err(TypeError::EmptyName));
        }
    }

    #[test]
    fn blank_notes_become_absent() {
        let now = Utc::now();
        let row = PaymentRow {
            id: PaymentId::new("p"),
            debtor_id: DebtorId::new("d"),
            amount: 1.0,
            date: now,
            notes: Some("  ".into()),
            created_at: now,
        };
        let payment = Payment::try_from(row).unwrap();
        assert_eq!(payment.notes, None);
    }

    #[test]
    fn new_debtor_omits_missing_owner() {
        let insert = NewDebtor {
            name: "Alice".into(),
            owner_ref: None,
        };
        assert_eq!(
            serde_json::to_string(&insert).unwrap(),
            r#"{"name":"Alice"}"#
        );
    }
}
