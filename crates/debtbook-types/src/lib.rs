//! Ledger data model for Debtbook.
//!
//! This crate defines the records every other Debtbook crate works with.
//! It has no I/O and no async code.
//!
//! # Key Types
//!
//! - [`Debtor`]: a person who owes money; owns debts and payments
//! - [`Debt`]: a single owed-amount line item
//! - [`Payment`]: a single payment received, reducing the balance
//! - [`DebtorId`] / [`DebtId`] / [`PaymentId`]: opaque UUID v7 identifiers
//! - [`OwnerRef`]: tenant reference for multi-user collaborators
//! - [`DebtorRow`] / [`DebtRow`] / [`PaymentRow`]: collaborator row shapes

pub mod error;
pub mod identity;
pub mod record;
pub mod row;

pub use error::TypeError;
pub use identity::{DebtId, DebtorId, OwnerRef, PaymentId};
pub use record::{validate_amount, validate_description, validate_name, Debt, Debtor, Payment};
pub use row::{DebtRow, DebtorRow, NewDebt, NewDebtor, NewPayment, PaymentRow};
