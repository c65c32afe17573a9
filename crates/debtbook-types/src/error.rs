use thiserror::Error;

/// Errors produced when constructing or validating ledger records.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    #[error("debtor name must not be empty")]
    EmptyName,

    #[error("debt description must not be empty")]
    EmptyDescription,

    #[error("amount must not be negative: {0}")]
    NegativeAmount(f64),

    #[error("amount must be a finite number")]
    NonFiniteAmount,

    #[error("{collection} row has an empty id")]
    EmptyId { collection: &'static str },
}
