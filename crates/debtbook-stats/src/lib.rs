//! Statistics engine for Debtbook.
//!
//! Pure functions over [`Debtor`](debtbook_types::Debtor) values: per-debtor
//! totals, remaining balance, payment percentage, and ledger-wide
//! aggregates. Empty inputs are valid and produce zeros.
//!
//! Values are exact `f64` sums. Nothing here rounds or clamps; that belongs
//! to the [`format`] helpers used at display time.

pub mod format;
pub mod stats;

pub use format::{
    display_percentage, format_currency, format_date, format_date_long, progress_bar,
    CurrencyFormat,
};
pub use stats::{
    global_stats, payment_percentage, remaining, summarize, total_debt, total_paid,
    DebtorSummary, GlobalStats,
};
