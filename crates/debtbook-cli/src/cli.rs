use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "debtbook",
    about = "Debtbook: keep track of who owes you what",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to ./debtbook.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add, list, show, or remove debtors
    Debtor(DebtorArgs),
    /// Record or remove debts
    Debt(DebtArgs),
    /// Record or remove payments
    Payment(PaymentArgs),
    /// Show totals across all debtors
    Stats,
}

#[derive(Args)]
pub struct DebtorArgs {
    #[command(subcommand)]
    pub action: DebtorAction,
}

#[derive(Subcommand)]
pub enum DebtorAction {
    /// Add a debtor
    Add { name: String },
    /// List debtors with their balances
    List,
    /// Show one debtor with every debt and payment
    Show { debtor: String },
    /// Remove a debtor and everything recorded for them
    Rm { debtor: String },
}

#[derive(Args)]
pub struct DebtArgs {
    #[command(subcommand)]
    pub action: DebtAction,
}

#[derive(Subcommand)]
pub enum DebtAction {
    /// Record a debt owed by a debtor
    Add {
        debtor: String,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        description: String,
    },
    /// Remove a debt
    Rm { debtor: String, debt: String },
}

#[derive(Args)]
pub struct PaymentArgs {
    #[command(subcommand)]
    pub action: PaymentAction,
}

#[derive(Subcommand)]
pub enum PaymentAction {
    /// Record a payment received from a debtor
    Add {
        debtor: String,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        #[arg(short, long)]
        notes: Option<String>,
        /// Payment date, `YYYY-MM-DD` or RFC 3339 (defaults to now)
        #[arg(short, long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
    },
    /// Remove a payment
    Rm { debtor: String, payment: String },
}

/// Accepts `2025-10-07` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| format!("invalid date: {s}"));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid date {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_plain_and_rfc3339_dates() {
        assert_eq!(
            parse_date("2025-10-07").unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 7, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date("2025-10-07T15:30:00+07:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 7, 8, 30, 0).unwrap()
        );
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn payment_add_arguments() {
        let cli = Cli::parse_from([
            "debtbook", "--format", "json", "payment", "add", "0192", "40", "--notes", "cash",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Payment(PaymentArgs {
                action:
                    PaymentAction::Add {
                        debtor,
                        amount,
                        notes,
                        date,
                    },
            }) => {
                assert_eq!(debtor, "0192");
                assert_eq!(amount, 40.0);
                assert_eq!(notes.as_deref(), Some("cash"));
                assert!(date.is_none());
            }
            _ => panic!("expected payment add"),
        }
    }
}
