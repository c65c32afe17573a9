use std::path::PathBuf;

use anyhow::{bail, Context};
use colored::Colorize;
use debtbook_stats::{
    format_currency, format_date, format_date_long, global_stats, progress_bar, summarize,
    CurrencyFormat, DebtorSummary,
};
use debtbook_store::{LedgerStore, LedgerView};
use debtbook_types::{Debt, Debtor, Payment};
use serde::Serialize;
use serde_json::json;

use crate::cli::*;
use crate::config::{DebtbookConfig, API_KEY_ENV, DEFAULT_CONFIG_PATH};

const BAR_WIDTH: usize = 20;

/// How results are printed.
struct Output {
    format: OutputFormat,
    currency: CurrencyFormat,
}

impl Output {
    fn money(&self, amount: f64) -> String {
        format_currency(amount, &self.currency)
    }

    fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = DebtbookConfig::load(&path)?;
    config.apply_env(std::env::var(API_KEY_ENV).ok());

    let mut store = LedgerStore::new(config.open_backend()?, config.store_config());
    store.load_all().await.context("cannot load the ledger")?;

    let out = Output {
        format: cli.format,
        currency: config.display.clone(),
    };

    match cli.command {
        Command::Debtor(args) => match args.action {
            DebtorAction::Add { name } => cmd_debtor_add(&mut store, &out, &name).await,
            DebtorAction::List => cmd_debtor_list(&store.view(), &out),
            DebtorAction::Show { debtor } => cmd_debtor_show(&store.view(), &out, &debtor),
            DebtorAction::Rm { debtor } => cmd_debtor_rm(&mut store, &out, &debtor).await,
        },
        Command::Debt(args) => match args.action {
            DebtAction::Add {
                debtor,
                amount,
                description,
            } => cmd_debt_add(&mut store, &out, &debtor, amount, &description).await,
            DebtAction::Rm { debtor, debt } => cmd_debt_rm(&mut store, &out, &debtor, &debt).await,
        },
        Command::Payment(args) => match args.action {
            PaymentAction::Add {
                debtor,
                amount,
                notes,
                date,
            } => cmd_payment_add(&mut store, &out, &debtor, amount, notes.as_deref(), date).await,
            PaymentAction::Rm { debtor, payment } => {
                cmd_payment_rm(&mut store, &out, &debtor, &payment).await
            }
        },
        Command::Stats => cmd_stats(&store.view(), &out),
    }
}

async fn cmd_debtor_add(store: &mut LedgerStore, out: &Output, name: &str) -> anyhow::Result<()> {
    let debtor = store.create_debtor(name).await?;
    if out.format == OutputFormat::Json {
        return out.json(&debtor);
    }
    println!(
        "{} Added debtor {} ({})",
        "✓".green().bold(),
        debtor.name.bold(),
        debtor.id.short_id().yellow()
    );
    Ok(())
}

fn cmd_debtor_list(view: &LedgerView, out: &Output) -> anyhow::Result<()> {
    let summaries: Vec<DebtorSummary> = view.debtors.iter().map(summarize).collect();
    if out.format == OutputFormat::Json {
        return out.json(&summaries);
    }
    if summaries.is_empty() {
        println!("No debtors yet.");
        return Ok(());
    }
    for s in &summaries {
        let remaining = if s.remaining > 0.0 {
            out.money(s.remaining).red()
        } else {
            out.money(s.remaining).green()
        };
        println!(
            "{}  {:<20}  {} {:>5.1}%  remaining {}",
            s.debtor_id.short_id().yellow(),
            s.name.bold(),
            progress_bar(s.payment_percentage, BAR_WIDTH),
            s.payment_percentage,
            remaining
        );
    }
    Ok(())
}

fn cmd_debtor_show(view: &LedgerView, out: &Output, query: &str) -> anyhow::Result<()> {
    let Some(debtor) = find_debtor(view, query)? else {
        bail!("no debtor matches {query:?}");
    };
    let summary = summarize(debtor);
    if out.format == OutputFormat::Json {
        return out.json(&json!({ "debtor": debtor, "summary": summary }));
    }

    println!("{}  {}", debtor.name.bold(), debtor.id.as_str().dimmed());
    println!("  Since:     {}", format_date_long(&debtor.created_at));
    println!("  Debt:      {}", out.money(summary.total_debt));
    println!("  Paid:      {}", out.money(summary.total_paid));
    println!("  Remaining: {}", out.money(summary.remaining).bold());
    println!(
        "  Progress:  {} {:.1}%",
        progress_bar(summary.payment_percentage, BAR_WIDTH),
        summary.payment_percentage
    );

    println!("\n{} ({})", "Debts".underline(), debtor.debts.len());
    for debt in &debtor.debts {
        println!(
            "  {}  {}  {:>16}  {}",
            debt.id.short_id().yellow(),
            format_date(&debt.created_at).dimmed(),
            out.money(debt.amount),
            debt.description
        );
    }

    println!("\n{} ({})", "Payments".underline(), debtor.payments.len());
    for payment in &debtor.payments {
        println!(
            "  {}  {}  {:>16}  {}",
            payment.id.short_id().yellow(),
            format_date(&payment.date).dimmed(),
            out.money(payment.amount).green(),
            payment.notes.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn cmd_debtor_rm(store: &mut LedgerStore, out: &Output, query: &str) -> anyhow::Result<()> {
    let Some(debtor) = find_debtor(&store.view(), query)?.cloned() else {
        return report_missing(out, "debtor", query);
    };
    let removed = store.delete_debtor(&debtor.id).await?;
    if out.format == OutputFormat::Json {
        return out.json(&json!({ "removed": removed, "id": debtor.id }));
    }
    println!(
        "{} Removed debtor {} with {} debts and {} payments",
        "✓".green().bold(),
        debtor.name.bold(),
        debtor.debts.len(),
        debtor.payments.len()
    );
    Ok(())
}

async fn cmd_debt_add(
    store: &mut LedgerStore,
    out: &Output,
    query: &str,
    amount: f64,
    description: &str,
) -> anyhow::Result<()> {
    let Some(debtor) = find_debtor(&store.view(), query)?.cloned() else {
        bail!("no debtor matches {query:?}");
    };
    let debt = store.create_debt(&debtor.id, description, amount).await?;
    if out.format == OutputFormat::Json {
        return out.json(&debt);
    }
    println!(
        "{} Recorded debt {} for {}: {}",
        "✓".green().bold(),
        debt.id.short_id().yellow(),
        debtor.name.bold(),
        out.money(debt.amount)
    );
    Ok(())
}

async fn cmd_debt_rm(
    store: &mut LedgerStore,
    out: &Output,
    debtor_query: &str,
    debt_query: &str,
) -> anyhow::Result<()> {
    let view = store.view();
    let Some(debtor) = find_debtor(&view, debtor_query)? else {
        return report_missing(out, "debtor", debtor_query);
    };
    let Some(debt) = find_debt(debtor, debt_query)? else {
        return report_missing(out, "debt", debt_query);
    };

    let removed = store.delete_debt(&debtor.id, &debt.id).await?;
    if out.format == OutputFormat::Json {
        return out.json(&json!({ "removed": removed, "id": debt.id }));
    }
    println!(
        "{} Removed debt {} ({})",
        "✓".green().bold(),
        debt.description,
        out.money(debt.amount)
    );
    Ok(())
}

async fn cmd_payment_add(
    store: &mut LedgerStore,
    out: &Output,
    query: &str,
    amount: f64,
    notes: Option<&str>,
    date: Option<chrono::DateTime<chrono::Utc>>,
) -> anyhow::Result<()> {
    let Some(debtor) = find_debtor(&store.view(), query)?.cloned() else {
        bail!("no debtor matches {query:?}");
    };
    let payment = match date {
        Some(date) => store.create_payment_at(&debtor.id, amount, notes, date).await?,
        None => store.create_payment(&debtor.id, amount, notes).await?,
    };
    if out.format == OutputFormat::Json {
        return out.json(&payment);
    }
    println!(
        "{} Recorded payment {} from {}: {}",
        "✓".green().bold(),
        payment.id.short_id().yellow(),
        debtor.name.bold(),
        out.money(payment.amount).green()
    );
    if let Some(updated) = store.debtor(&debtor.id) {
        let summary = summarize(&updated);
        println!("  Remaining: {}", out.money(summary.remaining).bold());
    }
    Ok(())
}

async fn cmd_payment_rm(
    store: &mut LedgerStore,
    out: &Output,
    debtor_query: &str,
    payment_query: &str,
) -> anyhow::Result<()> {
    let view = store.view();
    let Some(debtor) = find_debtor(&view, debtor_query)? else {
        return report_missing(out, "debtor", debtor_query);
    };
    let Some(payment) = find_payment(debtor, payment_query)? else {
        return report_missing(out, "payment", payment_query);
    };

    let removed = store.delete_payment(&debtor.id, &payment.id).await?;
    if out.format == OutputFormat::Json {
        return out.json(&json!({ "removed": removed, "id": payment.id }));
    }
    println!(
        "{} Removed payment of {} from {}",
        "✓".green().bold(),
        out.money(payment.amount),
        format_date(&payment.date)
    );
    Ok(())
}

fn cmd_stats(view: &LedgerView, out: &Output) -> anyhow::Result<()> {
    let stats = global_stats(&view.debtors);
    if out.format == OutputFormat::Json {
        return out.json(&stats);
    }
    println!("Debtors:   {}", stats.total_debtors.to_string().bold());
    println!("Debt:      {}", out.money(stats.total_debt));
    println!("Paid:      {}", out.money(stats.total_paid).green());
    println!("Remaining: {}", out.money(stats.total_remaining).bold());
    println!(
        "Progress:  {} {:.1}%",
        progress_bar(stats.overall_percentage, BAR_WIDTH),
        stats.overall_percentage
    );
    Ok(())
}

/// Deleting something that is not there is not an error.
fn report_missing(out: &Output, what: &str, query: &str) -> anyhow::Result<()> {
    if out.format == OutputFormat::Json {
        return out.json(&json!({ "removed": false, "id": query }));
    }
    println!("No {what} matches {}; nothing removed.", query.yellow());
    Ok(())
}

fn find_debtor<'a>(view: &'a LedgerView, query: &str) -> anyhow::Result<Option<&'a Debtor>> {
    pick(
        "debtor",
        query,
        &view.debtors,
        |d| d.id.as_str() == query,
        |d| d.id.matches_prefix(query),
    )
}

fn find_debt<'a>(debtor: &'a Debtor, query: &str) -> anyhow::Result<Option<&'a Debt>> {
    pick(
        "debt",
        query,
        &debtor.debts,
        |d| d.id.as_str() == query,
        |d| d.id.matches_prefix(query),
    )
}

fn find_payment<'a>(debtor: &'a Debtor, query: &str) -> anyhow::Result<Option<&'a Payment>> {
    pick(
        "payment",
        query,
        &debtor.payments,
        |p| p.id.as_str() == query,
        |p| p.id.matches_prefix(query),
    )
}

/// Resolve a user-supplied id: an exact match wins, otherwise the prefix
/// must select exactly one item.
fn pick<'a, T>(
    what: &str,
    query: &str,
    items: &'a [T],
    exact: impl Fn(&T) -> bool,
    prefix: impl Fn(&T) -> bool,
) -> anyhow::Result<Option<&'a T>> {
    if query.is_empty() {
        bail!("empty {what} id");
    }
    if let Some(item) = items.iter().find(|&i| exact(i)) {
        return Ok(Some(item));
    }
    let mut matches = items.iter().filter(|&i| prefix(i));
    match (matches.next(), matches.next()) {
        (Some(item), None) => Ok(Some(item)),
        (Some(_), Some(_)) => bail!("{what} id {query:?} is ambiguous; give more characters"),
        (None, _) => Ok(None),
    }
}
