//! Display formatting for amounts, dates, and progress.
//!
//! The defaults follow the Indonesian locale the ledger was first used
//! with: rupiah without minor units, `.` as the thousands separator, and
//! Indonesian day and month names.

use std::fmt::Display;

use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};

const WEEKDAYS: [&str; 7] = [
    "Minggu", "Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu",
];

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// How to render a currency amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub fraction_digits: u8,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "Rp".into(),
            thousands_separator: '.',
            decimal_separator: ',',
            fraction_digits: 0,
        }
    }
}

/// Render `amount` as currency, e.g. `Rp 1.250.000` or `-Rp 50`.
///
/// Rounds half away from zero to `fraction_digits`.
pub fn format_currency(amount: f64, format: &CurrencyFormat) -> String {
    let digits = u32::from(format.fraction_digits.min(9));
    let scale = 10u128.pow(digits);
    let scaled = (amount.abs() * scale as f64).round() as u128;
    let whole = scaled / scale;
    let fraction = scaled % scale;

    let mut out = String::new();
    if amount.is_sign_negative() && scaled != 0 {
        out.push('-');
    }
    if !format.symbol.is_empty() {
        out.push_str(&format.symbol);
        out.push(' ');
    }
    out.push_str(&group_thousands(whole, format.thousands_separator));
    if digits > 0 {
        out.push(format.decimal_separator);
        out.push_str(&format!("{fraction:0width$}", width = digits as usize));
    }
    out
}

fn group_thousands(value: u128, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Short date-time, e.g. `07/10/2025 15.30`.
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%d/%m/%Y %H.%M").to_string()
}

/// Long date with Indonesian names, e.g. `Selasa, 7 Oktober 2025`.
pub fn format_date_long<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_sunday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{weekday}, {} {month} {}", date.day(), date.year())
}

/// Clamp a payment percentage into `[0, 100]` for progress display.
pub fn display_percentage(percentage: f64) -> f64 {
    if percentage.is_nan() {
        return 0.0;
    }
    percentage.clamp(0.0, 100.0)
}

/// Text progress bar of `width` cells for a payment percentage.
pub fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((display_percentage(percentage) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn rupiah() -> CurrencyFormat {
        CurrencyFormat::default()
    }

    #[test]
    fn rupiah_groups_thousands() {
        assert_eq!(format_currency(1_250_000.0, &rupiah()), "Rp 1.250.000");
        assert_eq!(format_currency(999.0, &rupiah()), "Rp 999");
        assert_eq!(format_currency(1000.0, &rupiah()), "Rp 1.000");
        assert_eq!(format_currency(0.0, &rupiah()), "Rp 0");
    }

    #[test]
    fn rupiah_rounds_to_whole_units() {
        assert_eq!(format_currency(1499.5, &rupiah()), "Rp 1.500");
        assert_eq!(format_currency(1499.4, &rupiah()), "Rp 1.499");
    }

    #[test]
    fn negative_amounts_carry_sign() {
        assert_eq!(format_currency(-50.0, &rupiah()), "-Rp 50");
        assert_eq!(format_currency(-0.2, &rupiah()), "Rp 0");
    }

    #[test]
    fn fraction_digits() {
        let usd = CurrencyFormat {
            symbol: "$".into(),
            thousands_separator: ',',
            decimal_separator: '.',
            fraction_digits: 2,
        };
        assert_eq!(format_currency(1234.5, &usd), "$ 1,234.50");
        assert_eq!(format_currency(0.05, &usd), "$ 0.05");
    }

    #[test]
    fn short_date() {
        let date = Utc.with_ymd_and_hms(2025, 10, 7, 15, 30, 45).unwrap();
        assert_eq!(format_date(&date), "07/10/2025 15.30");
    }

    #[test]
    fn long_date_uses_indonesian_names() {
        let date = Utc.with_ymd_and_hms(2025, 10, 6, 12, 0, 0).unwrap();
        assert_eq!(format_date_long(&date), "Senin, 6 Oktober 2025");
        let sunday = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(format_date_long(&sunday), "Minggu, 5 Januari 2025");
    }

    #[test]
    fn percentage_is_clamped_for_display() {
        assert_eq!(display_percentage(120.0), 100.0);
        assert_eq!(display_percentage(-5.0), 0.0);
        assert_eq!(display_percentage(42.5), 42.5);
        assert_eq!(display_percentage(f64::NAN), 0.0);
    }

    #[test]
    fn progress_bar_widths() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(50.0, 4), "██░░");
        assert_eq!(progress_bar(250.0, 4), "████");
        assert_eq!(progress_bar(40.0, 10).chars().count(), 10);
    }
}
