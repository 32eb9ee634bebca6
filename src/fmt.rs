use chrono::{Month, NaiveDate};

use crate::models::DEFAULT_CURRENCY;

fn currency_prefix(code: &str) -> String {
    match code.to_ascii_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "\u{20ac}".to_string(),
        "GBP" => "\u{a3}".to_string(),
        "JPY" => "\u{a5}".to_string(),
        "CAD" => "CA$".to_string(),
        "AUD" => "A$".to_string(),
        "" => "$".to_string(),
        other => format!("{other} "),
    }
}

fn with_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format an amount in the given currency: `currency(1234.5, "EUR")` -> `€1,234.50`.
/// An empty code falls back to dollars.
pub fn currency(val: f64, code: &str) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));
    let sign = if negative && cents != "0.00" { "-" } else { "" };
    format!(
        "{sign}{}{}.{dec_part}",
        currency_prefix(code),
        with_thousands(int_part)
    )
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    currency(val, DEFAULT_CURRENCY)
}

/// Hours to at most two decimals, trailing zeros dropped: 8 -> "8", 7.5 -> "7.5".
pub fn hours(val: f64) -> String {
    let rounded = (val * 100.0).round() / 100.0;
    // -0.0 would print as "-0"
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}

/// "Jan 15, 2024"
pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// "January 15, 2024"
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Full English month name for 1..=12, empty otherwise.
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("")
}
