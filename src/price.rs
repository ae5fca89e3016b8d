//! Price normalization and display formatting.
//!
//! Prices arrive in two shapes: proper numbers, and legacy free-text entries
//! like `"3,50€"` or `"ej: 3.50"`. The formatter parses what it can and shows
//! the rest verbatim so a malformed record never breaks a page.

use serde::{Deserialize, Serialize};

use crate::text::Locale;

/// Price as stored: a number, or a loosely formatted string from legacy data
/// entry. Both shapes must keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Number(f64),
    Text(String),
}

impl Price {
    /// Trimmed-empty text counts as no price at all.
    pub fn is_blank(&self) -> bool {
        match self {
            Price::Number(_) => false,
            Price::Text(s) => s.trim().is_empty(),
        }
    }
}

/// Canonical display string for a price in the given locale: two fraction
/// digits and the Euro symbol, `3,50 €` for Spanish, `€3.50` for English.
///
/// String input is parsed first (comma accepted as decimal separator, any
/// currency marker stripped); when it parses, it renders exactly like the
/// numeric path, and when it does not, the original string is returned
/// unchanged.
pub fn format_price(price: &Price, locale: Locale) -> String {
    match price {
        Price::Number(n) => format_amount(*n, locale),
        Price::Text(s) => match parse_loose(s) {
            Some(n) => format_amount(n, locale),
            None => s.clone(),
        },
    }
}

fn format_amount(n: f64, locale: Locale) -> String {
    let digits = two_decimals(n, locale);
    match locale {
        Locale::Es => format!("{digits} €"),
        Locale::En => format!("€{digits}"),
    }
}

/// Parse a loosely formatted price string: trim, accept the first comma as a
/// decimal separator, drop every other non-numeric character.
fn parse_loose(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replacen(',', ".", 1)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

fn two_decimals(n: f64, locale: Locale) -> String {
    let (group_sep, decimal_sep) = match locale {
        Locale::Es => ('.', ','),
        Locale::En => (',', '.'),
    };
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(group_sep);
        }
        grouped.push(c);
    }

    let sign = if n < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}{decimal_sep}{frac_part}")
}
