//! Exact-decimal amount formatting.
//!
//! Separator and fraction conventions come from the export's own currency
//! declarations, so the rendered journals read like the source file did.

use rust_decimal::Decimal;

use crate::homebank::Currency;

/// Display preferences for rendering amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountFormat {
    pub decimal_char: String,
    pub group_char: String,
    pub fraction: u32,
}

impl AmountFormat {
    /// Derives the format from a currency's declared separators.
    pub fn from_currency(currency: &Currency) -> Self {
        Self {
            decimal_char: currency.decimal_char.clone(),
            group_char: currency.group_char.clone(),
            fraction: currency.fraction,
        }
    }
}

impl Default for AmountFormat {
    fn default() -> Self {
        Self {
            decimal_char: ".".into(),
            group_char: ",".into(),
            fraction: 2,
        }
    }
}

/// Formats an amount with grouping separators and a fixed number of fraction
/// digits. Midpoints round to even, like the source application.
pub fn format_amount(amount: Decimal, format: &AmountFormat) -> String {
    let rounded = amount.round_dp(format.fraction);
    let negative = rounded < Decimal::ZERO;
    let magnitude = rounded.abs();

    let raw = magnitude.to_string();
    let (integer_part, fraction_part) = match raw.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (raw.as_str(), ""),
    };

    let mut body = group_digits(integer_part, &format.group_char);
    if format.fraction > 0 {
        body.push_str(&format.decimal_char);
        body.push_str(fraction_part);
        for _ in fraction_part.len() as u32..format.fraction {
            body.push('0');
        }
    }
    if negative {
        body.insert(0, '-');
    }
    body
}

fn group_digits(digits: &str, separator: &str) -> String {
    let mut grouped = String::new();
    let mut count = 0;
    for ch in digits.chars().rev() {
        if count != 0 && count % 3 == 0 {
            grouped.insert_str(0, separator);
        }
        grouped.insert(0, ch);
        count += 1;
    }
    grouped
}
