//! Canonical money amounts and the normalizer that produces them.
//!
//! Receipt text arrives with currency symbols and either thousands convention
//! (`1.234,56` or `1,234.56`). Everything stored goes through
//! [`normalize_amount`], which yields a fixed two-decimal string.
//!
//! Normalisation never fails. Unusable input becomes `"0.00"` and the returned
//! [`AmountStatus`] says so, leaving the caller to decide whether to warn.

use std::fmt;

use serde::{Deserialize, Serialize};

const ZERO: &str = "0.00";

/// How [`normalize_amount`] arrived at its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountStatus {
    /// The input held a number and it was formatted.
    Parsed,
    /// The input was blank; `"0.00"` was substituted.
    Empty,
    /// The input had text but no parseable number; `"0.00"` was substituted.
    Unparseable,
}

/// Canonical decimal string matching `^\d+\.\d{2}$`.
///
/// Values read back from the store are trusted as-is; new values are only
/// built through [`normalize_amount`] or [`Amount::from_cents`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    /// The `"0.00"` amount.
    pub fn zero() -> Self {
        Self(ZERO.to_owned())
    }

    /// Build an amount from a whole number of cents.
    pub fn from_cents(cents: u64) -> Self {
        Self(format!("{}.{:02}", cents / 100, cents % 100))
    }

    /// Interpret the amount as whole cents.
    ///
    /// Returns `None` for stored values that do not follow the canonical shape
    /// or that overflow.
    pub fn cents(&self) -> Option<u64> {
        let (whole, fraction) = self.0.split_once('.')?;
        if fraction.len() != 2 || !is_ascii_digits(whole) || !is_ascii_digits(fraction) {
            return None;
        }
        let whole: u64 = whole.parse().ok()?;
        let fraction: u64 = fraction.parse().ok()?;
        whole.checked_mul(100)?.checked_add(fraction)
    }

    /// Borrow the canonical text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_ascii_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Result of normalising one fragment of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAmount {
    /// Canonical amount, `"0.00"` on fallback.
    pub amount: Amount,
    /// Whether the amount came from the input or from the fallback.
    pub status: AmountStatus,
}

impl NormalizedAmount {
    fn fallback(status: AmountStatus) -> Self {
        Self {
            amount: Amount::zero(),
            status,
        }
    }

    /// True when `"0.00"` was substituted for unusable input.
    pub fn fell_back(&self) -> bool {
        self.status != AmountStatus::Parsed
    }
}

/// Convert loosely formatted currency or quantity text into a canonical amount.
///
/// 1. Drop every character except ASCII digits, `.` and `,`.
/// 2. With both separators present, the one occurring last is the decimal
///    separator and the other is removed as a thousands separator.
/// 3. A lone `,` is the decimal separator.
/// 4. Otherwise the text is already dot-decimal or an integer.
/// 5. Parse and format with exactly two fractional digits.
///
/// # Examples
/// ```
/// use receipts::domain::{normalize_amount, AmountStatus};
///
/// assert_eq!(normalize_amount("R$ 1.234,56").amount.as_str(), "1234.56");
/// assert_eq!(normalize_amount("1,234.56").amount.as_str(), "1234.56");
/// assert_eq!(normalize_amount("abc").status, AmountStatus::Unparseable);
/// ```
pub fn normalize_amount(raw: &str) -> NormalizedAmount {
    if raw.trim().is_empty() {
        return NormalizedAmount::fallback(AmountStatus::Empty);
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    let decimal = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    match decimal.parse::<f64>() {
        Ok(value) if value.is_finite() => NormalizedAmount {
            amount: Amount(format!("{value:.2}")),
            status: AmountStatus::Parsed,
        },
        _ => NormalizedAmount::fallback(AmountStatus::Unparseable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("R$ 1.234,56", "1234.56")]
    #[case("1,234.56", "1234.56")]
    #[case("123,45", "123.45")]
    #[case("42", "42.00")]
    #[case("US$ 1,050.00", "1050.00")]
    #[case("1.234.567,89", "1234567.89")]
    #[case("$12.5", "12.50")]
    #[case(".5", "0.50")]
    #[case("€ 0,99", "0.99")]
    #[case("-3.10", "3.10")]
    fn parses_both_separator_conventions(#[case] raw: &str, #[case] expected: &str) {
        let normalized = normalize_amount(raw);
        assert_eq!(normalized.amount.as_str(), expected);
        assert_eq!(normalized.status, AmountStatus::Parsed);
    }

    #[rstest]
    #[case("", AmountStatus::Empty)]
    #[case("   ", AmountStatus::Empty)]
    #[case("abc", AmountStatus::Unparseable)]
    #[case("1,2,3", AmountStatus::Unparseable)]
    #[case("1.2.3", AmountStatus::Unparseable)]
    #[case("TOTAL", AmountStatus::Unparseable)]
    fn falls_back_to_zero(#[case] raw: &str, #[case] status: AmountStatus) {
        let normalized = normalize_amount(raw);
        assert_eq!(normalized.amount.as_str(), "0.00");
        assert_eq!(normalized.status, status);
        assert!(normalized.fell_back());
    }

    #[rstest]
    fn overlong_digit_runs_do_not_leak_infinity() {
        let raw = "9".repeat(400);
        let normalized = normalize_amount(&raw);
        assert_eq!(normalized.amount, Amount::zero());
        assert_eq!(normalized.status, AmountStatus::Unparseable);
    }

    #[rstest]
    #[case("1234.56", Some(123_456))]
    #[case("0.07", Some(7))]
    #[case("12.5", None)]
    #[case("abc.de", None)]
    #[case("", None)]
    fn cents_reads_canonical_text(#[case] text: &str, #[case] expected: Option<u64>) {
        assert_eq!(Amount(text.to_owned()).cents(), expected);
    }

    #[rstest]
    fn from_cents_pads_fraction() {
        assert_eq!(Amount::from_cents(105).as_str(), "1.05");
        assert_eq!(Amount::from_cents(0).as_str(), "0.00");
    }
}
