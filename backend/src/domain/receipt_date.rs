//! Best-effort parsing of dates read off receipts.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const ISO_DATE: &str = "%Y-%m-%d";
const DAY_FIRST_FORMATS: [&str; 2] = ["%d/%m/%Y", "%d-%m-%Y"];
const OFFSET_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.f%#z";
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse the receipt date text extracted by document analysis.
///
/// Attempts, in order: a timestamp (with or without offset, the calendar date
/// is taken in the timestamp's own offset), `YYYY-MM-DD`, `DD/MM/YYYY`,
/// `DD-MM-YYYY`, and finally `YYYY-MM-DD` on the first whitespace-separated
/// token. Returns `None` when nothing matches; callers substitute today.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use receipts::domain::parse_receipt_date;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
/// assert_eq!(parse_receipt_date("15/03/2024"), expected);
/// assert_eq!(parse_receipt_date("2024-03-15 10:42"), expected);
/// assert_eq!(parse_receipt_date("mid-March"), None);
/// ```
pub fn parse_receipt_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if text.contains('T') {
        if let Some(date) = parse_timestamp(text) {
            return Some(date);
        }
    }

    std::iter::once(ISO_DATE)
        .chain(DAY_FIRST_FORMATS)
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            let first = text.split_whitespace().next()?;
            NaiveDate::parse_from_str(first, ISO_DATE).ok()
        })
}

fn parse_timestamp(text: &str) -> Option<NaiveDate> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.date_naive());
    }
    // Offsets without a colon (`+0000`) or without minutes (`+00`).
    if let Ok(stamp) = DateTime::parse_from_str(text, OFFSET_TIMESTAMP) {
        return Some(stamp.date_naive());
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|stamp| stamp.date())
}

/// Parse a `YYYY-MM-DD` calendar date as supplied by API callers.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, ISO_DATE).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[rstest]
    #[case("2024-03-15T10:30:00Z", date(2024, 3, 15))]
    #[case("2024-03-15T23:30:00-03:00", date(2024, 3, 15))]
    #[case("2024-03-15T23:30:00+0000", date(2024, 3, 15))]
    #[case("2024-03-15T23:30:00+00", date(2024, 3, 15))]
    #[case("2024-03-15T23:30:00.5-0300", date(2024, 3, 15))]
    #[case("2024-03-15T08:00:00.250", date(2024, 3, 15))]
    #[case("2024-03-15", date(2024, 3, 15))]
    #[case("15/03/2024", date(2024, 3, 15))]
    #[case("15-03-2024", date(2024, 3, 15))]
    #[case("2024-03-15 10:30", date(2024, 3, 15))]
    #[case("  2024-03-15  ", date(2024, 3, 15))]
    fn recognised_formats(#[case] raw: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(parse_receipt_date(raw), expected);
    }

    #[rstest]
    #[case("")]
    #[case("March 15")]
    #[case("31/02/2024")]
    #[case("2024-13-01")]
    #[case("Thursday")]
    fn unrecognised_text_yields_none(#[case] raw: &str) {
        assert_eq!(parse_receipt_date(raw), None);
    }

    #[rstest]
    #[case("2024-02-29", true)]
    #[case("2023-02-29", false)]
    #[case("29/02/2024", false)]
    fn iso_dates_are_strict(#[case] raw: &str, #[case] valid: bool) {
        assert_eq!(parse_iso_date(raw).is_some(), valid);
    }
}
