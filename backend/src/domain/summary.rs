//! Per-month spending totals.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Amount, ExpenseRecord};

/// Total spent in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`.
    pub month: String,
    pub total: Amount,
    pub count: usize,
}

/// Sum record totals per `YYYY-MM`, oldest month first.
///
/// Sums are kept in integer cents. Records whose date has no `YYYY-MM` prefix
/// or whose total is not canonical are skipped.
pub fn monthly_totals(records: &[ExpenseRecord]) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for record in records {
        let Some(month) = month_of(&record.date) else {
            continue;
        };
        let Some(cents) = record.total.cents() else {
            continue;
        };
        let entry = months.entry(month).or_default();
        entry.0 = entry.0.saturating_add(cents);
        entry.1 += 1;
    }

    months
        .into_iter()
        .map(|(month, (cents, count))| MonthlyTotal {
            month: month.to_owned(),
            total: Amount::from_cents(cents),
            count,
        })
        .collect()
}

fn month_of(date: &str) -> Option<&str> {
    let month = date.get(..7)?;
    let (year, mm) = month.split_once('-')?;
    let numeric = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    (year.len() == 4 && mm.len() == 2 && numeric(year) && numeric(mm)).then_some(month)
}
