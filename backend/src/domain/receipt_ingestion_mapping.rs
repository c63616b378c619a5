//! Mapping from document-analysis output to expense fields.
//!
//! Only the first expense document is used. Summary fields and line items
//! are read by type label; every fallback is reported as an
//! [`IngestionWarning`].

use chrono::NaiveDate;

use crate::domain::ports::{AnalyzedDocument, ExpenseAnalysis, ExtractedField, IngestionWarning};
use crate::domain::{
    Amount, AmountStatus, LineItem, default_quantity, normalize_amount, parse_receipt_date,
};

const TOTAL: &str = "TOTAL";
const RECEIPT_DATE: &str = "INVOICE_RECEIPT_DATE";
const VENDOR_NAME: &str = "VENDOR_NAME";
const ITEM: &str = "ITEM";
const PRICE: &str = "PRICE";
const QUANTITY: &str = "QUANTITY";

/// Vendor stored when none was detected.
pub(super) const UNKNOWN_VENDOR: &str = "Unknown";

/// Expense fields pulled out of one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ExtractedReceipt {
    pub date: String,
    pub vendor: String,
    pub total: Amount,
    pub items: Vec<LineItem>,
    pub warnings: Vec<IngestionWarning>,
}

impl ExtractedReceipt {
    fn defaults(today: NaiveDate) -> Self {
        Self {
            date: iso(today),
            vendor: UNKNOWN_VENDOR.to_owned(),
            total: Amount::zero(),
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Build expense fields from `analysis`, falling back to `today` for the date.
pub(super) fn extract_receipt(analysis: &ExpenseAnalysis, today: NaiveDate) -> ExtractedReceipt {
    let mut receipt = ExtractedReceipt::defaults(today);
    let Some(document) = analysis.documents.first() else {
        receipt.warnings.push(IngestionWarning::NoExpenseDocuments);
        return receipt;
    };

    let summary = Summary::read(document);
    if let Some(vendor) = summary.vendor {
        receipt.vendor = vendor;
    }
    receipt.total = total_from(summary.total, &mut receipt.warnings);
    if let Some(date) = date_from(summary.date, &mut receipt.warnings) {
        receipt.date = iso(date);
    }
    receipt.items = line_items(document, &mut receipt.warnings);
    receipt
}

#[derive(Default)]
struct Summary {
    total: Option<String>,
    date: Option<String>,
    vendor: Option<String>,
}

impl Summary {
    // Later fields of the same type overwrite earlier ones.
    fn read(document: &AnalyzedDocument) -> Self {
        let mut summary = Self::default();
        for field in &document.summary_fields {
            match field.kind.as_str() {
                TOTAL => summary.total = Some(field.text.clone()),
                RECEIPT_DATE => summary.date = Some(field.text.clone()),
                VENDOR_NAME if !field.text.trim().is_empty() => {
                    summary.vendor = Some(field.text.trim().to_owned());
                }
                _ => {}
            }
        }
        summary
    }
}

fn total_from(raw: Option<String>, warnings: &mut Vec<IngestionWarning>) -> Amount {
    let Some(raw) = raw else {
        warnings.push(IngestionWarning::TotalMissing);
        return Amount::zero();
    };
    let normalized = normalize_amount(&raw);
    match normalized.status {
        AmountStatus::Parsed => {}
        AmountStatus::Empty => warnings.push(IngestionWarning::TotalMissing),
        AmountStatus::Unparseable => warnings.push(IngestionWarning::TotalUnparseable { raw }),
    }
    normalized.amount
}

fn date_from(raw: Option<String>, warnings: &mut Vec<IngestionWarning>) -> Option<NaiveDate> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => {
            let parsed = parse_receipt_date(&raw);
            if parsed.is_none() {
                warnings.push(IngestionWarning::DateUnparseable { raw });
            }
            parsed
        }
        _ => {
            warnings.push(IngestionWarning::DateMissing);
            None
        }
    }
}

fn line_items(document: &AnalyzedDocument, warnings: &mut Vec<IngestionWarning>) -> Vec<LineItem> {
    document
        .line_item_groups
        .iter()
        .flatten()
        .filter_map(|line| line_item(&line.fields, warnings))
        .collect()
}

// A line without an ITEM field is dropped.
fn line_item(fields: &[ExtractedField], warnings: &mut Vec<IngestionWarning>) -> Option<LineItem> {
    let mut name = None;
    let mut price = None;
    let mut quantity = None;
    for field in fields {
        match field.kind.as_str() {
            ITEM => name = Some(field.text.clone()),
            PRICE => price = Some(field.text.clone()),
            QUANTITY => quantity = Some(field.text.clone()),
            _ => {}
        }
    }
    let name = name?;

    let price = match price {
        Some(raw) => {
            let normalized = normalize_amount(&raw);
            if normalized.status == AmountStatus::Unparseable {
                warnings.push(IngestionWarning::PriceUnparseable {
                    item: name.clone(),
                    raw,
                });
            }
            normalized.amount
        }
        None => Amount::zero(),
    };
    let quantity = quantity
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(default_quantity);

    Some(LineItem {
        name,
        price,
        quantity,
    })
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
