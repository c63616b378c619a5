//! Port for the managed document-analysis (expense extraction) service.
//!
//! Only the contract is modelled: the service returns expense documents made
//! of typed summary fields and grouped line items, each field being a
//! `(type, detected text)` pair.

use async_trait::async_trait;

use crate::domain::BlobLocator;

use super::define_port_error;

define_port_error! {
    /// Errors raised by document analyzer adapters.
    pub enum DocumentAnalyzerError {
        /// The service rejected the document (unsupported format, too large…).
        Rejected { message: String } =>
            "document analysis rejected the document: {message}",
        /// The service failed or could not be reached.
        Service { message: String } =>
            "document analysis failed: {message}",
    }
}

/// One typed field detected on a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedField {
    /// Field type label such as `TOTAL` or `ITEM`; empty when unlabelled.
    pub kind: String,
    /// Detected value text; empty when nothing was read.
    pub text: String,
}

impl ExtractedField {
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
        }
    }
}

/// Fields detected on one receipt line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLineItem {
    pub fields: Vec<ExtractedField>,
}

/// One expense document (a receipt or invoice) found in the blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzedDocument {
    pub summary_fields: Vec<ExtractedField>,
    /// Line items, grouped as the service groups them.
    pub line_item_groups: Vec<Vec<ExtractedLineItem>>,
}

/// Everything the service returned for one blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseAnalysis {
    pub documents: Vec<AnalyzedDocument>,
}

/// Port for expense-field extraction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Run expense analysis on the blob at `locator`.
    async fn analyze_expense(
        &self,
        locator: &BlobLocator,
    ) -> Result<ExpenseAnalysis, DocumentAnalyzerError>;
}
