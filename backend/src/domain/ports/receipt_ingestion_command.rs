//! Driving port for turning an uploaded receipt image into an expense record.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{BlobLocator, Error, OwnerId, ReceiptId};

/// Best-effort substitutions made while building a record.
///
/// Ingestion never fails on noisy extraction; it records what it papered over
/// so the outcome (and the logs) show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestionWarning {
    /// The service found no expense document; defaults were stored.
    NoExpenseDocuments,
    /// The object carried no owner metadata; the record has no `userId`.
    OwnerMissing,
    /// No usable total was extracted; `"0.00"` was stored.
    TotalMissing,
    /// The total text had no parseable number; `"0.00"` was stored.
    TotalUnparseable { raw: String },
    /// A line price had no parseable number; `"0.00"` was stored.
    PriceUnparseable { item: String, raw: String },
    /// No receipt date was extracted; today's date was stored.
    DateMissing,
    /// The receipt date text matched no known format; today's date was stored.
    DateUnparseable { raw: String },
}

impl fmt::Display for IngestionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExpenseDocuments => write!(f, "no expense documents detected"),
            Self::OwnerMissing => write!(f, "object metadata names no owner"),
            Self::TotalMissing => write!(f, "no total detected"),
            Self::TotalUnparseable { raw } => write!(f, "total {raw:?} is not a number"),
            Self::PriceUnparseable { item, raw } => {
                write!(f, "price {raw:?} of {item:?} is not a number")
            }
            Self::DateMissing => write!(f, "no receipt date detected"),
            Self::DateUnparseable { raw } => write!(f, "receipt date {raw:?} not understood"),
        }
    }
}

/// Result of ingesting one receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionOutcome {
    pub receipt_id: ReceiptId,
    pub s3_path: String,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerId>,
    pub warnings: Vec<IngestionWarning>,
}

/// Driving port for receipt ingestion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptIngestionCommand: Send + Sync {
    /// Analyse the blob at `locator` and persist the extracted record.
    async fn ingest(&self, locator: BlobLocator) -> Result<IngestionOutcome, Error>;
}
