//! Expense records and the values used to create or change them.
//!
//! `(receipt_id, date)` is the composite primary key. The secondary index is
//! `(userId, date)`, which is why every mutation carries the date as well as
//! the id.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, BlobLocator, OwnerId};

/// Sentinel stored in `s3_path` for records typed in by hand.
pub const MANUAL_ENTRY_PATH: &str = "MANUAL_ENTRY";

/// Partition component of the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(String);

impl ReceiptId {
    /// Wrap an id taken from a request path or the store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id for a manual entry: `manual-<YYYYmmddHHMMSS>-<8 hex chars>`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use receipts::domain::ReceiptId;
    ///
    /// let at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 5, 0).unwrap();
    /// let id = ReceiptId::manual(at, [0xde, 0xad, 0xbe, 0xef]);
    /// assert_eq!(id.as_str(), "manual-20240315090500-deadbeef");
    /// ```
    pub fn manual(at: DateTime<Utc>, suffix: [u8; 4]) -> Self {
        Self(format!(
            "manual-{}-{}",
            at.format("%Y%m%d%H%M%S"),
            hex::encode(suffix)
        ))
    }

    /// Random id for an ingested receipt.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Name-based id derived from the blob locator, stable across re-delivery.
    pub fn for_blob(locator: &BlobLocator) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, locator.uri().as_bytes()).to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite primary key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpenseKey {
    pub receipt_id: ReceiptId,
    pub date: String,
}

impl ExpenseKey {
    pub fn new(receipt_id: ReceiptId, date: impl Into<String>) -> Self {
        Self {
            receipt_id,
            date: date.into(),
        }
    }
}

/// One line of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub price: Amount,
    #[serde(default = "default_quantity")]
    pub quantity: String,
}

/// Quantity recorded when none was supplied or extracted.
pub fn default_quantity() -> String {
    "1".to_owned()
}

/// The persisted expense entity.
///
/// ## Invariants
/// - `total` and every `items[].price` are canonical [`Amount`]s.
/// - `owner` is serialised as `userId` and omitted when unknown, so the
///   record stays out of the owner index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub receipt_id: ReceiptId,
    pub date: String,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerId>,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub total: Amount,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub s3_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_timestamp: Option<String>,
}

impl ExpenseRecord {
    /// Primary key of this record.
    pub fn key(&self) -> ExpenseKey {
        ExpenseKey::new(self.receipt_id.clone(), self.date.clone())
    }

    /// True when the record belongs to `owner`.
    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        self.owner.as_ref() == Some(owner)
    }
}

/// Validated content of a manual entry or an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseContent {
    pub date: String,
    pub vendor: String,
    pub total: Amount,
    pub items: Vec<LineItem>,
}

/// Attribute changes applied by an update, keyed by `(receipt_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseChanges {
    pub vendor: String,
    pub total: Amount,
    pub items: Vec<LineItem>,
    pub updated_timestamp: String,
}

/// ISO-8601 timestamp written to `processed_timestamp` / `updated_timestamp`.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
