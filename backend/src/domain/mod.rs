//! Domain primitives, aggregates and services.
//!
//! Purpose: define the expense entities, the normalisation rules applied to
//! extracted text, and the services behind the driving ports. Keep types
//! transport agnostic and document serialisation contracts (serde) in each
//! type's Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: failure payload mapped to responses by adapters.
//! - ExpenseRecord and friends: the persisted entity and its key.
//! - normalize_amount / parse_receipt_date: extraction clean-up.
//! - ExpenseService / ReceiptIngestionService: driving port implementations.

pub mod amount;
pub mod blob;
pub mod error;
pub mod expense;
pub mod expense_service;
pub mod invocation_id;
pub mod owner;
pub mod ports;
pub mod receipt_date;
pub mod receipt_ingestion;
mod receipt_ingestion_mapping;
pub mod summary;

pub use self::amount::{Amount, AmountStatus, NormalizedAmount, normalize_amount};
pub use self::blob::BlobLocator;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::expense::{
    ExpenseChanges, ExpenseContent, ExpenseKey, ExpenseRecord, LineItem, MANUAL_ENTRY_PATH,
    ReceiptId, default_quantity, timestamp,
};
pub use self::expense_service::ExpenseService;
pub use self::invocation_id::InvocationId;
pub use self::owner::{OwnerId, OwnerIdValidationError};
pub use self::receipt_date::{parse_iso_date, parse_receipt_date};
pub use self::receipt_ingestion::{IngestionOptions, ReceiptIdStrategy, ReceiptIngestionService};
pub use self::summary::{MonthlyTotal, monthly_totals};
