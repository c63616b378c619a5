//! Driving ports for the expense CRUD use-cases.

use async_trait::async_trait;

use crate::domain::{
    Error, ExpenseContent, ExpenseKey, ExpenseRecord, MonthlyTotal, OwnerId, ReceiptId,
};

/// Read-side use-cases scoped to the caller's own records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseQuery: Send + Sync {
    /// Records owned by `owner`, newest date first.
    async fn list(&self, owner: &OwnerId) -> Result<Vec<ExpenseRecord>, Error>;

    /// Per-month totals over the records owned by `owner`.
    async fn monthly_totals(&self, owner: &OwnerId) -> Result<Vec<MonthlyTotal>, Error>;
}

/// Write-side use-cases scoped to the caller's own records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseCommand: Send + Sync {
    /// Store a manual entry owned by `owner` and return its new id.
    async fn create(&self, owner: &OwnerId, content: ExpenseContent) -> Result<ReceiptId, Error>;

    /// Replace vendor, total and items of an owned record.
    ///
    /// `content.date` identifies the record together with `receipt_id`; it is
    /// not changed.
    async fn update(
        &self,
        owner: &OwnerId,
        receipt_id: ReceiptId,
        content: ExpenseContent,
    ) -> Result<ExpenseRecord, Error>;

    /// Delete an owned record.
    async fn delete(&self, owner: &OwnerId, key: ExpenseKey) -> Result<(), Error>;
}
