//! Port for expense record persistence.
//!
//! The store is keyed by `(receipt_id, date)` and carries a secondary index on
//! `(userId, date)`. Ownership checks therefore go through the index first
//! ([`ExpenseRepository::find_owned`]) before a primary-key mutation.

use async_trait::async_trait;

use crate::domain::{ExpenseChanges, ExpenseKey, ExpenseRecord, OwnerId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by expense repository adapters.
    pub enum ExpenseRepositoryError {
        /// The store could not be reached.
        Connection { message: String } =>
            "expense store connection failed: {message}",
        /// A query or mutation was rejected by the store.
        Query { message: String } =>
            "expense store query failed: {message}",
        /// A record could not be converted to or from its stored shape.
        Serialization { message: String } =>
            "expense store serialization failed: {message}",
        /// A conditional mutation found no matching record.
        ConditionFailed { receipt_id: String } =>
            "no matching expense record for {receipt_id}",
    }
}

/// Port for expense record storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// All records indexed under `owner`, newest date first.
    async fn list_by_owner(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<ExpenseRecord>, ExpenseRepositoryError>;

    /// Look up `key` through the owner index.
    ///
    /// Returns `None` when the record is missing or indexed under another
    /// owner.
    async fn find_owned(
        &self,
        owner: &OwnerId,
        key: &ExpenseKey,
    ) -> Result<Option<ExpenseRecord>, ExpenseRepositoryError>;

    /// Write a whole record, replacing any record with the same key.
    async fn put(&self, record: &ExpenseRecord) -> Result<(), ExpenseRepositoryError>;

    /// Apply `changes` to the existing record at `key` and return the result.
    ///
    /// Fails with [`ExpenseRepositoryError::ConditionFailed`] when no record
    /// exists at `key`.
    async fn update(
        &self,
        key: &ExpenseKey,
        changes: &ExpenseChanges,
    ) -> Result<ExpenseRecord, ExpenseRepositoryError>;

    /// Delete the record at `key` if it is still owned by `owner`.
    ///
    /// Fails with [`ExpenseRepositoryError::ConditionFailed`] otherwise.
    async fn delete(&self, owner: &OwnerId, key: &ExpenseKey) -> Result<(), ExpenseRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn condition_failures_name_the_receipt() {
        let error = ExpenseRepositoryError::condition_failed("manual-1");
        assert_eq!(error.to_string(), "no matching expense record for manual-1");
        assert_eq!(error.kind(), "condition_failed");
    }
}
