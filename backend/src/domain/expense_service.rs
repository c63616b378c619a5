//! Expense CRUD service implementing the driving ports.
//!
//! Ownership of an existing record is always established through the owner
//! index before the primary key is used, because the key alone says nothing
//! about who owns the record.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{ExpenseCommand, ExpenseQuery, ExpenseRepository, ExpenseRepositoryError};
use crate::domain::{
    Error, ExpenseChanges, ExpenseContent, ExpenseKey, ExpenseRecord, MANUAL_ENTRY_PATH,
    MonthlyTotal, OwnerId, ReceiptId, monthly_totals, timestamp,
};

/// Verb used in not-found messages.
#[derive(Debug, Clone, Copy)]
enum Mutation {
    Update,
    Delete,
}

impl Mutation {
    fn not_found(self) -> Error {
        let verb = match self {
            Self::Update => "update",
            Self::Delete => "delete",
        };
        Error::not_found(format!(
            "Expense not found or you do not have permission to {verb} it"
        ))
    }
}

/// Expense service backed by an [`ExpenseRepository`].
#[derive(Clone)]
pub struct ExpenseService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ExpenseService<R> {
    /// Create a new service.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

impl<R> ExpenseService<R>
where
    R: ExpenseRepository,
{
    fn store_failure(message: &'static str, error: &ExpenseRepositoryError) -> Error {
        warn!(kind = error.kind(), error = %error, "{message}");
        Error::internal(message).caused_by(error)
    }

    async fn ensure_owned(
        &self,
        owner: &OwnerId,
        key: &ExpenseKey,
        mutation: Mutation,
    ) -> Result<ExpenseRecord, Error> {
        let found = self
            .repo
            .find_owned(owner, key)
            .await
            .map_err(|err| Self::store_failure("Failed to verify expense ownership", &err))?;

        found.ok_or_else(|| {
            warn!(
                owner = %owner,
                receipt_id = %key.receipt_id,
                date = %key.date,
                "expense not found for owner via index lookup"
            );
            mutation.not_found()
        })
    }
}

#[async_trait]
impl<R> ExpenseQuery for ExpenseService<R>
where
    R: ExpenseRepository,
{
    async fn list(&self, owner: &OwnerId) -> Result<Vec<ExpenseRecord>, Error> {
        let records = self
            .repo
            .list_by_owner(owner)
            .await
            .map_err(|err| Self::store_failure("Failed to fetch expenses from database", &err))?;
        info!(owner = %owner, count = records.len(), "fetched expenses");
        Ok(records)
    }

    async fn monthly_totals(&self, owner: &OwnerId) -> Result<Vec<MonthlyTotal>, Error> {
        let records = self.list(owner).await?;
        Ok(monthly_totals(&records))
    }
}

#[async_trait]
impl<R> ExpenseCommand for ExpenseService<R>
where
    R: ExpenseRepository,
{
    async fn create(&self, owner: &OwnerId, content: ExpenseContent) -> Result<ReceiptId, Error> {
        let now = self.clock.utc();
        let receipt_id = ReceiptId::manual(now, rand::random());
        let record = ExpenseRecord {
            receipt_id: receipt_id.clone(),
            date: content.date,
            owner: Some(owner.clone()),
            vendor: content.vendor,
            total: content.total,
            items: content.items,
            s3_path: MANUAL_ENTRY_PATH.to_owned(),
            processed_timestamp: Some(timestamp(now)),
            updated_timestamp: None,
        };

        self.repo
            .put(&record)
            .await
            .map_err(|err| Self::store_failure("Failed to add expense", &err))?;
        info!(owner = %owner, receipt_id = %receipt_id, "expense added");
        Ok(receipt_id)
    }

    async fn update(
        &self,
        owner: &OwnerId,
        receipt_id: ReceiptId,
        content: ExpenseContent,
    ) -> Result<ExpenseRecord, Error> {
        let key = ExpenseKey::new(receipt_id, content.date);
        self.ensure_owned(owner, &key, Mutation::Update).await?;

        let changes = ExpenseChanges {
            vendor: content.vendor,
            total: content.total,
            items: content.items,
            updated_timestamp: timestamp(self.clock.utc()),
        };
        let updated = self
            .repo
            .update(&key, &changes)
            .await
            .map_err(|err| match err {
                ExpenseRepositoryError::ConditionFailed { .. } => Mutation::Update.not_found(),
                other => Self::store_failure("Failed to update expense in database", &other),
            })?;
        info!(owner = %owner, receipt_id = %key.receipt_id, "expense updated");
        Ok(updated)
    }

    async fn delete(&self, owner: &OwnerId, key: ExpenseKey) -> Result<(), Error> {
        self.ensure_owned(owner, &key, Mutation::Delete).await?;

        self.repo
            .delete(owner, &key)
            .await
            .map_err(|err| match err {
                ExpenseRepositoryError::ConditionFailed { .. } => Mutation::Delete.not_found(),
                other => Self::store_failure("Failed to delete expense from database", &other),
            })?;
        info!(owner = %owner, receipt_id = %key.receipt_id, "expense deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "expense_service_tests.rs"]
mod tests;
