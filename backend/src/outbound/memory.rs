//! In-memory `ExpenseRepository` used by the development server and tests.
//!
//! Mirrors the store's semantics: records are keyed by `(receipt_id, date)`,
//! the owner "index" only sees records carrying an owner, and the conditional
//! mutations fail with `ConditionFailed` like the real store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{ExpenseRepository, ExpenseRepositoryError};
use crate::domain::{ExpenseChanges, ExpenseKey, ExpenseRecord, OwnerId};

type StoreKey = (String, String);

fn store_key(key: &ExpenseKey) -> StoreKey {
    (key.receipt_id.as_str().to_owned(), key.date.clone())
}

/// Process-local expense store.
#[derive(Debug, Default)]
pub struct InMemoryExpenseRepository {
    records: Mutex<BTreeMap<StoreKey, ExpenseRecord>>,
}

impl InMemoryExpenseRepository {
    /// Store seeded with `records`.
    pub fn with_records(records: impl IntoIterator<Item = ExpenseRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (store_key(&record.key()), record))
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of every stored record, in key order.
    pub fn snapshot(&self) -> Result<Vec<ExpenseRecord>, ExpenseRepositoryError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<StoreKey, ExpenseRecord>>, ExpenseRepositoryError> {
        self.records
            .lock()
            .map_err(|_| ExpenseRepositoryError::connection("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryExpenseRepository {
    async fn list_by_owner(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<ExpenseRecord>, ExpenseRepositoryError> {
        let mut records: Vec<ExpenseRecord> = self
            .lock()?
            .values()
            .filter(|record| record.is_owned_by(owner))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn find_owned(
        &self,
        owner: &OwnerId,
        key: &ExpenseKey,
    ) -> Result<Option<ExpenseRecord>, ExpenseRepositoryError> {
        Ok(self
            .lock()?
            .get(&store_key(key))
            .filter(|record| record.is_owned_by(owner))
            .cloned())
    }

    async fn put(&self, record: &ExpenseRecord) -> Result<(), ExpenseRepositoryError> {
        self.lock()?
            .insert(store_key(&record.key()), record.clone());
        Ok(())
    }

    async fn update(
        &self,
        key: &ExpenseKey,
        changes: &ExpenseChanges,
    ) -> Result<ExpenseRecord, ExpenseRepositoryError> {
        let mut records = self.lock()?;
        let record = records
            .get_mut(&store_key(key))
            .ok_or_else(|| ExpenseRepositoryError::condition_failed(key.receipt_id.as_str()))?;
        record.vendor.clone_from(&changes.vendor);
        record.total = changes.total.clone();
        record.items.clone_from(&changes.items);
        record.updated_timestamp = Some(changes.updated_timestamp.clone());
        Ok(record.clone())
    }

    async fn delete(&self, owner: &OwnerId, key: &ExpenseKey) -> Result<(), ExpenseRepositoryError> {
        let mut records = self.lock()?;
        let store_key = store_key(key);
        match records.get(&store_key) {
            Some(record) if record.is_owned_by(owner) => {
                records.remove(&store_key);
                Ok(())
            }
            _ => Err(ExpenseRepositoryError::condition_failed(
                key.receipt_id.as_str(),
            )),
        }
    }
}
