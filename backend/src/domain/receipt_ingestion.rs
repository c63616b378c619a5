//! Receipt ingestion: storage notification to persisted expense record.
//!
//! The flow is: confirm the object and read its owner metadata, run expense
//! analysis, map the first document, then write the record. Only an
//! unreachable object or a failing downstream service aborts ingestion; noisy
//! extraction results are stored with defaults and reported as warnings.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{error, info, warn};

use crate::domain::ports::{
    BlobStore, BlobStoreError, DocumentAnalyzer, DocumentAnalyzerError, ExpenseRepository,
    ExpenseRepositoryError, IngestionOutcome, IngestionWarning, ReceiptIngestionCommand,
};
use crate::domain::receipt_ingestion_mapping::extract_receipt;
use crate::domain::{BlobLocator, Error, ExpenseRecord, OwnerId, ReceiptId, timestamp};

/// How ingested receipts are assigned ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReceiptIdStrategy {
    /// A fresh random UUID per ingestion.
    #[default]
    Random,
    /// A name-based UUID derived from the object location, so a redelivered
    /// notification overwrites the same record.
    FromBlob,
}

impl ReceiptIdStrategy {
    fn assign(self, locator: &BlobLocator) -> ReceiptId {
        match self {
            Self::Random => ReceiptId::random(),
            Self::FromBlob => ReceiptId::for_blob(locator),
        }
    }
}

/// Tunables for [`ReceiptIngestionService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionOptions {
    /// User metadata key naming the uploader.
    pub owner_metadata_key: String,
    pub receipt_ids: ReceiptIdStrategy,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            owner_metadata_key: "userid".to_owned(),
            receipt_ids: ReceiptIdStrategy::default(),
        }
    }
}

/// Receipt ingestion service.
#[derive(Clone)]
pub struct ReceiptIngestionService<B, A, R> {
    blobs: Arc<B>,
    analyzer: Arc<A>,
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    options: IngestionOptions,
}

impl<B, A, R> ReceiptIngestionService<B, A, R> {
    /// Create a new service.
    pub fn new(
        blobs: Arc<B>,
        analyzer: Arc<A>,
        repo: Arc<R>,
        clock: Arc<dyn Clock>,
        options: IngestionOptions,
    ) -> Self {
        Self {
            blobs,
            analyzer,
            repo,
            clock,
            options,
        }
    }
}

fn map_blob_error(locator: &BlobLocator, err: &BlobStoreError) -> Error {
    error!(kind = err.kind(), error = %err, locator = %locator, "receipt object unreachable");
    Error::internal(format!(
        "Could not access object {} in bucket {}",
        locator.key(),
        locator.bucket()
    ))
    .caused_by(err)
}

fn map_analyzer_error(locator: &BlobLocator, err: &DocumentAnalyzerError) -> Error {
    error!(kind = err.kind(), error = %err, locator = %locator, "expense analysis failed");
    Error::internal("Failed to analyze receipt").caused_by(err)
}

fn map_repository_error(locator: &BlobLocator, err: &ExpenseRepositoryError) -> Error {
    error!(kind = err.kind(), error = %err, locator = %locator, "storing receipt failed");
    Error::internal("Failed to store receipt").caused_by(err)
}

#[async_trait]
impl<B, A, R> ReceiptIngestionCommand for ReceiptIngestionService<B, A, R>
where
    B: BlobStore,
    A: DocumentAnalyzer,
    R: ExpenseRepository,
{
    async fn ingest(&self, locator: BlobLocator) -> Result<IngestionOutcome, Error> {
        info!(locator = %locator, "processing receipt");

        let metadata = self
            .blobs
            .head(&locator)
            .await
            .map_err(|err| map_blob_error(&locator, &err))?;

        let mut warnings = Vec::new();
        let owner = metadata
            .get(&self.options.owner_metadata_key)
            .and_then(|raw| OwnerId::new(raw.trim()).ok());
        if owner.is_none() {
            warnings.push(IngestionWarning::OwnerMissing);
        }

        let analysis = self
            .analyzer
            .analyze_expense(&locator)
            .await
            .map_err(|err| map_analyzer_error(&locator, &err))?;

        let now = self.clock.utc();
        let extracted = extract_receipt(&analysis, now.date_naive());
        warnings.extend(extracted.warnings);

        let receipt_id = self.options.receipt_ids.assign(&locator);
        let record = ExpenseRecord {
            receipt_id: receipt_id.clone(),
            date: extracted.date,
            owner: owner.clone(),
            vendor: extracted.vendor,
            total: extracted.total,
            items: extracted.items,
            s3_path: locator.uri(),
            processed_timestamp: Some(timestamp(now)),
            updated_timestamp: None,
        };

        self.repo
            .put(&record)
            .await
            .map_err(|err| map_repository_error(&locator, &err))?;

        for warning in &warnings {
            warn!(receipt_id = %receipt_id, warning = %warning, "receipt stored with fallback");
        }
        info!(
            receipt_id = %receipt_id,
            date = %record.date,
            total = %record.total,
            items = record.items.len(),
            "receipt stored"
        );

        Ok(IngestionOutcome {
            receipt_id,
            s3_path: record.s3_path,
            owner,
            warnings,
        })
    }
}

#[cfg(test)]
#[path = "receipt_ingestion_tests.rs"]
mod tests;
