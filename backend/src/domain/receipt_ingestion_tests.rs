//! Tests for the receipt ingestion service.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    AnalyzedDocument, BlobMetadata, ExpenseAnalysis, ExtractedField, MockBlobStore,
    MockDocumentAnalyzer, MockExpenseRepository,
};
use crate::domain::ErrorCode;

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: Utc
            .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .expect("valid fixture timestamp"),
    })
}

fn locator() -> BlobLocator {
    BlobLocator::new("receipts", "uploads/Jan 2024/a.jpg")
}

fn metadata(entries: &[(&str, &str)]) -> BlobMetadata {
    BlobMetadata {
        user_metadata: entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect::<HashMap<_, _>>(),
    }
}

fn analysis() -> ExpenseAnalysis {
    ExpenseAnalysis {
        documents: vec![AnalyzedDocument {
            summary_fields: vec![
                ExtractedField::new("VENDOR_NAME", "Corner Shop"),
                ExtractedField::new("TOTAL", "US$ 1,050.00"),
                ExtractedField::new("INVOICE_RECEIPT_DATE", "2024-03-14"),
            ],
            line_item_groups: Vec::new(),
        }],
    }
}

fn make_service(
    blobs: MockBlobStore,
    analyzer: MockDocumentAnalyzer,
    repo: MockExpenseRepository,
    options: IngestionOptions,
) -> ReceiptIngestionService<MockBlobStore, MockDocumentAnalyzer, MockExpenseRepository> {
    ReceiptIngestionService::new(
        Arc::new(blobs),
        Arc::new(analyzer),
        Arc::new(repo),
        fixture_clock(),
        options,
    )
}

fn blobs_with(entries: &'static [(&'static str, &'static str)]) -> MockBlobStore {
    let mut blobs = MockBlobStore::new();
    blobs
        .expect_head()
        .times(1)
        .return_once(move |_| Ok(metadata(entries)));
    blobs
}

fn analyzer_returning(result: ExpenseAnalysis) -> MockDocumentAnalyzer {
    let mut analyzer = MockDocumentAnalyzer::new();
    analyzer
        .expect_analyze_expense()
        .times(1)
        .return_once(move |_| Ok(result));
    analyzer
}

#[tokio::test]
async fn stores_extracted_record_for_owner() {
    let mut repo = MockExpenseRepository::new();
    repo.expect_put()
        .withf(|record| {
            record.owner.as_ref().map(OwnerId::as_str) == Some("user-123")
                && record.vendor == "Corner Shop"
                && record.total.as_str() == "1050.00"
                && record.date == "2024-03-14"
                && record.s3_path == "s3://receipts/uploads/Jan 2024/a.jpg"
                && record.processed_timestamp.as_deref() == Some("2024-06-01T12:00:00.000000Z")
        })
        .times(1)
        .return_once(|_| Ok(()));

    let outcome = make_service(
        blobs_with(&[("userid", "user-123")]),
        analyzer_returning(analysis()),
        repo,
        IngestionOptions::default(),
    )
    .ingest(locator())
    .await
    .expect("ingestion succeeds");

    assert_eq!(outcome.owner.as_ref().map(OwnerId::as_str), Some("user-123"));
    assert_eq!(outcome.s3_path, "s3://receipts/uploads/Jan 2024/a.jpg");
    assert!(outcome.warnings.is_empty());
}

#[tokio::test]
async fn missing_owner_metadata_stores_unowned_record() {
    let mut repo = MockExpenseRepository::new();
    repo.expect_put()
        .withf(|record| record.owner.is_none())
        .times(1)
        .return_once(|_| Ok(()));

    let outcome = make_service(
        blobs_with(&[("content-source", "mobile")]),
        analyzer_returning(analysis()),
        repo,
        IngestionOptions::default(),
    )
    .ingest(locator())
    .await
    .expect("ingestion succeeds");

    assert!(outcome.owner.is_none());
    assert_eq!(outcome.warnings, vec![IngestionWarning::OwnerMissing]);
    let body = serde_json::to_value(&outcome).expect("serialise outcome");
    assert!(body.get("userId").is_none());
}

#[tokio::test]
async fn custom_owner_key_is_honoured() {
    let mut repo = MockExpenseRepository::new();
    repo.expect_put()
        .withf(|record| record.owner.as_ref().map(OwnerId::as_str) == Some("abc"))
        .times(1)
        .return_once(|_| Ok(()));
    let options = IngestionOptions {
        owner_metadata_key: "Uploader".to_owned(),
        ..IngestionOptions::default()
    };

    make_service(
        blobs_with(&[("uploader", " abc ")]),
        analyzer_returning(analysis()),
        repo,
        options,
    )
    .ingest(locator())
    .await
    .expect("ingestion succeeds");
}

#[rstest]
#[case(ReceiptIdStrategy::FromBlob, true)]
#[case(ReceiptIdStrategy::Random, false)]
#[tokio::test]
async fn receipt_id_strategy_controls_stability(
    #[case] strategy: ReceiptIdStrategy,
    #[case] stable: bool,
) {
    let expected = ReceiptId::for_blob(&locator());
    let mut repo = MockExpenseRepository::new();
    repo.expect_put().times(1).return_once(|_| Ok(()));
    let options = IngestionOptions {
        receipt_ids: strategy,
        ..IngestionOptions::default()
    };

    let outcome = make_service(
        blobs_with(&[("userid", "u")]),
        analyzer_returning(analysis()),
        repo,
        options,
    )
    .ingest(locator())
    .await
    .expect("ingestion succeeds");

    assert_eq!(outcome.receipt_id == expected, stable);
}

#[tokio::test]
async fn unreachable_object_aborts_before_analysis() {
    let mut blobs = MockBlobStore::new();
    blobs.expect_head().times(1).return_once(|_| {
        Err(BlobStoreError::unreachable(
            "receipts/uploads/a.jpg",
            "NoSuchKey",
        ))
    });
    let mut analyzer = MockDocumentAnalyzer::new();
    analyzer.expect_analyze_expense().never();
    let mut repo = MockExpenseRepository::new();
    repo.expect_put().never();

    let error = make_service(blobs, analyzer, repo, IngestionOptions::default())
        .ingest(locator())
        .await
        .expect_err("unreachable");

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert_eq!(
        error.message(),
        "Could not access object uploads/Jan 2024/a.jpg in bucket receipts"
    );
}

#[tokio::test]
async fn analysis_failure_is_internal() {
    let mut analyzer = MockDocumentAnalyzer::new();
    analyzer
        .expect_analyze_expense()
        .times(1)
        .return_once(|_| Err(DocumentAnalyzerError::rejected("unsupported format")));
    let mut repo = MockExpenseRepository::new();
    repo.expect_put().never();

    let error = make_service(
        blobs_with(&[("userid", "u")]),
        analyzer,
        repo,
        IngestionOptions::default(),
    )
    .ingest(locator())
    .await
    .expect_err("analysis failure");

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert_eq!(error.message(), "Failed to analyze receipt");
}

#[tokio::test]
async fn store_failure_is_internal() {
    let mut repo = MockExpenseRepository::new();
    repo.expect_put()
        .times(1)
        .return_once(|_| Err(ExpenseRepositoryError::connection("reset")));

    let error = make_service(
        blobs_with(&[("userid", "u")]),
        analyzer_returning(analysis()),
        repo,
        IngestionOptions::default(),
    )
    .ingest(locator())
    .await
    .expect_err("store failure");

    assert_eq!(error.message(), "Failed to store receipt");
}

#[tokio::test]
async fn empty_analysis_is_stored_with_defaults() {
    let mut repo = MockExpenseRepository::new();
    repo.expect_put()
        .withf(|record| {
            record.vendor == "Unknown" && record.total.as_str() == "0.00" && record.date == "2024-06-01"
        })
        .times(1)
        .return_once(|_| Ok(()));

    let outcome = make_service(
        blobs_with(&[("userid", "u")]),
        analyzer_returning(ExpenseAnalysis::default()),
        repo,
        IngestionOptions::default(),
    )
    .ingest(locator())
    .await
    .expect("ingestion succeeds");

    assert_eq!(outcome.warnings, vec![IngestionWarning::NoExpenseDocuments]);
}
