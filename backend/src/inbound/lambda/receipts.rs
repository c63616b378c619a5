//! Storage notification handler feeding receipt ingestion.
//!
//! Each record of the notification names one uploaded object. Records are
//! ingested in order; the first failure ends the invocation with a `500`
//! envelope.

use std::sync::Arc;

use aws_lambda_events::event::s3::{S3Event, S3EventRecord};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use super::response::ResponseEnvelope;
use crate::domain::ports::{IngestionOutcome, ReceiptIngestionCommand};
use crate::domain::{BlobLocator, Error};

/// Decode `event` as a storage notification and resolve every record to a
/// [`BlobLocator`].
pub fn storage_locators(event: &Value) -> Result<Vec<BlobLocator>, Error> {
    let notification = S3Event::deserialize(event).map_err(|err| {
        Error::invalid_request("Event is not a storage notification").caused_by(err)
    })?;
    if notification.records.is_empty() {
        return Err(Error::invalid_request("Storage notification carries no records"));
    }
    notification.records.iter().map(record_locator).collect()
}

fn record_locator(record: &S3EventRecord) -> Result<BlobLocator, Error> {
    let bucket = record
        .s3
        .bucket
        .name
        .as_deref()
        .ok_or_else(|| Error::invalid_request("storage event is missing a bucket name"))?;
    let key = record
        .s3
        .object
        .key
        .as_deref()
        .ok_or_else(|| Error::invalid_request("storage event is missing an object key"))?;
    BlobLocator::from_notification(bucket, key)
}

/// Handler for storage notifications.
#[derive(Clone)]
pub struct ReceiptEventHandler {
    ingestion: Arc<dyn ReceiptIngestionCommand>,
}

impl ReceiptEventHandler {
    pub fn new(ingestion: Arc<dyn ReceiptIngestionCommand>) -> Self {
        Self { ingestion }
    }

    /// Ingest every receipt named by `event`.
    pub async fn handle(&self, event: &Value) -> ResponseEnvelope {
        debug!(event = %event, "received storage notification");
        match self.ingest_all(event).await {
            Ok(receipts) => ResponseEnvelope::json(
                200,
                &json!({
                    "message": "Receipt processed successfully",
                    "receipts": receipts,
                }),
            ),
            Err(err) => {
                error!(message = err.message(), details = ?err.details(), "receipt processing failed");
                let mut response = ResponseEnvelope::from_error(&err);
                response.status_code = 500;
                response
            }
        }
    }

    async fn ingest_all(&self, event: &Value) -> Result<Vec<IngestionOutcome>, Error> {
        let locators = storage_locators(event)?;
        let mut outcomes = Vec::with_capacity(locators.len());
        for locator in locators {
            let outcome = self.ingestion.ingest(locator).await?;
            info!(
                receipt_id = %outcome.receipt_id,
                warnings = outcome.warnings.len(),
                "receipt ingested"
            );
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReceiptId;
    use crate::domain::ports::MockReceiptIngestionCommand;
    use mockall::Sequence;
    use rstest::rstest;

    fn record(bucket: &str, key: &str) -> Value {
        json!({
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "awsRegion": "eu-west-1",
            "eventTime": "2024-03-15T10:00:00.000Z",
            "eventName": "ObjectCreated:Put",
            "userIdentity": {"principalId": "AWS:EXAMPLE"},
            "requestParameters": {"sourceIPAddress": "127.0.0.1"},
            "responseElements": {},
            "s3": {
                "s3SchemaVersion": "1.0",
                "configurationId": "receipt-upload",
                "bucket": {
                    "name": bucket,
                    "ownerIdentity": {"principalId": "EXAMPLE"},
                    "arn": format!("arn:aws:s3:::{bucket}"),
                },
                "object": {"key": key, "size": 1024, "eTag": "0123456789abcdef", "sequencer": "0A1B2C3D4E5F678901"},
            },
        })
    }

    fn notification(keys: &[&str]) -> Value {
        let records: Vec<Value> = keys.iter().map(|key| record("receipts", key)).collect();
        json!({ "Records": records })
    }

    fn outcome(locator: &BlobLocator) -> IngestionOutcome {
        IngestionOutcome {
            receipt_id: ReceiptId::for_blob(locator),
            s3_path: locator.uri(),
            owner: None,
            warnings: Vec::new(),
        }
    }

    #[rstest]
    fn keys_are_decoded() {
        let locators =
            storage_locators(&notification(&["uploads/My+Receipt%281%29.jpg"]))
                .expect("valid notification");
        assert_eq!(
            locators,
            vec![BlobLocator::new("receipts", "uploads/My Receipt(1).jpg")]
        );
    }

    #[rstest]
    #[case("bucket", "storage event is missing a bucket name")]
    #[case("object", "storage event is missing an object key")]
    fn records_without_coordinates_are_rejected(#[case] entity: &str, #[case] message: &str) {
        let mut event = record("receipts", "a.jpg");
        event["s3"][entity]
            .as_object_mut()
            .expect("entity object")
            .retain(|field, _| field != "name" && field != "key");

        let err = storage_locators(&json!({ "Records": [event] })).expect_err("rejected");

        assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
        assert_eq!(err.message(), message);
    }

    #[rstest]
    #[tokio::test]
    async fn ingests_every_record_in_order() {
        let mut ingestion = MockReceiptIngestionCommand::new();
        let mut sequence = Sequence::new();
        for key in ["a.jpg", "b.jpg"] {
            ingestion
                .expect_ingest()
                .withf(move |locator| locator.key() == key)
                .times(1)
                .in_sequence(&mut sequence)
                .returning(|locator| Ok(outcome(&locator)));
        }

        let response = ReceiptEventHandler::new(Arc::new(ingestion))
            .handle(&notification(&["a.jpg", "b.jpg"]))
            .await;

        assert_eq!(response.status_code, 200);
        let body = response.body_json().expect("json body");
        assert_eq!(body["message"], json!("Receipt processed successfully"));
        assert_eq!(body["receipts"][1]["s3_path"], json!("s3://receipts/b.jpg"));
    }

    #[rstest]
    #[tokio::test]
    async fn first_failure_stops_processing() {
        let mut ingestion = MockReceiptIngestionCommand::new();
        ingestion.expect_ingest().times(1).returning(|locator| {
            Err(Error::internal(format!(
                "Could not access object {} in bucket {}",
                locator.key(),
                locator.bucket()
            )))
        });

        let response = ReceiptEventHandler::new(Arc::new(ingestion))
            .handle(&notification(&["a.jpg", "b.jpg"]))
            .await;

        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body_json().expect("json body")["message"],
            json!("Could not access object a.jpg in bucket receipts")
        );
    }

    #[rstest]
    #[case(json!({"httpMethod": "GET"}))]
    #[case(json!({"Records": []}))]
    #[case(json!({"Records": [record("", "a.jpg")]}))]
    #[tokio::test]
    async fn malformed_notifications_fail_the_invocation(#[case] event: Value) {
        let mut ingestion = MockReceiptIngestionCommand::new();
        ingestion.expect_ingest().never();

        let response = ReceiptEventHandler::new(Arc::new(ingestion))
            .handle(&event)
            .await;

        assert_eq!(response.status_code, 500);
    }
}
