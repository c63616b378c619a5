//! Serverless function ingesting receipts named by storage notifications.

use std::ffi::OsString;
use std::sync::Arc;

use aws_config::BehaviorVersion;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde_json::Value;
use tracing::{Instrument, info, info_span};

use receipts::Settings;
use receipts::domain::{InvocationId, ReceiptIngestionService};
use receipts::inbound::lambda::{ReceiptEventHandler, ResponseEnvelope};
use receipts::outbound::dynamodb::DynamoDbExpenseRepository;
use receipts::outbound::s3::S3BlobStore;
use receipts::outbound::textract::TextractDocumentAnalyzer;
use receipts::telemetry;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    let settings = Settings::load_from_iter([OsString::from("receipt-processor")])
        .map_err(|err| Error::from(format!("failed to load configuration: {err}")))?;

    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let ingestion = ReceiptIngestionService::new(
        Arc::new(S3BlobStore::new(&sdk_config)),
        Arc::new(TextractDocumentAnalyzer::new(&sdk_config)),
        Arc::new(DynamoDbExpenseRepository::new(
            &sdk_config,
            settings.dynamodb_table(),
            settings.dynamodb_endpoint(),
        )),
        Arc::new(DefaultClock),
        settings.ingestion_options(),
    );
    let handler = ReceiptEventHandler::new(Arc::new(ingestion));
    info!(table = settings.table_name(), "receipt processor ready");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        handle(handler.clone(), event)
    }))
    .await
}

async fn handle(
    handler: ReceiptEventHandler,
    event: LambdaEvent<Value>,
) -> Result<ResponseEnvelope, Error> {
    let (payload, context) = event.into_parts();
    let invocation_id = InvocationId::from_request_id(&context.request_id);
    let span = info_span!("invocation", %invocation_id, request_id = %context.request_id);
    let response =
        InvocationId::scope(invocation_id, async move { handler.handle(&payload).await })
            .instrument(span)
            .await;
    Ok(response)
}
