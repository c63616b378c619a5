//! Serverless function answering the expense CRUD routes.

use std::ffi::OsString;
use std::sync::Arc;

use aws_config::BehaviorVersion;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde_json::Value;
use tracing::{Instrument, info, info_span};

use receipts::Settings;
use receipts::domain::{ExpenseService, InvocationId};
use receipts::inbound::lambda::{ExpenseRouter, ResponseEnvelope};
use receipts::outbound::dynamodb::DynamoDbExpenseRepository;
use receipts::telemetry;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    let settings = Settings::load_from_iter([OsString::from("expenses-api")])
        .map_err(|err| Error::from(format!("failed to load configuration: {err}")))?;

    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let repo = Arc::new(DynamoDbExpenseRepository::new(
        &sdk_config,
        settings.dynamodb_table(),
        settings.dynamodb_endpoint(),
    ));
    let service = Arc::new(ExpenseService::new(repo, Arc::new(DefaultClock)));
    let router = ExpenseRouter::new(service.clone(), service);
    info!(table = settings.table_name(), "expense router ready");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        handle(router.clone(), event)
    }))
    .await
}

async fn handle(
    router: ExpenseRouter,
    event: LambdaEvent<Value>,
) -> Result<ResponseEnvelope, Error> {
    let (payload, context) = event.into_parts();
    let invocation_id = InvocationId::from_request_id(&context.request_id);
    let span = info_span!("invocation", %invocation_id, request_id = %context.request_id);
    let response = InvocationId::scope(invocation_id, async move { router.handle(&payload).await })
        .instrument(span)
        .await;
    Ok(response)
}
