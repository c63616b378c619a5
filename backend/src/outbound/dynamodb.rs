//! DynamoDB-backed `ExpenseRepository`.
//!
//! Table layout: primary key `(receipt_id, date)`, global secondary index on
//! `(userId, date)`. Index queries follow `LastEvaluatedKey` until the result
//! set is exhausted.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use serde_dynamo::{from_item, to_attribute_value, to_item};
use tracing::debug;

use crate::domain::ports::{ExpenseRepository, ExpenseRepositoryError};
use crate::domain::{ExpenseChanges, ExpenseKey, ExpenseRecord, OwnerId};

type Item = HashMap<String, AttributeValue>;

const ATTR_RECEIPT_ID: &str = "receipt_id";
const ATTR_DATE: &str = "date";
const ATTR_OWNER: &str = "userId";

/// Table coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbTable {
    pub table_name: String,
    pub owner_index: String,
}

/// DynamoDB implementation of the `ExpenseRepository` port.
#[derive(Clone)]
pub struct DynamoDbExpenseRepository {
    client: Client,
    table: DynamoDbTable,
}

impl fmt::Debug for DynamoDbExpenseRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoDbExpenseRepository")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl DynamoDbExpenseRepository {
    /// Build a client from shared SDK configuration, optionally pointing it at
    /// a local endpoint.
    pub fn new(
        sdk_config: &aws_config::SdkConfig,
        table: DynamoDbTable,
        endpoint: Option<&str>,
    ) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Self::from_client(Client::from_conf(builder.build()), table)
    }

    /// Wrap a pre-built client.
    pub fn from_client(client: Client, table: DynamoDbTable) -> Self {
        Self { client, table }
    }

    fn primary_key(key: &ExpenseKey) -> Item {
        HashMap::from([
            (
                ATTR_RECEIPT_ID.to_owned(),
                AttributeValue::S(key.receipt_id.as_str().to_owned()),
            ),
            (ATTR_DATE.to_owned(), AttributeValue::S(key.date.clone())),
        ])
    }

    /// Query the owner index, optionally narrowed to one date and receipt.
    async fn query_owner_index(
        &self,
        owner: &OwnerId,
        key: Option<&ExpenseKey>,
    ) -> Result<Vec<ExpenseRecord>, ExpenseRepositoryError> {
        let mut records = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table.table_name)
                .index_name(&self.table.owner_index)
                .expression_attribute_names("#owner", ATTR_OWNER)
                .expression_attribute_values(":owner", AttributeValue::S(owner.as_str().to_owned()))
                .scan_index_forward(false)
                .set_exclusive_start_key(start_key.take());
            request = match key {
                Some(key) => request
                    .key_condition_expression("#owner = :owner AND #date = :date")
                    .filter_expression("#receipt_id = :receipt_id")
                    .expression_attribute_names("#date", ATTR_DATE)
                    .expression_attribute_names("#receipt_id", ATTR_RECEIPT_ID)
                    .expression_attribute_values(":date", AttributeValue::S(key.date.clone()))
                    .expression_attribute_values(
                        ":receipt_id",
                        AttributeValue::S(key.receipt_id.as_str().to_owned()),
                    ),
                None => request.key_condition_expression("#owner = :owner"),
            };

            let page = request
                .send()
                .await
                .map_err(|err| map_sdk_error("Query", &err))?;
            for item in page.items() {
                records.push(decode(item.clone())?);
            }
            if key.is_some() && !records.is_empty() {
                break;
            }

            match page.last_evaluated_key() {
                Some(next) if !next.is_empty() => start_key = Some(next.clone()),
                _ => break,
            }
        }

        debug!(owner = %owner, count = records.len(), "owner index query finished");
        Ok(records)
    }
}

fn decode(item: Item) -> Result<ExpenseRecord, ExpenseRepositoryError> {
    from_item(item).map_err(|err| ExpenseRepositoryError::serialization(err.to_string()))
}

fn map_sdk_error<E, R>(operation: &str, err: &SdkError<E, R>) -> ExpenseRepositoryError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    debug!(operation, error = %DisplayErrorContext(err), "dynamodb call failed");
    match err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            let message = inner
                .message()
                .or_else(|| inner.code())
                .unwrap_or("unknown service error");
            ExpenseRepositoryError::query(format!("DynamoDB {operation} failed: {message}"))
        }
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            ExpenseRepositoryError::connection(format!(
                "DynamoDB {operation} failed: {}",
                DisplayErrorContext(err)
            ))
        }
        _ => ExpenseRepositoryError::query(format!(
            "DynamoDB {operation} failed: {}",
            DisplayErrorContext(err)
        )),
    }
}

#[async_trait]
impl ExpenseRepository for DynamoDbExpenseRepository {
    async fn list_by_owner(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<ExpenseRecord>, ExpenseRepositoryError> {
        self.query_owner_index(owner, None).await
    }

    async fn find_owned(
        &self,
        owner: &OwnerId,
        key: &ExpenseKey,
    ) -> Result<Option<ExpenseRecord>, ExpenseRepositoryError> {
        Ok(self
            .query_owner_index(owner, Some(key))
            .await?
            .into_iter()
            .next())
    }

    async fn put(&self, record: &ExpenseRecord) -> Result<(), ExpenseRepositoryError> {
        let item: Item = to_item(record)
            .map_err(|err| ExpenseRepositoryError::serialization(err.to_string()))?;
        self.client
            .put_item()
            .table_name(&self.table.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| map_sdk_error("PutItem", &err))?;
        Ok(())
    }

    async fn update(
        &self,
        key: &ExpenseKey,
        changes: &ExpenseChanges,
    ) -> Result<ExpenseRecord, ExpenseRepositoryError> {
        let items = to_attribute_value(&changes.items)
            .map_err(|err| ExpenseRepositoryError::serialization(err.to_string()))?;
        let result = self
            .client
            .update_item()
            .table_name(&self.table.table_name)
            .set_key(Some(Self::primary_key(key)))
            .update_expression(
                "SET #vendor = :vendor, #total = :total, #items = :items, #updated = :updated",
            )
            .condition_expression("attribute_exists(#receipt_id)")
            .expression_attribute_names("#receipt_id", ATTR_RECEIPT_ID)
            .expression_attribute_names("#vendor", "vendor")
            .expression_attribute_names("#total", "total")
            .expression_attribute_names("#items", "items")
            .expression_attribute_names("#updated", "updated_timestamp")
            .expression_attribute_values(":vendor", AttributeValue::S(changes.vendor.clone()))
            .expression_attribute_values(":total", AttributeValue::S(changes.total.to_string()))
            .expression_attribute_values(":items", items)
            .expression_attribute_values(
                ":updated",
                AttributeValue::S(changes.updated_timestamp.clone()),
            )
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => {
                let attributes = output.attributes.ok_or_else(|| {
                    ExpenseRepositoryError::serialization("UpdateItem returned no attributes")
                })?;
                decode(attributes)
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Err(ExpenseRepositoryError::condition_failed(
                    key.receipt_id.as_str(),
                ))
            }
            Err(err) => Err(map_sdk_error("UpdateItem", &err)),
        }
    }

    async fn delete(&self, owner: &OwnerId, key: &ExpenseKey) -> Result<(), ExpenseRepositoryError> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table.table_name)
            .set_key(Some(Self::primary_key(key)))
            .condition_expression("#owner = :owner")
            .expression_attribute_names("#owner", ATTR_OWNER)
            .expression_attribute_values(":owner", AttributeValue::S(owner.as_str().to_owned()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Err(ExpenseRepositoryError::condition_failed(
                    key.receipt_id.as_str(),
                ))
            }
            Err(err) => Err(map_sdk_error("DeleteItem", &err)),
        }
    }
}
