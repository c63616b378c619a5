//! CRUD router for expense records.
//!
//! Flow per event: detect the envelope, resolve the caller, then branch on the
//! HTTP method. Every outcome, including failures, becomes a
//! [`ResponseEnvelope`]; nothing is propagated to the dispatcher.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use super::envelope::{self, Envelope, NormalizedRequest};
use super::identity::caller_identity;
use super::requests::{
    CREATE_MESSAGES, UPDATE_MESSAGES, body_object, deletion_date, expense_content,
};
use super::response::ResponseEnvelope;
use crate::domain::ports::{ExpenseCommand, ExpenseQuery};
use crate::domain::{Error, ErrorCode, ExpenseKey, OwnerId, ReceiptId};

const RECEIPT_ID_PARAM: &str = "receipt_id";
const VIEW_PARAM: &str = "view";
const MONTHLY_VIEW: &str = "monthly";

/// Routes API events to the expense use-cases.
#[derive(Clone)]
pub struct ExpenseRouter {
    query: Arc<dyn ExpenseQuery>,
    command: Arc<dyn ExpenseCommand>,
}

impl ExpenseRouter {
    pub fn new(query: Arc<dyn ExpenseQuery>, command: Arc<dyn ExpenseCommand>) -> Self {
        Self { query, command }
    }

    /// Handle one dispatcher event.
    pub async fn handle(&self, event: &Value) -> ResponseEnvelope {
        debug!(event = %event, "received event");
        match self.dispatch(event).await {
            Ok(response) => response,
            Err(err) => {
                if err.code() == ErrorCode::InternalError {
                    error!(message = err.message(), details = ?err.details(), "request failed");
                } else {
                    warn!(code = ?err.code(), message = err.message(), "request rejected");
                }
                ResponseEnvelope::from_error(&err)
            }
        }
    }

    async fn dispatch(&self, event: &Value) -> Result<ResponseEnvelope, Error> {
        let detected = envelope::detect(event);
        if let Envelope::Unrecognized {
            keys,
            service_event,
        } = &detected
        {
            warn!(keys = ?keys, "unknown event format");
            if *service_event {
                warn!("event carries Records; this looks like a service notification");
            }
        }
        let request = detected.into_request()?;
        info!(shape = ?request.shape, method = %request.method, "request detected");

        let Some(owner) = caller_identity(event) else {
            return Err(Error::unauthorized("Unauthorized - User ID not found"));
        };
        info!(owner = %owner, "caller authenticated");

        match request.method.as_str() {
            "GET" => self.list(&owner, &request).await,
            "POST" => self.create(&owner, &request).await,
            "PUT" => self.update(&owner, &request).await,
            "DELETE" => self.delete(&owner, &request).await,
            other => {
                warn!(method = other, "method not allowed");
                Err(Error::method_not_allowed("Method Not Allowed"))
            }
        }
    }

    async fn list(
        &self,
        owner: &OwnerId,
        request: &NormalizedRequest,
    ) -> Result<ResponseEnvelope, Error> {
        if request.query_parameter(VIEW_PARAM) == Some(MONTHLY_VIEW) {
            let totals = self.query.monthly_totals(owner).await?;
            return Ok(ResponseEnvelope::json(200, &totals));
        }
        let records = self.query.list(owner).await?;
        Ok(ResponseEnvelope::json(200, &records))
    }

    async fn create(
        &self,
        owner: &OwnerId,
        request: &NormalizedRequest,
    ) -> Result<ResponseEnvelope, Error> {
        let body = body_object(request.body.as_ref(), "Request body is required")?;
        let content = expense_content(&body, CREATE_MESSAGES)?;
        let receipt_id = self.command.create(owner, content).await?;
        Ok(ResponseEnvelope::json(
            201,
            &json!({
                "message": "Expense added successfully",
                "receipt_id": receipt_id,
            }),
        ))
    }

    async fn update(
        &self,
        owner: &OwnerId,
        request: &NormalizedRequest,
    ) -> Result<ResponseEnvelope, Error> {
        let receipt_id = receipt_id(request)?;
        let body = body_object(request.body.as_ref(), "Request body is required")?;
        let content = expense_content(&body, UPDATE_MESSAGES)?;
        let updated = self.command.update(owner, receipt_id, content).await?;
        Ok(ResponseEnvelope::json(
            200,
            &json!({
                "message": "Expense updated successfully",
                "updated_item": updated,
            }),
        ))
    }

    async fn delete(
        &self,
        owner: &OwnerId,
        request: &NormalizedRequest,
    ) -> Result<ResponseEnvelope, Error> {
        let receipt_id = receipt_id(request)?;
        let body = body_object(request.body.as_ref(), "Request body is required for deletion")?;
        let date = deletion_date(&body)?;
        self.command
            .delete(owner, ExpenseKey::new(receipt_id, date))
            .await?;
        Ok(ResponseEnvelope::no_content())
    }
}

fn receipt_id(request: &NormalizedRequest) -> Result<ReceiptId, Error> {
    request
        .path_parameter(RECEIPT_ID_PARAM)
        .map(|id| ReceiptId::new(id.trim()))
        .ok_or_else(|| Error::invalid_request("Receipt ID is required in path parameters"))
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
