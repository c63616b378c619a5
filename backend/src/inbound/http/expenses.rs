//! Expense endpoints for the development server.
//!
//! ```text
//! GET    /expenses[?view=monthly]
//! POST   /expenses                {"date", "vendor", "total", "items"}
//! PUT    /expenses/{receipt_id}   {"date", "vendor", "total", "items"}
//! DELETE /expenses/{receipt_id}   {"date"}
//! ```

use std::collections::BTreeMap;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::{Map, Value, json};

use super::state::HttpState;
use crate::inbound::lambda::ResponseEnvelope;

/// Register the expense routes. Every method is forwarded so the router
/// decides which ones are allowed.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/expenses").route(web::route().to(collection)))
        .service(web::resource("/expenses/{receipt_id}").route(web::route().to(item)));
}

async fn collection(
    state: web::Data<HttpState>,
    request: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    forward(&state, &request, None, &body).await
}

async fn item(
    state: web::Data<HttpState>,
    request: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
) -> HttpResponse {
    let receipt_id = path.into_inner();
    forward(&state, &request, Some(receipt_id), &body).await
}

async fn forward(
    state: &HttpState,
    request: &HttpRequest,
    receipt_id: Option<String>,
    body: &[u8],
) -> HttpResponse {
    let event = direct_event(state, request, receipt_id, body);
    into_http(state.router.handle(&event).await)
}

/// Build the direct-invocation envelope for `request`.
fn direct_event(
    state: &HttpState,
    request: &HttpRequest,
    receipt_id: Option<String>,
    body: &[u8],
) -> Value {
    let path_parameters = receipt_id.map_or(Value::Null, |id| json!({ "receipt_id": id }));
    let query = web::Query::<BTreeMap<String, String>>::from_query(request.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();
    let headers: Map<String, Value> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_owned(), Value::String(value.to_owned())))
        })
        .collect();
    let body = if body.is_empty() {
        Value::Null
    } else {
        Value::String(String::from_utf8_lossy(body).into_owned())
    };

    json!({
        "method": request.method().as_str(),
        "pathParameters": path_parameters,
        "queryStringParameters": query,
        "headers": headers,
        "body": body,
        "requestContext": {
            "authorizer": { "principalId": state.dev_user.as_str() },
        },
    })
}

fn into_http(response: ResponseEnvelope) -> HttpResponse {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = HttpResponse::build(status);
    for (name, value) in &response.headers {
        builder.insert_header((name.as_str(), value.as_str()));
    }
    builder.body(response.body)
}
