//! Tests for domain error construction and invocation correlation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const INVOCATION_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn invocation_id() -> InvocationId {
    INVOCATION_ID.parse().expect("fixture UUID parses")
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("who"), ErrorCode::Unauthorized)]
#[case(Error::not_found("gone"), ErrorCode::NotFound)]
#[case(Error::method_not_allowed("nope"), ErrorCode::MethodNotAllowed)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn details_accumulate_under_distinct_keys() {
    let error = Error::internal("Failed to fetch expenses")
        .caused_by("throttled")
        .with_detail("table", "Receipts");

    let details = error.details().expect("details present");
    assert_eq!(details.get("error"), Some(&json!("throttled")));
    assert_eq!(details.get("table"), Some(&json!("Receipts")));
}

#[rstest]
fn invocation_id_is_absent_out_of_scope() {
    assert!(Error::internal("boom").invocation_id().is_none());
}

#[rstest]
#[tokio::test]
async fn invocation_id_is_captured_in_scope(invocation_id: InvocationId) {
    let error = InvocationId::scope(invocation_id, async { Error::internal("boom") }).await;
    assert_eq!(error.invocation_id(), Some(INVOCATION_ID));
}

#[rstest]
fn serialises_with_snake_case_code() {
    let value = serde_json::to_value(Error::not_found("gone")).expect("serialise");
    assert_eq!(value["code"], json!("not_found"));
    assert_eq!(value["message"], json!("gone"));
    assert!(value.get("details").is_none());
}
