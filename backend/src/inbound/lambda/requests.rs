//! Request body parsing and validation for the CRUD operations.
//!
//! Bodies arrive either as JSON text (gateway envelopes) or as an already
//! decoded object (direct invocation). Field errors carry `field` and `code`
//! details next to the message.

use serde_json::{Map, Value};

use crate::domain::{
    Amount, AmountStatus, Error, ExpenseContent, LineItem, default_quantity, normalize_amount,
    parse_iso_date,
};

pub(crate) const REQUIRED_FIELDS: [&str; 4] = ["date", "vendor", "total", "items"];

/// Validation error codes for request fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldErrorCode {
    InvalidType,
    InvalidDate,
    InvalidAmount,
    MissingField,
}

impl FieldErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidType => "invalid_type",
            Self::InvalidDate => "invalid_date",
            Self::InvalidAmount => "invalid_amount",
            Self::MissingField => "missing_field",
        }
    }
}

fn field_error(field: impl Into<String>, code: FieldErrorCode, message: impl Into<String>) -> Error {
    let field: String = field.into();
    Error::invalid_request(message)
        .with_detail("field", field)
        .with_detail("code", code.as_str())
}

/// Decode the request body into a JSON object.
///
/// An absent, empty or `{}` body is reported with `missing_message`.
pub(crate) fn body_object(
    body: Option<&Value>,
    missing_message: &str,
) -> Result<Map<String, Value>, Error> {
    let decoded = match body {
        None => return Err(Error::invalid_request(missing_message)),
        Some(Value::String(text)) if text.trim().is_empty() => {
            return Err(Error::invalid_request(missing_message));
        }
        Some(Value::String(text)) => serde_json::from_str::<Value>(text)
            .map_err(|_| Error::invalid_request("Invalid JSON body"))?,
        Some(value) => value.clone(),
    };

    match decoded {
        Value::Object(map) if map.is_empty() => Err(Error::invalid_request(missing_message)),
        Value::Object(map) => Ok(map),
        _ => Err(Error::invalid_request("Invalid JSON body")),
    }
}

/// Messages used when validating expense content.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContentMessages {
    pub missing_fields: &'static str,
    pub missing_date: &'static str,
}

pub(crate) const CREATE_MESSAGES: ContentMessages = ContentMessages {
    missing_fields: "Missing required fields. Required: date, vendor, total, items",
    missing_date: "Date is required in the request body",
};

pub(crate) const UPDATE_MESSAGES: ContentMessages = ContentMessages {
    missing_fields: "Missing required fields for update. Required: date, vendor, total, items",
    missing_date: "Date is required in the request body to update an expense.",
};

/// Validate a create or update body.
///
/// `total` and every item `price` are normalised to canonical amounts;
/// `quantity` defaults to `"1"`.
pub(crate) fn expense_content(
    body: &Map<String, Value>,
    messages: ContentMessages,
) -> Result<ExpenseContent, Error> {
    if !REQUIRED_FIELDS.iter().all(|field| body.contains_key(*field)) {
        let missing: Vec<&str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|field| !body.contains_key(*field))
            .collect();
        return Err(Error::invalid_request(messages.missing_fields).with_detail("missing", missing));
    }

    let date = required_date(body.get("date"), messages.missing_date)?;
    let vendor = match body.get("vendor") {
        Some(Value::String(vendor)) => vendor.trim().to_owned(),
        _ => {
            return Err(field_error(
                "vendor",
                FieldErrorCode::InvalidType,
                "vendor must be a string",
            ));
        }
    };
    let total = amount(body.get("total"), "total")?
        .ok_or_else(|| field_error("total", FieldErrorCode::InvalidAmount, "total is required"))?;
    let items = match body.get("items") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| line_item(index, item))
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(field_error(
                "items",
                FieldErrorCode::InvalidType,
                "items must be an array",
            ));
        }
    };

    Ok(ExpenseContent {
        date,
        vendor,
        total,
        items,
    })
}

/// Date identifying the record to delete; any non-empty string.
pub(crate) fn deletion_date(body: &Map<String, Value>) -> Result<String, Error> {
    match body.get("date") {
        Some(Value::String(date)) if !date.trim().is_empty() => Ok(date.trim().to_owned()),
        _ => Err(Error::invalid_request(
            "Date is required in the request body for deletion",
        )),
    }
}

fn required_date(value: Option<&Value>, missing_message: &str) -> Result<String, Error> {
    let text = match value {
        Some(Value::String(text)) if !text.trim().is_empty() => text.trim(),
        Some(Value::String(_) | Value::Null) | None => {
            return Err(Error::invalid_request(missing_message));
        }
        Some(_) => {
            return Err(field_error(
                "date",
                FieldErrorCode::InvalidType,
                "date must be a string",
            ));
        }
    };
    parse_iso_date(text)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| {
            field_error(
                "date",
                FieldErrorCode::InvalidDate,
                "date must be a YYYY-MM-DD calendar date",
            )
            .with_detail("value", text)
        })
}

// Strings and numbers are accepted; `None` when the value is absent or blank.
fn amount(value: Option<&Value>, field: &str) -> Result<Option<Amount>, Error> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(_) => {
            return Err(field_error(
                field,
                FieldErrorCode::InvalidType,
                format!("{field} must be a string or number"),
            ));
        }
    };
    let normalized = normalize_amount(&raw);
    match normalized.status {
        AmountStatus::Parsed => Ok(Some(normalized.amount)),
        AmountStatus::Empty => Ok(None),
        AmountStatus::Unparseable => Err(field_error(
            field,
            FieldErrorCode::InvalidAmount,
            format!("{field} is not a valid amount"),
        )
        .with_detail("value", raw)),
    }
}

fn line_item(index: usize, item: &Value) -> Result<LineItem, Error> {
    let field = |name: &str| format!("items[{index}].{name}");
    let Value::Object(item) = item else {
        return Err(field_error(
            format!("items[{index}]"),
            FieldErrorCode::InvalidType,
            "each item must be an object",
        ));
    };

    let name = match item.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_owned(),
        _ => {
            return Err(field_error(
                field("name"),
                FieldErrorCode::MissingField,
                "each item needs a name",
            ));
        }
    };
    let price = amount(item.get("price"), &field("price"))?.unwrap_or_default();
    let quantity = match item.get("quantity") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_owned(),
        Some(Value::Number(number)) => number.to_string(),
        None | Some(Value::Null | Value::String(_)) => default_quantity(),
        Some(_) => {
            return Err(field_error(
                field("quantity"),
                FieldErrorCode::InvalidType,
                "quantity must be a string or number",
            ));
        }
    };

    Ok(LineItem {
        name,
        price,
        quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[rstest]
    #[case(None)]
    #[case(Some(json!("")))]
    #[case(Some(json!({})))]
    fn missing_bodies_are_rejected(#[case] body: Option<Value>) {
        let error = body_object(body.as_ref(), "Request body is required").expect_err("missing");
        assert_eq!(error.message(), "Request body is required");
    }

    #[rstest]
    #[case(json!("{not json"))]
    #[case(json!("[1, 2]"))]
    #[case(json!(42))]
    fn non_object_bodies_are_invalid_json(#[case] body: Value) {
        let error = body_object(Some(&body), "Request body is required").expect_err("invalid");
        assert_eq!(error.message(), "Invalid JSON body");
    }

    #[rstest]
    fn text_and_object_bodies_decode_alike() {
        let text = json!(r#"{"date": "2024-03-15"}"#);
        let decoded = json!({"date": "2024-03-15"});
        assert_eq!(
            body_object(Some(&text), "missing").expect("text"),
            body_object(Some(&decoded), "missing").expect("object")
        );
    }

    #[rstest]
    fn content_is_normalised() {
        let body = object(json!({
            "date": "2024-03-15",
            "vendor": " Corner Shop ",
            "total": 12.5,
            "items": [
                {"name": "Bread", "price": "R$ 2,50"},
                {"name": "Milk", "price": 3, "quantity": 2},
            ],
        }));

        let content = expense_content(&body, CREATE_MESSAGES).expect("valid");

        assert_eq!(content.date, "2024-03-15");
        assert_eq!(content.vendor, "Corner Shop");
        assert_eq!(content.total.as_str(), "12.50");
        assert_eq!(content.items[0].price.as_str(), "2.50");
        assert_eq!(content.items[0].quantity, "1");
        assert_eq!(content.items[1].price.as_str(), "3.00");
        assert_eq!(content.items[1].quantity, "2");
    }

    #[rstest]
    fn missing_fields_are_listed() {
        let body = object(json!({"date": "2024-03-15", "vendor": "Shop", "total": "1"}));
        let error = expense_content(&body, CREATE_MESSAGES).expect_err("missing items");

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            error.message(),
            "Missing required fields. Required: date, vendor, total, items"
        );
        assert_eq!(
            error.details().and_then(|details| details.get("missing")),
            Some(&json!(["items"]))
        );
    }

    #[rstest]
    #[case(json!(""), "Date is required in the request body to update an expense.")]
    #[case(json!("15/03/2024"), "date must be a YYYY-MM-DD calendar date")]
    #[case(json!("2024-02-30"), "date must be a YYYY-MM-DD calendar date")]
    #[case(json!(20240315), "date must be a string")]
    fn dates_must_be_calendar_dates(#[case] date: Value, #[case] message: &str) {
        let body = object(json!({"date": date, "vendor": "Shop", "total": "1", "items": []}));
        let error = expense_content(&body, UPDATE_MESSAGES).expect_err("bad date");
        assert_eq!(error.message(), message);
    }

    #[rstest]
    #[case(json!({"date": "2024-03-15", "vendor": "Shop", "total": "abc", "items": []}), "total")]
    #[case(json!({"date": "2024-03-15", "vendor": "Shop", "total": "", "items": []}), "total")]
    #[case(json!({"date": "2024-03-15", "vendor": 5, "total": "1", "items": []}), "vendor")]
    #[case(json!({"date": "2024-03-15", "vendor": "Shop", "total": "1", "items": {}}), "items")]
    #[case(json!({"date": "2024-03-15", "vendor": "Shop", "total": "1", "items": [{"price": "1"}]}), "items[0].name")]
    #[case(json!({"date": "2024-03-15", "vendor": "Shop", "total": "1", "items": [{"name": "A", "price": "x"}]}), "items[0].price")]
    fn invalid_fields_are_named(#[case] body: Value, #[case] field: &str) {
        let error = expense_content(&object(body), CREATE_MESSAGES).expect_err("invalid");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            error.details().and_then(|details| details.get("field")),
            Some(&json!(field))
        );
    }

    #[rstest]
    #[case(json!({"date": "2024-03-15"}), Ok("2024-03-15".to_owned()))]
    #[case(json!({"date": "anything"}), Ok("anything".to_owned()))]
    #[case(json!({"date": ""}), Err(()))]
    #[case(json!({"receipt": "r1"}), Err(()))]
    fn deletion_needs_a_date(#[case] body: Value, #[case] expected: Result<String, ()>) {
        assert_eq!(deletion_date(&object(body)).map_err(|_| ()), expected);
    }
}
