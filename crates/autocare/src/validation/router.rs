use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use super::document::validate_document;
use super::guard::{validate_object, FieldKind, ObjectSchema, StringRules};
use super::numeric::{
    kilometers_from_number, monetary_from_number, parse_kilometer_value, parse_monetary_value,
    ParsedValue,
};
use crate::response::ApiResponse;

/// Stateless endpoints exposing the validators to the web and mobile clients.
pub fn validation_router() -> Router {
    Router::new()
        .route("/api/v1/validate/document", post(document_handler))
        .route("/api/v1/parse/monetary", post(monetary_handler))
        .route("/api/v1/parse/kilometers", post(kilometer_handler))
}

fn text_field(payload: &Value, field: &str) -> Result<String, Response> {
    let schema = ObjectSchema::new().required(
        field,
        FieldKind::String(StringRules {
            max_len: Some(64),
            ..StringRules::default()
        }),
    );
    let clean = validate_object(payload, &schema).map_err(IntoResponse::into_response)?;
    Ok(clean
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

pub(crate) async fn document_handler(Json(payload): Json<Value>) -> Response {
    let document = match text_field(&payload, "document") {
        Ok(document) => document,
        Err(response) => return response,
    };

    let validation = validate_document(&document);
    let status = if validation.is_valid {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    let envelope = ApiResponse {
        success: validation.is_valid,
        error: validation.error.clone(),
        data: Some(validation),
        message: None,
    };
    envelope.into_response_with(status)
}

fn parsed_response(parsed: ParsedValue) -> Response {
    if parsed.success() {
        ApiResponse::ok(parsed).into_response()
    } else {
        let error = parsed.error().unwrap_or("invalid value").to_string();
        ApiResponse {
            success: false,
            data: Some(parsed),
            error: Some(error),
            message: None,
        }
        .into_response_with(StatusCode::BAD_REQUEST)
    }
}

/// Strings go through the locale heuristic; JSON numbers are already unambiguous.
fn parse_value_field(
    payload: &Value,
    from_text: fn(Option<&str>) -> ParsedValue,
    from_number: fn(f64) -> ParsedValue,
) -> ParsedValue {
    match payload.get("value") {
        Some(Value::String(text)) => from_text(Some(text.as_str())),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(value) => from_number(value),
            None => from_text(Some(number.to_string().as_str())),
        },
        _ => from_text(None),
    }
}

pub(crate) async fn monetary_handler(Json(payload): Json<Value>) -> Response {
    parsed_response(parse_value_field(
        &payload,
        parse_monetary_value,
        monetary_from_number,
    ))
}

pub(crate) async fn kilometer_handler(Json(payload): Json<Value>) -> Response {
    parsed_response(parse_value_field(
        &payload,
        parse_kilometer_value,
        kilometers_from_number,
    ))
}
