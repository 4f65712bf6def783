//! Runtime shape checks for untyped JSON request payloads.
//!
//! Every check returns a value or a [`FieldError`]; nothing here panics. Handlers decide
//! whether a failure becomes a 400 ([`ValidationErrors`] renders one) or falls back to a
//! default.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Number, Value};

const MAX_ECHOED_STRING: usize = 64;

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FieldError {
    fn new(field: &str, reason: impl Into<String>, offending: &Value) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
            value: echoable(offending),
        }
    }
}

/// Only short scalars are reflected back to the client.
fn echoable(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) | Value::Number(_) => Some(value.clone()),
        Value::String(s) if s.chars().count() <= MAX_ECHOED_STRING => Some(value.clone()),
        _ => None,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StringRules {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub allow_empty: bool,
    pub trim: bool,
}

impl Default for StringRules {
    fn default() -> Self {
        Self {
            min_len: None,
            max_len: None,
            allow_empty: false,
            trim: true,
        }
    }
}

impl StringRules {
    pub fn bounded(min_len: usize, max_len: usize) -> Self {
        Self {
            min_len: Some(min_len),
            max_len: Some(max_len),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumberRules {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub integer: bool,
}

impl NumberRules {
    pub fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            integer: false,
        }
    }

    pub fn integer() -> Self {
        Self {
            integer: true,
            ..Self::default()
        }
    }
}

pub fn validate_string(value: &Value, field: &str, rules: &StringRules) -> Result<String, FieldError> {
    let Value::String(raw) = value else {
        return Err(FieldError::new(
            field,
            format!("expected string, got {}", kind_name(value)),
            value,
        ));
    };

    let text = if rules.trim { raw.trim() } else { raw.as_str() };
    let len = text.chars().count();

    if len == 0 {
        if rules.allow_empty {
            return Ok(String::new());
        }
        return Err(FieldError::new(field, "must not be empty", value));
    }
    if let Some(min) = rules.min_len {
        if len < min {
            return Err(FieldError::new(
                field,
                format!("must be at least {min} characters"),
                value,
            ));
        }
    }
    if let Some(max) = rules.max_len {
        if len > max {
            return Err(FieldError::new(
                field,
                format!("must be at most {max} characters"),
                value,
            ));
        }
    }

    Ok(text.to_string())
}

pub fn validate_number(value: &Value, field: &str, rules: &NumberRules) -> Result<f64, FieldError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    let Some(number) = number.filter(|n| n.is_finite()) else {
        return Err(FieldError::new(
            field,
            format!("expected number, got {}", kind_name(value)),
            value,
        ));
    };

    if rules.integer && number.fract() != 0.0 {
        return Err(FieldError::new(field, "must be an integer", value));
    }
    if let Some(min) = rules.min {
        if number < min {
            return Err(FieldError::new(field, format!("must be >= {min}"), value));
        }
    }
    if let Some(max) = rules.max {
        if number > max {
            return Err(FieldError::new(field, format!("must be <= {max}"), value));
        }
    }

    Ok(number)
}

pub fn validate_boolean(value: &Value, field: &str) -> Result<bool, FieldError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(FieldError::new(
            field,
            format!("expected boolean, got {}", kind_name(value)),
            value,
        )),
    }
}

/// Positive integer identifiers, as numbers or numeric strings.
pub fn validate_id(value: &Value, field: &str) -> Result<u64, FieldError> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(FieldError::new(field, "must be a positive integer id", value)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String(StringRules),
    Number(NumberRules),
    Boolean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub required: bool,
}

/// Ordered field → expectation mapping consumed by [`validate_object`].
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldSpec)>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, field: &str, kind: FieldKind) -> Self {
        self.fields.push((
            field.to_string(),
            FieldSpec {
                kind,
                required: true,
            },
        ));
        self
    }

    pub fn optional(mut self, field: &str, kind: FieldKind) -> Self {
        self.fields.push((
            field.to_string(),
            FieldSpec {
                kind,
                required: false,
            },
        ));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }
}

fn validate_field(value: &Value, field: &str, kind: &FieldKind) -> Result<Value, FieldError> {
    match kind {
        FieldKind::String(rules) => validate_string(value, field, rules).map(Value::String),
        FieldKind::Number(rules) => {
            let number = validate_number(value, field, rules)?;
            // `i64::MAX as f64` rounds up to 2^63, hence the strict upper bound.
            let coerced = if rules.integer {
                (number >= i64::MIN as f64 && number < i64::MAX as f64)
                    .then(|| json!(number as i64))
            } else {
                Number::from_f64(number).map(Value::Number)
            };
            coerced.ok_or_else(|| FieldError::new(field, "number is not representable", value))
        }
        FieldKind::Boolean => validate_boolean(value, field).map(Value::Bool),
    }
}

/// Validate every field in `schema`, collecting all failures before returning.
///
/// Fields absent from the payload (or `null`) are only errors when required. On success the
/// returned map holds the coerced values for the fields that were present.
pub fn validate_object(
    value: &Value,
    schema: &ObjectSchema,
) -> Result<Map<String, Value>, ValidationErrors> {
    let Value::Object(object) = value else {
        return Err(ValidationErrors(vec![FieldError::new(
            "body",
            format!("expected object, got {}", kind_name(value)),
            value,
        )]));
    };

    let mut coerced = Map::new();
    let mut errors = Vec::new();

    for (field, spec) in schema.fields() {
        match object.get(field) {
            None | Some(Value::Null) => {
                if spec.required {
                    errors.push(FieldError {
                        field: field.to_string(),
                        reason: "is required".to_string(),
                        value: None,
                    });
                }
            }
            Some(raw) => match validate_field(raw, field, &spec.kind) {
                Ok(clean) => {
                    coerced.insert(field.to_string(), clean);
                }
                Err(error) => errors.push(error),
            },
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Collected field failures; renders as a 400 in the response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|error| format!("{} {}", error.field, error.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: {}", self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": "validation failed",
            "message": self.summary(),
            "details": self.0,
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
