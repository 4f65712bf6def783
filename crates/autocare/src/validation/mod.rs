//! Pure input validators: tax documents, locale-formatted numbers, and request shapes.

pub mod document;
pub mod guard;
pub mod numeric;
pub mod router;

pub use document::{validate_document, DocumentType, DocumentValidation};
pub use guard::{
    validate_boolean, validate_id, validate_number, validate_object, validate_string, FieldError,
    FieldKind, FieldSpec, NumberRules, ObjectSchema, StringRules, ValidationErrors,
};
pub use numeric::{
    format_kilometers, format_monetary, kilometers_from_number, monetary_from_number,
    parse_kilometer_value, parse_monetary_value, ParsedValue,
};
pub use router::validation_router;
