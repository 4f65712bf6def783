use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::dispatcher::{DispatchOutcome, NotificationDispatcher};
use super::domain::{
    NewNotification, Notification, NotificationId, NotificationType, Priority, PreferencesUpdate,
    UserId,
};
use super::repository::{NotificationStore, StoreError};
use crate::response::ApiResponse;
use crate::validation::guard::{
    validate_boolean, validate_id, validate_object, FieldError, FieldKind, NumberRules,
    ObjectSchema, StringRules, ValidationErrors,
};

/// Router exposing notification listing, creation, read-marking, and preferences.
pub fn notification_router<S>(dispatcher: Arc<NotificationDispatcher<S>>) -> Router
where
    S: NotificationStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:user_id/notifications",
            get(list_handler::<S>),
        )
        .route(
            "/api/v1/users/:user_id/notifications/read-all",
            patch(mark_all_read_handler::<S>),
        )
        .route(
            "/api/v1/users/:user_id/notification-preferences",
            get(preferences_handler::<S>).put(update_preferences_handler::<S>),
        )
        .route("/api/v1/notifications", post(create_handler::<S>))
        .route(
            "/api/v1/notifications/:notification_id/read",
            patch(mark_read_handler::<S>),
        )
        .route(
            "/api/v1/notifications/maintenance",
            post(maintenance_handler::<S>),
        )
        .with_state(dispatcher)
}

fn store_error_response(error: StoreError) -> Response {
    match error {
        StoreError::NotFound => {
            ApiResponse::<()>::failure("notification not found").into_response_with(StatusCode::NOT_FOUND)
        }
        StoreError::Unavailable(_) => ApiResponse::<()>::failure(error.to_string())
            .into_response_with(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

fn user_id_from_path(raw: &str) -> Result<UserId, Response> {
    validate_id(&Value::String(raw.to_string()), "userId")
        .map(UserId)
        .map_err(|error| ValidationErrors(vec![error]).into_response())
}

pub(crate) async fn list_handler<S>(
    State(dispatcher): State<Arc<NotificationDispatcher<S>>>,
    Path(user_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response
where
    S: NotificationStore + 'static,
{
    let user_id = match user_id_from_path(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let unread_only = match params.get("unread") {
        Some(raw) => match validate_boolean(&Value::String(raw.clone()), "unread") {
            Ok(flag) => flag,
            Err(error) => return ValidationErrors(vec![error]).into_response(),
        },
        None => false,
    };

    match dispatcher.list_for_user(user_id, unread_only) {
        Ok(notifications) => ApiResponse::ok(notifications).into_response(),
        Err(error) => store_error_response(error),
    }
}

fn creation_schema() -> ObjectSchema {
    ObjectSchema::new()
        .required(
            "userId",
            FieldKind::Number(NumberRules {
                min: Some(1.0),
                max: None,
                integer: true,
            }),
        )
        .required("type", FieldKind::String(StringRules::bounded(1, 40)))
        .required("title", FieldKind::String(StringRules::bounded(1, 120)))
        .required("message", FieldKind::String(StringRules::bounded(1, 1000)))
        .optional("priority", FieldKind::String(StringRules::bounded(1, 10)))
        .optional("actionUrl", FieldKind::String(StringRules::bounded(1, 500)))
        .optional("expiresAt", FieldKind::String(StringRules::bounded(1, 40)))
}

fn field_error(field: &str, reason: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        reason: reason.to_string(),
        value: None,
    }
}

/// Checks the raw payload and turns it into a creation request, reporting every bad field.
pub(crate) fn parse_new_notification(payload: &Value) -> Result<NewNotification, ValidationErrors> {
    let clean = validate_object(payload, &creation_schema())?;
    let text = |field: &str| clean.get(field).and_then(Value::as_str);
    let mut errors = Vec::new();

    let user_id = clean.get("userId").and_then(Value::as_u64).map(UserId);
    if user_id.is_none() {
        errors.push(field_error("userId", "must be a positive integer id"));
    }
    let kind = text("type").and_then(NotificationType::parse);
    if kind.is_none() {
        errors.push(field_error("type", "is not a known notification type"));
    }

    let priority = match text("priority") {
        Some(raw) => {
            let parsed = Priority::parse(raw);
            if parsed.is_none() {
                errors.push(field_error("priority", "must be one of low, medium, high"));
            }
            parsed
        }
        None => None,
    };

    let expires_at = match text("expiresAt") {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(_) => {
                errors.push(field_error("expiresAt", "must be an RFC 3339 timestamp"));
                None
            }
        },
        None => None,
    };

    let data = match payload.get("data") {
        None | Some(Value::Null) => Value::Null,
        Some(object @ Value::Object(_)) => object.clone(),
        Some(_) => {
            errors.push(field_error("data", "must be an object"));
            Value::Null
        }
    };

    match (user_id, kind) {
        (Some(user_id), Some(kind)) if errors.is_empty() => Ok(NewNotification {
            user_id,
            kind,
            title: text("title").unwrap_or_default().to_string(),
            message: text("message").unwrap_or_default().to_string(),
            priority,
            data,
            action_url: text("actionUrl").map(str::to_string),
            expires_at,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

pub(crate) async fn create_handler<S>(
    State(dispatcher): State<Arc<NotificationDispatcher<S>>>,
    Json(payload): Json<Value>,
) -> Response
where
    S: NotificationStore + 'static,
{
    let request = match parse_new_notification(&payload) {
        Ok(request) => request,
        Err(errors) => return errors.into_response(),
    };

    match dispatcher.create_notification(request) {
        DispatchOutcome::Created(notification) => ApiResponse::ok(notification)
            .with_message("notification created")
            .into_response_with(StatusCode::CREATED),
        DispatchOutcome::Suppressed(kind) => ApiResponse::<Notification> {
            success: true,
            data: None,
            error: None,
            message: Some(format!(
                "{} notifications are disabled for this user",
                kind.as_str()
            )),
        }
        .into_response(),
        DispatchOutcome::Failed(reason) => {
            ApiResponse::<()>::failure(reason).into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub(crate) async fn mark_read_handler<S>(
    State(dispatcher): State<Arc<NotificationDispatcher<S>>>,
    Path(notification_id): Path<String>,
) -> Response
where
    S: NotificationStore + 'static,
{
    let Some(id) = NotificationId::parse(&notification_id) else {
        return ValidationErrors(vec![field_error("notificationId", "must be a UUID")])
            .into_response();
    };

    match dispatcher.mark_read(&id) {
        Ok(notification) => ApiResponse::ok(notification).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub(crate) async fn mark_all_read_handler<S>(
    State(dispatcher): State<Arc<NotificationDispatcher<S>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: NotificationStore + 'static,
{
    let user_id = match user_id_from_path(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match dispatcher.mark_all_read(user_id) {
        Ok(updated) => ApiResponse::ok(json!({ "updated": updated })).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub(crate) async fn preferences_handler<S>(
    State(dispatcher): State<Arc<NotificationDispatcher<S>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: NotificationStore + 'static,
{
    let user_id = match user_id_from_path(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match dispatcher.preferences(user_id) {
        Ok(preferences) => ApiResponse::ok(preferences).into_response(),
        Err(error) => store_error_response(error),
    }
}

fn preferences_schema() -> ObjectSchema {
    ["maintenance", "inspection", "payment", "promotional", "system", "emergency"]
        .into_iter()
        .fold(ObjectSchema::new(), |schema, field| {
            schema.optional(field, FieldKind::Boolean)
        })
}

pub(crate) async fn update_preferences_handler<S>(
    State(dispatcher): State<Arc<NotificationDispatcher<S>>>,
    Path(user_id): Path<String>,
    Json(payload): Json<Value>,
) -> Response
where
    S: NotificationStore + 'static,
{
    let user_id = match user_id_from_path(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let clean = match validate_object(&payload, &preferences_schema()) {
        Ok(clean) => clean,
        Err(errors) => return errors.into_response(),
    };

    let flag = |field: &str| clean.get(field).and_then(Value::as_bool);
    let update = PreferencesUpdate {
        maintenance: flag("maintenance"),
        inspection: flag("inspection"),
        payment: flag("payment"),
        promotional: flag("promotional"),
        system: flag("system"),
        emergency: flag("emergency"),
    };

    match dispatcher.update_preferences(user_id, &update) {
        Ok(preferences) => ApiResponse::ok(preferences).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub(crate) async fn maintenance_handler<S>(
    State(dispatcher): State<Arc<NotificationDispatcher<S>>>,
) -> Response
where
    S: NotificationStore + 'static,
{
    ApiResponse::ok(dispatcher.run_maintenance()).into_response()
}
