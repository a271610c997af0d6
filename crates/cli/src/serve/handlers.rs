//! Route handlers: entity creation, approval actions, role-scoped listings
//! and the notification inbox.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use lodgeflow_core::{Action, Actor, EntityKind, Payload, TransitionOutcome, WorkflowError};
use lodgeflow_engine::EngineError;
use lodgeflow_storage::StorageError;
use serde::Deserialize;
use uuid::Uuid;

use super::json_error;
use super::state::AppState;

/// Default notification page size.
const DEFAULT_INBOX_LIMIT: usize = 50;

/// URL collection segment to entity kind.
fn collection_kind(collection: &str) -> Option<EntityKind> {
    match collection {
        "requests" => Some(EntityKind::Request),
        "attendance" => Some(EntityKind::AttendanceExternal),
        "procurements" => Some(EntityKind::Procurement),
        "schedules" => Some(EntityKind::MonthlySchedule),
        _ => None,
    }
}

/// Map an engine failure to its HTTP status per the error taxonomy:
/// validation and stage errors are the caller's fault (400), scoping
/// violations are 403, missing records 404, backend failures 500.
fn engine_error(err: EngineError) -> Response {
    let status = match &err {
        EngineError::Workflow(w) => match w {
            WorkflowError::DepartmentMismatch { .. } | WorkflowError::Unauthorized { .. } => {
                StatusCode::FORBIDDEN
            }
            WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        },
        EngineError::Storage(s) => match s {
            StorageError::EntityNotFound { .. }
            | StorageError::UserNotFound { .. }
            | StorageError::NotificationNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };
    json_error(status, &err.to_string()).into_response()
}

fn outcome_token(outcome: TransitionOutcome) -> &'static str {
    match outcome {
        TransitionOutcome::Advanced { .. } => "ADVANCED",
        TransitionOutcome::FullyApproved => "APPROVED",
        TransitionOutcome::Rejected => "REJECTED",
        TransitionOutcome::Fulfilled => "COMPLETED",
    }
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "service": "lodgeflow",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// POST /{collection}
///
/// Body is the kind-specific payload; the collection segment supplies the
/// kind tag, so clients never send one.
pub(crate) async fn handle_create(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Extension(actor): Extension<Actor>,
    Json(mut body): Json<serde_json::Value>,
) -> Response {
    let Some(kind) = collection_kind(&collection) else {
        return json_error(StatusCode::NOT_FOUND, "not found").into_response();
    };

    if let Some(object) = body.as_object_mut() {
        object.insert(
            "kind".to_string(),
            serde_json::Value::String(kind.to_string()),
        );
    }
    let payload: Payload = match serde_json::from_value(body) {
        Ok(p) => p,
        Err(e) => {
            return json_error(StatusCode::BAD_REQUEST, &format!("malformed payload: {e}"))
                .into_response()
        }
    };

    match state.engine.create(&actor, payload).await {
        Ok(entity) => (StatusCode::CREATED, Json(entity)).into_response(),
        Err(err) => engine_error(err),
    }
}

/// GET /{collection}/pending
pub(crate) async fn handle_pending(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Response {
    let Some(kind) = collection_kind(&collection) else {
        return json_error(StatusCode::NOT_FOUND, "not found").into_response();
    };
    match state.engine.pending(kind, &actor).await {
        Ok(entities) => (StatusCode::OK, Json(entities)).into_response(),
        Err(err) => engine_error(err),
    }
}

/// GET /{collection}/history
pub(crate) async fn handle_history(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Response {
    let Some(kind) = collection_kind(&collection) else {
        return json_error(StatusCode::NOT_FOUND, "not found").into_response();
    };
    match state.engine.history(kind, &actor).await {
        Ok(entities) => (StatusCode::OK, Json(entities)).into_response(),
        Err(err) => engine_error(err),
    }
}

/// GET /{collection}/mine
pub(crate) async fn handle_mine(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Response {
    let Some(kind) = collection_kind(&collection) else {
        return json_error(StatusCode::NOT_FOUND, "not found").into_response();
    };
    match state.engine.mine(kind, &actor).await {
        Ok(entities) => (StatusCode::OK, Json(entities)).into_response(),
        Err(err) => engine_error(err),
    }
}

#[derive(Deserialize)]
pub(crate) struct ApprovalBody {
    action: Action,
    #[serde(default)]
    reason: Option<String>,
}

/// PUT /{collection}/{id}/approval and PUT /attendance/{id}/status
pub(crate) async fn handle_approval(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, Uuid)>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<ApprovalBody>,
) -> Response {
    let Some(kind) = collection_kind(&collection) else {
        return json_error(StatusCode::NOT_FOUND, "not found").into_response();
    };

    // An id under the wrong collection is as missing as an unknown one.
    match state.engine.get(id).await {
        Ok(entity) if entity.kind() != kind => {
            return json_error(StatusCode::NOT_FOUND, &format!("entity not found: {id}"))
                .into_response()
        }
        Ok(_) => {}
        Err(err) => return engine_error(err),
    }

    match state
        .engine
        .transition(&actor, id, body.action, body.reason.as_deref())
        .await
    {
        Ok(transition) => {
            let response = serde_json::json!({
                "outcome": outcome_token(transition.outcome),
                "entity": transition.entity,
            });
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => engine_error(err),
    }
}

/// PUT /attendance/{id}/status -- legacy route shape; same semantics as
/// the approval endpoint.
pub(crate) async fn handle_attendance_status(
    state: State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Extension<Actor>,
    body: Json<ApprovalBody>,
) -> Response {
    handle_approval(state, Path(("attendance".to_string(), id)), actor, body).await
}

#[derive(Deserialize)]
pub(crate) struct InboxQuery {
    limit: Option<usize>,
}

/// GET /notifications
pub(crate) async fn handle_notifications(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<InboxQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_INBOX_LIMIT);
    match state.engine.notifications(&actor.id, limit).await {
        Ok(inbox) => (StatusCode::OK, Json(inbox)).into_response(),
        Err(err) => engine_error(err),
    }
}

/// PUT /notifications/{id}/read
pub(crate) async fn handle_notification_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.engine.mark_notification_read(id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"read": true}))).into_response(),
        Err(err) => engine_error(err),
    }
}

/// PUT /notifications/read-all
pub(crate) async fn handle_notifications_read_all(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Response {
    match state.engine.mark_all_notifications_read(&actor.id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"read": true}))).into_response(),
        Err(err) => engine_error(err),
    }
}
