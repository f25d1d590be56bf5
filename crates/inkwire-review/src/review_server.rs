use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use inkwire_dotcms::{CanonicalContent, ContentSystem};
use inkwire_webhook_runtime::{AckResponder, FieldMap};
use inkwire_wrike::TaskTracker;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::pdf_renderer::PdfRenderer;
use crate::reverse_sync::{sync_to_task, ReverseSyncRequest, SyncMode, NO_FIELDS_ERROR, NO_FIELDS_HINT};
use crate::review_error::ReviewError;
use crate::send_for_review::{send_for_review, SendForReviewRequest};
use crate::status_update::{update_status, StatusUpdateRequest};

pub const REVIEW_SENT_MESSAGE: &str =
    "PDF generated, uploaded as attachment, and comment added to Wrike task.";
pub const REVIEW_FAILED_MESSAGE: &str =
    "An error occurred while generating the PDF or sending it to Wrike.";
pub const REVERSE_SYNC_FAILED_MESSAGE: &str = "Failed to update Wrike ticket";

pub struct ReviewServerState {
    pub tracker: Arc<dyn TaskTracker>,
    pub content_system: Arc<dyn ContentSystem>,
    pub renderer: Arc<dyn PdfRenderer>,
    pub field_map: FieldMap,
}

pub fn build_review_router(state: Arc<ReviewServerState>) -> Router {
    Router::new()
        .route("/wrike/send-for-review", post(handle_send_for_review))
        .route("/wrike/update-status", post(handle_update_status))
        .route("/wrike/dotcms-to-wrike-update", post(handle_reverse_sync))
        .route("/dotcms/insight", post(handle_insight))
        .with_state(state)
}

fn rejection_response(rejection: JsonRejection, body: impl FnOnce(String) -> Value) -> Response {
    warn!(error = %rejection, "rejecting malformed request body");
    (StatusCode::BAD_REQUEST, Json(body(rejection.body_text()))).into_response()
}

async fn handle_send_for_review(
    State(state): State<Arc<ReviewServerState>>,
    payload: Result<Json<SendForReviewRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return rejection_response(rejection, |message| json!({"message": message}));
        }
    };
    let acks = AckResponder::new(state.tracker.clone());
    match send_for_review(
        state.tracker.as_ref(),
        state.renderer.as_ref(),
        &acks,
        &request,
    )
    .await
    {
        Ok(delivery) => {
            info!(
                task_id = %delivery.task_id,
                attachment_id = %delivery.attachment_id,
                file_name = %delivery.file_name,
                comment_posted = delivery.comment_posted,
                "review pdf delivered"
            );
            (StatusCode::OK, Json(json!({"message": REVIEW_SENT_MESSAGE}))).into_response()
        }
        Err(ReviewError::InvalidRequest(message)) => {
            (StatusCode::BAD_REQUEST, Json(json!({"message": message}))).into_response()
        }
        Err(review_error) => {
            error!(error = %review_error, "send for review failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": REVIEW_FAILED_MESSAGE})),
            )
                .into_response()
        }
    }
}

async fn handle_update_status(
    State(state): State<Arc<ReviewServerState>>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return rejection_response(rejection, |message| {
                json!({"message": message, "details": Value::Null})
            });
        }
    };
    match update_status(state.tracker.as_ref(), &request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "id": outcome.task_id,
                "customStatus": outcome.custom_status,
                "data": outcome.data,
            })),
        )
            .into_response(),
        Err(review_error) => {
            warn!(error = %review_error, "task status update failed");
            (
                review_error.status(),
                Json(json!({
                    "message": review_error.to_string(),
                    "details": review_error.details(),
                })),
            )
                .into_response()
        }
    }
}

async fn handle_reverse_sync(
    State(state): State<Arc<ReviewServerState>>,
    payload: Result<Json<ReverseSyncRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return rejection_response(rejection, |message| {
                json!({"ok": false, "message": REVERSE_SYNC_FAILED_MESSAGE, "error": message})
            });
        }
    };
    match sync_to_task(state.tracker.as_ref(), &state.field_map, &request).await {
        Ok(outcome) => {
            let mut body = json!({
                "ok": true,
                "mode": outcome.mode,
                "taskId": outcome.task_id,
                "updated": outcome.updated,
            });
            if outcome.mode == SyncMode::Simple {
                body["field"] = json!(state.field_map.creation_locked);
                body["value"] = json!("yes");
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(ReviewError::InvalidRequest(message)) if message == NO_FIELDS_ERROR => (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error": message, "hint": NO_FIELDS_HINT})),
        )
            .into_response(),
        Err(review_error) => {
            warn!(error = %review_error, "reverse sync failed");
            (
                review_error.status(),
                Json(json!({
                    "ok": false,
                    "message": REVERSE_SYNC_FAILED_MESSAGE,
                    "error": review_error.to_string(),
                    "details": review_error.details(),
                })),
            )
                .into_response()
        }
    }
}

async fn handle_insight(
    State(state): State<Arc<ReviewServerState>>,
    payload: Result<Json<CanonicalContent>, JsonRejection>,
) -> Response {
    let Json(content) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return rejection_response(rejection, |message| json!({"ok": false, "error": message}));
        }
    };
    let content = content.normalized();
    match state.content_system.create_content(&content).await {
        Ok(created) => {
            info!(identifier = %created.identifier, "direct content create succeeded");
            (
                StatusCode::OK,
                Json(json!({
                    "ok": true,
                    "identifier": created.identifier,
                    "fired": created.fired,
                })),
            )
                .into_response()
        }
        Err(create_error) => {
            let review_error = ReviewError::from(create_error);
            warn!(error = %review_error, "direct content create failed");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "ok": false,
                    "error": review_error.to_string(),
                    "details": review_error.details(),
                })),
            )
                .into_response()
        }
    }
}
