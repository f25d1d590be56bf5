use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::event_dispatcher::{CountersSnapshot, EventDispatcher};
use crate::signature::{handshake_response, is_handshake, verify_signature, HOOK_SECRET_HEADER};
use crate::webhook_event::split_event_batch;

pub struct WebhookServerState {
    pub secret: String,
    pub dispatcher: Arc<EventDispatcher>,
}

pub fn build_webhook_router(state: Arc<WebhookServerState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/healthz", get(handle_health))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    #[serde(flatten)]
    counters: CountersSnapshot,
}

async fn handle_health(State(state): State<Arc<WebhookServerState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthReport {
            status: "ok",
            counters: state.dispatcher.counters(),
        }),
    )
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"error": {"code": code, "message": message}})),
    )
        .into_response()
}

/// Handshake requests are answered without authentication: any body carrying
/// the verification marker gets the HMAC of its `X-Hook-Secret` value back.
/// Wrike's registration flow requires this, so the endpoint acts as a signing
/// oracle for arbitrary header values while it is reachable.
async fn handle_webhook(
    State(state): State<Arc<WebhookServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let hook_secret = headers
        .get(HOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim);

    if is_handshake(&body) {
        return match handshake_response(&state.secret, hook_secret.unwrap_or("")) {
            Ok(response_secret) => {
                info!("answered webhook secret verification handshake");
                (StatusCode::OK, [(HOOK_SECRET_HEADER, response_secret)]).into_response()
            }
            Err(error) => {
                warn!(error = %error, "webhook handshake failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "handshake_failed",
                    "Handshake failed",
                )
            }
        };
    }

    if let Err(error) = verify_signature(&body, hook_secret, &state.secret) {
        warn!(error = %error, "rejecting unsigned or mis-signed webhook");
        return error_response(
            StatusCode::UNAUTHORIZED,
            "invalid_signature",
            "Invalid signature",
        );
    }

    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Array(Vec::new())
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, "webhook body is not valid json");
                return error_response(StatusCode::BAD_REQUEST, "parse_failed", "Bad JSON");
            }
        }
    };
    let events = split_event_batch(payload);
    let accepted = state.dispatcher.dispatch_batch(events);
    debug!(events = accepted, "webhook batch accepted");
    (
        StatusCode::OK,
        Json(json!({"status": "accepted", "events": accepted})),
    )
        .into_response()
}
