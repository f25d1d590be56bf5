use inkwire_wrike::TaskTracker;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::request_fields::{deserialize_text, require_task_id, resolve_api_task_id};
use crate::review_error::ReviewError;

const STATUS_ID_MIN_CHARS: usize = 8;
const STATUS_ID_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub custom_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdateOutcome {
    pub task_id: String,
    pub custom_status: String,
    pub data: Value,
}

/// Accepts 8 to 20 ASCII letters or digits.
pub fn validate_status_id(raw: Option<&str>) -> Result<String, ReviewError> {
    let status = raw.map(str::trim).unwrap_or("");
    if status.is_empty() {
        return Err(ReviewError::invalid("Status ID is required"));
    }
    let well_formed = (STATUS_ID_MIN_CHARS..=STATUS_ID_MAX_CHARS).contains(&status.len())
        && status.bytes().all(|byte| byte.is_ascii_alphanumeric());
    if !well_formed {
        return Err(ReviewError::invalid(
            "Status ID must be 8-20 alphanumeric characters",
        ));
    }
    Ok(status.to_string())
}

pub async fn update_status(
    tracker: &dyn TaskTracker,
    request: &StatusUpdateRequest,
) -> Result<StatusUpdateOutcome, ReviewError> {
    let raw_task_id = require_task_id(request.task_id.as_deref())?;
    let custom_status = validate_status_id(request.custom_status.as_deref())?;
    let task_id = resolve_api_task_id(tracker, raw_task_id).await?;
    let data = tracker.update_task_status(&task_id, &custom_status).await?;
    info!(task_id = %task_id, custom_status = %custom_status, "task status updated");
    Ok(StatusUpdateOutcome {
        task_id,
        custom_status,
        data,
    })
}
