use inkwire_wrike::{is_permalink_id, TaskTracker};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::review_error::ReviewError;

/// Reads an optional request field that callers send as a string, number or boolean.
pub(crate) fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| value_text(&value)))
}

pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) fn require_task_id(task_id: Option<&str>) -> Result<&str, ReviewError> {
    task_id
        .map(str::trim)
        .filter(|task_id| !task_id.is_empty())
        .ok_or_else(|| ReviewError::invalid("taskId is required"))
}

/// Numeric permalink ids are looked up; anything else is already an API task id.
pub async fn resolve_api_task_id(
    tracker: &dyn TaskTracker,
    task_id: &str,
) -> Result<String, ReviewError> {
    let trimmed = task_id.trim();
    if is_permalink_id(trimmed) {
        return Ok(tracker.resolve_task_id(trimmed).await?);
    }
    Ok(trimmed.to_string())
}
