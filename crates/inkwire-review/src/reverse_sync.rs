//! Pushes CMS-side edits back onto the originating task.
//!
//! A body carrying only `taskId` locks the task against further creates.
//! Any other key switches to a full update of the mapped custom fields and,
//! when provided, the task description.

use inkwire_core::{encode_yes_no, format_dd_mm_yyyy, normalize_yes_no};
use inkwire_webhook_runtime::FieldMap;
use inkwire_wrike::{CustomFieldUpdate, TaskTracker, TaskUpdate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::request_fields::{deserialize_text, require_task_id, resolve_api_task_id, value_text};
use crate::review_error::ReviewError;
use crate::rich_text::render_story_block;

pub const NO_FIELDS_ERROR: &str = "No valid fields provided for update";
pub const NO_FIELDS_HINT: &str = "Provide at least one custom field (summary, metaTitle, content, mediaType, dateOfPublication, etc.) or storyBlock/contentHtml for description. Or send only {taskId} to set allowUpdateOnly=yes.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseSyncRequest {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub story_block: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub content_html: Option<String>,
    #[serde(default, rename = "titleCF", deserialize_with = "deserialize_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub date_of_publication: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub media_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub meta_title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub allow_update_only: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReverseSyncRequest {
    fn is_simple(&self) -> bool {
        self.story_block.is_none()
            && self.content_html.is_none()
            && self.title.is_none()
            && self.summary.is_none()
            && self.date_of_publication.is_none()
            && self.content.is_none()
            && self.media_type.is_none()
            && self.meta_description.is_none()
            && self.meta_title.is_none()
            && self.identifier.is_none()
            && self.allow_update_only.is_none()
            && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Simple,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReverseSyncOutcome {
    pub mode: SyncMode,
    pub task_id: String,
    pub update: TaskUpdate,
    pub updated: Value,
}

pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds the task update a request asks for, without touching the network.
pub fn plan_task_update(
    request: &ReverseSyncRequest,
    field_map: &FieldMap,
) -> Result<(SyncMode, TaskUpdate), ReviewError> {
    if request.is_simple() {
        return Ok((
            SyncMode::Simple,
            TaskUpdate::custom_fields(vec![CustomFieldUpdate::new(
                field_map.creation_locked.as_str(),
                encode_yes_no(true),
            )]),
        ));
    }

    let mut fields = Vec::new();
    let mut add = |id: &str, value: Option<String>| {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            fields.push(CustomFieldUpdate::new(id, value));
        }
    };
    add(field_map.title.as_str(), request.title.clone());
    add(field_map.summary.as_str(), request.summary.clone());
    add(
        field_map.date_of_publication.as_str(),
        request
            .date_of_publication
            .as_deref()
            .filter(|date| !date.trim().is_empty())
            .map(format_dd_mm_yyyy),
    );
    add(field_map.content.as_str(), request.content.clone());
    add(
        field_map.media_type.as_str(),
        request
            .media_type
            .as_deref()
            .map(|media| capitalize_first(media.trim())),
    );
    add(field_map.meta_description.as_str(), request.meta_description.clone());
    add(field_map.meta_title.as_str(), request.meta_title.clone());
    add(field_map.identifier.as_str(), request.identifier.clone());
    add(
        field_map.creation_locked.as_str(),
        request
            .allow_update_only
            .as_ref()
            .and_then(value_text)
            .and_then(|flag| normalize_yes_no(&flag))
            .map(ToOwned::to_owned),
    );

    let description = match (&request.content_html, &request.story_block) {
        (Some(html), _) if !html.is_empty() => Some(html.clone()),
        (_, Some(story_block)) if !story_block.is_null() => match render_story_block(story_block) {
            Ok(html) if !html.is_empty() => Some(html),
            Ok(_) => None,
            Err(error) => {
                warn!(error = %error, "story block could not be rendered");
                None
            }
        },
        _ => None,
    };

    let update = TaskUpdate {
        custom_fields: fields,
        description,
    };
    if update.is_empty() {
        return Err(ReviewError::invalid(NO_FIELDS_ERROR));
    }
    Ok((SyncMode::Full, update))
}

pub async fn sync_to_task(
    tracker: &dyn TaskTracker,
    field_map: &FieldMap,
    request: &ReverseSyncRequest,
) -> Result<ReverseSyncOutcome, ReviewError> {
    let raw_task_id = require_task_id(request.task_id.as_deref())?;
    let (mode, update) = plan_task_update(request, field_map)?;
    let task_id = resolve_api_task_id(tracker, raw_task_id).await?;
    let response = tracker.update_task(&task_id, &update).await?;
    info!(
        task_id = %task_id,
        mode = ?mode,
        fields = update.custom_fields.len(),
        description = update.description.is_some(),
        "task updated from content system"
    );
    Ok(ReverseSyncOutcome {
        mode,
        task_id,
        update,
        updated: response.pointer("/data/0").cloned().unwrap_or(Value::Null),
    })
}
