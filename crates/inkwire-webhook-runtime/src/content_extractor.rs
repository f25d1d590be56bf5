use std::sync::Arc;
use std::time::Duration;

use inkwire_core::decode_yes_no;
use inkwire_dotcms::{CanonicalContent, DEFAULT_MEDIA_TYPE};
use inkwire_wrike::{extract_permalink_task_id, TaskTracker, WrikeTask};
use thiserror::Error;
use tracing::debug;

use crate::field_map::FieldMap;

pub const DEFAULT_FETCH_ATTEMPTS: usize = 3;
pub const DEFAULT_FETCH_DELAY_MS: u64 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRetryPolicy {
    pub attempts: usize,
    pub delay_ms: u64,
}

impl Default for FetchRetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_FETCH_ATTEMPTS,
            delay_ms: DEFAULT_FETCH_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to fetch task {task_id} after {attempts} attempt(s): {message}")]
pub struct ExtractionError {
    pub task_id: String,
    pub attempts: usize,
    pub message: String,
}

/// Reads the mapped custom fields of a task into [`CanonicalContent`].
#[derive(Clone)]
pub struct ContentExtractor {
    tracker: Arc<dyn TaskTracker>,
    field_map: FieldMap,
    retry: FetchRetryPolicy,
}

impl ContentExtractor {
    pub fn new(tracker: Arc<dyn TaskTracker>, field_map: FieldMap, retry: FetchRetryPolicy) -> Self {
        Self {
            tracker,
            field_map,
            retry: FetchRetryPolicy {
                attempts: retry.attempts.max(1),
                delay_ms: retry.delay_ms,
            },
        }
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    /// Fetches the task with a fixed delay between attempts; the first
    /// success wins and exhaustion reports the last error.
    pub async fn fetch_task(&self, task_id: &str) -> Result<WrikeTask, ExtractionError> {
        let mut last_error = String::new();
        for attempt in 1..=self.retry.attempts {
            match self.tracker.get_task(task_id).await {
                Ok(task) => return Ok(task),
                Err(error) => {
                    debug!(task_id, attempt, error = %error, "task fetch attempt failed");
                    last_error = error.to_string();
                }
            }
            if attempt < self.retry.attempts {
                tokio::time::sleep(Duration::from_millis(self.retry.delay_ms)).await;
            }
        }
        Err(ExtractionError {
            task_id: task_id.to_string(),
            attempts: self.retry.attempts,
            message: last_error,
        })
    }

    pub async fn extract(&self, task_id: &str) -> Result<CanonicalContent, ExtractionError> {
        let task = self.fetch_task(task_id).await?;
        Ok(self.content_from_task(&task))
    }

    pub fn content_from_task(&self, task: &WrikeTask) -> CanonicalContent {
        let map = &self.field_map;
        let read = |field_id: &str| {
            task.custom_field_value(field_id)
                .unwrap_or_default()
                .to_string()
        };
        CanonicalContent {
            ticket_id: task.permalink.as_deref().and_then(extract_permalink_task_id),
            identifier: task.custom_field_value(&map.identifier).map(ToOwned::to_owned),
            title: read(&map.title),
            title_url_slug: String::new(),
            summary: read(&map.summary),
            date_of_publication: read(&map.date_of_publication),
            content: read(&map.content),
            media_type: task
                .custom_field_value(&map.media_type)
                .filter(|media| !media.is_empty())
                .unwrap_or(DEFAULT_MEDIA_TYPE)
                .to_string(),
            meta_description: read(&map.meta_description),
            meta_title: read(&map.meta_title),
            allow_only_update: decode_yes_no(task.custom_field_value(&map.creation_locked)),
        }
        .normalized()
    }
}
