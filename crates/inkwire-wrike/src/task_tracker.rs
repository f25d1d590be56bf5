use async_trait::async_trait;
use serde_json::Value;

use crate::wrike_api_client::WrikeApiError;
use crate::wrike_types::{TaskUpdate, WrikeAttachment, WrikeComment, WrikeContact, WrikeTask};

/// Operations Inkwire needs from the task tracker.
///
/// Implementations make a single attempt per call; callers own retry policy.
#[async_trait]
pub trait TaskTracker: Send + Sync {
    async fn get_task(&self, task_id: &str) -> Result<WrikeTask, WrikeApiError>;

    async fn get_comment(&self, comment_id: &str) -> Result<WrikeComment, WrikeApiError>;

    async fn get_contact(&self, contact_id: &str) -> Result<WrikeContact, WrikeApiError>;

    /// Posts an HTML comment on a task.
    async fn post_comment(&self, task_id: &str, html: &str) -> Result<WrikeComment, WrikeApiError>;

    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Value, WrikeApiError>;

    async fn update_task_status(
        &self,
        task_id: &str,
        custom_status: &str,
    ) -> Result<Value, WrikeApiError>;

    /// Maps a numeric permalink id to the tracker's API task id.
    async fn resolve_task_id(&self, permalink_id: &str) -> Result<String, WrikeApiError>;

    async fn upload_attachment(
        &self,
        task_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<WrikeAttachment, WrikeApiError>;
}
