//! Wrike task-tracker integration for Inkwire.
//!
//! Exposes the typed Wrike payloads, the [`TaskTracker`] seam the webhook
//! runtime and review handlers depend on, and the reqwest-backed
//! [`WrikeApiClient`] implementation.

pub mod task_ids;
pub mod task_tracker;
pub mod wrike_api_client;
pub mod wrike_types;

pub use task_ids::{extract_permalink_task_id, is_permalink_id, permalink_url};
pub use task_tracker::TaskTracker;
pub use wrike_api_client::{WrikeApiClient, WrikeApiError};
pub use wrike_types::{
    CustomFieldUpdate, TaskUpdate, WrikeAttachment, WrikeComment, WrikeContact, WrikeCustomField,
    WrikeEnvelope, WrikeTask,
};
