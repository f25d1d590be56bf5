//! Create-or-update workflow driven by classified task comments.
//!
//! Every command for a task runs under that task's lock, from extraction to
//! the final state write, so two commands for the same task can never both
//! observe "not yet created" or the same stale snapshot hash.

use std::sync::Arc;

use inkwire_core::{encode_yes_no, now_rfc3339};
use inkwire_dotcms::{CanonicalContent, ContentSystem};
use inkwire_wrike::{CustomFieldUpdate, TaskTracker, TaskUpdate};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::ack_responder::AckResponder;
use crate::command_classifier::Command;
use crate::content_extractor::ContentExtractor;
use crate::content_validation::validate_content;
use crate::messages;
use crate::task_locks::TaskLocks;
use crate::task_state_store::TaskStateStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Ignored,
    ExtractionFailed,
    AlreadyCreated,
    ValidationFailed,
    Created { identifier: String },
    CreateFailed,
    CreateFirst,
    NoChanges,
    Updated,
    UpdateFailed,
}

impl CommandOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::ExtractionFailed => "extraction_failed",
            Self::AlreadyCreated => "already_created",
            Self::ValidationFailed => "validation_failed",
            Self::Created { .. } => "created",
            Self::CreateFailed => "create_failed",
            Self::CreateFirst => "create_first",
            Self::NoChanges => "no_changes",
            Self::Updated => "updated",
            Self::UpdateFailed => "update_failed",
        }
    }
}

/// SHA-256 hex of the content's JSON form.
pub fn snapshot_hash(content: &CanonicalContent) -> String {
    let encoded = serde_json::to_vec(content).unwrap_or_default();
    hex::encode(Sha256::digest(&encoded))
}

pub struct WorkflowOrchestrator {
    tracker: Arc<dyn TaskTracker>,
    content_system: Arc<dyn ContentSystem>,
    extractor: ContentExtractor,
    state_store: Arc<dyn TaskStateStore>,
    responder: AckResponder,
    locks: TaskLocks,
}

impl WorkflowOrchestrator {
    pub fn new(
        tracker: Arc<dyn TaskTracker>,
        content_system: Arc<dyn ContentSystem>,
        extractor: ContentExtractor,
        state_store: Arc<dyn TaskStateStore>,
    ) -> Self {
        Self {
            responder: AckResponder::new(tracker.clone()),
            tracker,
            content_system,
            extractor,
            state_store,
            locks: TaskLocks::new(),
        }
    }

    pub fn state_store(&self) -> &Arc<dyn TaskStateStore> {
        &self.state_store
    }

    /// Marks `created_seen` under the task lock so a command in flight for
    /// the same task cannot overwrite it with its older copy.
    pub async fn record_task_created(&self, task_id: &str) {
        let _task_guard = self.locks.acquire(task_id).await;
        let mut state = self.state_store.get(task_id);
        state.created_seen = true;
        self.state_store.put(task_id, state);
    }

    pub async fn run(&self, task_id: &str, command: Command) -> CommandOutcome {
        if command == Command::None {
            return CommandOutcome::Ignored;
        }
        let _task_guard = self.locks.acquire(task_id).await;
        let outcome = match command {
            Command::Create => self.run_create(task_id).await,
            Command::Update => self.run_update(task_id).await,
            Command::None => CommandOutcome::Ignored,
        };
        info!(
            task_id,
            command = command.as_str(),
            outcome = outcome.as_str(),
            "task command finished"
        );
        outcome
    }

    async fn extract_or_report(&self, task_id: &str) -> Option<CanonicalContent> {
        match self.extractor.extract(task_id).await {
            Ok(content) => Some(content),
            Err(error) => {
                warn!(task_id, stage = "extract", error = %error, "task extraction failed");
                self.responder
                    .post(task_id, &messages::extraction_failed(&error.message))
                    .await;
                None
            }
        }
    }

    async fn run_create(&self, task_id: &str) -> CommandOutcome {
        let Some(content) = self.extract_or_report(task_id).await else {
            return CommandOutcome::ExtractionFailed;
        };
        let mut state = self.state_store.get(task_id);

        if content.has_identifier() && content.allow_only_update {
            self.responder
                .post(
                    task_id,
                    &messages::already_created(state.skeleton_created_at.as_deref()),
                )
                .await;
            state.skeleton_created = true;
            state.skeleton_created_at.get_or_insert_with(now_rfc3339);
            self.state_store.put(task_id, state);
            return CommandOutcome::AlreadyCreated;
        }

        let report = validate_content(&content);
        if !report.is_valid() {
            info!(task_id, stage = "validate", missing = ?report.missing, "create rejected by validation");
            self.responder.post(task_id, &report.render_comment()).await;
            return CommandOutcome::ValidationFailed;
        }

        self.responder.post(task_id, messages::CREATING).await;
        let created = match self.content_system.create_content(&content).await {
            Ok(created) => created,
            Err(error) => {
                warn!(task_id, stage = "create", error = %error, "content create failed");
                self.responder
                    .post(task_id, &messages::create_failed(&error.to_string()))
                    .await;
                return CommandOutcome::CreateFailed;
            }
        };

        let field_map = self.extractor.field_map();
        let mut snapshot = content;
        let mut write_back_warnings = Vec::new();
        for (field_label, field_id, value) in [
            ("Identifier", &field_map.identifier, created.identifier.as_str()),
            ("Created flag", &field_map.creation_locked, encode_yes_no(true)),
        ] {
            let update = TaskUpdate::custom_fields(vec![CustomFieldUpdate::new(field_id, value)]);
            match self.tracker.update_task(task_id, &update).await {
                Ok(_) => {
                    if field_id == &field_map.identifier {
                        snapshot.identifier = Some(created.identifier.clone());
                    } else {
                        snapshot.allow_only_update = true;
                    }
                }
                Err(error) => {
                    warn!(task_id, stage = "write_back", field = field_label, error = %error, "task field write-back failed");
                    write_back_warnings
                        .push(messages::field_write_back_failed(field_label, &error.to_string()));
                }
            }
        }

        state.skeleton_created = true;
        state.skeleton_created_at = Some(now_rfc3339());
        state.last_snapshot_hash = Some(snapshot_hash(&snapshot));
        state.snapshot = Some(snapshot);
        self.state_store.put(task_id, state);

        self.responder.post(task_id, messages::CREATED).await;
        for warning in write_back_warnings {
            self.responder.post(task_id, &warning).await;
        }
        CommandOutcome::Created {
            identifier: created.identifier,
        }
    }

    async fn run_update(&self, task_id: &str) -> CommandOutcome {
        let Some(content) = self.extract_or_report(task_id).await else {
            return CommandOutcome::ExtractionFailed;
        };
        let Some(identifier) = content.identifier.clone() else {
            self.responder
                .post(task_id, messages::PLEASE_CREATE_FIRST)
                .await;
            return CommandOutcome::CreateFirst;
        };

        let report = validate_content(&content);
        if !report.is_valid() {
            info!(task_id, stage = "validate", missing = ?report.missing, "update rejected by validation");
            self.responder.post(task_id, &report.render_comment()).await;
            return CommandOutcome::ValidationFailed;
        }

        let mut state = self.state_store.get(task_id);
        let next_hash = snapshot_hash(&content);
        let unchanged = state.last_snapshot_hash.as_deref() == Some(next_hash.as_str());
        if unchanged || content.has_no_editable_text() {
            let since = state
                .last_update_at
                .as_deref()
                .or(state.skeleton_created_at.as_deref());
            self.responder
                .post(task_id, &messages::no_changes(since))
                .await;
            state.last_no_changes_at = Some(now_rfc3339());
            self.state_store.put(task_id, state);
            return CommandOutcome::NoChanges;
        }

        self.responder.post(task_id, messages::UPDATE_STARTING).await;
        if let Err(error) = self
            .content_system
            .update_content(&identifier, &content)
            .await
        {
            warn!(task_id, stage = "update", identifier = %identifier, error = %error, "content update failed");
            self.responder
                .post(task_id, &messages::update_failed(&error.to_string()))
                .await;
            return CommandOutcome::UpdateFailed;
        }

        state.last_update_at = Some(now_rfc3339());
        state.last_snapshot_hash = Some(next_hash);
        state.snapshot = Some(content);
        self.state_store.put(task_id, state);
        self.responder.post(task_id, messages::UPDATED).await;
        CommandOutcome::Updated
    }
}
