use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use inkwire_core::{current_unix_timestamp_ms, BoundedCache, BoundedKeySet};
use inkwire_wrike::TaskTracker;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::command_classifier::{Command, CommandClassifier};
use crate::webhook_event::{dedupe_key, RawEvent, WebhookEvent};
use crate::workflow_orchestrator::{CommandOutcome, WorkflowOrchestrator};

pub const DEFAULT_PROCESSED_EVENT_CAP: usize = 500;
pub const DEFAULT_CONTACT_CACHE_CAP: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub processed_event_cap: usize,
    pub contact_cache_cap: usize,
    pub bot_contact_id: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            processed_event_cap: DEFAULT_PROCESSED_EVENT_CAP,
            contact_cache_cap: DEFAULT_CONTACT_CACHE_CAP,
            bot_contact_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Duplicate,
    TaskCreatedRecorded,
    Ignored,
    OwnComment,
    Command(CommandOutcome),
    Failed(String),
}

#[derive(Debug, Default)]
struct RuntimeCounters {
    events_accepted: AtomicU64,
    duplicates_skipped: AtomicU64,
    events_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub events_accepted: u64,
    pub duplicates_skipped: u64,
    pub events_failed: u64,
    pub tracked_tasks: usize,
}

/// Runs every webhook event through dedup, kind branching, comment fetch,
/// classification and the orchestrator.
pub struct EventDispatcher {
    tracker: Arc<dyn TaskTracker>,
    classifier: CommandClassifier,
    orchestrator: Arc<WorkflowOrchestrator>,
    processed: Mutex<BoundedKeySet>,
    contacts: Mutex<BoundedCache<String, String>>,
    bot_contact_id: Option<String>,
    counters: RuntimeCounters,
}

impl EventDispatcher {
    pub fn new(
        tracker: Arc<dyn TaskTracker>,
        classifier: CommandClassifier,
        orchestrator: Arc<WorkflowOrchestrator>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            tracker,
            classifier,
            orchestrator,
            processed: Mutex::new(BoundedKeySet::new(config.processed_event_cap)),
            contacts: Mutex::new(BoundedCache::new(config.contact_cache_cap)),
            bot_contact_id: config
                .bot_contact_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            counters: RuntimeCounters::default(),
        }
    }

    pub fn counters(&self) -> CountersSnapshot {
        CountersSnapshot {
            events_accepted: self.counters.events_accepted.load(Ordering::Relaxed),
            duplicates_skipped: self.counters.duplicates_skipped.load(Ordering::Relaxed),
            events_failed: self.counters.events_failed.load(Ordering::Relaxed),
            tracked_tasks: self.orchestrator.state_store().len(),
        }
    }

    /// Spawns one detached task per event and returns immediately.
    pub fn dispatch_batch(self: &Arc<Self>, events: Vec<RawEvent>) -> usize {
        let evicted = self
            .orchestrator
            .state_store()
            .evict(current_unix_timestamp_ms());
        if evicted > 0 {
            debug!(evicted, "evicted idle task state records");
        }
        let count = events.len();
        for event in events {
            let dispatcher = Arc::clone(self);
            tokio::spawn(async move {
                dispatcher.process_event(event).await;
            });
        }
        count
    }

    pub async fn process_event(&self, raw: RawEvent) -> EventOutcome {
        let event_key = dedupe_key(&raw);
        let first_delivery = self
            .processed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(&event_key);
        if !first_delivery {
            self.counters
                .duplicates_skipped
                .fetch_add(1, Ordering::Relaxed);
            debug!(event_key = %event_key, "skipping duplicate webhook event");
            return EventOutcome::Duplicate;
        }
        self.counters.events_accepted.fetch_add(1, Ordering::Relaxed);

        match self.route_event(&raw).await {
            Ok(outcome) => outcome,
            Err(error) => {
                self.counters.events_failed.fetch_add(1, Ordering::Relaxed);
                error!(event_key = %event_key, error = %format!("{error:#}"), "webhook event processing failed");
                EventOutcome::Failed(format!("{error:#}"))
            }
        }
    }

    async fn route_event(&self, raw: &RawEvent) -> Result<EventOutcome> {
        match WebhookEvent::from_raw(raw) {
            WebhookEvent::TaskCreated { task_id } => {
                self.orchestrator.record_task_created(&task_id).await;
                info!(task_id = %task_id, "task created event recorded");
                Ok(EventOutcome::TaskCreatedRecorded)
            }
            WebhookEvent::Other { event_type } => {
                debug!(event_type = %event_type, "ignoring webhook event kind");
                Ok(EventOutcome::Ignored)
            }
            WebhookEvent::CommentAdded {
                task_id,
                comment_id,
            } => self.route_comment(task_id, &comment_id).await,
        }
    }

    async fn route_comment(&self, task_id: Option<String>, comment_id: &str) -> Result<EventOutcome> {
        let comment = self
            .tracker
            .get_comment(comment_id)
            .await
            .with_context(|| format!("failed to fetch comment {comment_id}"))?;
        let Some(task_id) = task_id.or_else(|| comment.task_id.clone()) else {
            debug!(comment_id, "comment carries no task id");
            return Ok(EventOutcome::Ignored);
        };
        if let (Some(bot_id), Some(author_id)) =
            (self.bot_contact_id.as_deref(), comment.author_id.as_deref())
        {
            if bot_id == author_id {
                debug!(task_id = %task_id, comment_id, "ignoring comment authored by the bridge");
                return Ok(EventOutcome::OwnComment);
            }
        }

        let command = self.classifier.classify(&comment.text);
        if command == Command::None {
            return Ok(EventOutcome::Ignored);
        }
        let author = self.author_display_name(comment.author_id.as_deref()).await;
        info!(
            task_id = %task_id,
            comment_id,
            author = %author,
            command = command.as_str(),
            "task command received"
        );
        Ok(EventOutcome::Command(
            self.orchestrator.run(&task_id, command).await,
        ))
    }

    /// Resolves a contact id for display, caching the result even when
    /// the lookup fails.
    async fn author_display_name(&self, author_id: Option<&str>) -> String {
        let Some(author_id) = author_id.filter(|id| !id.is_empty()) else {
            return "unknown".to_string();
        };
        let cached = self
            .contacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&author_id.to_string());
        if let Some(name) = cached {
            return name;
        }
        let name = match self.tracker.get_contact(author_id).await {
            Ok(contact) => contact.display_name(),
            Err(error) => {
                debug!(author_id, error = %error, "contact lookup failed");
                author_id.to_string()
            }
        };
        self.contacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(author_id.to_string(), name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use inkwire_dotcms::{ContentSystem, ContentletDefaults, DotcmsApiClient, DotcmsClientConfig};
    use inkwire_wrike::WrikeApiClient;
    use serde_json::{json, Value};

    use super::*;
    use crate::content_extractor::{ContentExtractor, FetchRetryPolicy};
    use crate::field_map::sample_field_map;
    use crate::task_state_store::{InMemoryTaskStateStore, TaskStateStore};

    fn dispatcher_for(wrike: &MockServer, dotcms: &MockServer, config: DispatcherConfig) -> Arc<EventDispatcher> {
        let tracker: Arc<dyn TaskTracker> = Arc::new(
            WrikeApiClient::new(&wrike.url("/api/v4"), "wrike-token", 5_000).expect("wrike"),
        );
        let content_system: Arc<dyn ContentSystem> = Arc::new(
            DotcmsApiClient::new(DotcmsClientConfig {
                api_base: dotcms.base_url(),
                token: "dotcms-token".to_string(),
                workflow_action_id: "create-action".to_string(),
                contentlet_defaults: ContentletDefaults::default(),
                request_timeout_ms: 5_000,
            })
            .expect("dotcms"),
        );
        let extractor =
            ContentExtractor::new(tracker.clone(), sample_field_map(), FetchRetryPolicy::default());
        let store: Arc<dyn TaskStateStore> = Arc::new(InMemoryTaskStateStore::default());
        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            tracker.clone(),
            content_system,
            extractor,
            store,
        ));
        Arc::new(EventDispatcher::new(
            tracker,
            CommandClassifier::new().expect("classifier"),
            orchestrator,
            config,
        ))
    }

    fn raw(value: Value) -> RawEvent {
        value.as_object().cloned().expect("object")
    }

    fn comment_event(comment_id: &str) -> RawEvent {
        raw(json!({
            "webhookId": "WH1",
            "eventType": "CommentAdded",
            "taskId": "IEAT1",
            "commentId": comment_id,
            "lastUpdatedDate": "2025-06-01T10:00:00Z"
        }))
    }

    #[tokio::test]
    async fn functional_duplicate_delivery_is_processed_once() {
        let wrike = MockServer::start();
        let dotcms = MockServer::start();
        let comment_mock = wrike.mock(|when, then| {
            when.method(GET).path("/api/v4/comments/IEAC1");
            then.status(200).json_body(json!({"data": [{
                "id": "IEAC1", "taskId": "IEAT1", "text": "thanks, looks good"
            }]}));
        });
        let dispatcher = dispatcher_for(&wrike, &dotcms, DispatcherConfig::default());

        assert_eq!(
            dispatcher.process_event(comment_event("IEAC1")).await,
            EventOutcome::Ignored
        );
        assert_eq!(
            dispatcher.process_event(comment_event("IEAC1")).await,
            EventOutcome::Duplicate
        );
        comment_mock.assert_calls(1);
        let counters = dispatcher.counters();
        assert_eq!(counters.events_accepted, 1);
        assert_eq!(counters.duplicates_skipped, 1);
    }

    #[tokio::test]
    async fn functional_task_created_marks_state_without_remote_calls() {
        let wrike = MockServer::start();
        let dotcms = MockServer::start();
        let dispatcher = dispatcher_for(&wrike, &dotcms, DispatcherConfig::default());

        let outcome = dispatcher
            .process_event(raw(json!({"eventType": "TaskCreated", "taskId": "IEAT9"})))
            .await;
        assert_eq!(outcome, EventOutcome::TaskCreatedRecorded);
        assert!(dispatcher.orchestrator.state_store().get("IEAT9").created_seen);
        assert_eq!(dispatcher.counters().tracked_tasks, 1);
    }

    #[tokio::test]
    async fn regression_comment_fetch_failure_is_counted_not_propagated() {
        let wrike = MockServer::start();
        let dotcms = MockServer::start();
        wrike.mock(|when, then| {
            when.method(GET).path("/api/v4/comments/IEAC2");
            then.status(404).body("gone");
        });
        let dispatcher = dispatcher_for(&wrike, &dotcms, DispatcherConfig::default());

        let outcome = dispatcher.process_event(comment_event("IEAC2")).await;
        assert!(matches!(outcome, EventOutcome::Failed(message) if message.contains("IEAC2")));
        assert_eq!(dispatcher.counters().events_failed, 1);
    }

    #[tokio::test]
    async fn functional_bot_authored_comments_are_ignored_before_classification() {
        let wrike = MockServer::start();
        let dotcms = MockServer::start();
        wrike.mock(|when, then| {
            when.method(GET).path("/api/v4/comments/IEAC3");
            then.status(200).json_body(json!({"data": [{
                "id": "IEAC3", "taskId": "IEAT1", "authorId": "KUBOT", "text": "create"
            }]}));
        });
        let task_mock = wrike.mock(|when, then| {
            when.method(GET).path("/api/v4/tasks/IEAT1");
            then.status(200).json_body(json!({"data": [{"id": "IEAT1"}]}));
        });
        let dispatcher = dispatcher_for(
            &wrike,
            &dotcms,
            DispatcherConfig {
                bot_contact_id: Some("KUBOT".to_string()),
                ..DispatcherConfig::default()
            },
        );

        assert_eq!(
            dispatcher.process_event(comment_event("IEAC3")).await,
            EventOutcome::OwnComment
        );
        task_mock.assert_calls(0);
    }

    #[tokio::test]
    async fn functional_command_author_is_resolved_once_through_contact_cache() {
        let wrike = MockServer::start();
        let dotcms = MockServer::start();
        for comment_id in ["IEAC4", "IEAC5"] {
            wrike.mock(|when, then| {
                when.method(GET).path(format!("/api/v4/comments/{comment_id}"));
                then.status(200).json_body(json!({"data": [{
                    "id": comment_id, "taskId": "IEAT1", "authorId": "KUA1", "text": "update"
                }]}));
            });
        }
        let contact_mock = wrike.mock(|when, then| {
            when.method(GET).path("/api/v4/contacts/KUA1");
            then.status(200).json_body(json!({"data": [{
                "id": "KUA1", "firstName": "Ada", "lastName": "Lovelace"
            }]}));
        });
        wrike.mock(|when, then| {
            when.method(GET).path("/api/v4/tasks/IEAT1");
            then.status(200).json_body(json!({"data": [{"id": "IEAT1", "customFields": []}]}));
        });
        wrike.mock(|when, then| {
            when.method(POST).path("/api/v4/tasks/IEAT1/comments");
            then.status(200).json_body(json!({"data": [{"id": "IEAC-ack"}]}));
        });
        let dispatcher = dispatcher_for(&wrike, &dotcms, DispatcherConfig::default());

        for comment_id in ["IEAC4", "IEAC5"] {
            assert_eq!(
                dispatcher.process_event(comment_event(comment_id)).await,
                EventOutcome::Command(CommandOutcome::CreateFirst)
            );
        }
        contact_mock.assert_calls(1);
        assert_eq!(
            dispatcher.author_display_name(Some("KUA1")).await,
            "Ada Lovelace"
        );
    }
}
