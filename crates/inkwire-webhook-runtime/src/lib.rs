//! Webhook intake and article workflow for the Wrike to dotCMS bridge.
//!
//! Events arrive on `POST /webhook`, are verified, split into a batch,
//! deduplicated, and routed through command classification into the
//! create/update orchestrator.

pub mod ack_responder;
pub mod command_classifier;
pub mod content_extractor;
pub mod content_validation;
pub mod event_dispatcher;
pub mod field_map;
pub mod messages;
pub mod signature;
pub mod task_locks;
pub mod task_state_store;
pub mod webhook_event;
pub mod webhook_server;
pub mod workflow_orchestrator;

pub use ack_responder::AckResponder;
pub use command_classifier::{normalize_command_text, Command, CommandClassifier};
pub use content_extractor::{
    ContentExtractor, ExtractionError, FetchRetryPolicy, DEFAULT_FETCH_ATTEMPTS,
    DEFAULT_FETCH_DELAY_MS,
};
pub use content_validation::{validate_content, ValidationReport};
pub use event_dispatcher::{
    CountersSnapshot, DispatcherConfig, EventDispatcher, EventOutcome,
    DEFAULT_CONTACT_CACHE_CAP, DEFAULT_PROCESSED_EVENT_CAP,
};
pub use field_map::{FieldMap, FieldMapError};
pub use signature::{
    handshake_response, hmac_sha256_hex, is_handshake, verify_signature, SignatureError,
    HOOK_SECRET_HEADER,
};
pub use task_locks::TaskLocks;
pub use task_state_store::{
    InMemoryTaskStateStore, TaskState, TaskStateStore, DEFAULT_TASK_STATE_CAPACITY,
    DEFAULT_TASK_STATE_TTL_MS,
};
pub use webhook_event::{dedupe_key, split_event_batch, RawEvent, WebhookEvent};
pub use webhook_server::{build_webhook_router, WebhookServerState};
pub use workflow_orchestrator::{snapshot_hash, CommandOutcome, WorkflowOrchestrator};
