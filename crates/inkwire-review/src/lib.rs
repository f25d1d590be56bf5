//! Editorial side endpoints: review PDFs, task status changes, CMS to task
//! sync, and direct content creation.

pub mod pdf_renderer;
mod request_fields;
pub mod reverse_sync;
pub mod review_error;
pub mod review_server;
pub mod rich_text;
pub mod send_for_review;
pub mod status_update;

pub use pdf_renderer::{
    ChromePdfConfig, ChromePdfRenderer, PdfRenderError, PdfRenderer, DEFAULT_PDF_RENDERER_BIN,
    DEFAULT_PDF_TIMEOUT_MS,
};
pub use request_fields::resolve_api_task_id;
pub use reverse_sync::{plan_task_update, sync_to_task, ReverseSyncRequest, SyncMode};
pub use review_error::ReviewError;
pub use review_server::{build_review_router, ReviewServerState};
pub use rich_text::{render_story_block, RichTextError};
pub use send_for_review::{review_comment_html, review_file_name, send_for_review};
pub use status_update::{update_status, validate_status_id};
