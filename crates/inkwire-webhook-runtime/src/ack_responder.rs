use std::sync::Arc;

use inkwire_wrike::TaskTracker;
use tracing::{debug, warn};

/// Best-effort task comments; failures are logged and never propagate.
#[derive(Clone)]
pub struct AckResponder {
    tracker: Arc<dyn TaskTracker>,
}

impl AckResponder {
    pub fn new(tracker: Arc<dyn TaskTracker>) -> Self {
        Self { tracker }
    }

    /// Returns whether the comment was posted.
    pub async fn post(&self, task_id: &str, html: &str) -> bool {
        match self.tracker.post_comment(task_id, html).await {
            Ok(comment) => {
                debug!(task_id, comment_id = %comment.id, "posted task comment");
                true
            }
            Err(error) => {
                warn!(task_id, error = %error, "failed to post task comment");
                false
            }
        }
    }
}
