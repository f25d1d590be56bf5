use anyhow::{bail, Result};

use crate::cli_args::Cli;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Rejects configurations that would only fail once traffic arrives.
pub fn validate_cli(cli: &Cli) -> Result<()> {
    if is_blank(&cli.bind) {
        bail!("--bind cannot be empty");
    }
    if is_blank(&cli.wrike_token) {
        bail!("--wrike-token (WRIKE_API_TOKEN) cannot be empty");
    }
    if is_blank(&cli.webhook_secret) {
        bail!("--webhook-secret (WEBHOOK_SECRET) cannot be empty");
    }
    if is_blank(&cli.dotcms_api_base) {
        bail!("--dotcms-api-base (DOTCMS_API_URL) cannot be empty");
    }
    if is_blank(&cli.dotcms_token) {
        bail!("--dotcms-token (DOTCMS_API_TOKEN) cannot be empty");
    }
    if is_blank(&cli.dotcms_workflow_action_id) {
        bail!("--dotcms-workflow-action-id (WORKFLOW_ACTION_ID_DEFAULT) cannot be empty");
    }
    if is_blank(&cli.dotcms_content_type) {
        bail!("--dotcms-content-type cannot be empty");
    }
    if is_blank(&cli.pdf_renderer_bin) {
        bail!("--pdf-renderer-bin cannot be empty");
    }
    if cli.task_state_ttl_seconds.checked_mul(1_000).is_none() {
        bail!("--task-state-ttl-seconds is too large");
    }
    Ok(())
}
