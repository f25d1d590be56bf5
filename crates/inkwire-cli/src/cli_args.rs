use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_WRIKE_API_BASE: &str = "https://www.wrike.com/api/v4";

pub fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

pub fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "inkwire",
    about = "Bridge between Wrike task comments and dotCMS articles",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "INKWIRE_BIND",
        default_value = DEFAULT_BIND,
        help = "Socket address the HTTP server listens on"
    )]
    pub bind: String,

    #[arg(
        long,
        env = "INKWIRE_WRIKE_API_BASE",
        default_value = DEFAULT_WRIKE_API_BASE,
        help = "Base URL for the Wrike REST API"
    )]
    pub wrike_api_base: String,

    #[arg(
        long,
        env = "WRIKE_API_TOKEN",
        hide_env_values = true,
        help = "Bearer token for the Wrike API"
    )]
    pub wrike_token: String,

    #[arg(
        long,
        env = "INKWIRE_WRIKE_BOT_CONTACT_ID",
        help = "Wrike contact id the bridge posts as; comments by this contact are ignored"
    )]
    pub wrike_bot_contact_id: Option<String>,

    #[arg(
        long,
        env = "WEBHOOK_SECRET",
        hide_env_values = true,
        help = "Shared secret for webhook signatures and the verification handshake"
    )]
    pub webhook_secret: String,

    #[arg(
        long,
        env = "DOTCMS_API_URL",
        help = "Base URL of the dotCMS instance"
    )]
    pub dotcms_api_base: String,

    #[arg(
        long,
        env = "DOTCMS_API_TOKEN",
        hide_env_values = true,
        help = "Bearer token for the dotCMS API"
    )]
    pub dotcms_token: String,

    #[arg(
        long,
        env = "DOTCMS_SITE",
        help = "Site or folder new contentlets are created in"
    )]
    pub dotcms_site: Option<String>,

    #[arg(
        long,
        env = "WORKFLOW_ACTION_ID_DEFAULT",
        help = "Workflow action fired when creating content"
    )]
    pub dotcms_workflow_action_id: String,

    #[arg(
        long,
        env = "INKWIRE_DOTCMS_CONTENT_TYPE",
        default_value = "usInsightArticle",
        help = "Content type variable for created contentlets"
    )]
    pub dotcms_content_type: String,

    #[arg(
        long,
        env = "INKWIRE_FIELD_MAP",
        help = "TOML file mapping article fields to Wrike custom field ids"
    )]
    pub field_map: PathBuf,

    #[arg(
        long,
        env = "INKWIRE_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout for every outbound Wrike and dotCMS request"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long,
        env = "INKWIRE_TASK_FETCH_ATTEMPTS",
        default_value_t = 3,
        value_parser = parse_positive_usize,
        help = "Attempts when reading a task for extraction"
    )]
    pub task_fetch_attempts: usize,

    #[arg(
        long,
        env = "INKWIRE_TASK_FETCH_DELAY_MS",
        default_value_t = 400,
        help = "Fixed delay between task read attempts"
    )]
    pub task_fetch_delay_ms: u64,

    #[arg(
        long,
        env = "INKWIRE_PROCESSED_EVENT_CAP",
        default_value_t = 500,
        value_parser = parse_positive_usize,
        help = "Webhook event keys remembered for duplicate suppression"
    )]
    pub processed_event_cap: usize,

    #[arg(
        long,
        env = "INKWIRE_CONTACT_CACHE_CAP",
        default_value_t = 500,
        value_parser = parse_positive_usize,
        help = "Comment author display names kept in memory"
    )]
    pub contact_cache_cap: usize,

    #[arg(
        long,
        env = "INKWIRE_TASK_STATE_CAP",
        default_value_t = 10_000,
        value_parser = parse_positive_usize,
        help = "Per-task workflow records kept in memory"
    )]
    pub task_state_cap: usize,

    #[arg(
        long,
        env = "INKWIRE_TASK_STATE_TTL_SECONDS",
        default_value_t = 2_592_000,
        value_parser = parse_positive_u64,
        help = "Idle time after which a task workflow record may be evicted"
    )]
    pub task_state_ttl_seconds: u64,

    #[arg(
        long,
        env = "INKWIRE_PDF_RENDERER_BIN",
        default_value = "chromium",
        help = "Headless browser used to print review PDFs"
    )]
    pub pdf_renderer_bin: String,

    #[arg(
        long,
        env = "INKWIRE_PDF_TIMEOUT_MS",
        default_value_t = 60_000,
        value_parser = parse_positive_u64,
        help = "Timeout for one PDF render"
    )]
    pub pdf_timeout_ms: u64,
}

#[cfg(test)]
pub(crate) fn minimal_args() -> Vec<&'static str> {
    vec![
        "inkwire",
        "--wrike-token",
        "wrike-token",
        "--webhook-secret",
        "secret",
        "--dotcms-api-base",
        "https://cms.example.com",
        "--dotcms-token",
        "dotcms-token",
        "--dotcms-workflow-action-id",
        "action-1",
        "--field-map",
        "config/field-map.toml",
    ]
}
