use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use inkwire_dotcms::{ContentSystem, ContentletDefaults, DotcmsApiClient, DotcmsClientConfig};
use inkwire_review::{build_review_router, ChromePdfConfig, ChromePdfRenderer, ReviewServerState};
use inkwire_webhook_runtime::{
    build_webhook_router, CommandClassifier, ContentExtractor, DispatcherConfig, EventDispatcher,
    FetchRetryPolicy, FieldMap, InMemoryTaskStateStore, WebhookServerState, WorkflowOrchestrator,
};
use inkwire_wrike::{TaskTracker, WrikeApiClient};
use tokio::net::TcpListener;
use tracing::info;

use crate::cli_args::Cli;

/// Wires clients, stores and routers for one server process.
pub fn build_app(cli: &Cli, field_map: FieldMap) -> Result<Router> {
    let tracker: Arc<dyn TaskTracker> = Arc::new(
        WrikeApiClient::new(&cli.wrike_api_base, &cli.wrike_token, cli.request_timeout_ms)
            .context("failed to build wrike client")?,
    );
    let content_system: Arc<dyn ContentSystem> = Arc::new(
        DotcmsApiClient::new(DotcmsClientConfig {
            api_base: cli.dotcms_api_base.trim().to_string(),
            token: cli.dotcms_token.trim().to_string(),
            workflow_action_id: cli.dotcms_workflow_action_id.trim().to_string(),
            contentlet_defaults: ContentletDefaults {
                content_type: cli.dotcms_content_type.trim().to_string(),
                site: cli
                    .dotcms_site
                    .as_deref()
                    .map(str::trim)
                    .filter(|site| !site.is_empty())
                    .map(ToOwned::to_owned),
                ..ContentletDefaults::default()
            },
            request_timeout_ms: cli.request_timeout_ms,
        })
        .context("failed to build dotcms client")?,
    );
    let renderer = Arc::new(
        ChromePdfRenderer::new(ChromePdfConfig {
            executable: cli.pdf_renderer_bin.trim().to_string(),
            timeout_ms: cli.pdf_timeout_ms,
            extra_args: Vec::new(),
        })
        .context("failed to configure pdf renderer")?,
    );

    let extractor = ContentExtractor::new(
        tracker.clone(),
        field_map.clone(),
        FetchRetryPolicy {
            attempts: cli.task_fetch_attempts,
            delay_ms: cli.task_fetch_delay_ms,
        },
    );
    let state_store = Arc::new(InMemoryTaskStateStore::new(
        cli.task_state_cap,
        cli.task_state_ttl_seconds.saturating_mul(1_000),
    ));
    let orchestrator = Arc::new(WorkflowOrchestrator::new(
        tracker.clone(),
        content_system.clone(),
        extractor,
        state_store,
    ));
    let classifier = CommandClassifier::new().context("failed to compile command patterns")?;
    let dispatcher = Arc::new(EventDispatcher::new(
        tracker.clone(),
        classifier,
        orchestrator,
        DispatcherConfig {
            processed_event_cap: cli.processed_event_cap,
            contact_cache_cap: cli.contact_cache_cap,
            bot_contact_id: cli.wrike_bot_contact_id.clone(),
        },
    ));

    let webhook = build_webhook_router(Arc::new(WebhookServerState {
        secret: cli.webhook_secret.trim().to_string(),
        dispatcher,
    }));
    let review = build_review_router(Arc::new(ReviewServerState {
        tracker,
        content_system,
        renderer,
        field_map,
    }));
    Ok(webhook.merge(review))
}

pub async fn serve(cli: &Cli, app: Router) -> Result<()> {
    let listener = TcpListener::bind(cli.bind.trim())
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound address")?;
    info!(addr = %local_addr, "inkwire server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("inkwire server exited unexpectedly")?;
    info!("inkwire server stopped");
    Ok(())
}
