use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_PDF_RENDERER_BIN: &str = "chromium";
pub const DEFAULT_PDF_TIMEOUT_MS: u64 = 60_000;

const PDF_FILE_NAME: &str = "page.pdf";
const STDERR_SUMMARY_MAX_CHARS: usize = 400;

#[derive(Debug, Error)]
pub enum PdfRenderError {
    #[error("page url '{0}' must be an absolute http(s) url")]
    InvalidUrl(String),
    #[error("pdf renderer configuration is invalid: {0}")]
    InvalidConfig(String),
    #[error("failed to spawn pdf renderer '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },
    #[error("pdf renderer timed out after {0}ms")]
    Timeout(u64),
    #[error("pdf renderer failed with status {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("pdf renderer produced no output: {0}")]
    MissingOutput(String),
    #[error("pdf renderer i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a public page into PDF bytes.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<Vec<u8>, PdfRenderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromePdfConfig {
    pub executable: String,
    pub timeout_ms: u64,
    pub extra_args: Vec<String>,
}

impl Default for ChromePdfConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_PDF_RENDERER_BIN.to_string(),
            timeout_ms: DEFAULT_PDF_TIMEOUT_MS,
            extra_args: Vec::new(),
        }
    }
}

/// Runs a headless Chromium-compatible browser with `--print-to-pdf`.
#[derive(Debug, Clone)]
pub struct ChromePdfRenderer {
    config: ChromePdfConfig,
}

impl ChromePdfRenderer {
    pub fn new(config: ChromePdfConfig) -> Result<Self, PdfRenderError> {
        if config.executable.trim().is_empty() {
            return Err(PdfRenderError::InvalidConfig(
                "renderer executable is empty".to_string(),
            ));
        }
        if config.timeout_ms == 0 {
            return Err(PdfRenderError::InvalidConfig(
                "renderer timeout must be greater than 0ms".to_string(),
            ));
        }
        Ok(Self { config })
    }
}

fn validate_page_url(raw: &str) -> Result<Url, PdfRenderError> {
    let trimmed = raw.trim();
    let parsed =
        Url::parse(trimmed).map_err(|_| PdfRenderError::InvalidUrl(trimmed.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(PdfRenderError::InvalidUrl(trimmed.to_string())),
    }
}

#[async_trait]
impl PdfRenderer for ChromePdfRenderer {
    async fn render(&self, url: &str) -> Result<Vec<u8>, PdfRenderError> {
        let page_url = validate_page_url(url)?;
        let output_dir = tempfile::tempdir()?;
        let output_path = output_dir.path().join(PDF_FILE_NAME);

        let mut command = Command::new(&self.config.executable);
        command.kill_on_drop(true);
        command.args([
            "--headless=new",
            "--no-sandbox",
            "--disable-setuid-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--no-first-run",
            "--no-zygote",
            "--no-pdf-header-footer",
            "--run-all-compositor-stages-before-draw",
        ]);
        command.args(&self.config.extra_args);
        command.arg(format!("--print-to-pdf={}", output_path.display()));
        command.arg(page_url.as_str());
        command.stdin(Stdio::null());
        command.stdout(Stdio::null());
        command.stderr(Stdio::piped());

        let child = command.spawn().map_err(|source| PdfRenderError::Spawn {
            executable: self.config.executable.clone(),
            source,
        })?;
        let output = tokio::time::timeout(
            Duration::from_millis(self.config.timeout_ms),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| PdfRenderError::Timeout(self.config.timeout_ms))??;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfRenderError::Failed {
                status,
                stderr: inkwire_core::truncate_for_error(stderr.trim(), STDERR_SUMMARY_MAX_CHARS),
            });
        }

        let bytes = match tokio::fs::read(&output_path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(PdfRenderError::MissingOutput(output_path.display().to_string()));
            }
            Err(error) => return Err(error.into()),
        };
        if bytes.is_empty() {
            return Err(PdfRenderError::MissingOutput(
                output_path.display().to_string(),
            ));
        }
        debug!(url = %page_url, bytes = bytes.len(), "rendered page to pdf");
        Ok(bytes)
    }
}
