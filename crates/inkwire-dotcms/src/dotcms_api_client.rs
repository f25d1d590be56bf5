use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use inkwire_core::truncate_for_error;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::canonical_content::CanonicalContent;
use crate::content_system::{ContentSystem, CreatedContent};
use crate::contentlet::{
    build_create_contentlet, build_update_patch, merge_contentlet, ContentletDefaults,
};

const ERROR_BODY_MAX_CHARS: usize = 800;
const SAVE_ACTION_NAME: &str = "save";
const SAVE_COMMENTS: &str = "Updating via API";

#[derive(Debug, Error)]
pub enum DotcmsApiError {
    #[error("dotcms api {operation} request failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("dotcms api {operation} failed with status {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode dotcms {operation}: {source}")]
    Decode {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("contentlet with identifier {identifier} not found")]
    NotFound { identifier: String },
    #[error("dotcms create response carried no entity.identifier")]
    MissingIdentifier { fired: Value },
    #[error("invalid dotcms {operation} request: {message}")]
    InvalidRequest { operation: String, message: String },
}

impl DotcmsApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Transport { source, .. } | Self::Decode { source, .. } => {
                source.status().map(|status| status.as_u16())
            }
            Self::MissingIdentifier { .. } | Self::InvalidRequest { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotcmsClientConfig {
    pub api_base: String,
    pub token: String,
    pub workflow_action_id: String,
    pub contentlet_defaults: ContentletDefaults,
    pub request_timeout_ms: u64,
}

#[derive(Clone)]
pub struct DotcmsApiClient {
    http: reqwest::Client,
    api_base: reqwest::Url,
    workflow_action_id: String,
    contentlet_defaults: ContentletDefaults,
}

impl DotcmsApiClient {
    pub fn new(config: DotcmsClientConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("inkwire-bridge"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let auth_header = format!("Bearer {}", config.token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid dotcms authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create dotcms api client")?;
        let api_base = reqwest::Url::parse(config.api_base.trim_end_matches('/'))
            .with_context(|| format!("invalid dotcms api base '{}'", config.api_base))?;
        Ok(Self {
            http: client,
            api_base,
            workflow_action_id: config.workflow_action_id.trim().to_string(),
            contentlet_defaults: config.contentlet_defaults,
        })
    }

    fn endpoint(&self, operation: &str, segments: &[&str]) -> Result<reqwest::Url, DotcmsApiError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| DotcmsApiError::InvalidRequest {
                operation: operation.to_string(),
                message: format!("api base '{}' cannot carry a path", self.api_base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_for_json(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, DotcmsApiError> {
        let response = request
            .send()
            .await
            .map_err(|source| DotcmsApiError::Transport {
                operation: operation.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DotcmsApiError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|source| DotcmsApiError::Decode {
                operation: operation.to_string(),
                source,
            })
    }

    /// `GET /api/content/id/{identifier}`, first entry of `contentlets`.
    pub async fn fetch_contentlet(&self, identifier: &str) -> Result<Value, DotcmsApiError> {
        let url = self.endpoint("fetch contentlet", &["api", "content", "id", identifier])?;
        let payload = self
            .send_for_json("fetch contentlet", self.http.get(url))
            .await?;
        payload
            .get("contentlets")
            .and_then(Value::as_array)
            .and_then(|contentlets| contentlets.first())
            .filter(|contentlet| contentlet.is_object())
            .cloned()
            .ok_or_else(|| DotcmsApiError::NotFound {
                identifier: identifier.to_string(),
            })
    }
}

#[async_trait]
impl ContentSystem for DotcmsApiClient {
    async fn create_content(
        &self,
        content: &CanonicalContent,
    ) -> Result<CreatedContent, DotcmsApiError> {
        let operation = "fire create action";
        let url = self.endpoint(
            operation,
            &["api", "v1", "workflow", "actions", self.workflow_action_id.as_str(), "fire"],
        )?;
        let contentlet = build_create_contentlet(content, &self.contentlet_defaults);
        let fired = self
            .send_for_json(
                operation,
                self.http.put(url).json(&json!({ "contentlet": contentlet })),
            )
            .await?;
        let identifier = fired
            .pointer("/entity/identifier")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|identifier| !identifier.is_empty())
            .map(ToOwned::to_owned);
        match identifier {
            Some(identifier) => {
                debug!(identifier = %identifier, "dotcms create action fired");
                Ok(CreatedContent { identifier, fired })
            }
            None => Err(DotcmsApiError::MissingIdentifier { fired }),
        }
    }

    async fn update_content(
        &self,
        identifier: &str,
        content: &CanonicalContent,
    ) -> Result<Value, DotcmsApiError> {
        let current = self.fetch_contentlet(identifier).await?;
        let Some(current) = current.as_object() else {
            return Err(DotcmsApiError::NotFound {
                identifier: identifier.to_string(),
            });
        };
        let merged = merge_contentlet(current, &build_update_patch(content));

        let operation = "fire save action";
        let url = self.endpoint(operation, &["api", "v1", "workflow", "actions", "fire"])?;
        let body = json!({
            "actionName": SAVE_ACTION_NAME,
            "comments": SAVE_COMMENTS,
            "contentlet": merged,
        });
        self.send_for_json(operation, self.http.put(url).json(&body))
            .await
    }
}
