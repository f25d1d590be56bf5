use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use inkwire_core::truncate_for_error;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::task_ids::permalink_url;
use crate::task_tracker::TaskTracker;
use crate::wrike_types::{
    TaskUpdate, WrikeAttachment, WrikeComment, WrikeContact, WrikeEnvelope, WrikeTask,
};

const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Error)]
pub enum WrikeApiError {
    #[error("wrike api {operation} request failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("wrike api {operation} failed with status {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode wrike {operation}: {source}")]
    Decode {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("wrike {operation} returned no record for {id}")]
    NotFound { operation: String, id: String },
    #[error("invalid wrike {operation} request: {message}")]
    InvalidRequest { operation: String, message: String },
}

impl WrikeApiError {
    /// HTTP status to surface to callers, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Transport { source, .. } | Self::Decode { source, .. } => {
                source.status().map(|status| status.as_u16())
            }
            Self::InvalidRequest { .. } => None,
        }
    }

    /// Upstream response body, when the failure carries one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct WrikeApiClient {
    http: reqwest::Client,
    api_base: reqwest::Url,
}

impl WrikeApiClient {
    pub fn new(api_base: &str, token: &str, request_timeout_ms: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("inkwire-bridge"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid wrike authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create wrike api client")?;
        let api_base = reqwest::Url::parse(api_base.trim_end_matches('/'))
            .with_context(|| format!("invalid wrike api base '{api_base}'"))?;
        Ok(Self {
            http: client,
            api_base,
        })
    }

    fn endpoint(&self, operation: &str, segments: &[&str]) -> Result<reqwest::Url, WrikeApiError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| WrikeApiError::InvalidRequest {
                operation: operation.to_string(),
                message: format!("api base '{}' cannot carry a path", self.api_base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_for_json<T>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, WrikeApiError>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|source| WrikeApiError::Transport {
                operation: operation.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(operation, status = status.as_u16(), "wrike api request rejected");
            return Err(WrikeApiError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| WrikeApiError::Decode {
                operation: operation.to_string(),
                source,
            })
    }

    async fn first_record<T>(
        &self,
        operation: &str,
        id: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, WrikeApiError>
    where
        T: DeserializeOwned,
    {
        let envelope: WrikeEnvelope<T> = self.send_for_json(operation, request).await?;
        envelope.into_first().ok_or_else(|| WrikeApiError::NotFound {
            operation: operation.to_string(),
            id: id.to_string(),
        })
    }
}

#[async_trait]
impl TaskTracker for WrikeApiClient {
    async fn get_task(&self, task_id: &str) -> Result<WrikeTask, WrikeApiError> {
        let url = self.endpoint("get task", &["tasks", task_id])?;
        self.first_record("get task", task_id, self.http.get(url))
            .await
    }

    async fn get_comment(&self, comment_id: &str) -> Result<WrikeComment, WrikeApiError> {
        let url = self.endpoint("get comment", &["comments", comment_id])?;
        self.first_record("get comment", comment_id, self.http.get(url))
            .await
    }

    async fn get_contact(&self, contact_id: &str) -> Result<WrikeContact, WrikeApiError> {
        let url = self.endpoint("get contact", &["contacts", contact_id])?;
        self.first_record("get contact", contact_id, self.http.get(url))
            .await
    }

    async fn post_comment(&self, task_id: &str, html: &str) -> Result<WrikeComment, WrikeApiError> {
        let url = self.endpoint("post comment", &["tasks", task_id, "comments"])?;
        let request = self.http.post(url).form(&[("text", html)]);
        self.first_record("post comment", task_id, request).await
    }

    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Value, WrikeApiError> {
        let url = self.endpoint("update task", &["tasks", task_id])?;
        self.send_for_json("update task", self.http.put(url).json(update))
            .await
    }

    async fn update_task_status(
        &self,
        task_id: &str,
        custom_status: &str,
    ) -> Result<Value, WrikeApiError> {
        let url = self.endpoint("update task status", &["tasks", task_id])?;
        let request = self.http.put(url).form(&[("customStatus", custom_status)]);
        self.send_for_json("update task status", request).await
    }

    async fn resolve_task_id(&self, permalink_id: &str) -> Result<String, WrikeApiError> {
        let url = self.endpoint("resolve task permalink", &["tasks"])?;
        let permalink = permalink_url(permalink_id);
        let request = self
            .http
            .get(url)
            .query(&[("permalink", permalink.as_str())]);
        let task: WrikeTask = self
            .first_record("resolve task permalink", permalink_id, request)
            .await?;
        Ok(task.id)
    }

    async fn upload_attachment(
        &self,
        task_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<WrikeAttachment, WrikeApiError> {
        let operation = "upload attachment";
        let url = self.endpoint(operation, &["tasks", task_id, "attachments"])?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|error| WrikeApiError::InvalidRequest {
                operation: operation.to_string(),
                message: error.to_string(),
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);
        self.first_record(operation, task_id, self.http.post(url).multipart(form))
            .await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::wrike_types::CustomFieldUpdate;

    fn client_for(server: &MockServer) -> WrikeApiClient {
        WrikeApiClient::new(&server.url("/api/v4"), "wrike-token", 5_000).expect("client")
    }

    #[tokio::test]
    async fn functional_get_task_reads_first_envelope_record_with_bearer_auth() {
        let server = MockServer::start();
        let task_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/tasks/IEAAAAAQKQ")
                .header("authorization", "Bearer wrike-token");
            then.status(200).json_body(json!({
                "kind": "tasks",
                "data": [{
                    "id": "IEAAAAAQKQ",
                    "title": "Quarterly outlook",
                    "permalink": "https://www.wrike.com/open.htm?id=1742609723",
                    "customFields": [{"id": "CF_TITLE", "value": "Outlook"}]
                }]
            }));
        });

        let task = client_for(&server)
            .get_task("IEAAAAAQKQ")
            .await
            .expect("task");
        assert_eq!(task.id, "IEAAAAAQKQ");
        assert_eq!(task.custom_field_value("CF_TITLE"), Some("Outlook"));
        task_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn regression_empty_envelope_maps_to_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v4/comments/IEAC1");
            then.status(200).json_body(json!({"kind": "comments", "data": []}));
        });

        let error = client_for(&server)
            .get_comment("IEAC1")
            .await
            .expect_err("missing comment");
        assert!(matches!(error, WrikeApiError::NotFound { .. }));
        assert_eq!(error.status(), Some(404));
    }

    #[tokio::test]
    async fn functional_non_success_status_carries_truncated_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path("/api/v4/tasks/IEAT1");
            then.status(403).body("x".repeat(2_000));
        });

        let error = client_for(&server)
            .update_task(
                "IEAT1",
                &TaskUpdate::custom_fields(vec![CustomFieldUpdate::new("CF", "yes")]),
            )
            .await
            .expect_err("forbidden");
        assert_eq!(error.status(), Some(403));
        let body = error.body().expect("body");
        assert!(body.ends_with("..."));
        assert!(body.chars().count() <= ERROR_BODY_MAX_CHARS + 3);
    }

    #[tokio::test]
    async fn functional_post_comment_sends_form_encoded_text() {
        let server = MockServer::start();
        let comment_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/tasks/IEAT1/comments")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_includes("text=Article+created");
            then.status(200).json_body(json!({
                "data": [{"id": "IEAC9", "taskId": "IEAT1", "text": "Article created"}]
            }));
        });

        let comment = client_for(&server)
            .post_comment("IEAT1", "Article created")
            .await
            .expect("comment");
        assert_eq!(comment.id, "IEAC9");
        comment_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn functional_update_task_sends_custom_fields_json() {
        let server = MockServer::start();
        let update_mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v4/tasks/IEAT1")
                .json_body(json!({"customFields": [{"id": "CF_ID", "value": "abc"}]}));
            then.status(200).json_body(json!({"data": [{"id": "IEAT1"}]}));
        });

        client_for(&server)
            .update_task(
                "IEAT1",
                &TaskUpdate::custom_fields(vec![CustomFieldUpdate::new("CF_ID", "abc")]),
            )
            .await
            .expect("update");
        update_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn functional_update_task_status_sends_form_custom_status() {
        let server = MockServer::start();
        let status_mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v4/tasks/IEAT1")
                .body_includes("customStatus=IEABCDEFGH");
            then.status(200).json_body(json!({"data": [{"id": "IEAT1"}]}));
        });

        let data = client_for(&server)
            .update_task_status("IEAT1", "IEABCDEFGH")
            .await
            .expect("status");
        assert_eq!(data["data"][0]["id"], "IEAT1");
        status_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn functional_resolve_task_id_queries_by_permalink() {
        let server = MockServer::start();
        let lookup_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/tasks")
                .query_param("permalink", "https://www.wrike.com/open.htm?id=1742609723");
            then.status(200)
                .json_body(json!({"data": [{"id": "IEAAAAAQKQ"}]}));
        });

        let resolved = client_for(&server)
            .resolve_task_id("1742609723")
            .await
            .expect("resolved");
        assert_eq!(resolved, "IEAAAAAQKQ");
        lookup_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn functional_upload_attachment_posts_multipart_file_part() {
        let server = MockServer::start();
        let upload_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v4/tasks/IEAT1/attachments")
                .body_includes("name=\"file\"")
                .body_includes("filename=\"outlook.pdf\"");
            then.status(200)
                .json_body(json!({"data": [{"id": "IEAATT1", "name": "outlook.pdf"}]}));
        });

        let attachment = client_for(&server)
            .upload_attachment("IEAT1", "outlook.pdf", "application/pdf", b"%PDF-1.4".to_vec())
            .await
            .expect("attachment");
        assert_eq!(attachment.id, "IEAATT1");
        upload_mock.assert_calls(1);
    }
}
