use async_trait::async_trait;
use serde_json::Value;

use crate::canonical_content::CanonicalContent;
use crate::dotcms_api_client::DotcmsApiError;

/// Result of a successful create: the new record identifier plus the raw
/// workflow response.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedContent {
    pub identifier: String,
    pub fired: Value,
}

#[async_trait]
pub trait ContentSystem: Send + Sync {
    async fn create_content(&self, content: &CanonicalContent)
        -> Result<CreatedContent, DotcmsApiError>;

    /// Fetches the record, merges the present fields of `content` over it and
    /// saves it through the workflow.
    async fn update_content(
        &self,
        identifier: &str,
        content: &CanonicalContent,
    ) -> Result<Value, DotcmsApiError>;
}
