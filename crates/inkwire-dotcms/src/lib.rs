//! dotCMS content-system integration: the canonical article payload, the
//! [`ContentSystem`] seam and its reqwest-backed client.

pub mod canonical_content;
pub mod content_system;
pub mod contentlet;
pub mod dotcms_api_client;

pub use canonical_content::{CanonicalContent, DEFAULT_MEDIA_TYPE};
pub use content_system::{ContentSystem, CreatedContent};
pub use contentlet::{build_create_contentlet, build_update_patch, merge_contentlet, ContentletDefaults};
pub use dotcms_api_client::{DotcmsApiClient, DotcmsApiError, DotcmsClientConfig};
