use inkwire_core::to_iso_date;
use serde_json::{json, Map, Value};

use crate::canonical_content::CanonicalContent;

/// Values every new contentlet carries regardless of the article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentletDefaults {
    pub content_type: String,
    pub language_id: u64,
    pub site: Option<String>,
}

impl Default for ContentletDefaults {
    fn default() -> Self {
        Self {
            content_type: "usInsightArticle".to_string(),
            language_id: 1,
            site: None,
        }
    }
}

fn publication_date_value(raw: &str) -> Value {
    to_iso_date(raw).map_or(Value::Null, Value::String)
}

/// Contentlet body for the create workflow action.
pub fn build_create_contentlet(content: &CanonicalContent, defaults: &ContentletDefaults) -> Value {
    let mut contentlet = json!({
        "contentType": defaults.content_type,
        "languageId": defaults.language_id,
        "title": content.title,
        "titleUrlSlug": content.title_url_slug,
        "summary": content.summary,
        "content": content.content,
        "wrikeTicketId": content.ticket_id,
        "dateOfPublication": publication_date_value(&content.date_of_publication),
        "fullWidth": false,
        "showBannerUnderTitle": false,
        "showBannerOnArticlePage": false,
        "useCustomDisclaimer": false,
        "siteType": { "golf": false },
        "mediaType": content.media_type,
    });
    if let Some(object) = contentlet.as_object_mut() {
        if let Some(site) = defaults.site.as_deref().filter(|site| !site.trim().is_empty()) {
            object.insert("siteOrFolder".to_string(), Value::String(site.to_string()));
        }
        for (key, value) in [
            ("metaDescription", &content.meta_description),
            ("metaTitle", &content.meta_title),
        ] {
            if !value.is_empty() {
                object.insert(key.to_string(), Value::String(value.clone()));
            }
        }
    }
    contentlet
}

/// Present, non-empty article fields to lay over an existing contentlet.
///
/// Empty task fields never blank out CMS values.
pub fn build_update_patch(content: &CanonicalContent) -> Map<String, Value> {
    let mut patch = Map::new();
    let text_fields = [
        ("title", &content.title),
        ("titleUrlSlug", &content.title_url_slug),
        ("summary", &content.summary),
        ("content", &content.content),
        ("mediaType", &content.media_type),
        ("metaDescription", &content.meta_description),
        ("metaTitle", &content.meta_title),
    ];
    for (key, value) in text_fields {
        if !value.is_empty() {
            patch.insert(key.to_string(), Value::String(value.clone()));
        }
    }
    if let Some(date) = to_iso_date(&content.date_of_publication) {
        patch.insert("dateOfPublication".to_string(), Value::String(date));
    }
    if let Some(ticket_id) = content.ticket_id.as_deref() {
        patch.insert("wrikeTicketId".to_string(), Value::String(ticket_id.to_string()));
    }
    patch
}

/// Shallow-merges `patch` over `current`, keeping the record's own
/// `contentType` and `identifier`.
pub fn merge_contentlet(current: &Map<String, Value>, patch: &Map<String, Value>) -> Value {
    let mut merged = current.clone();
    for (key, value) in patch {
        if key == "contentType" || key == "identifier" {
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}
