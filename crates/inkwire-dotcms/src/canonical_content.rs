use inkwire_core::create_slug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MEDIA_TYPE: &str = "read";

/// Article fields as read from a task, and the only payload sent to the CMS.
///
/// Its serialized JSON is also the unit of change detection, so field order
/// and naming here are part of the snapshot hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalContent {
    #[serde(rename = "wrikeTicketId", skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub title: String,
    pub title_url_slug: String,
    pub summary: String,
    pub date_of_publication: String,
    pub content: String,
    pub media_type: String,
    pub meta_description: String,
    pub meta_title: String,
    pub allow_only_update: bool,
}

impl CanonicalContent {
    /// Trims every string field, lowercases the media type, drops blank
    /// identifiers and derives the slug from the title when none was supplied.
    /// A blank media type stays blank so validation can report it.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.title,
            &mut self.title_url_slug,
            &mut self.summary,
            &mut self.date_of_publication,
            &mut self.content,
            &mut self.meta_description,
            &mut self.meta_title,
        ] {
            *field = field.trim().to_string();
        }
        self.media_type = self.media_type.trim().to_lowercase();
        self.identifier = trimmed_non_empty(self.identifier.take());
        self.ticket_id = trimmed_non_empty(self.ticket_id.take());
        if self.title_url_slug.is_empty() {
            self.title_url_slug = create_slug(&self.title);
        }
        self
    }

    pub fn has_identifier(&self) -> bool {
        self.identifier.is_some()
    }

    /// True when none of the editable text fields carries a value.
    pub fn has_no_editable_text(&self) -> bool {
        [
            &self.title,
            &self.summary,
            &self.content,
            &self.meta_title,
            &self.meta_description,
        ]
        .iter()
        .all(|field| field.is_empty())
    }
}

fn trimmed_non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
