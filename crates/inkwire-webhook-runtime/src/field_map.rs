use serde::Deserialize;
use thiserror::Error;

/// Task custom-field ids the bridge reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldMap {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub media_type: String,
    pub date_of_publication: String,
    pub meta_description: String,
    pub meta_title: String,
    pub identifier: String,
    pub creation_locked: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("field map entry '{field}' must be a non-blank custom field id")]
pub struct FieldMapError {
    pub field: &'static str,
}

impl FieldMap {
    pub fn validate(&self) -> Result<(), FieldMapError> {
        for (field, value) in self.entries() {
            if value.trim().is_empty() {
                return Err(FieldMapError { field });
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("title", self.title.as_str()),
            ("summary", self.summary.as_str()),
            ("content", self.content.as_str()),
            ("media_type", self.media_type.as_str()),
            ("date_of_publication", self.date_of_publication.as_str()),
            ("meta_description", self.meta_description.as_str()),
            ("meta_title", self.meta_title.as_str()),
            ("identifier", self.identifier.as_str()),
            ("creation_locked", self.creation_locked.as_str()),
        ]
    }
}

#[cfg(test)]
pub(crate) fn sample_field_map() -> FieldMap {
    FieldMap {
        title: "CF_TITLE".to_string(),
        summary: "CF_SUMMARY".to_string(),
        content: "CF_CONTENT".to_string(),
        media_type: "CF_MEDIA".to_string(),
        date_of_publication: "CF_DATE".to_string(),
        meta_description: "CF_META_DESC".to_string(),
        meta_title: "CF_META_TITLE".to_string(),
        identifier: "CF_IDENTIFIER".to_string(),
        creation_locked: "CF_LOCKED".to_string(),
    }
}
