use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
/// Wrike wraps every resource list in `{ "kind": ..., "data": [...] }`.
pub struct WrikeEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> WrikeEnvelope<T> {
    pub fn into_first(self) -> Option<T> {
        self.data.into_iter().next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrikeCustomField {
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_field_value")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrikeTask {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<WrikeCustomField>,
}

impl WrikeTask {
    /// Returns the value of the custom field with `field_id`, if set.
    pub fn custom_field_value(&self, field_id: &str) -> Option<&str> {
        if field_id.is_empty() {
            return None;
        }
        self.custom_fields
            .iter()
            .find(|field| field.id == field_id)
            .and_then(|field| field.value.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrikeComment {
    pub id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrikeContact {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl WrikeContact {
    /// `first last` when either part is present, else the contact name, else the id.
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        if !first.is_empty() || !last.is_empty() {
            return format!("{first} {last}").trim().to_string();
        }
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| self.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrikeAttachment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomFieldUpdate {
    pub id: String,
    pub value: String,
}

impl CustomFieldUpdate {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Body of `PUT /tasks/{id}`.
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaskUpdate {
    pub fn custom_fields(fields: Vec<CustomFieldUpdate>) -> Self {
        Self {
            custom_fields: fields,
            description: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.custom_fields.is_empty() && self.description.is_none()
    }
}

fn deserialize_field_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unit_task_custom_field_lookup_reads_string_and_scalar_values() {
        let task: WrikeTask = serde_json::from_value(json!({
            "id": "IEAAA",
            "permalink": "https://www.wrike.com/open.htm?id=1742609723",
            "customFields": [
                {"id": "CF_TITLE", "value": "Hello"},
                {"id": "CF_COUNT", "value": 3},
                {"id": "CF_EMPTY", "value": null}
            ]
        }))
        .expect("task");
        assert_eq!(task.custom_field_value("CF_TITLE"), Some("Hello"));
        assert_eq!(task.custom_field_value("CF_COUNT"), Some("3"));
        assert_eq!(task.custom_field_value("CF_EMPTY"), None);
        assert_eq!(task.custom_field_value("CF_MISSING"), None);
        assert_eq!(task.custom_field_value(""), None);
    }

    #[test]
    fn unit_contact_display_name_prefers_first_last_then_name_then_id() {
        let full = WrikeContact {
            id: "KUA1".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            name: None,
        };
        assert_eq!(full.display_name(), "Ada Lovelace");
        let named = WrikeContact {
            id: "KUA2".to_string(),
            first_name: None,
            last_name: None,
            name: Some("Review Bot".to_string()),
        };
        assert_eq!(named.display_name(), "Review Bot");
        let bare = WrikeContact {
            id: "KUA3".to_string(),
            first_name: Some(" ".to_string()),
            last_name: None,
            name: None,
        };
        assert_eq!(bare.display_name(), "KUA3");
    }

    #[test]
    fn unit_task_update_skips_empty_parts_when_serialized() {
        let update = TaskUpdate::custom_fields(vec![CustomFieldUpdate::new("CF", "yes")]);
        assert_eq!(
            serde_json::to_value(&update).expect("json"),
            json!({"customFields": [{"id": "CF", "value": "yes"}]})
        );
        assert!(TaskUpdate::default().is_empty());
    }
}
