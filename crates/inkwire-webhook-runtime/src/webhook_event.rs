use serde_json::{Map, Value};

pub type RawEvent = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    TaskCreated {
        task_id: String,
    },
    CommentAdded {
        task_id: Option<String>,
        comment_id: String,
    },
    Other {
        event_type: String,
    },
}

impl WebhookEvent {
    pub fn from_raw(raw: &RawEvent) -> Self {
        let event_type = field_text(raw, "eventType").unwrap_or_default();
        match event_type.as_str() {
            "TaskCreated" => match field_text(raw, "taskId") {
                Some(task_id) => Self::TaskCreated { task_id },
                None => Self::Other { event_type },
            },
            "CommentAdded" => match field_text(raw, "commentId") {
                Some(comment_id) => Self::CommentAdded {
                    task_id: field_text(raw, "taskId"),
                    comment_id,
                },
                None => Self::Other { event_type },
            },
            _ => Self::Other { event_type },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TaskCreated { .. } => "task_created",
            Self::CommentAdded { .. } => "comment_added",
            Self::Other { .. } => "other",
        }
    }
}

/// Splits a webhook payload into its events, preserving order.
///
/// A single object is a batch of one; non-object array elements are skipped.
pub fn split_event_batch(payload: Value) -> Vec<RawEvent> {
    match payload {
        Value::Object(event) => vec![event],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(event) => Some(event),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// `webhookId|eventType|subject|moment`, where the subject is the first of
/// comment, task, folder or work-item id and the moment the first of the
/// created or last-updated date. Missing parts are empty.
pub fn dedupe_key(raw: &RawEvent) -> String {
    let first_of = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| field_text(raw, key))
            .unwrap_or_default()
    };
    [
        first_of(&["webhookId"]),
        first_of(&["eventType"]),
        first_of(&["commentId", "taskId", "folderId", "workItemId"]),
        first_of(&["createdDate", "lastUpdatedDate"]),
    ]
    .join("|")
}

fn field_text(raw: &RawEvent, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawEvent {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn unit_dedupe_key_prefers_comment_then_created_date() {
        let event = raw(json!({
            "webhookId": "WH1",
            "eventType": "CommentAdded",
            "commentId": "IEAC1",
            "taskId": "IEAT1",
            "createdDate": "2025-06-01T10:00:00Z",
            "lastUpdatedDate": "2025-06-01T11:00:00Z"
        }));
        assert_eq!(
            dedupe_key(&event),
            "WH1|CommentAdded|IEAC1|2025-06-01T10:00:00Z"
        );
    }

    #[test]
    fn unit_dedupe_key_fills_missing_parts_with_empty_strings() {
        let event = raw(json!({"eventType": "FolderCreated", "folderId": "IEAF1"}));
        assert_eq!(dedupe_key(&event), "|FolderCreated|IEAF1|");
        assert_eq!(dedupe_key(&RawEvent::new()), "|||");
    }

    #[test]
    fn functional_redelivered_event_yields_identical_key() {
        let first = raw(json!({"webhookId": "WH1", "eventType": "TaskCreated", "taskId": "IEAT1", "lastUpdatedDate": "t1"}));
        let second = raw(json!({"lastUpdatedDate": "t1", "taskId": "IEAT1", "eventType": "TaskCreated", "webhookId": "WH1"}));
        assert_eq!(dedupe_key(&first), dedupe_key(&second));
    }

    #[test]
    fn functional_split_event_batch_handles_object_array_and_junk() {
        assert_eq!(split_event_batch(json!({"eventType": "TaskCreated"})).len(), 1);
        let batch = split_event_batch(json!([{"eventType": "A"}, 7, "x", null, {"eventType": "B"}]));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1]["eventType"], "B");
        assert!(split_event_batch(json!("scalar")).is_empty());
    }

    #[test]
    fn unit_event_kinds_are_classified_from_event_type() {
        assert_eq!(
            WebhookEvent::from_raw(&raw(json!({"eventType": "TaskCreated", "taskId": "IEAT1"}))),
            WebhookEvent::TaskCreated { task_id: "IEAT1".to_string() }
        );
        assert_eq!(
            WebhookEvent::from_raw(&raw(json!({"eventType": "CommentAdded", "commentId": "IEAC1"}))),
            WebhookEvent::CommentAdded { task_id: None, comment_id: "IEAC1".to_string() }
        );
        assert_eq!(
            WebhookEvent::from_raw(&raw(json!({"eventType": "CommentAdded"}))).kind(),
            "other"
        );
        assert_eq!(
            WebhookEvent::from_raw(&raw(json!({"eventType": "TaskStatusChanged", "taskId": "IEAT1"}))).kind(),
            "other"
        );
    }
}
