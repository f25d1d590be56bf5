use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RichTextError {
    #[error("story block is not valid json: {0}")]
    Parse(String),
    #[error("story block root must be an object with a node type")]
    NotADocument,
}

/// Accepts a story block either as a JSON object or as a JSON-encoded string.
pub fn parse_story_block(value: &Value) -> Result<Value, RichTextError> {
    let document = match value {
        Value::String(raw) => serde_json::from_str::<Value>(raw)
            .map_err(|error| RichTextError::Parse(error.to_string()))?,
        other => other.clone(),
    };
    match document.get("type").and_then(Value::as_str) {
        Some(_) => Ok(document),
        None => Err(RichTextError::NotADocument),
    }
}

pub fn render_story_block(value: &Value) -> Result<String, RichTextError> {
    let document = parse_story_block(value)?;
    let mut html = String::new();
    render_node(&document, &mut html);
    Ok(html)
}

fn render_node(node: &Value, out: &mut String) {
    let Some(node) = node.as_object() else {
        return;
    };
    let node_type = node.get("type").and_then(Value::as_str).unwrap_or("");
    match node_type {
        "text" => render_text(node, out),
        "doc" => render_children(node, out),
        "paragraph" => wrap(node, "p", out),
        "heading" => {
            let level = attr_u64(node, "level").unwrap_or(1).clamp(1, 6);
            wrap(node, &format!("h{level}"), out);
        }
        "bulletList" => wrap(node, "ul", out),
        "orderedList" => match attr_u64(node, "start").filter(|start| *start != 1) {
            Some(start) => {
                out.push_str(&format!("<ol start=\"{start}\">"));
                render_children(node, out);
                out.push_str("</ol>");
            }
            None => wrap(node, "ol", out),
        },
        "listItem" => wrap(node, "li", out),
        "blockquote" => wrap(node, "blockquote", out),
        "codeBlock" => {
            out.push_str("<pre><code");
            if let Some(language) = attr_str(node, "language").filter(|value| !value.is_empty()) {
                out.push_str(&format!(" class=\"language-{}\"", escape_html(language)));
            }
            out.push('>');
            render_children(node, out);
            out.push_str("</code></pre>");
        }
        "hardBreak" => out.push_str("<br>"),
        "horizontalRule" => out.push_str("<hr>"),
        _ => render_children(node, out),
    }
}

fn wrap(node: &Map<String, Value>, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    render_children(node, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn render_children(node: &Map<String, Value>, out: &mut String) {
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            render_node(child, out);
        }
    }
}

fn render_text(node: &Map<String, Value>, out: &mut String) {
    let text = node.get("text").and_then(Value::as_str).unwrap_or("");
    let marks = node
        .get("marks")
        .and_then(Value::as_array)
        .map(|marks| marks.iter().filter_map(mark_tags).collect::<Vec<_>>())
        .unwrap_or_default();
    for (open, _) in &marks {
        out.push_str(open);
    }
    out.push_str(&escape_html(text));
    for (_, close) in marks.iter().rev() {
        out.push_str(close);
    }
}

fn mark_tags(mark: &Value) -> Option<(String, &'static str)> {
    let mark_type = mark.get("type").and_then(Value::as_str)?;
    let tags = match mark_type {
        "bold" => ("<strong>".to_string(), "</strong>"),
        "italic" => ("<em>".to_string(), "</em>"),
        "strike" => ("<s>".to_string(), "</s>"),
        "code" => ("<code>".to_string(), "</code>"),
        "link" => {
            let href = mark
                .get("attrs")
                .and_then(|attrs| attrs.get("href"))
                .and_then(Value::as_str)
                .unwrap_or("");
            (
                format!(
                    "<a target=\"_blank\" rel=\"noopener noreferrer nofollow\" href=\"{}\">",
                    escape_html(href)
                ),
                "</a>",
            )
        }
        _ => return None,
    };
    Some(tags)
}

fn attr_u64(node: &Map<String, Value>, key: &str) -> Option<u64> {
    node.get("attrs")
        .and_then(|attrs| attrs.get(key))
        .and_then(Value::as_u64)
}

fn attr_str<'a>(node: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    node.get("attrs")
        .and_then(|attrs| attrs.get(key))
        .and_then(Value::as_str)
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
