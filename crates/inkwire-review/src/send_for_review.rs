use inkwire_webhook_runtime::AckResponder;
use inkwire_wrike::TaskTracker;
use reqwest::Url;
use serde::Deserialize;
use tracing::info;

use crate::pdf_renderer::PdfRenderer;
use crate::request_fields::{deserialize_text, require_task_id, resolve_api_task_id};
use crate::rich_text::escape_html;
use crate::review_error::ReviewError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const FALLBACK_FILE_STEM: &str = "article";
const MAX_FILE_STEM_CHARS: usize = 120;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendForReviewRequest {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub persona: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDelivery {
    pub task_id: String,
    pub attachment_id: String,
    pub file_name: String,
    pub comment_posted: bool,
}

/// Attachment name for a rendered page: the URL's last path segment with
/// anything outside `[A-Za-z0-9_-]` collapsed to `-`.
pub fn review_file_name(page_url: &str) -> String {
    let segment = Url::parse(page_url.trim())
        .ok()
        .and_then(|url| {
            url.path_segments().and_then(|segments| {
                segments
                    .rev()
                    .find(|segment| !segment.is_empty())
                    .map(ToOwned::to_owned)
            })
        })
        .unwrap_or_default();
    let segment = segment
        .strip_suffix(".html")
        .or_else(|| segment.strip_suffix(".htm"))
        .unwrap_or(&segment);

    let mut stem = String::with_capacity(segment.len());
    for ch in segment.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            stem.push(ch);
        } else if !stem.ends_with('-') {
            stem.push('-');
        }
    }
    let stem: String = stem
        .trim_matches('-')
        .chars()
        .take(MAX_FILE_STEM_CHARS)
        .collect();
    if stem.is_empty() {
        format!("{FALLBACK_FILE_STEM}.pdf")
    } else {
        format!("{stem}.pdf")
    }
}

pub fn review_comment_html(page_url: &str, file_name: &str) -> String {
    format!(
        concat!(
            "<div>",
            "<p>The PDF for the article has been successfully generated. ",
            "Please review the content and confirm the details. Your feedback is appreciated.</p>",
            "<h3 style=\"color: #2a7e99;\">🔗 <strong>Access the WebSite:</strong></h3>",
            "<p style=\"font-size: 16px; color: #333;\">",
            "<a href=\"{url}\" target=\"_blank\" style=\"color: #1d74d7; text-decoration: none; font-weight: bold;\">Click here </a>",
            "</p><br /><br />",
            "<p style=\"font-size: 16px; color: #333;\"><strong style=\"color: #5e9ed6;\">🔗 Attached PDF Name:</strong> ",
            "<span style=\"font-weight: bold; color: #ff6347;\">{file}</span></p>",
            "</div>"
        ),
        url = escape_html(page_url.trim()),
        file = escape_html(file_name),
    )
}

/// Renders the page, attaches the PDF to the task and posts the review comment.
///
/// The comment is best effort; a failed post still reports the delivery.
pub async fn send_for_review(
    tracker: &dyn TaskTracker,
    renderer: &dyn PdfRenderer,
    acks: &AckResponder,
    request: &SendForReviewRequest,
) -> Result<ReviewDelivery, ReviewError> {
    let page_url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ReviewError::invalid("url is required"))?;
    let task_id = resolve_api_task_id(tracker, require_task_id(request.task_id.as_deref())?).await?;
    info!(
        task_id = %task_id,
        url = page_url,
        persona = request.persona.as_deref().unwrap_or(""),
        "rendering page for review"
    );

    let pdf = renderer.render(page_url).await?;
    let file_name = review_file_name(page_url);
    let attachment = tracker
        .upload_attachment(&task_id, &file_name, PDF_CONTENT_TYPE, pdf)
        .await?;
    let comment_posted = acks
        .post(&task_id, &review_comment_html(page_url, &file_name))
        .await;

    Ok(ReviewDelivery {
        task_id,
        attachment_id: attachment.id,
        file_name,
        comment_posted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_file_name_uses_last_path_segment() {
        assert_eq!(
            review_file_name("https://example.com/insights/rates-outlook-2025/"),
            "rates-outlook-2025.pdf"
        );
        assert_eq!(
            review_file_name("https://example.com/insights/q3_review,final.html?draft=1"),
            "q3_review-final.pdf"
        );
    }

    #[test]
    fn regression_file_name_falls_back_to_article() {
        assert_eq!(review_file_name("https://example.com/"), "article.pdf");
        assert_eq!(review_file_name("not a url"), "article.pdf");
        assert_eq!(review_file_name("https://example.com/%%%/"), "article.pdf");
    }

    #[test]
    fn unit_review_comment_escapes_url_and_file_name() {
        let html = review_comment_html("https://example.com/a?x=1&y=2", "a<b>.pdf");
        assert!(html.contains("href=\"https://example.com/a?x=1&amp;y=2\""));
        assert!(html.contains("a&lt;b&gt;.pdf"));
        assert!(html.contains("Attached PDF Name"));
    }
}
