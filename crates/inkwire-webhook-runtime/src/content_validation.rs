use inkwire_core::parse_publication_date;
use inkwire_dotcms::CanonicalContent;

pub const TITLE_LABEL: &str = "Title";
pub const DATE_OF_PUBLICATION_LABEL: &str = "Date of publication";
pub const SUMMARY_LABEL: &str = "Summary";
pub const CONTENT_LABEL: &str = "Content";
pub const MEDIA_TYPE_LABEL: &str = "Media Type";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub missing: Vec<&'static str>,
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.issues.is_empty()
    }

    /// Comment body listing every missing field and then each issue.
    pub fn render_comment(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            let lead = if self.missing.len() > 1 {
                "These fields are"
            } else {
                "This field is"
            };
            parts.push(format!(
                "⚠️ Note: {lead} required and missing: <b><i>{}</i></b><br/><br/>",
                self.missing.join(", ")
            ));
        }
        for issue in &self.issues {
            parts.push(format!("⚠️ {issue}<br/>"));
        }
        parts.join("\n")
    }
}

/// Checks that every required article field is present and usable.
pub fn validate_content(content: &CanonicalContent) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (label, value) in [
        (TITLE_LABEL, &content.title),
        (SUMMARY_LABEL, &content.summary),
        (CONTENT_LABEL, &content.content),
        (MEDIA_TYPE_LABEL, &content.media_type),
    ] {
        if value.trim().is_empty() {
            report.missing.push(label);
        }
    }
    if content.date_of_publication.trim().is_empty() {
        report.missing.push(DATE_OF_PUBLICATION_LABEL);
    } else if parse_publication_date(&content.date_of_publication).is_none() {
        report.issues.push(format!(
            "{DATE_OF_PUBLICATION_LABEL} must be a valid date (YYYY-MM-DD recommended)."
        ));
    }
    report
}
