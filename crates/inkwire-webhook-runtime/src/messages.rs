use inkwire_core::{format_us_date_time, sanitize_upstream_error};

pub const CREATING: &str = "🛠 Creating article… This may take ~a few seconds.";
pub const CREATED: &str = "Article created ✅";
pub const PLEASE_CREATE_FIRST: &str = "Please create article first❗";
pub const UPDATE_STARTING: &str = "⏳ Starting update. This may take a while...";
pub const UPDATED: &str = "Article updated 📝";

pub fn already_created(created_at: Option<&str>) -> String {
    format!(
        "⚠️ Article already created on {}.",
        format_us_date_time(created_at)
    )
}

pub fn no_changes(since: Option<&str>) -> String {
    format!(
        "Nothing to update — no changes detected since {}.❗️",
        format_us_date_time(since)
    )
}

pub fn create_failed(raw_error: &str) -> String {
    format!(
        "❌ Failed to create article: {}",
        sanitize_upstream_error(raw_error)
    )
}

pub fn update_failed(raw_error: &str) -> String {
    format!(
        "❌ Failed to update article: {}",
        sanitize_upstream_error(raw_error)
    )
}

pub fn extraction_failed(raw_error: &str) -> String {
    format!(
        "❌ Could not read task fields: {}",
        sanitize_upstream_error(raw_error)
    )
}

pub fn field_write_back_failed(field: &str, raw_error: &str) -> String {
    format!(
        "⚠️ Article created, but the task field <b>{field}</b> could not be updated: {}",
        sanitize_upstream_error(raw_error)
    )
}
