//! Canonical codec for yes/no task custom fields.
//!
//! Extraction, the create workflow, and the reverse sync endpoint all read or
//! write the creation-locked flag through these functions so the accepted
//! spellings live in exactly one place.

const TRUTHY_SPELLINGS: [&str; 4] = ["yes", "y", "true", "1"];
const FALSY_SPELLINGS: [&str; 4] = ["no", "n", "false", "0"];

/// Decodes a custom field value; anything outside the truthy spellings is `false`.
pub fn decode_yes_no(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let normalized = value.trim().to_ascii_lowercase();
    TRUTHY_SPELLINGS.contains(&normalized.as_str())
}

/// Encodes a boolean as the lowercase value written back to the task.
pub fn encode_yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Normalizes free-form input to `yes`/`no`, or `None` when it is neither.
pub fn normalize_yes_no(value: &str) -> Option<&'static str> {
    let normalized = value.trim().to_ascii_lowercase();
    if TRUTHY_SPELLINGS.contains(&normalized.as_str()) {
        return Some(encode_yes_no(true));
    }
    if FALSY_SPELLINGS.contains(&normalized.as_str()) {
        return Some(encode_yes_no(false));
    }
    None
}
