//! Foundational low-level utilities shared across Inkwire crates.
//!
//! Provides time formatting, markup/text normalization helpers, the shared
//! yes/no field codec, and the bounded in-memory stores used by the webhook
//! runtime for duplicate suppression and lookup caching.

pub mod bounded_store;
pub mod text_utils;
pub mod time_utils;
pub mod yes_no;

pub use bounded_store::{BoundedCache, BoundedKeySet};
pub use text_utils::{create_slug, sanitize_upstream_error, strip_html, truncate_for_error};
pub use time_utils::{
    current_unix_timestamp, current_unix_timestamp_ms, format_dd_mm_yyyy, format_us_date_time,
    now_rfc3339, parse_publication_date, to_iso_date,
};
pub use yes_no::{decode_yes_no, encode_yes_no, normalize_yes_no};
