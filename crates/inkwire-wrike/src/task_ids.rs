//! Task id helpers for the numeric permalink ids editors copy out of Wrike.

use std::sync::OnceLock;

use regex::Regex;

const PERMALINK_BASE: &str = "https://www.wrike.com/open.htm?id=";

/// True when `value` is a bare numeric permalink id.
pub fn is_permalink_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

pub fn permalink_url(permalink_id: &str) -> String {
    format!("{PERMALINK_BASE}{permalink_id}")
}

/// Pulls the numeric permalink id out of a bare id, a Wrike URL or free text.
///
/// URLs are searched in order: `id` query parameter, `t`/`id` in the
/// fragment, a run of six or more digits in the path. Non-URL text is
/// searched for `id=`/`t=` pairs, then any run of six or more digits.
pub fn extract_permalink_task_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if is_permalink_id(trimmed) {
        return Some(trimmed.to_string());
    }

    let Ok(url) = reqwest::Url::parse(trimmed) else {
        return find_key_digits(trimmed).or_else(|| find_digit_run(trimmed));
    };

    if let Some(id) = url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| is_permalink_id(value))
    {
        return Some(id);
    }

    if let Some(fragment) = url.fragment().filter(|fragment| !fragment.is_empty()) {
        let pairs = fragment
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .collect::<Vec<_>>();
        let by_key = |wanted: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == wanted)
                .map(|(_, value)| *value)
        };
        if let Some(id) = by_key("t")
            .filter(|value| !value.is_empty())
            .or_else(|| by_key("id"))
            .filter(|value| is_permalink_id(value))
        {
            return Some(id.to_string());
        }
        if let Some(id) = find_key_digits(fragment) {
            return Some(id);
        }
    }

    find_digit_run(url.path())
}

static KEY_DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
static DIGIT_RUN: OnceLock<Option<Regex>> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// First word-bounded `id=<digits>` or `t=<digits>` pair, keys case-insensitive.
fn find_key_digits(text: &str) -> Option<String> {
    compiled(&KEY_DIGITS, r"(?i)\b(?:id|t)=([0-9]+)\b")?
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|digits| digits.as_str().to_string())
}

fn find_digit_run(text: &str) -> Option<String> {
    compiled(&DIGIT_RUN, r"[0-9]{6,}")?
        .find(text)
        .map(|digits| digits.as_str().to_string())
}
