use unicode_normalization::UnicodeNormalization;

const UPSTREAM_ERROR_MAX_CHARS: usize = 500;

/// Removes markup tags and decodes the small set of named entities Wrike emits.
///
/// A `<` only opens a tag when a closing `>` follows it; an unterminated `<`
/// is kept as text.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let mut plain = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        plain.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    plain.push_str(rest);
    plain
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
}

/// Builds a lowercase URL slug: diacritics folded, punctuation dropped,
/// whitespace runs replaced with `-`.
pub fn create_slug(input: &str) -> String {
    let folded = input
        .nfkd()
        .filter(|ch| !('\u{0300}'..='\u{036f}').contains(ch))
        .filter(|ch| ch.is_ascii_alphanumeric() || ch.is_whitespace() || *ch == '-')
        .collect::<String>();
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Truncates text to `max_chars` characters, marking the cut.
pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// Prepares upstream error text for inclusion in a task comment.
///
/// Markup is removed so upstream HTML is never re-injected into a comment,
/// whitespace is collapsed, and the result is bounded in length.
pub fn sanitize_upstream_error(raw: &str) -> String {
    let plain = strip_html(raw);
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "unknown error".to_string();
    }
    let bounded = truncate_for_error(&collapsed, UPSTREAM_ERROR_MAX_CHARS);
    bounded.replace('<', "&lt;").replace('>', "&gt;")
}
