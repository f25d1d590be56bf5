use inkwire_core::strip_html;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Short-command forms, matched against the normalized (lowercase) comment.
/// Anchored so longer sentences, including the bridge's own replies, never
/// read as commands.
const CREATE_PATTERNS: &[&str] = &[
    r"^[/!#]?\s*(?:please\s+)?create(?:\s+(?:the\s+)?article)?(?:\s+now)?(?:\s+please)?\s*[.!?]*$",
];
const UPDATE_PATTERNS: &[&str] = &[
    r"^[/!#]?\s*(?:please\s+)?update(?:\s+(?:the\s+)?article)?(?:\s+now)?(?:\s+please)?\s*[.!?]*$",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Create,
    Update,
    None,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::None => "none",
        }
    }
}

/// Reduces comment HTML to the form command patterns are written against:
/// tags stripped, entities decoded, NFKC applied, Cyrillic `С`/`с` mapped to
/// Latin `C`, whitespace collapsed, lowercased.
pub fn normalize_command_text(html: &str) -> String {
    let plain = strip_html(html);
    let normalized = plain
        .nfkc()
        .map(|ch| match ch {
            '\u{0421}' | '\u{0441}' => 'C',
            other => other,
        })
        .collect::<String>();
    normalized
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
pub struct CommandClassifier {
    create: Vec<Regex>,
    update: Vec<Regex>,
}

impl CommandClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_patterns(CREATE_PATTERNS, UPDATE_PATTERNS)
    }

    pub fn with_patterns(create: &[&str], update: &[&str]) -> Result<Self, regex::Error> {
        let compile = |patterns: &[&str]| {
            patterns
                .iter()
                .map(|pattern| Regex::new(pattern))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            create: compile(create)?,
            update: compile(update)?,
        })
    }

    /// Create patterns are consulted first, so a comment matching both
    /// tables classifies as [`Command::Create`].
    pub fn classify(&self, comment_html: &str) -> Command {
        let text = normalize_command_text(comment_html);
        if text.is_empty() {
            return Command::None;
        }
        if self.create.iter().any(|pattern| pattern.is_match(&text)) {
            return Command::Create;
        }
        if self.update.iter().any(|pattern| pattern.is_match(&text)) {
            return Command::Update;
        }
        Command::None
    }
}
