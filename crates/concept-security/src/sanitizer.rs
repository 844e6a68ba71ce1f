//! Input sanitizers for the three trust boundaries of the service: document
//! store updates, HTML-adjacent display, and language-model prompts.
//!
//! Every function here is pure. A call either returns text that satisfies
//! the sanitizer's contract or a [`ConceptError`]; there is no best-effort
//! partial result. The pattern lists are denylists for the fields this
//! service handles, not a general-purpose sanitizer. New attack shapes need
//! new entries.

use concept_core::{ConceptError, ConceptResult, ObjectId};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Hard cap on prompt-sanitized text, in characters.
pub const MAX_PROMPT_CHARS: usize = 100;

const SENSITIVE_PATHS: &[&str] = &[
    "etc/passwd",
    "system32",
    "windows",
    "config/sam",
    "var/log",
    "boot.ini",
    "autoexec.bat",
];

const DANGEROUS_TAGS: &[&str] = &[
    "script", "iframe", "object", "embed", "form", "meta", "base", "link", "style", "svg",
    "audio", "video",
];

const DANGEROUS_ATTRS: &[&str] = &[
    "onload",
    "onerror",
    "onclick",
    "onmouseover",
    "onmouseout",
    "onfocus",
    "onblur",
    "onsubmit",
    "onreset",
    "onchange",
    "onkeydown",
    "onkeyup",
    "onkeypress",
    "href",
    "src",
];

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("sanitizer pattern must compile")
}

fn alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

// --- generic text ---

static QUERY_OPERATORS: LazyLock<Regex> = LazyLock::new(|| compile(r"[{}$]"));

static TRAVERSAL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r"\.\.[\\/]"),
        compile(r"(?i)%2e%2e%2f"),
        compile(r"(?i)%2e%2e%5c"),
    ]
});

static DOT_RUN: LazyLock<Regex> = LazyLock::new(|| compile(r"\.{4,}"));

static FILE_SCHEME: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)file://"));

static UNC_PREFIX: LazyLock<Regex> = LazyLock::new(|| compile(r"\\\\[^\\]+\\"));

static SENSITIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!("(?i){}", alternation(SENSITIVE_PATHS))));

// --- html ---

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?is)<script[^>]*>.*?</script>"));

static DANGEROUS_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!("(?i)<(?:{})[^>]*>", alternation(DANGEROUS_TAGS))));

static DANGEROUS_CLOSE_TAG: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!("(?i)</(?:{})>", alternation(DANGEROUS_TAGS))));

static QUOTED_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"(?i)(?:{})\s*=\s*["'][^"']*["']"#,
        alternation(DANGEROUS_ATTRS)
    ))
});

static UNQUOTED_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)(?:{})\s*=\s*[^\s>]*",
        alternation(DANGEROUS_ATTRS)
    ))
});

static JS_SCHEME: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)javascript:"));

// --- prompt ---

/// Applied in order; later patterns see the output of earlier ones.
static PROMPT_OVERRIDES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"ignore.*previous.*instructions?",
        r"forget.*above",
        r"act.*as.*if",
        r"pretend.*to.*be",
        r"system[:\s]",
        r"assistant[:\s]",
        r"user[:\s]",
        r"\[.*\]",
        r"```",
        r"---",
        r"<.*>",
        r"\n\n",
        r"\\n",
    ]
    .iter()
    .map(|p| compile(&format!("(?i){p}")))
    .collect()
});

static PROMPT_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| compile(r"[^a-zA-Z0-9\s\-_.,&()]"));

/// Passes allowed before still-changing text is rejected.
const MAX_PASSES: usize = 32;

/// Raw input longer than this multiple of the output limit is rejected
/// before any pattern runs.
const RAW_LENGTH_FACTOR: usize = 8;

/// Re-apply `pass` until the text stops changing.
///
/// Each pass peels one layer of a nested payload, so the pass count is
/// capped; text still changing after [`MAX_PASSES`] is rejected.
fn until_stable(input: &str, pass: impl Fn(&str) -> String) -> ConceptResult<String> {
    let mut current = input.to_string();
    for _ in 0..MAX_PASSES {
        let next = pass(&current);
        if next == current {
            return Ok(current);
        }
        current = next;
    }
    Err(ConceptError::InvalidInput(
        "Input could not be sanitized".to_string(),
    ))
}

fn check_raw_length(input: &str, max_length: usize) -> ConceptResult<()> {
    if input.chars().count() > max_length.saturating_mul(RAW_LENGTH_FACTOR) {
        return Err(ConceptError::InvalidInput(format!(
            "Input too long (max {max_length} characters)"
        )));
    }
    Ok(())
}

fn strip_generic(input: &str) -> String {
    let mut s = QUERY_OPERATORS.replace_all(input, "").into_owned();
    for re in TRAVERSAL.iter() {
        s = re.replace_all(&s, "").into_owned();
    }
    s = DOT_RUN.replace_all(&s, "...").into_owned();
    s = FILE_SCHEME.replace_all(&s, "").into_owned();
    s = UNC_PREFIX.replace_all(&s, "").into_owned();
    SENSITIVE_PATH.replace_all(&s, "").into_owned()
}

/// Clean a short free-text field (username, interest, category) for use in
/// a store update.
///
/// Removes query-operator characters, path traversal sequences, file and
/// UNC paths, and a fixed set of sensitive path fragments, then trims.
/// Over-long results are rejected rather than truncated, as is raw input far
/// beyond `max_length`.
pub fn sanitize(input: &str, max_length: usize) -> ConceptResult<String> {
    check_raw_length(input, max_length)?;
    let cleaned = until_stable(input, strip_generic)?;
    let cleaned = cleaned.trim();

    if cleaned.chars().count() > max_length {
        return Err(ConceptError::InvalidInput(format!(
            "Input too long (max {max_length} characters)"
        )));
    }
    if cleaned.is_empty() {
        return Err(ConceptError::InvalidInput(
            "Input cannot be empty".to_string(),
        ));
    }
    Ok(cleaned.to_string())
}

/// Escape the HTML reserved characters so residual markup renders as text.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Clean longer text (terms, explanations) that may end up rendered as HTML.
///
/// Script blocks, denylisted tags, event/URL attributes and `javascript:`
/// markers are stripped first; whatever survives is escaped. The escape is
/// the guarantee, the stripping only reduces noise. Empty output is allowed.
/// The length limit applies to the escaped text.
pub fn sanitize_html(input: &str, max_length: usize) -> ConceptResult<String> {
    let s = input.trim();
    let s = SCRIPT_BLOCK.replace_all(s, "");
    let s = DANGEROUS_OPEN_TAG.replace_all(&s, "");
    let s = DANGEROUS_CLOSE_TAG.replace_all(&s, "");
    let s = QUOTED_ATTR.replace_all(&s, "");
    let s = UNQUOTED_ATTR.replace_all(&s, "");
    let s = JS_SCHEME.replace_all(&s, "");
    let escaped = escape_html(&s);

    if escaped.chars().count() > max_length {
        return Err(ConceptError::InvalidInput(format!(
            "Content too long (max {max_length} characters)"
        )));
    }
    Ok(escaped)
}

fn strip_prompt(input: &str) -> String {
    let mut s = input.to_string();
    for re in PROMPT_OVERRIDES.iter() {
        s = re.replace_all(&s, "").into_owned();
    }
    PROMPT_DISALLOWED.replace_all(&s, "").into_owned()
}

/// Clean text that is interpolated into a natural-language prompt.
///
/// Removes instruction-override phrases and turn markers, keeps only ASCII
/// letters, digits, whitespace and `- _ . , & ( )`, and truncates to
/// [`MAX_PROMPT_CHARS`]. Raw input beyond a small multiple of that limit is
/// rejected outright. Phrase removal cannot catch paraphrases or other
/// languages; the model's system prompt is the other half of the defense.
pub fn sanitize_for_prompt(input: &str) -> ConceptResult<String> {
    let input = input.trim();
    check_raw_length(input, MAX_PROMPT_CHARS)?;
    let cleaned = until_stable(input, strip_prompt)?;
    let truncated: String = cleaned.chars().take(MAX_PROMPT_CHARS).collect();
    let truncated = truncated.trim();

    if truncated.is_empty() {
        return Err(ConceptError::InvalidInput(
            "Input cannot be empty after sanitization".to_string(),
        ));
    }
    Ok(truncated.to_string())
}

/// Validate an external identifier and convert it to an [`ObjectId`].
///
/// Exactly 24 hex characters are accepted. Constructor failures map to the
/// same [`ConceptError::InvalidIdentifier`] kind.
pub fn validate_identifier(s: &str) -> ConceptResult<ObjectId> {
    if s.chars().count() != ObjectId::HEX_LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConceptError::InvalidIdentifier(
            "Invalid user ID format".to_string(),
        ));
    }
    ObjectId::parse_str(s)
        .map_err(|e| ConceptError::InvalidIdentifier(format!("Invalid user ID: {e}")))
}

/// [`validate_identifier`] for a value taken from a JSON document, where the
/// field may be missing or not a string at all.
pub fn validate_identifier_value(value: Option<&Value>) -> ConceptResult<ObjectId> {
    match value {
        Some(Value::String(s)) => validate_identifier(s),
        Some(_) => Err(ConceptError::InvalidIdentifier(
            "Identifier must be a string".to_string(),
        )),
        None => Err(ConceptError::InvalidIdentifier(
            "Identifier is required".to_string(),
        )),
    }
}

/// Borrow the text of a JSON string value, rejecting every other shape
/// (operator objects, arrays, numbers, null).
pub fn expect_text(value: &Value) -> ConceptResult<&str> {
    value
        .as_str()
        .ok_or_else(|| ConceptError::InvalidInput("Input must be a string".to_string()))
}

/// The role a field plays, which decides the sanitizer and its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Category name used as a history key and in prompts.
    Category,
    /// Interest stored in the user's interest set.
    Interest,
    /// Display name chosen at registration.
    Username,
    /// Term produced by the model and stored in history.
    Term,
    /// Explanation produced by the model.
    Explanation,
}

impl Field {
    /// Maximum accepted length for this field.
    pub fn max_length(self) -> usize {
        match self {
            Field::Category | Field::Interest | Field::Username => 50,
            Field::Term => 200,
            Field::Explanation => 2000,
        }
    }

    /// Run the sanitizer that applies to this field.
    pub fn sanitize(self, input: &str) -> ConceptResult<String> {
        match self {
            Field::Category | Field::Interest | Field::Username => {
                sanitize(input, self.max_length())
            }
            Field::Term | Field::Explanation => sanitize_html(input, self.max_length()),
        }
    }
}
