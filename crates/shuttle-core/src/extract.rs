//! Recovery of a structured JSON payload from free-text model replies
//!
//! Models are asked to answer with a JSON object but routinely wrap it in a
//! markdown fence or surround it with prose. Extraction is purely syntactic and
//! never fails the request: the raw text always comes back, with either the
//! parsed document or the reason none was found.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const FENCE: &str = "```";

/// Each start scans to the end of the reply at worst, so the embedded-object
/// pass is bounded by this many starts times the reply length.
const MAX_REGION_STARTS: usize = 256;

/// Why no structured payload could be recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionErrorKind {
    /// A fence was present but enclosed nothing
    EmptyFence,
    /// No `{` opened a region that closes again
    NoBalancedObject,
    /// Balanced regions were found but none is valid JSON
    ParseFailure,
}

impl std::fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFence => write!(f, "empty fence"),
            Self::NoBalancedObject => write!(f, "no balanced object"),
            Self::ParseFailure => write!(f, "parse failure"),
        }
    }
}

/// Outcome of [`extract`]. Exactly one of `structured` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub raw_text: String,
    pub structured: Option<Value>,
    pub error: Option<ExtractionErrorKind>,
}

impl Extraction {
    fn found(raw: &str, value: Value) -> Self {
        Self {
            raw_text: raw.to_string(),
            structured: Some(value),
            error: None,
        }
    }

    fn failed(raw: &str, kind: ExtractionErrorKind) -> Self {
        debug!("No structured payload in reply: {}", kind);
        Self {
            raw_text: raw.to_string(),
            structured: None,
            error: Some(kind),
        }
    }
}

/// A language tag such as `json` or `c++`; anything else on the opening
/// fence line is content.
fn is_fence_tag(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
}

/// Remove a leading fence (with optional language tag) and/or a trailing
/// fence. Text without any fence is returned untouched.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with(FENCE) && !trimmed.ends_with(FENCE) {
        return text;
    }

    let (opened, mut body) = match trimmed.strip_prefix(FENCE) {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest;
    }
    if opened {
        let (line, rest) = body.split_once('\n').unwrap_or((body, ""));
        let line = line.trim();
        if line.is_empty() || is_fence_tag(line) {
            body = rest;
        }
    }
    body.trim()
}

/// Slice of `text` from the `{` at `start` to its matching `}`.
///
/// Braces inside string literals do not count; escapes are honoured.
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Recover the structured payload from a model reply.
///
/// 1. strip a surrounding fence;
/// 2. accept the remainder if it is a JSON object or array on its own;
/// 3. otherwise try each balanced `{...}` region left to right and take the
///    first that parses.
pub fn extract(raw: &str) -> Extraction {
    let fenced = {
        let trimmed = raw.trim();
        trimmed.starts_with(FENCE) || trimmed.ends_with(FENCE)
    };
    let body = strip_fences(raw).trim();

    if body.is_empty() {
        let kind = if fenced {
            ExtractionErrorKind::EmptyFence
        } else {
            ExtractionErrorKind::NoBalancedObject
        };
        return Extraction::failed(raw, kind);
    }

    if let Ok(value) = serde_json::from_str::<Value>(body)
        && (value.is_object() || value.is_array())
    {
        return Extraction::found(raw, value);
    }

    let mut saw_region = false;
    let starts = body
        .char_indices()
        .filter(|&(_, ch)| ch == '{')
        .map(|(idx, _)| idx)
        .take(MAX_REGION_STARTS);
    for idx in starts {
        if let Some(region) = balanced_object_at(body, idx) {
            saw_region = true;
            if let Ok(value) = serde_json::from_str::<Value>(region) {
                return Extraction::found(raw, value);
            }
        }
    }

    Extraction::failed(
        raw,
        if saw_region {
            ExtractionErrorKind::ParseFailure
        } else {
            ExtractionErrorKind::NoBalancedObject
        },
    )
}
