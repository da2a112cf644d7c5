//! Parsing of raw model output into gate labels and reply content.

use murmur_core::traits::GeneratedContent;
use serde_json::Value;
use tracing::debug;

/// Labels the should-respond prompt asks for.
const LABELS: [&str; 3] = ["RESPOND", "IGNORE", "STOP"];

/// Pull the gate label out of a classification answer.
///
/// Models often wrap the label in prose ("I think [IGNORE] fits"). The
/// first bracketed label wins, then a bare label as the whole answer.
/// Anything else is returned trimmed and left to the gate to reject.
pub fn extract_label(raw: &str) -> String {
    let trimmed = raw.trim();
    let upper = trimmed.to_uppercase();

    let bracketed = LABELS
        .iter()
        .filter_map(|label| upper.find(&format!("[{label}]")).map(|pos| (pos, *label)))
        .min_by_key(|(pos, _)| *pos);
    if let Some((_, label)) = bracketed {
        return label.to_string();
    }

    let bare = upper.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
    if let Some(label) = LABELS.iter().find(|l| **l == bare) {
        return label.to_string();
    }

    trimmed.to_string()
}

/// Parse reply content from a message-template answer.
///
/// Prefers a fenced ```json block, then the whole answer as JSON. An answer
/// that carries JSON which does not yield a `text` string parses to empty
/// content, so nothing is sent. Only answers without any JSON are used
/// verbatim as the reply text.
pub fn parse_generated(raw: &str) -> GeneratedContent {
    let fenced = fenced_json(raw);
    let candidates = [fenced, Some(raw.trim())];
    for candidate in candidates.into_iter().flatten() {
        if let Some(content) = content_from_json(candidate) {
            return content;
        }
    }

    if fenced.is_some() || raw.contains('{') {
        debug!("providers: unusable JSON reply, discarding");
        return GeneratedContent::default();
    }

    GeneratedContent {
        text: raw.trim().to_string(),
    }
}

/// Body of the first ```json fence, if any.
fn fenced_json(raw: &str) -> Option<&str> {
    let start = raw.find("```json")? + "```json".len();
    let rest = &raw[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn content_from_json(candidate: &str) -> Option<GeneratedContent> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    let obj = value.as_object()?;
    let text = obj.get("text")?.as_str()?.trim().to_string();
    Some(GeneratedContent { text })
}
