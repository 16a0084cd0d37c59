//! Pulling a JSON object out of a model reply.
//!
//! Models asked for "valid JSON" still like to wrap it in Markdown fences or
//! a sentence of prose.

/// Return the JSON payload of `text`.
///
/// Prefers a ```` ```json ```` fence, then any ```` ``` ```` fence, then the
/// span from the first `{` to the last `}`. Falls back to the trimmed text.
pub fn extract_json(text: &str) -> &str {
    if let Some(inner) = fenced(text, "```json") {
        return inner;
    }
    if let Some(inner) = fenced(text, "```") {
        return inner;
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text.trim(),
    }
}

fn fenced<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}
