use crate::error::SourceError;

/// Extract a JSON object from model output that may contain surrounding text.
///
/// Handles common response formats:
/// - Clean JSON: `{"key": "value"}`
/// - Fenced: ```json\n{"key": "value"}\n```
/// - Prefix/suffix text: `Here is the summary:\n{"key": "value"}\nHope it helps.`
pub fn extract_json(text: &str) -> Result<String, SourceError> {
    let trimmed = strip_code_fence(text.trim());

    if trimmed.starts_with('{') && is_json(trimmed) {
        return Ok(trimmed.to_string());
    }

    // A fenced block somewhere after leading prose
    if let Some(json_str) = extract_from_markdown_block(trimmed) {
        if is_json(&json_str) {
            return Ok(json_str);
        }
    }

    if let Some(json_str) = extract_outer_braces(trimmed) {
        if is_json(json_str) {
            return Ok(json_str.to_string());
        }
    }

    // Trailing prose with its own braces defeats the outer-brace slice
    if let Some(json_str) = extract_first_object(trimmed) {
        if is_json(&json_str) {
            return Ok(json_str);
        }
    }

    Err(SourceError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

fn is_json(candidate: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(candidate).is_ok()
}

/// Remove a code fence wrapping the entire text, with or without a language tag.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string ("json", "JSON", ...) on the opening line
    let body = match body.find('\n') {
        Some(newline) if !body[..newline].contains('{') => &body[newline + 1..],
        _ => body,
    };
    body.trim()
}

/// Extract JSON from a markdown code block (```json ... ``` or ``` ... ```)
fn extract_from_markdown_block(text: &str) -> Option<String> {
    let start_markers = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for marker in &start_markers {
        if let Some(start) = text.find(marker) {
            let json_start = start + marker.len();
            if let Some(end) = text[json_start..].find("```") {
                let extracted = text[json_start..json_start + end].trim();
                return Some(extracted.to_string());
            }
        }
    }

    None
}

/// Slice from the first `{` to the last `}`.
fn extract_outer_braces(text: &str) -> Option<&str> {
    let first = text.find('{')?;
    let last = text.rfind('}')?;
    (last > first).then(|| &text[first..=last])
}

/// Find the first balanced { ... } in the text.
fn extract_first_object(text: &str) -> Option<String> {
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}
