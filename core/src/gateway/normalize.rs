//! Normalizes raw model output into parseable JSON.
//!
//! Models routinely wrap JSON in Markdown code fences, or surround it with
//! prose ("Here is the JSON you requested:"). This module strips fences and
//! then extracts the outermost balanced `{...}`/`[...]` span, which is
//! enough to recover valid JSON from both failure modes without attempting a
//! full Markdown parse.

/// Strip a leading/trailing Markdown code fence (```json ... ``` or ``` ... ```).
fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
        let rest = rest.trim_start_matches('\n');
        if let Some(body) = rest.strip_suffix("```") {
            return body.trim();
        }
        return rest.trim();
    }
    trimmed
}

/// Extract the outermost balanced `{...}` or `[...]` span, tracking string
/// literals and escapes so braces inside string values don't throw off the
/// count.
fn extract_balanced_span(input: &str) -> Option<&str> {
    let bytes = input.as_bytes();
    let start = input.find(['{', '['])?;
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Normalize a raw model response into a JSON-parseable string.
///
/// Returns `None` if no JSON-shaped span could be located at all, in which
/// case the caller should treat the response as a parse failure.
pub fn normalize_json_response(raw: &str) -> Option<String> {
    let unfenced = strip_code_fence(raw);
    if serde_json::from_str::<serde_json::Value>(unfenced).is_ok() {
        return Some(unfenced.to_string());
    }
    extract_balanced_span(unfenced).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_passes_through() {
        let raw = r#"{"a": 1}"#;
        assert_eq!(normalize_json_response(raw).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn strips_fenced_json_block() {
        let raw = "```json\n{\"a\": 1}\n```";
        let out = normalize_json_response(raw).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn extracts_json_surrounded_by_prose() {
        let raw = "Sure, here you go:\n{\"a\": {\"b\": [1,2,3]}}\nLet me know if you need more.";
        let out = normalize_json_response(raw).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["a"]["b"][1], 2);
    }

    #[test]
    fn ignores_braces_inside_string_values() {
        let raw = r#"{"text": "a { b } c", "n": 2}"#;
        let out = normalize_json_response(raw).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["n"], 2);
    }

    #[test]
    fn returns_none_when_no_json_present() {
        assert!(normalize_json_response("no json here at all").is_none());
    }

    #[test]
    fn handles_array_root() {
        let raw = "prefix [1, 2, 3] suffix";
        let out = normalize_json_response(raw).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[2], 3);
    }
}
