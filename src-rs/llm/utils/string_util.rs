/// Keeps at most `max_chars` characters of `s`, appending an ellipsis only
/// when something was cut off.
pub fn truncate_chars_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

/// First `max_chars` characters of `s`, never splitting a character.
pub fn take_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Strips a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````)
/// that chat models like to wrap JSON answers in.
pub fn strip_code_fence(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) on the opening line.
    match body.find('\n') {
        Some(pos) if !body[..pos].trim().contains(|c: char| c == '{' || c == '[') => {
            body[pos + 1..].trim()
        }
        _ => body.trim(),
    }
}
