//! Text helpers

/// Cut `text` to at most `max_chars` characters, appending `...` when cut.
///
/// Works on character boundaries so multi-byte bodies never panic.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
