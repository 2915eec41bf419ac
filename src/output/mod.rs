// Output formatting: terminal display and report files.

pub mod report;
pub mod terminal;

/// One-line preview of a review: whitespace runs (including newlines) collapse
/// to single spaces and the result is cut to `max_chars` characters with "..."
/// appended when anything was dropped.
///
/// Counts characters, not bytes, so multi-byte text never splits mid-character.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_lines() {
        assert_eq!(preview("great\n\n  kettle", 40), "great kettle");
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }
}
