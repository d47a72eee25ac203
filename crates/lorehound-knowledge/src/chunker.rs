//! Paragraph chunking.
//!
//! Documents split on blank lines; paragraphs shorter than the configured
//! minimum are dropped as noise (headings, stray separators).

/// Split `text` into trimmed paragraphs of at least `min_chars` characters.
///
/// Order follows the document. Windows line endings are handled.
pub fn split_paragraphs(text: &str, min_chars: usize) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty() && p.chars().count() >= min_chars)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_blank_lines() {
        let doc = "First paragraph with enough text.\n\nSecond paragraph, also long enough.";
        let chunks = split_paragraphs(doc, 20);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "First paragraph with enough text.");
    }

    #[test]
    fn test_drops_short_paragraphs() {
        let doc = "# Title\n\nA real paragraph that clears the minimum length.\n\nok";
        let chunks = split_paragraphs(doc, 20);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("A real paragraph"));
    }

    #[test]
    fn test_preserves_document_order() {
        let doc = "Alpha paragraph number one here.\n\nBeta paragraph number two here.\n\nGamma paragraph number three.";
        let chunks = split_paragraphs(doc, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].starts_with("Alpha"));
        assert!(chunks[1].starts_with("Beta"));
        assert!(chunks[2].starts_with("Gamma"));
    }

    #[test]
    fn test_crlf_and_whitespace() {
        let doc = "Windows paragraph with some length.\r\n\r\n   padded paragraph with enough text   ";
        let chunks = split_paragraphs(doc, 20);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], "padded paragraph with enough text");
    }

    #[test]
    fn test_empty_input() {
        assert!(split_paragraphs("", 20).is_empty());
        assert!(split_paragraphs("\n\n\n\n", 20).is_empty());
    }
}
