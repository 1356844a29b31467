//! Blank-line chunking of note text.
//!
//! A chunk is a paragraph: the text between two `"\n\n"` boundaries, trimmed.
//! Empty pieces are dropped, so runs of blank lines never yield empty chunks.

const CHUNK_BOUNDARY: &str = "\n\n";

/// Lazily iterate over the chunks of `text` in document order.
///
/// The iterator borrows `text`; call again to restart.
pub fn chunk_iter(text: &str) -> impl Iterator<Item = &str> + Clone + '_ {
    text.split(CHUNK_BOUNDARY)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
}

/// Split `text` into owned chunks.
pub fn chunk(text: &str) -> Vec<String> {
    chunk_iter(text).map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_blank_lines() {
        assert_eq!(chunk("a\n\nb\n\n\n\nc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert!(chunk("   ").is_empty());
        assert!(chunk("").is_empty());
        assert!(chunk("\n\n\n\n").is_empty());
    }

    #[test]
    fn test_single_paragraph() {
        assert_eq!(chunk("solo"), vec!["solo"]);
        assert_eq!(chunk("  line one\nline two  "), vec!["line one\nline two"]);
    }

    #[test]
    fn test_odd_newline_runs_leave_no_stray_whitespace() {
        // Three newlines split once and leave a leading "\n" that trim removes.
        assert_eq!(chunk("first\n\n\nsecond"), vec!["first", "second"]);
        assert_eq!(chunk("x\n\n \n\ny"), vec!["x", "y"]);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let text = "one\n\ntwo";
        let chunks = chunk_iter(text);
        assert_eq!(chunks.clone().count(), 2);
        assert_eq!(chunks.collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn test_single_character_chunks_are_kept() {
        assert_eq!(chunk("a\n\n.\n\nb"), vec!["a", ".", "b"]);
    }
}
