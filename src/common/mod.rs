//! Common utilities shared by the CLI, the engine and the check catalog

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Truncate `text` to at most `max` characters, appending `...` when cut.
///
/// Counts characters rather than bytes so multi-byte text is never split.
pub fn truncate_display(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_display("hello", 10), "hello");
        assert_eq!(truncate_display("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate_display("abcdefgh", 3), "abc...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_display("ééééé", 2), "éé...");
    }
}
