/// Tokens shorter than this are discarded.
pub const MIN_TOKEN_LEN: usize = 2;

/// Split text into lowercase ASCII alphanumeric tokens.
///
/// The text is lowercased first; every character outside `[a-z0-9]` is then
/// a separator, so non-ASCII letters split words rather than join them.
///
/// ```
/// use trackmap_search::tokenize;
///
/// assert_eq!(tokenize("Track-Name 2 Ft. DJ"), vec!["track", "name", "ft", "dj"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|run| run.len() >= MIN_TOKEN_LEN)
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_single_characters() {
        assert_eq!(tokenize("Track-Name 2 Ft. DJ"), vec!["track", "name", "ft", "dj"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  - . ").is_empty());
    }

    #[test]
    fn test_digits_are_token_characters() {
        assert_eq!(tokenize("Blink-182 / 99 Problems"), vec!["blink", "182", "99", "problems"]);
    }

    #[test]
    fn test_non_ascii_letters_separate_tokens() {
        // 'é' is not ASCII, so "Beyoncé" yields "beyonc"
        assert_eq!(tokenize("Beyoncé"), vec!["beyonc"]);
        assert_eq!(tokenize("Sigur Rós"), vec!["sigur"]);
    }

    #[test]
    fn test_unicode_lowercasing_happens_first() {
        // KELVIN SIGN lowercases to an ASCII 'k'
        assert_eq!(tokenize("\u{212A}ing"), vec!["king"]);
    }

    #[test]
    fn test_repeated_tokens_are_kept() {
        assert_eq!(tokenize("Bye Bye Bye"), vec!["bye", "bye", "bye"]);
    }
}
