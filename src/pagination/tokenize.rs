/// Split text into alternating whitespace / non-whitespace runs. Every byte
/// of the input lands in exactly one token, so joining the tokens gives the
/// input back.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0usize;
    let mut in_space: Option<bool> = None;

    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match in_space {
            Some(current) if current != is_space => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }

    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_whitespace_runs_as_tokens() {
        assert_eq!(
            tokenize("Call me  Ishmael.\n\nSome years"),
            vec!["Call", " ", "me", "  ", "Ishmael.", "\n\n", "Some", " ", "years"]
        );
    }

    #[test]
    fn leading_and_trailing_whitespace_survive() {
        let text = "  indented line \n";
        assert_eq!(tokenize(text).concat(), text);
        assert_eq!(tokenize(text).first(), Some(&"  "));
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "naïve café\u{00A0}crème";
        assert_eq!(tokenize(text).concat(), text);
        assert_eq!(tokenize(text).len(), 5);
    }
}
