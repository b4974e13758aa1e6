//! Quote-aware word splitting for raw command strings.
//!
//! A raw `execute {command: "..."}` request is never handed to a shell.
//! This is a small hand-rolled splitter rather than a dependency pulled
//! in for something this narrow.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Split `command` into words, honoring single quotes (literal, no
/// escapes), double quotes (backslash escapes `\"` and `\\`), and
/// backslash escapes outside quotes. Returns `None` if a quote or a
/// trailing backslash is left unterminated.
pub fn split_words(command: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut has_current = false;
    let mut quote = Quote::None;
    let mut chars = command.chars().peekable();

    while let Some(ch) = chars.next() {
        match quote {
            Quote::None => match ch {
                ' ' | '\t' | '\n' => {
                    if has_current {
                        words.push(std::mem::take(&mut current));
                        has_current = false;
                    }
                }
                '\'' => {
                    quote = Quote::Single;
                    has_current = true;
                }
                '"' => {
                    quote = Quote::Double;
                    has_current = true;
                }
                '\\' => {
                    let next = chars.next()?;
                    current.push(next);
                    has_current = true;
                }
                _ => {
                    current.push(ch);
                    has_current = true;
                }
            },
            Quote::Single => match ch {
                '\'' => quote = Quote::None,
                _ => current.push(ch),
            },
            Quote::Double => match ch {
                '"' => quote = Quote::None,
                '\\' if matches!(chars.peek(), Some('"') | Some('\\')) => {
                    current.push(chars.next().unwrap());
                }
                _ => current.push(ch),
            },
        }
    }

    if quote != Quote::None {
        return None;
    }
    if has_current {
        words.push(current);
    }
    Some(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_words() {
        assert_eq!(
            split_words("echo hello world"),
            Some(vec!["echo".into(), "hello".into(), "world".into()])
        );
    }

    #[test]
    fn collapses_repeated_whitespace() {
        assert_eq!(split_words("echo   hi"), Some(vec!["echo".into(), "hi".into()]));
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(
            split_words(r#"echo 'a b $HOME'"#),
            Some(vec!["echo".into(), "a b $HOME".into()])
        );
    }

    #[test]
    fn double_quotes_allow_escape_of_quote_and_backslash() {
        assert_eq!(
            split_words(r#"echo "say \"hi\" now""#),
            Some(vec!["echo".into(), "say \"hi\" now".into()])
        );
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert_eq!(split_words("echo 'unterminated"), None);
    }

    #[test]
    fn trailing_backslash_is_rejected() {
        assert_eq!(split_words("echo \\"), None);
    }

    #[test]
    fn adjacent_quoted_and_unquoted_segments_join_into_one_word() {
        assert_eq!(
            split_words(r#"llm -p "What is 2+2?""#),
            Some(vec!["llm".into(), "-p".into(), "What is 2+2?".into()])
        );
    }

    #[test]
    fn empty_command_splits_to_no_words() {
        assert_eq!(split_words("   "), Some(vec![]));
    }
}
