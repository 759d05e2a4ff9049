//! Stateless string helpers shared by the lexicons

/// Byte length of the longest prefix whose characters satisfy `pred`
pub fn prefix_len(input: &str, pred: impl Fn(char) -> bool) -> usize {
    input
        .char_indices()
        .find(|&(_, ch)| !pred(ch))
        .map(|(idx, _)| idx)
        .unwrap_or(input.len())
}

pub fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

pub fn is_identifier_continue(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}

/// Length of the identifier at the start of `input`, 0 if none
pub fn identifier_len(input: &str) -> usize {
    match input.chars().next() {
        Some(ch) if is_identifier_start(ch) => prefix_len(input, is_identifier_continue),
        _ => 0,
    }
}

/// Length of a line terminator at the start of `input` (`\r\n`, `\n` or `\r`)
pub fn line_break_len(input: &str) -> usize {
    if input.starts_with("\r\n") {
        2
    } else if input.starts_with('\n') || input.starts_with('\r') {
        1
    } else {
        0
    }
}

/// Length up to, not including, the next line terminator
pub fn rest_of_line_len(input: &str) -> usize {
    input.find(['\n', '\r']).unwrap_or(input.len())
}

pub fn ascii_lowercase(text: &str) -> String {
    text.to_ascii_lowercase()
}

/// Strip `open` from the front and `close` from the back when both are present
pub fn strip_delimiters<'a>(text: &'a str, open: &str, close: &str) -> &'a str {
    text.strip_prefix(open)
        .and_then(|inner| inner.strip_suffix(close))
        .unwrap_or(text)
}

/// Decode the common single-character backslash escapes.
///
/// A backslash followed by a line break is a continuation and vanishes.
/// Unknown escapes keep the escaped character.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_len() {
        assert_eq!(identifier_len("foo_bar1(x)"), 8);
        assert_eq!(identifier_len("_x"), 2);
        assert_eq!(identifier_len("1abc"), 0);
        assert_eq!(identifier_len(""), 0);
    }

    #[test]
    fn test_line_break_len() {
        assert_eq!(line_break_len("\r\nx"), 2);
        assert_eq!(line_break_len("\nx"), 1);
        assert_eq!(line_break_len("\rx"), 1);
        assert_eq!(line_break_len("x\n"), 0);
    }

    #[test]
    fn test_rest_of_line_len() {
        assert_eq!(rest_of_line_len("# note\r\nnext"), 6);
        assert_eq!(rest_of_line_len("no break"), 8);
    }

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters("\"abc\"", "\"", "\""), "abc");
        assert_eq!(strip_delimiters("[==[x]==]", "[==[", "]==]"), "x");
        assert_eq!(strip_delimiters("abc", "\"", "\""), "abc");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\tb\nc"), "a\tb\nc");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape("one \\\ntwo"), "one two");
        assert_eq!(unescape("one \\\r\ntwo"), "one two");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
