//! CMake script lexicon
//!
//! Covers the CMake language's lexical elements: bracket and line comments,
//! quoted, bracket and unquoted arguments, parentheses, and the flow-control
//! command names as case-insensitive keywords.

use crate::lexical::{verbatim, LexRule, Lexicon, Scan};
use crate::tokens::{Terminal, TokenCategory};
use crate::utils::text::{
    ascii_lowercase, identifier_len, line_break_len, prefix_len, rest_of_line_len, strip_delimiters,
    unescape,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CMakeTerminal {
    Whitespace,
    Newline,
    LineComment,
    BracketComment,
    Keyword,
    Identifier,
    LeftParen,
    RightParen,
    QuotedArgument,
    BracketArgument,
    UnquotedArgument,
}

impl Terminal for CMakeTerminal {
    fn category(&self) -> TokenCategory {
        match self {
            CMakeTerminal::Whitespace | CMakeTerminal::Newline => TokenCategory::Whitespace,
            CMakeTerminal::LineComment | CMakeTerminal::BracketComment => TokenCategory::Comment,
            CMakeTerminal::Keyword => TokenCategory::Keyword,
            CMakeTerminal::Identifier => TokenCategory::Identifier,
            CMakeTerminal::LeftParen | CMakeTerminal::RightParen => TokenCategory::Punctuation,
            CMakeTerminal::QuotedArgument
            | CMakeTerminal::BracketArgument
            | CMakeTerminal::UnquotedArgument => TokenCategory::Literal,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CMakeTerminal::Whitespace => "whitespace",
            CMakeTerminal::Newline => "newline",
            CMakeTerminal::LineComment => "line comment",
            CMakeTerminal::BracketComment => "bracket comment",
            CMakeTerminal::Keyword => "keyword",
            CMakeTerminal::Identifier => "identifier",
            CMakeTerminal::LeftParen => "left paren",
            CMakeTerminal::RightParen => "right paren",
            CMakeTerminal::QuotedArgument => "quoted argument",
            CMakeTerminal::BracketArgument => "bracket argument",
            CMakeTerminal::UnquotedArgument => "unquoted argument",
        }
    }
}

impl fmt::Display for CMakeTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Command names that open, continue or close a block
pub const KEYWORDS: &[&str] = &[
    "if",
    "elseif",
    "else",
    "endif",
    "foreach",
    "endforeach",
    "while",
    "endwhile",
    "function",
    "endfunction",
    "macro",
    "endmacro",
    "break",
    "continue",
    "return",
    "block",
    "endblock",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&ascii_lowercase(word).as_str())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CMakeLexicon;

impl Lexicon for CMakeLexicon {
    type Terminal = CMakeTerminal;

    fn name(&self) -> &'static str {
        "cmake"
    }

    fn rules(&self) -> &[LexRule<CMakeTerminal>] {
        RULES
    }
}

const RULES: &[LexRule<CMakeTerminal>] = &[
    LexRule::new(CMakeTerminal::Whitespace, whitespace, verbatim),
    LexRule::new(CMakeTerminal::Newline, newline, verbatim),
    LexRule::new(CMakeTerminal::LineComment, line_comment, verbatim),
    LexRule::new(CMakeTerminal::BracketComment, bracket_comment, verbatim),
    LexRule::new(CMakeTerminal::Keyword, keyword, ascii_lowercase),
    LexRule::new(CMakeTerminal::Identifier, identifier, verbatim),
    LexRule::new(CMakeTerminal::LeftParen, left_paren, verbatim),
    LexRule::new(CMakeTerminal::RightParen, right_paren, verbatim),
    LexRule::new(CMakeTerminal::QuotedArgument, quoted_argument, decode_quoted),
    LexRule::new(CMakeTerminal::BracketArgument, bracket_argument, decode_bracket),
    LexRule::new(CMakeTerminal::UnquotedArgument, unquoted_argument, decode_escapes),
];

fn whitespace(input: &str) -> Scan {
    Scan::from_len(prefix_len(input, |c| c == ' ' || c == '\t'))
}

fn newline(input: &str) -> Scan {
    Scan::from_len(line_break_len(input))
}

/// `[`, any number of `=`, `[`: returns the opener length and the `=` count
fn bracket_open(input: &str) -> Option<(usize, usize)> {
    let rest = input.strip_prefix('[')?;
    let equals = prefix_len(rest, |c| c == '=');
    rest[equals..].starts_with('[').then_some((equals + 2, equals))
}

fn bracket(input: &str) -> Scan {
    let Some((open, equals)) = bracket_open(input) else {
        return Scan::NoMatch;
    };

    let close = format!("]{}]", "=".repeat(equals));
    match input[open..].find(&close) {
        Some(idx) => Scan::Matched(open + idx + close.len()),
        None => Scan::NeedMore,
    }
}

fn line_comment(input: &str) -> Scan {
    match input.strip_prefix('#') {
        Some(rest) if bracket_open(rest).is_none() => Scan::Matched(1 + rest_of_line_len(rest)),
        _ => Scan::NoMatch,
    }
}

fn bracket_comment(input: &str) -> Scan {
    match input.strip_prefix('#').map(bracket) {
        Some(Scan::Matched(len)) => Scan::Matched(len + 1),
        Some(Scan::NeedMore) => Scan::NeedMore,
        _ => Scan::NoMatch,
    }
}

fn keyword(input: &str) -> Scan {
    let len = identifier_len(input);
    if len > 0 && is_keyword(&input[..len]) {
        Scan::Matched(len)
    } else {
        Scan::NoMatch
    }
}

fn identifier(input: &str) -> Scan {
    Scan::from_len(identifier_len(input))
}

fn left_paren(input: &str) -> Scan {
    Scan::from_len(if input.starts_with('(') { 1 } else { 0 })
}

fn right_paren(input: &str) -> Scan {
    Scan::from_len(if input.starts_with(')') { 1 } else { 0 })
}

/// Quoted arguments may run over several lines
fn quoted_argument(input: &str) -> Scan {
    let Some(rest) = input.strip_prefix('"') else {
        return Scan::NoMatch;
    };

    let mut chars = rest.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                if chars.next().is_none() {
                    return Scan::NeedMore;
                }
            }
            '"' => return Scan::Matched(idx + 2),
            _ => {}
        }
    }
    Scan::NeedMore
}

fn bracket_argument(input: &str) -> Scan {
    bracket(input)
}

/// Length of a quoted segment inside a legacy unquoted argument, quotes included.
/// The segment must close on the same line.
fn legacy_segment_len(input: &str) -> Option<usize> {
    let mut chars = input.char_indices().skip(1);
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, '\r' | '\n')) | None => return None,
                Some(_) => {}
            },
            '\r' | '\n' => return None,
            '"' => return Some(idx + 1),
            _ => {}
        }
    }
    None
}

/// Unquoted argument, including legacy forms such as `-DNAME="a b"` where a
/// quoted segment follows unquoted text
fn unquoted_argument(input: &str) -> Scan {
    let mut len = 0;

    while let Some(ch) = input[len..].chars().next() {
        match ch {
            '"' if len > 0 => match legacy_segment_len(&input[len..]) {
                Some(segment) => len += segment,
                None => break,
            },
            ' ' | '\t' | '\r' | '\n' | '(' | ')' | '#' | '"' => break,
            '\\' => match input[len + 1..].chars().next() {
                Some(next) if next != '\r' && next != '\n' => len += 1 + next.len_utf8(),
                _ => {
                    len += 1;
                    break;
                }
            },
            _ => len += ch.len_utf8(),
        }
    }

    Scan::from_len(len)
}

/// Decode escapes, keeping `\;` as written: it marks a literal semicolon
/// that list splitting must not treat as a separator
fn decode_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find('\\') {
        out.push_str(&rest[..idx]);
        let escape = &rest[idx..];
        let len = escape[1..].chars().next().map_or(1, |c| 1 + c.len_utf8());

        match &escape[..len] {
            "\\;" => out.push_str("\\;"),
            sequence => out.push_str(&unescape(sequence)),
        }

        rest = &escape[len..];
        if escape[..len].ends_with('\r') {
            rest = rest.strip_prefix('\n').unwrap_or(rest);
        }
    }

    out.push_str(rest);
    out
}

fn decode_quoted(text: &str) -> String {
    decode_escapes(strip_delimiters(text, "\"", "\""))
}

/// Content between the brackets, minus a newline directly after the opener
fn decode_bracket(text: &str) -> String {
    let Some((open, equals)) = bracket_open(text) else {
        return text.to_string();
    };

    let inner = text.get(open..text.len() - equals - 2).unwrap_or_default();
    inner[line_break_len(inner)..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::test_support::{lex, pairs, reconstruct};
    use crate::tokens::{InvalidToken, Lexeme, LexicalError};
    use assert_matches::assert_matches;
    use CMakeTerminal::*;

    fn significant(text: &str) -> Vec<(CMakeTerminal, String)> {
        pairs(&lex(CMakeLexicon, text))
            .into_iter()
            .filter(|(terminal, _)| !terminal.is_trivia())
            .collect()
    }

    fn owned(expected: &[(CMakeTerminal, &str)]) -> Vec<(CMakeTerminal, String)> {
        expected.iter().map(|(t, v)| (*t, v.to_string())).collect()
    }

    #[test]
    fn test_command_invocation() {
        assert_eq!(
            significant("add_executable(app main.cpp)"),
            owned(&[
                (Identifier, "add_executable"),
                (LeftParen, "("),
                (Identifier, "app"),
                (UnquotedArgument, "main.cpp"),
                (RightParen, ")"),
            ])
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            significant("IF(WIN32)\nEndIf()"),
            owned(&[
                (Keyword, "if"),
                (LeftParen, "("),
                (Identifier, "WIN32"),
                (RightParen, ")"),
                (Keyword, "endif"),
                (LeftParen, "("),
                (RightParen, ")"),
            ])
        );
    }

    #[test]
    fn test_keyword_prefix_is_not_a_keyword() {
        assert_eq!(significant("iffy"), owned(&[(Identifier, "iffy")]));
        assert_eq!(significant("if-x"), owned(&[(UnquotedArgument, "if-x")]));
    }

    #[test]
    fn test_quoted_argument_escapes_and_lines() {
        assert_eq!(
            significant("set(X \"a\\\"b\\n\")"),
            owned(&[
                (Identifier, "set"),
                (LeftParen, "("),
                (Identifier, "X"),
                (QuotedArgument, "a\"b\n"),
                (RightParen, ")"),
            ])
        );

        let lexemes = lex(CMakeLexicon, "message(\"one\ntwo\")");
        assert_matches!(
            &lexemes[2],
            Lexeme::Valid(t) if t.terminal == QuotedArgument
                && t.value == "one\ntwo"
                && t.span.to_string() == "1:9-2:5"
        );
    }

    #[test]
    fn test_bracket_argument_spans_lines() {
        let tokens = significant("message([=[\nkeep ]] this\n]=])");
        assert_eq!(tokens[2], (BracketArgument, "keep ]] this\n".to_string()));
        assert_eq!(tokens[3], (RightParen, ")".to_string()));
    }

    #[test]
    fn test_comments() {
        let tokens = pairs(&lex(CMakeLexicon, "# line\n#[[ block\ncomment ]]x"));
        assert_eq!(
            tokens,
            owned(&[
                (LineComment, "# line"),
                (Newline, "\n"),
                (BracketComment, "#[[ block\ncomment ]]"),
                (Identifier, "x"),
            ])
        );

        assert_eq!(pairs(&lex(CMakeLexicon, "#[=x")), owned(&[(LineComment, "#[=x")]));
    }

    #[test]
    fn test_unquoted_argument_forms() {
        assert_eq!(
            significant("${CMAKE_SOURCE_DIR}/src a\\ b -DFOO=1"),
            owned(&[
                (UnquotedArgument, "${CMAKE_SOURCE_DIR}/src"),
                (UnquotedArgument, "a b"),
                (UnquotedArgument, "-DFOO=1"),
            ])
        );
    }

    #[test]
    fn test_legacy_unquoted_argument_keeps_quoted_segment() {
        assert_eq!(
            significant("add_definitions(-DNAME=\"x y\" a\"b c\"d)"),
            owned(&[
                (Identifier, "add_definitions"),
                (LeftParen, "("),
                (UnquotedArgument, "-DNAME=\"x y\""),
                (UnquotedArgument, "a\"b c\"d"),
                (RightParen, ")"),
            ])
        );

        // a segment left open at the end of the line splits off as a quoted argument
        assert_eq!(
            significant("set(-DB=\"open\n\")"),
            owned(&[
                (Identifier, "set"),
                (LeftParen, "("),
                (UnquotedArgument, "-DB="),
                (QuotedArgument, "open\n"),
                (RightParen, ")"),
            ])
        );
    }

    #[test]
    fn test_escaped_semicolon_is_kept() {
        assert_eq!(
            significant("set(L \"${X}\\;\" a\\;b)"),
            owned(&[
                (Identifier, "set"),
                (LeftParen, "("),
                (Identifier, "L"),
                (QuotedArgument, "${X}\\;"),
                (UnquotedArgument, "a\\;b"),
                (RightParen, ")"),
            ])
        );
    }

    #[test]
    fn test_unterminated_constructs() {
        let lexemes = lex(CMakeLexicon, "message(\"open\n");
        assert_matches!(
            lexemes.last(),
            Some(Lexeme::Invalid(InvalidToken {
                error: LexicalError::Unterminated { construct: "quoted argument" },
                ..
            }))
        );

        let lexemes = lex(CMakeLexicon, "#[[ never closed");
        assert_matches!(
            lexemes.last(),
            Some(Lexeme::Invalid(InvalidToken {
                error: LexicalError::Unterminated { construct: "bracket comment" },
                ..
            }))
        );
    }

    #[test]
    fn test_tokens_reconstruct_input() {
        let input = "cmake_minimum_required(VERSION 3.20)\r\nproject(demo)\n\tif(A) # c\n  endif()\n";
        assert_eq!(reconstruct(&lex(CMakeLexicon, input)), input);
    }
}
