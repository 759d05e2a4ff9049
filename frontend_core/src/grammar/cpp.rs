//! C and C++ lexicon
//!
//! Reads raw source, so backslash-newline splices are handled here. Between
//! tokens a splice is whitespace. Inside a token it is skipped, and a token
//! that reaches a splice at the end of the window asks for the next line.
//! Raw strings keep their splices. Preprocessing directives come through as
//! ordinary `#` operators and identifiers.

use crate::lexical::{verbatim, LexRule, Lexicon, Scan};
use crate::tokens::{Terminal, TokenCategory};
use crate::utils::text::{identifier_len, is_identifier_continue, line_break_len, prefix_len, rest_of_line_len, unescape};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CppTerminal {
    Whitespace,
    Newline,
    LineComment,
    BlockComment,
    Keyword,
    Identifier,
    IntegerLiteral,
    FloatingLiteral,
    CharacterLiteral,
    StringLiteral,
    Operator,
}

impl Terminal for CppTerminal {
    fn category(&self) -> TokenCategory {
        match self {
            CppTerminal::Whitespace | CppTerminal::Newline => TokenCategory::Whitespace,
            CppTerminal::LineComment | CppTerminal::BlockComment => TokenCategory::Comment,
            CppTerminal::Keyword => TokenCategory::Keyword,
            CppTerminal::Identifier => TokenCategory::Identifier,
            CppTerminal::IntegerLiteral
            | CppTerminal::FloatingLiteral
            | CppTerminal::CharacterLiteral
            | CppTerminal::StringLiteral => TokenCategory::Literal,
            CppTerminal::Operator => TokenCategory::Operator,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CppTerminal::Whitespace => "whitespace",
            CppTerminal::Newline => "newline",
            CppTerminal::LineComment => "line comment",
            CppTerminal::BlockComment => "block comment",
            CppTerminal::Keyword => "keyword",
            CppTerminal::Identifier => "identifier",
            CppTerminal::IntegerLiteral => "integer literal",
            CppTerminal::FloatingLiteral => "floating literal",
            CppTerminal::CharacterLiteral => "character literal",
            CppTerminal::StringLiteral => "string literal",
            CppTerminal::Operator => "operator",
        }
    }
}

impl fmt::Display for CppTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// C++20 keywords, alternative operator spellings included
pub const KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class", "compl", "concept",
    "const", "consteval", "constexpr", "constinit", "const_cast", "continue", "co_await",
    "co_return", "co_yield", "decltype", "default", "delete", "do", "double", "dynamic_cast",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register",
    "reinterpret_cast", "requires", "return", "short", "signed", "sizeof", "static",
    "static_assert", "static_cast", "struct", "switch", "template", "this", "thread_local",
    "throw", "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
    "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
];

/// Punctuators, digraphs included
pub const OPERATORS: &[&str] = &[
    "%:%:", "...", "<=>", "->*", "<<=", ">>=", "::", "->", ".*", "++", "--", "<<", ">>", "<=",
    ">=", "==", "!=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "##", "<:",
    ":>", "<%", "%>", "%:", "{", "}", "[", "]", "(", ")", ";", ":", "?", ".", "~", "!", "+",
    "-", "*", "/", "%", "^", "&", "|", "=", "<", ">", ",", "#",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CppLexicon;

impl Lexicon for CppLexicon {
    type Terminal = CppTerminal;

    fn name(&self) -> &'static str {
        "cpp"
    }

    fn rules(&self) -> &[LexRule<CppTerminal>] {
        RULES
    }
}

const RULES: &[LexRule<CppTerminal>] = &[
    LexRule::new(CppTerminal::Whitespace, whitespace, verbatim),
    LexRule::new(CppTerminal::Newline, newline, verbatim),
    LexRule::new(CppTerminal::LineComment, line_comment, unsplice),
    LexRule::new(CppTerminal::BlockComment, block_comment, unsplice),
    LexRule::new(CppTerminal::Keyword, keyword, unsplice),
    LexRule::new(CppTerminal::Identifier, identifier, unsplice),
    LexRule::new(CppTerminal::IntegerLiteral, integer_literal, strip_separators),
    LexRule::new(CppTerminal::FloatingLiteral, floating_literal, strip_separators),
    LexRule::new(CppTerminal::CharacterLiteral, character_literal, decode_character),
    LexRule::new(CppTerminal::StringLiteral, string_literal, decode_string),
    LexRule::new(CppTerminal::Operator, operator, unsplice),
];

/// Length of a backslash-newline splice at the start of `input`, 0 if none
fn splice_len(input: &str) -> usize {
    match input.strip_prefix('\\').map(line_break_len) {
        Some(len) if len > 0 => 1 + len,
        _ => 0,
    }
}

fn has_splice(input: &str) -> bool {
    input.match_indices('\\').any(|(idx, _)| splice_len(&input[idx..]) > 0)
}

/// `input` with its splices removed, mapped back to physical offsets
struct Spliced<'a> {
    text: Cow<'a, str>,
    /// Physical offset of each byte of `text`; empty when nothing was removed
    offsets: Vec<usize>,
    /// `input` ends in a splice, so the next line continues it
    open_ended: bool,
}

impl<'a> Spliced<'a> {
    fn new(input: &'a str) -> Self {
        if !has_splice(input) {
            return Self {
                text: Cow::Borrowed(input),
                offsets: Vec::new(),
                open_ended: false,
            };
        }

        let mut text = String::with_capacity(input.len());
        let mut offsets = Vec::with_capacity(input.len());
        let mut open_ended = false;
        let mut pos = 0;

        while let Some(ch) = input[pos..].chars().next() {
            let splice = splice_len(&input[pos..]);
            if splice > 0 {
                pos += splice;
                open_ended = true;
                continue;
            }

            offsets.extend(pos..pos + ch.len_utf8());
            text.push(ch);
            pos += ch.len_utf8();
            open_ended = false;
        }

        Self {
            text: Cow::Owned(text),
            offsets,
            open_ended,
        }
    }

    /// Physical length of the first `len` spliced bytes, trailing splices excluded
    fn physical_len(&self, len: usize) -> usize {
        match len.checked_sub(1) {
            Some(last) => self.offsets.get(last).map_or(len, |offset| offset + 1),
            None => 0,
        }
    }

    fn ends_at(&self, len: usize) -> bool {
        len == self.text.len()
    }
}

fn run_spliced(input: &str, scan: fn(&str) -> Scan, extendable: bool) -> Scan {
    let view = Spliced::new(input);
    match scan(&view.text) {
        Scan::Matched(len) if extendable && view.open_ended && view.ends_at(len) => Scan::NeedMore,
        Scan::Matched(len) => Scan::Matched(view.physical_len(len)),
        other => other,
    }
}

/// Run `scan` over `input` with splices removed.
///
/// A match that runs into a trailing splice may continue on the next line,
/// so it asks for more input.
fn spliced(input: &str, scan: fn(&str) -> Scan) -> Scan {
    run_spliced(input, scan, true)
}

/// Like [`spliced`] for constructs that end at a closing delimiter
fn spliced_delimited(input: &str, scan: fn(&str) -> Scan) -> Scan {
    run_spliced(input, scan, false)
}

fn unsplice(text: &str) -> String {
    Spliced::new(text).text.into_owned()
}

/// Blanks plus backslash-newline splices
fn whitespace(input: &str) -> Scan {
    let mut len = 0;
    loop {
        let rest = &input[len..];
        let blank = prefix_len(rest, |c| matches!(c, ' ' | '\t' | '\x0B' | '\x0C'));
        if blank > 0 {
            len += blank;
            continue;
        }

        let splice = splice_len(rest);
        if splice > 0 {
            len += splice;
            continue;
        }

        return Scan::from_len(len);
    }
}

fn newline(input: &str) -> Scan {
    Scan::from_len(line_break_len(input))
}

/// A splice at the end of a line comment carries it onto the next line
fn line_comment(input: &str) -> Scan {
    spliced(input, |text| {
        if text.starts_with("//") {
            Scan::Matched(rest_of_line_len(text))
        } else {
            Scan::NoMatch
        }
    })
}

fn block_comment(input: &str) -> Scan {
    spliced_delimited(input, |text| match text.strip_prefix("/*") {
        Some(rest) => rest.find("*/").map_or(Scan::NeedMore, |idx| Scan::Matched(idx + 4)),
        None => Scan::NoMatch,
    })
}

fn keyword(input: &str) -> Scan {
    spliced(input, |text| {
        let len = identifier_len(text);
        if len > 0 && is_keyword(&text[..len]) {
            Scan::Matched(len)
        } else {
            Scan::NoMatch
        }
    })
}

fn identifier(input: &str) -> Scan {
    spliced(input, |text| Scan::from_len(identifier_len(text)))
}

fn is_dec(b: u8) -> bool {
    b.is_ascii_digit()
}

fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

fn is_bin(b: u8) -> bool {
    b == b'0' || b == b'1'
}

/// Digits with `'` separators between them
fn digits_len(bytes: &[u8], digit: fn(u8) -> bool) -> usize {
    let mut len = 0;
    while len < bytes.len() {
        if digit(bytes[len]) {
            len += 1;
        } else if bytes[len] == b'\'' && len > 0 && bytes.get(len + 1).is_some_and(|&b| digit(b)) {
            len += 2;
        } else {
            break;
        }
    }
    len
}

/// `e`/`p` exponent with optional sign; `None` without digits
fn exponent_len(bytes: &[u8]) -> Option<usize> {
    let mut pos = 1;
    if matches!(bytes.get(1), Some(b'+' | b'-')) {
        pos += 1;
    }
    let digits = digits_len(&bytes[pos..], is_dec);
    (digits > 0).then_some(pos + digits)
}

/// Length of the numeric literal at the start of `input` and whether it is floating
fn scan_number(input: &str) -> Option<(usize, bool)> {
    let bytes = input.as_bytes();
    let first = *bytes.first()?;
    let leading_dot = first == b'.' && bytes.get(1).is_some_and(|&b| is_dec(b));
    if !first.is_ascii_digit() && !leading_dot {
        return None;
    }

    let radix_prefix = first == b'0' && bytes.len() > 2;
    let mut floating = false;

    let mut pos = if radix_prefix && matches!(bytes[1], b'x' | b'X') && (is_hex(bytes[2]) || bytes[2] == b'.') {
        let mut pos = 2 + digits_len(&bytes[2..], is_hex);
        if bytes.get(pos) == Some(&b'.') {
            floating = true;
            pos += 1;
            pos += digits_len(&bytes[pos..], is_hex);
        }
        if matches!(bytes.get(pos), Some(b'p' | b'P')) {
            if let Some(len) = exponent_len(&bytes[pos..]) {
                floating = true;
                pos += len;
            }
        }
        pos
    } else if radix_prefix && matches!(bytes[1], b'b' | b'B') && is_bin(bytes[2]) {
        2 + digits_len(&bytes[2..], is_bin)
    } else {
        let mut pos = digits_len(bytes, is_dec);
        if bytes.get(pos) == Some(&b'.') && bytes.get(pos + 1) != Some(&b'.') {
            floating = true;
            pos += 1;
            pos += digits_len(&bytes[pos..], is_dec);
        }
        if matches!(bytes.get(pos), Some(b'e' | b'E')) {
            if let Some(len) = exponent_len(&bytes[pos..]) {
                floating = true;
                pos += len;
            }
        }
        pos
    };

    pos += prefix_len(&input[pos..], is_identifier_continue);
    Some((pos, floating))
}

fn integer_literal(input: &str) -> Scan {
    spliced(input, |text| match scan_number(text) {
        Some((len, false)) => Scan::Matched(len),
        _ => Scan::NoMatch,
    })
}

fn floating_literal(input: &str) -> Scan {
    spliced(input, |text| match scan_number(text) {
        Some((len, true)) => Scan::Matched(len),
        _ => Scan::NoMatch,
    })
}

fn encoding_prefix_len(input: &str) -> usize {
    ["u8", "u", "U", "L"]
        .iter()
        .find(|prefix| input.starts_with(*prefix))
        .map_or(0, |prefix| prefix.len())
}

/// Quoted sequence starting at `input[0]`, closing quote included.
///
/// Runs in spliced text, so a line break ends the literal unclosed. Running
/// out of input asks for more.
fn quoted(input: &str, quote: char) -> Scan {
    let mut chars = input.char_indices().skip(1);
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                None => return Scan::NeedMore,
                Some((_, '\n' | '\r')) => return Scan::NoMatch,
                Some(_) => {}
            },
            '\n' | '\r' => return Scan::NoMatch,
            c if c == quote => return Scan::Matched(idx + 1),
            _ => {}
        }
    }
    Scan::NeedMore
}

fn prefixed_quoted(text: &str, quote: char) -> Scan {
    let prefix = encoding_prefix_len(text);
    let rest = &text[prefix..];
    if !rest.starts_with(quote) {
        return Scan::NoMatch;
    }
    match quoted(rest, quote) {
        Scan::Matched(len) => Scan::Matched(prefix + len),
        other => other,
    }
}

fn character_literal(input: &str) -> Scan {
    spliced_delimited(input, |text| prefixed_quoted(text, '\''))
}

fn string_literal(input: &str) -> Scan {
    let prefix = encoding_prefix_len(input);
    let rest = &input[prefix..];

    if rest.starts_with("R\"") {
        return raw_string(rest).map_or(Scan::NoMatch, |scan| match scan {
            Scan::Matched(len) => Scan::Matched(prefix + len),
            other => other,
        });
    }

    spliced_delimited(input, |text| prefixed_quoted(text, '"'))
}

/// `R"delim( ... )delim"`, which may span lines. `None` for a malformed opener.
fn raw_string(input: &str) -> Option<Scan> {
    let body = &input[2..];
    let delimiter_len = prefix_len(body, |c| !matches!(c, '(' | ')' | '\\' | '"' | ' ' | '\t' | '\n' | '\r'));
    if delimiter_len > 16 || !body[delimiter_len..].starts_with('(') {
        return None;
    }

    let close = format!("){}\"", &body[..delimiter_len]);
    let content = &body[delimiter_len + 1..];
    Some(match content.find(&close) {
        Some(idx) => Scan::Matched(2 + delimiter_len + 1 + idx + close.len()),
        None => Scan::NeedMore,
    })
}

fn operator(input: &str) -> Scan {
    spliced(input, |text| {
        Scan::from_len(
            OPERATORS
                .iter()
                .filter(|op| text.starts_with(**op))
                .map(|op| op.len())
                .max()
                .unwrap_or(0),
        )
    })
}

fn strip_separators(text: &str) -> String {
    unsplice(text).replace('\'', "")
}

fn decode_character(text: &str) -> String {
    match text.find('\'') {
        Some(open) => unescape(text.get(open + 1..text.len() - 1).unwrap_or_default()),
        None => text.to_string(),
    }
}

/// Contents without prefix and quotes; escapes are decoded except in raw strings
fn decode_string(text: &str) -> String {
    let Some(quote) = text.find('"') else {
        return text.to_string();
    };
    let body = &text[quote + 1..];

    if text[..quote].ends_with('R') {
        let Some(open) = body.find('(') else {
            return text.to_string();
        };
        let end = body.len().saturating_sub(open + 2);
        body.get(open + 1..end).unwrap_or_default().to_string()
    } else {
        unescape(body.strip_suffix('"').unwrap_or(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::test_support::{lex, pairs, reconstruct};
    use crate::syntax::{CollectingSink, Parser};
    use crate::tokens::{InvalidToken, Lexeme, LexicalError};
    use assert_matches::assert_matches;
    use std::io::Cursor;
    use CppTerminal::*;

    fn significant(text: &str) -> Vec<(CppTerminal, String)> {
        pairs(&lex(CppLexicon, text))
            .into_iter()
            .filter(|(terminal, _)| !terminal.is_trivia())
            .collect()
    }

    fn owned(expected: &[(CppTerminal, &str)]) -> Vec<(CppTerminal, String)> {
        expected.iter().map(|(t, v)| (*t, v.to_string())).collect()
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            significant("unsigned x = 0x1F'FFu;"),
            owned(&[
                (Keyword, "unsigned"),
                (Identifier, "x"),
                (Operator, "="),
                (IntegerLiteral, "0x1FFFu"),
                (Operator, ";"),
            ])
        );
    }

    #[test]
    fn test_keyword_wins_tie_but_not_longer_identifier() {
        assert_eq!(
            significant("class classy int32_t"),
            owned(&[(Keyword, "class"), (Identifier, "classy"), (Identifier, "int32_t")])
        );
    }

    #[test]
    fn test_operators_take_longest_match() {
        let ops: Vec<String> = significant("a>>=b<=>c->*d...e::f<<g")
            .into_iter()
            .filter(|(t, _)| *t == Operator)
            .map(|(_, v)| v)
            .collect();
        assert_eq!(ops, [">>=", "<=>", "->*", "...", "::", "<<"]);
    }

    #[test]
    fn test_numeric_literals() {
        let cases = [
            ("42", IntegerLiteral),
            ("1'000'000", IntegerLiteral),
            ("0b1010", IntegerLiteral),
            ("0777ull", IntegerLiteral),
            ("3.14f", FloatingLiteral),
            (".5", FloatingLiteral),
            ("1.", FloatingLiteral),
            ("6.02e+23", FloatingLiteral),
            ("1e10", FloatingLiteral),
            ("0x1.8p3", FloatingLiteral),
        ];

        for (text, terminal) in cases {
            let tokens = significant(text);
            assert_eq!(tokens.len(), 1, "{}", text);
            assert_eq!(tokens[0].0, terminal, "{}", text);
        }
    }

    #[test]
    fn test_member_access_is_not_a_float() {
        assert_eq!(
            significant("s.x"),
            owned(&[(Identifier, "s"), (Operator, "."), (Identifier, "x")])
        );
    }

    #[test]
    fn test_character_and_string_literals() {
        assert_eq!(
            significant(r#"L'\'' u8"hi\n" R"x(a)"b)x" 'z'"#),
            owned(&[
                (CharacterLiteral, "'"),
                (StringLiteral, "hi\n"),
                (StringLiteral, "a)\"b"),
                (CharacterLiteral, "z"),
            ])
        );
    }

    #[test]
    fn test_raw_string_spans_lines() {
        let lexemes = lex(CppLexicon, "auto s = R\"(one\ntwo)\";");
        let raw = lexemes
            .iter()
            .filter_map(Lexeme::token)
            .find(|t| t.terminal == StringLiteral)
            .unwrap();
        assert_eq!(raw.value, "one\ntwo");
        assert_eq!(raw.span.to_string(), "1:10-2:6");
    }

    #[test]
    fn test_comments_are_emitted() {
        let tokens = pairs(&lex(CppLexicon, "a // note\n/* multi\nline */b"));
        assert_eq!(
            tokens,
            owned(&[
                (Identifier, "a"),
                (Whitespace, " "),
                (LineComment, "// note"),
                (Newline, "\n"),
                (BlockComment, "/* multi\nline */"),
                (Identifier, "b"),
            ])
        );
    }

    #[test]
    fn test_line_splice_is_whitespace() {
        assert_eq!(
            pairs(&lex(CppLexicon, "#define N \\\n  1")),
            owned(&[
                (Operator, "#"),
                (Identifier, "define"),
                (Whitespace, " "),
                (Identifier, "N"),
                (Whitespace, " \\\n"),
                (Whitespace, "  "),
                (IntegerLiteral, "1"),
            ])
        );
    }

    #[test]
    fn test_splice_inside_string_literal() {
        let text = "const char* s = \"abc\\\ndef\";\n";
        let lexemes = lex(CppLexicon, text);
        let literal = lexemes
            .iter()
            .filter_map(Lexeme::token)
            .find(|t| t.terminal == StringLiteral)
            .unwrap();
        assert_eq!(literal.text, "\"abc\\\ndef\"");
        assert_eq!(literal.value, "abcdef");
        assert_eq!(literal.span.to_string(), "1:17-2:5");
        assert_eq!(reconstruct(&lexemes), text);

        let mut parser = Parser::new("m.cpp", Cursor::new(text.as_bytes().to_vec()), CppLexicon, CollectingSink::new());
        assert!(parser.parse());
        assert!(parser.sink().is_empty());
    }

    #[test]
    fn test_splice_continues_line_comment() {
        assert_eq!(
            pairs(&lex(CppLexicon, "// note \\\nint x;")),
            owned(&[(LineComment, "// note int x;")])
        );
    }

    #[test]
    fn test_splice_inside_keyword_and_identifier() {
        let lexemes = lex(CppLexicon, "in\\\nt x;");
        assert_matches!(&lexemes[0], Lexeme::Valid(t) if t.terminal == Keyword && t.text == "in\\\nt" && t.value == "int");
        assert_eq!(
            significant("in\\\nt x;"),
            owned(&[(Keyword, "int"), (Identifier, "x"), (Operator, ";")])
        );

        assert_eq!(
            pairs(&lex(CppLexicon, "foo\\\n  bar")),
            owned(&[(Identifier, "foo"), (Whitespace, "\\\n  "), (Identifier, "bar")])
        );
    }

    #[test]
    fn test_splice_inside_operator_and_number() {
        assert_eq!(
            significant("a +\\\n= 1\\\n0;"),
            owned(&[(Identifier, "a"), (Operator, "+="), (IntegerLiteral, "10"), (Operator, ";")])
        );
    }

    #[test]
    fn test_raw_string_keeps_splice() {
        let raw = significant("R\"(a\\\nb)\"");
        assert_eq!(raw, owned(&[(StringLiteral, "a\\\nb")]));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let lexemes = lex(CppLexicon, "int a; /* open\nstill open");
        assert_matches!(
            lexemes.last(),
            Some(Lexeme::Invalid(InvalidToken {
                text,
                error: LexicalError::Unterminated { construct: "block comment" },
                ..
            })) if text == "/* open\nstill open"
        );
    }

    #[test]
    fn test_unrecognized_characters() {
        let lexemes = lex(CppLexicon, "a ` b");
        assert_matches!(
            &lexemes[2],
            Lexeme::Invalid(InvalidToken { text, error: LexicalError::UnrecognizedInput, .. }) if text == "`"
        );
        assert_matches!(&lexemes[4], Lexeme::Valid(t) if t.text == "b");
    }

    #[test]
    fn test_unclosed_string_is_invalid() {
        let lexemes = lex(CppLexicon, "\"abc\nx");
        assert_matches!(&lexemes[0], Lexeme::Invalid(InvalidToken { text, .. }) if text == "\"");
    }

    #[test]
    fn test_tokens_reconstruct_input() {
        let input = "#include <vector>\r\nint main() {\n\treturn v[0] >= 1 ? 0 : 1; // done\r}\n";
        assert_eq!(reconstruct(&lex(CppLexicon, input)), input);
    }
}
