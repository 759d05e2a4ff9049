//! Token types shared by every lexicon
//!
//! A grammar supplies its own `Terminal` enumeration; the engine only needs
//! to know each terminal's category.

use crate::logging::{codes, Code};
use crate::terms::SplitError;
use crate::utils::{SourceLocation, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Coarse classification every terminal maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenCategory {
    Whitespace,
    Comment,
    Keyword,
    Identifier,
    Literal,
    Operator,
    Punctuation,
}

impl TokenCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCategory::Whitespace => "whitespace",
            TokenCategory::Comment => "comment",
            TokenCategory::Keyword => "keyword",
            TokenCategory::Identifier => "identifier",
            TokenCategory::Literal => "literal",
            TokenCategory::Operator => "operator",
            TokenCategory::Punctuation => "punctuation",
        }
    }

    /// Categories the parser skips while looking for the next significant token
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenCategory::Whitespace | TokenCategory::Comment)
    }
}

/// A grammar's closed set of token kinds
pub trait Terminal: Copy + Eq + Hash + fmt::Debug + fmt::Display + 'static {
    fn category(&self) -> TokenCategory;

    /// Stable lowercase name used in diagnostics and token dumps
    fn name(&self) -> &'static str;

    fn is_trivia(&self) -> bool {
        self.category().is_trivia()
    }
}

/// A classified lexeme with its location and decoded value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<T> {
    pub terminal: T,
    /// Source text exactly as read
    pub text: String,
    /// Decoded form: quotes and escapes removed, keywords case-folded
    pub value: String,
    pub span: SourceSpan,
}

impl<T: Terminal> Token<T> {
    pub fn new(terminal: T, text: String, value: String, start: SourceLocation) -> Self {
        let span = SourceSpan::covering(start, &text);
        Self {
            terminal,
            text,
            value,
            span,
        }
    }

    /// Token whose value is its text
    pub fn verbatim(terminal: T, text: &str, start: SourceLocation) -> Self {
        Self::new(terminal, text.to_string(), text.to_string(), start)
    }

    pub fn location(&self) -> &SourceLocation {
        &self.span.start
    }

    pub fn category(&self) -> TokenCategory {
        self.terminal.category()
    }

    pub fn is_trivia(&self) -> bool {
        self.terminal.is_trivia()
    }

    pub fn is(&self, terminal: T) -> bool {
        self.terminal == terminal
    }
}

impl<T: Terminal> fmt::Display for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} at {}", self.terminal, self.text, self.span)
    }
}

/// Why a stretch of input could not be classified
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexicalError {
    #[error("Unrecognized input")]
    UnrecognizedInput,

    #[error("Unterminated {construct}")]
    Unterminated { construct: &'static str },

    #[error("Token exceeds maximum length of {limit} bytes")]
    TokenTooLong { limit: usize },

    #[error("Too many tokens (max {limit})")]
    TooManyTokens { limit: usize },

    #[error(transparent)]
    Split(#[from] SplitError),
}

impl LexicalError {
    pub fn error_code(&self) -> Code {
        match self {
            LexicalError::UnrecognizedInput => codes::lexical::UNRECOGNIZED_INPUT,
            LexicalError::Unterminated { .. } => codes::lexical::UNTERMINATED_CONSTRUCT,
            LexicalError::TokenTooLong { .. } => codes::lexical::TOKEN_TOO_LONG,
            LexicalError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
            LexicalError::Split(SplitError::TermTooLong { .. }) => codes::lexical::TERM_TOO_LONG,
            LexicalError::Split(SplitError::Source(_)) => codes::lexical::SOURCE_FAULT,
        }
    }
}

/// Input the classifier gave up on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidToken {
    /// Offending text, empty when the source itself failed
    pub text: String,
    pub span: SourceSpan,
    pub error: LexicalError,
}

impl InvalidToken {
    pub fn new(text: String, span: SourceSpan, error: LexicalError) -> Self {
        Self { text, span, error }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.span.start
    }

    pub fn error_code(&self) -> Code {
        self.error.error_code()
    }
}

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} at {}", self.error, self.text, self.span)
    }
}

/// What a token source hands out: a token, an unclassifiable stretch, or nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme<T> {
    EndOfInput,
    Invalid(InvalidToken),
    Valid(Token<T>),
}

impl<T: Terminal> Lexeme<T> {
    pub fn is_end(&self) -> bool {
        matches!(self, Lexeme::EndOfInput)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Lexeme::Invalid(_))
    }

    pub fn token(&self) -> Option<&Token<T>> {
        match self {
            Lexeme::Valid(token) => Some(token),
            _ => None,
        }
    }

    pub fn into_token(self) -> Option<Token<T>> {
        match self {
            Lexeme::Valid(token) => Some(token),
            _ => None,
        }
    }

    pub fn terminal(&self) -> Option<T> {
        self.token().map(|token| token.terminal)
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            Lexeme::EndOfInput => None,
            Lexeme::Invalid(invalid) => Some(&invalid.span),
            Lexeme::Valid(token) => Some(&token.span),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Lexeme::EndOfInput => "",
            Lexeme::Invalid(invalid) => &invalid.text,
            Lexeme::Valid(token) => &token.text,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::source::SourceError;

    /// Minimal terminal set for engine tests
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub(crate) enum Tiny {
        Space,
        Note,
        Word,
        Number,
        Plus,
    }

    impl fmt::Display for Tiny {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name())
        }
    }

    impl Terminal for Tiny {
        fn category(&self) -> TokenCategory {
            match self {
                Tiny::Space => TokenCategory::Whitespace,
                Tiny::Note => TokenCategory::Comment,
                Tiny::Word => TokenCategory::Identifier,
                Tiny::Number => TokenCategory::Literal,
                Tiny::Plus => TokenCategory::Operator,
            }
        }

        fn name(&self) -> &'static str {
            match self {
                Tiny::Space => "space",
                Tiny::Note => "note",
                Tiny::Word => "word",
                Tiny::Number => "number",
                Tiny::Plus => "plus",
            }
        }
    }

    #[test]
    fn test_token_span_covers_text() {
        let token = Token::verbatim(Tiny::Word, "abc", SourceLocation::new("u", 2, 5));
        assert_eq!(token.span.to_string(), "2:5-2:8");
        assert_eq!(token.location(), &SourceLocation::new("u", 2, 5));
        assert!(token.is(Tiny::Word));
        assert_eq!(token.to_string(), "word \"abc\" at 2:5-2:8");
    }

    #[test]
    fn test_trivia_categories() {
        assert!(Tiny::Space.is_trivia());
        assert!(Tiny::Note.is_trivia());
        assert!(!Tiny::Word.is_trivia());
        assert!(!Tiny::Plus.is_trivia());
    }

    #[test]
    fn test_lexeme_accessors() {
        let valid = Lexeme::Valid(Token::verbatim(Tiny::Number, "42", SourceLocation::start("u")));
        assert_eq!(valid.terminal(), Some(Tiny::Number));
        assert_eq!(valid.text(), "42");

        let invalid: Lexeme<Tiny> = Lexeme::Invalid(InvalidToken::new(
            "@".to_string(),
            SourceSpan::covering(SourceLocation::start("u"), "@"),
            LexicalError::UnrecognizedInput,
        ));
        assert!(invalid.is_invalid());
        assert_eq!(invalid.terminal(), None);
        assert_eq!(invalid.span().map(ToString::to_string).as_deref(), Some("1:1-1:2"));

        let end: Lexeme<Tiny> = Lexeme::EndOfInput;
        assert!(end.is_end());
        assert_eq!(end.text(), "");
        assert!(end.span().is_none());
    }

    #[test]
    fn test_lexical_error_codes() {
        assert_eq!(
            LexicalError::Unterminated { construct: "block comment" }.error_code(),
            codes::lexical::UNTERMINATED_CONSTRUCT
        );
        let split = LexicalError::from(SplitError::Source(SourceError::InvalidEncoding { offset: 0 }));
        assert_eq!(split.error_code(), codes::lexical::SOURCE_FAULT);
        assert_eq!(split.to_string(), "Invalid UTF-8 at byte offset 0");
    }
}
