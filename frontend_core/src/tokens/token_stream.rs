//! Token sources and the single-pass stream over them

use super::token::{Lexeme, Terminal, Token};
use crate::utils::SourceLocation;
use std::collections::VecDeque;
use std::sync::Arc;

/// Anything that produces lexemes for one unit.
///
/// Once `get_token` has returned `EndOfInput` it must keep doing so.
pub trait TokenSource {
    type Terminal: Terminal;

    fn get_token(&mut self) -> Lexeme<Self::Terminal>;

    /// Location just past the input read so far
    fn end_location(&self) -> SourceLocation;

    fn unit(&self) -> &Arc<str>;
}

impl<S: TokenSource + ?Sized> TokenSource for Box<S> {
    type Terminal = S::Terminal;

    fn get_token(&mut self) -> Lexeme<Self::Terminal> {
        (**self).get_token()
    }

    fn end_location(&self) -> SourceLocation {
        (**self).end_location()
    }

    fn unit(&self) -> &Arc<str> {
        (**self).unit()
    }
}

/// Forward-only cursor over a token source with one lexeme of lookahead.
///
/// `is_at_end` is true exactly when the next lexeme is `EndOfInput`; from
/// then on `next_token` returns `EndOfInput` without touching the source.
pub struct TokenStream<S: TokenSource> {
    source: S,
    lookahead: Lexeme<S::Terminal>,
    consumed: usize,
}

impl<S: TokenSource> TokenStream<S> {
    pub fn new(mut source: S) -> Self {
        let lookahead = source.get_token();
        Self {
            source,
            lookahead,
            consumed: 0,
        }
    }

    pub fn next_token(&mut self) -> Lexeme<S::Terminal> {
        if self.lookahead.is_end() {
            return Lexeme::EndOfInput;
        }

        let next = self.source.get_token();
        self.consumed += 1;
        std::mem::replace(&mut self.lookahead, next)
    }

    pub fn peek(&self) -> &Lexeme<S::Terminal> {
        &self.lookahead
    }

    pub fn is_at_end(&self) -> bool {
        self.lookahead.is_end()
    }

    /// Lexemes handed out so far, trivia and invalid ones included
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn end_location(&self) -> SourceLocation {
        self.source.end_location()
    }

    pub fn unit(&self) -> &Arc<str> {
        self.source.unit()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: TokenSource> Iterator for TokenStream<S> {
    type Item = Lexeme<S::Terminal>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Lexeme::EndOfInput => None,
            lexeme => Some(lexeme),
        }
    }
}

/// Token source over lexemes prepared in memory
pub struct VecTokenSource<T> {
    unit: Arc<str>,
    pending: VecDeque<Lexeme<T>>,
    end: SourceLocation,
}

impl<T: Terminal> VecTokenSource<T> {
    pub fn new(unit: impl Into<Arc<str>>, lexemes: Vec<Lexeme<T>>) -> Self {
        let unit = unit.into();
        Self {
            end: SourceLocation::start(Arc::clone(&unit)),
            unit,
            pending: lexemes.into_iter().filter(|l| !l.is_end()).collect(),
        }
    }

    /// Lay `(terminal, text)` pairs out one after another from line 1, column 1
    pub fn from_pairs(unit: impl Into<Arc<str>>, pairs: &[(T, &str)]) -> Self {
        let unit = unit.into();
        let mut location = SourceLocation::start(Arc::clone(&unit));
        let mut lexemes = Vec::with_capacity(pairs.len());

        for &(terminal, text) in pairs {
            let token = Token::verbatim(terminal, text, location);
            location = token.span.end.clone();
            lexemes.push(Lexeme::Valid(token));
        }

        Self::new(unit, lexemes)
    }
}

impl<T: Terminal> TokenSource for VecTokenSource<T> {
    type Terminal = T;

    fn get_token(&mut self) -> Lexeme<T> {
        match self.pending.pop_front() {
            Some(lexeme) => {
                if let Some(span) = lexeme.span() {
                    self.end = span.end.clone();
                }
                lexeme
            }
            None => Lexeme::EndOfInput,
        }
    }

    fn end_location(&self) -> SourceLocation {
        self.end.clone()
    }

    fn unit(&self) -> &Arc<str> {
        &self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::token::tests::Tiny;
    use assert_matches::assert_matches;

    fn source() -> VecTokenSource<Tiny> {
        VecTokenSource::from_pairs("u", &[(Tiny::Word, "a"), (Tiny::Space, " "), (Tiny::Number, "1")])
    }

    #[test]
    fn test_is_at_end_becomes_true_after_last_token() {
        let mut stream = TokenStream::new(source());

        assert!(!stream.is_at_end());
        assert_matches!(stream.next_token(), Lexeme::Valid(t) if t.text == "a");
        assert_matches!(stream.next_token(), Lexeme::Valid(t) if t.text == " ");
        assert!(!stream.is_at_end());
        assert_matches!(stream.next_token(), Lexeme::Valid(t) if t.text == "1");
        assert!(stream.is_at_end());
        assert_eq!(stream.consumed(), 3);
    }

    #[test]
    fn test_end_is_stable_and_side_effect_free() {
        let mut stream = TokenStream::new(source());
        while stream.next().is_some() {}

        let end = stream.end_location();
        for _ in 0..5 {
            assert_matches!(stream.next_token(), Lexeme::EndOfInput);
            assert!(stream.is_at_end());
        }
        assert_eq!(stream.consumed(), 3);
        assert_eq!(stream.end_location(), end);
        assert_eq!(end, SourceLocation::new("u", 1, 4));
    }

    #[test]
    fn test_empty_source_is_immediately_at_end() {
        let mut stream = TokenStream::new(VecTokenSource::<Tiny>::new("u", vec![]));
        assert!(stream.is_at_end());
        assert_matches!(stream.next_token(), Lexeme::EndOfInput);
        assert_eq!(stream.end_location(), SourceLocation::start("u"));
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut stream = TokenStream::new(source());
        assert_eq!(stream.peek().terminal(), Some(Tiny::Word));
        assert_eq!(stream.peek().terminal(), Some(Tiny::Word));
        assert_eq!(stream.consumed(), 0);
        stream.next_token();
        assert_eq!(stream.peek().terminal(), Some(Tiny::Space));
    }

    #[test]
    fn test_from_pairs_lays_out_locations() {
        let tokens: Vec<_> = TokenStream::new(source())
            .filter_map(Lexeme::into_token)
            .map(|t| t.span.to_string())
            .collect();
        assert_eq!(tokens, ["1:1-1:2", "1:2-1:3", "1:3-1:4"]);
    }
}
