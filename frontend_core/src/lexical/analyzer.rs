//! Token classifier: the second lexical pass
//!
//! Pulls terms into a window and carves the window into tokens with the
//! lexicon's longest-match rules. Constructs that continue across lines pull
//! further terms in until they close or the unit ends.

use super::rules::{longest_match, unrecognized_len, Lexicon, MatchOutcome};
use crate::config::compile_time::lexical::{MAX_TOKEN_COUNT, MAX_TOKEN_LENGTH};
use crate::config::runtime::LexicalPreferences;
use crate::logging::codes;
use crate::terms::{split_into_terms, TermStream};
use crate::tokens::{InvalidToken, Lexeme, LexicalError, Terminal, Token, TokenSource};
use crate::utils::{SourceLocation, SourceSpan};
use crate::{log_debug, log_error, log_success};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::Arc;

/// Per-unit classification counters
#[derive(Debug, Default, Clone, Serialize)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub invalid_tokens: usize,
    pub trivia_tokens: usize,
    pub lines_read: usize,
    /// Token count per terminal name, when tracking is enabled
    pub terminal_counts: BTreeMap<&'static str, usize>,
}

impl LexicalMetrics {
    pub(crate) fn record_token<T: Terminal>(&mut self, token: &Token<T>, preferences: &LexicalPreferences) {
        self.total_tokens += 1;

        if token.is_trivia() {
            self.trivia_tokens += 1;
        }

        if preferences.track_terminal_counts {
            *self.terminal_counts.entry(token.terminal.name()).or_insert(0) += 1;
        }
    }

    pub(crate) fn record_invalid(&mut self) {
        self.total_tokens += 1;
        self.invalid_tokens += 1;
    }

    pub(crate) fn record_line(&mut self) {
        self.lines_read += 1;
    }

    pub fn significant_tokens(&self) -> usize {
        self.total_tokens - self.trivia_tokens - self.invalid_tokens
    }
}

/// Classifies the terms of one unit into lexemes of lexicon `L`
pub struct Classifier<R, L: Lexicon> {
    terms: TermStream<R>,
    lexicon: L,
    preferences: LexicalPreferences,
    /// Text of the current term(s), terminators included
    window: String,
    cursor: usize,
    /// Location of `window[cursor]`
    location: SourceLocation,
    max_token_length: usize,
    max_token_count: usize,
    emitted: usize,
    metrics: LexicalMetrics,
    halted: bool,
    finished: bool,
}

impl<R: BufRead, L: Lexicon> Classifier<R, L> {
    pub fn new(unit: impl Into<Arc<str>>, reader: R, lexicon: L) -> Self {
        Self::with_preferences(unit, reader, lexicon, LexicalPreferences::default())
    }

    pub fn with_preferences(
        unit: impl Into<Arc<str>>,
        reader: R,
        lexicon: L,
        preferences: LexicalPreferences,
    ) -> Self {
        let terms = split_into_terms(unit, reader, preferences.eager_terms);
        Self::from_terms(terms, lexicon, preferences)
    }

    pub fn from_terms(terms: TermStream<R>, lexicon: L, preferences: LexicalPreferences) -> Self {
        let location = SourceLocation::start(Arc::clone(terms.unit()));

        log_debug!("Starting token classification",
            "unit" => terms.unit(),
            "lexicon" => lexicon.name(),
            "eager_terms" => terms.is_eager()
        );

        Self {
            terms,
            lexicon,
            preferences,
            window: String::new(),
            cursor: 0,
            location,
            max_token_length: MAX_TOKEN_LENGTH,
            max_token_count: MAX_TOKEN_COUNT,
            emitted: 0,
            metrics: LexicalMetrics::default(),
            halted: false,
            finished: false,
        }
    }

    /// Override the compile-time token limits
    pub fn with_limits(mut self, max_token_length: usize, max_token_count: usize) -> Self {
        self.max_token_length = max_token_length;
        self.max_token_count = max_token_count;
        self
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    pub fn lexicon(&self) -> &L {
        &self.lexicon
    }

    fn remaining(&self) -> &str {
        &self.window[self.cursor..]
    }

    /// Append the next term to the window. False when the terms are exhausted.
    fn pull_term(&mut self) -> bool {
        let Some(term) = self.terms.next_term() else {
            return false;
        };

        self.metrics.record_line();
        if self.cursor == self.window.len() {
            self.window.clear();
            self.cursor = 0;
            self.location = term.location.clone();
        } else if self.cursor > 0 {
            self.window.drain(..self.cursor);
            self.cursor = 0;
        }

        self.window.push_str(&term.text);
        self.window.push_str(term.terminator.as_str());
        true
    }

    fn classify(&mut self) -> Lexeme<L::Terminal> {
        loop {
            if self.emitted >= self.max_token_count {
                let len = self.window.len() - self.cursor;
                self.halted = true;
                return self.invalid(len, LexicalError::TooManyTokens { limit: self.max_token_count });
            }

            match longest_match(self.lexicon.rules(), self.remaining()) {
                MatchOutcome::Matched { rule, len } => return self.valid(rule, len),
                MatchOutcome::NeedMore { rule } => {
                    let len = self.window.len() - self.cursor;
                    if len > self.max_token_length {
                        return self.invalid(len, LexicalError::TokenTooLong { limit: self.max_token_length });
                    }
                    if !self.pull_term() {
                        let construct = self.lexicon.rules()[rule].terminal.name();
                        return self.invalid(len, LexicalError::Unterminated { construct });
                    }
                }
                MatchOutcome::NoMatch => {
                    let len = unrecognized_len(self.lexicon.rules(), self.remaining());
                    return self.invalid(len, LexicalError::UnrecognizedInput);
                }
            }
        }
    }

    fn take(&mut self, len: usize) -> (String, SourceLocation) {
        let text = self.window[self.cursor..self.cursor + len].to_string();
        let start = self.location.clone();
        self.cursor += len;
        self.location = start.advance_str(&text);
        self.emitted += 1;
        (text, start)
    }

    fn valid(&mut self, rule: usize, len: usize) -> Lexeme<L::Terminal> {
        if len > self.max_token_length {
            return self.invalid(len, LexicalError::TokenTooLong { limit: self.max_token_length });
        }

        let (text, start) = self.take(len);
        let rule = &self.lexicon.rules()[rule];
        let value = (rule.decode)(&text);
        let token = Token::new(rule.terminal, text, value, start);
        self.metrics.record_token(&token, &self.preferences);
        Lexeme::Valid(token)
    }

    fn invalid(&mut self, len: usize, error: LexicalError) -> Lexeme<L::Terminal> {
        let (text, start) = self.take(len);
        let span = SourceSpan::covering(start, &text);
        self.metrics.record_invalid();

        log_error!(error.error_code(), "Invalid token",
            span = span.clone(),
            "unit" => self.terms.unit(),
            "text" => text.escape_debug(),
            "reason" => error
        );

        Lexeme::Invalid(InvalidToken::new(text, span, error))
    }

    /// End of terms: report a split fault once, then settle into `EndOfInput`
    fn exhausted(&mut self) -> Lexeme<L::Terminal> {
        if let Some(fault) = self.terms.take_fault() {
            let location = self.terms.end_location().clone();
            let error = LexicalError::from(fault);
            self.metrics.record_invalid();

            log_error!(error.error_code(), "Source could not be read to the end",
                span = SourceSpan::point(location.clone()),
                "unit" => self.terms.unit(),
                "reason" => error
            );

            self.location = location.clone();
            return Lexeme::Invalid(InvalidToken::new(String::new(), SourceSpan::point(location), error));
        }

        self.finish();
        Lexeme::EndOfInput
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        log_success!(codes::success::TOKENIZATION_COMPLETE, "Token classification complete",
            "unit" => self.terms.unit(),
            "lexicon" => self.lexicon.name(),
            "tokens" => self.metrics.total_tokens,
            "significant" => self.metrics.significant_tokens(),
            "invalid" => self.metrics.invalid_tokens,
            "lines" => self.metrics.lines_read
        );

        if self.preferences.track_terminal_counts {
            for (terminal, count) in &self.metrics.terminal_counts {
                log_debug!("Terminal count", "terminal" => terminal, "count" => count);
            }
        }
    }
}

impl<R: BufRead, L: Lexicon> TokenSource for Classifier<R, L> {
    type Terminal = L::Terminal;

    fn get_token(&mut self) -> Lexeme<L::Terminal> {
        if self.finished {
            return Lexeme::EndOfInput;
        }

        if self.halted {
            self.finish();
            return Lexeme::EndOfInput;
        }

        while self.cursor == self.window.len() {
            if !self.pull_term() {
                return self.exhausted();
            }
        }

        self.classify()
    }

    fn end_location(&self) -> SourceLocation {
        self.location.clone()
    }

    fn unit(&self) -> &Arc<str> {
        self.terms.unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::rules::{verbatim, LexRule, Scan};
    use crate::tokens::token::tests::Tiny;
    use crate::utils::text::{prefix_len, rest_of_line_len};
    use assert_matches::assert_matches;
    use std::io::Cursor;

    fn space(input: &str) -> Scan {
        Scan::from_len(prefix_len(input, char::is_whitespace))
    }

    fn word(input: &str) -> Scan {
        Scan::from_len(prefix_len(input, |c| c.is_ascii_alphabetic()))
    }

    fn number(input: &str) -> Scan {
        Scan::from_len(prefix_len(input, |c| c.is_ascii_digit()))
    }

    fn plus(input: &str) -> Scan {
        Scan::from_len(if input.starts_with('+') { 1 } else { 0 })
    }

    /// `;` to end of line, or `{ ... }` across lines
    fn note(input: &str) -> Scan {
        if input.starts_with(';') {
            return Scan::Matched(rest_of_line_len(input));
        }
        match input.strip_prefix('{') {
            Some(rest) => rest.find('}').map_or(Scan::NeedMore, |idx| Scan::Matched(idx + 2)),
            None => Scan::NoMatch,
        }
    }

    fn upper(text: &str) -> String {
        text.to_uppercase()
    }

    struct TinyLexicon;

    impl Lexicon for TinyLexicon {
        type Terminal = Tiny;

        fn name(&self) -> &'static str {
            "tiny"
        }

        fn rules(&self) -> &[LexRule<Tiny>] {
            const RULES: &[LexRule<Tiny>] = &[
                LexRule::new(Tiny::Space, space, verbatim),
                LexRule::new(Tiny::Note, note, verbatim),
                LexRule::new(Tiny::Word, word, upper),
                LexRule::new(Tiny::Number, number, verbatim),
                LexRule::new(Tiny::Plus, plus, verbatim),
            ];
            RULES
        }
    }

    fn classifier(text: &str, eager: bool) -> Classifier<Cursor<Vec<u8>>, TinyLexicon> {
        let preferences = LexicalPreferences {
            eager_terms: eager,
            track_terminal_counts: true,
        };
        Classifier::with_preferences("u", Cursor::new(text.as_bytes().to_vec()), TinyLexicon, preferences)
    }

    fn drain<S: TokenSource>(source: &mut S) -> Vec<Lexeme<S::Terminal>> {
        let mut lexemes = Vec::new();
        loop {
            match source.get_token() {
                Lexeme::EndOfInput => return lexemes,
                lexeme => lexemes.push(lexeme),
            }
        }
    }

    fn summary(lexemes: &[Lexeme<Tiny>]) -> Vec<String> {
        lexemes
            .iter()
            .map(|lexeme| match lexeme {
                Lexeme::Valid(t) => format!("{}:{}@{}", t.terminal, t.value.escape_debug(), t.span),
                Lexeme::Invalid(i) => format!("!{}@{}", i.text.escape_debug(), i.span),
                Lexeme::EndOfInput => "end".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_classifies_across_lines() {
        let mut source = classifier("ab 12\n+cd", false);
        let lexemes = drain(&mut source);

        assert_eq!(
            summary(&lexemes),
            [
                "word:AB@1:1-1:3",
                "space: @1:3-1:4",
                "number:12@1:4-1:6",
                "space:\\n@1:6-2:1",
                "plus:+@2:1-2:2",
                "word:CD@2:2-2:4",
            ]
        );
        assert_eq!(source.metrics().total_tokens, 6);
        assert_eq!(source.metrics().trivia_tokens, 2);
        assert_eq!(source.metrics().terminal_counts.get("word"), Some(&2));
        assert_eq!(source.end_location(), SourceLocation::new("u", 2, 4));
    }

    #[test]
    fn test_multi_line_construct_pulls_terms() {
        let mut source = classifier("a{x\ny\r\nz}b", true);
        let lexemes = drain(&mut source);

        assert_eq!(
            summary(&lexemes),
            ["word:A@1:1-1:2", "note:{x\\ny\\r\\nz}@1:2-3:3", "word:B@3:3-3:4"]
        );
    }

    #[test]
    fn test_unterminated_construct_is_invalid() {
        let mut source = classifier("a {open\nstill", false);
        let lexemes = drain(&mut source);

        assert_eq!(lexemes.len(), 3);
        assert_matches!(
            &lexemes[2],
            Lexeme::Invalid(InvalidToken { text, error: LexicalError::Unterminated { construct: "note" }, .. })
                if text == "{open\nstill"
        );
    }

    #[test]
    fn test_unrecognized_run_is_one_invalid_token() {
        let mut source = classifier("ab@#$12", false);
        let lexemes = drain(&mut source);

        assert_eq!(summary(&lexemes), ["word:AB@1:1-1:3", "!@#$@1:3-1:6", "number:12@1:6-1:8"]);
        assert_eq!(source.metrics().invalid_tokens, 1);
    }

    #[test]
    fn test_end_of_input_is_stable() {
        let mut source = classifier("x", false);
        assert_matches!(source.get_token(), Lexeme::Valid(_));
        for _ in 0..3 {
            assert_matches!(source.get_token(), Lexeme::EndOfInput);
        }
    }

    #[test]
    fn test_empty_unit() {
        let mut source = classifier("", true);
        assert_matches!(source.get_token(), Lexeme::EndOfInput);
        assert_eq!(source.end_location(), SourceLocation::start("u"));
    }

    #[test]
    fn test_eager_and_lazy_terms_classify_identically() {
        let input = "a {b\nc} 1 + ; rest\r\nd";
        assert_eq!(drain(&mut classifier(input, true)), drain(&mut classifier(input, false)));
    }

    #[test]
    fn test_token_count_limit() {
        let mut source = classifier("a b c d", false).with_limits(MAX_TOKEN_LENGTH, 3);
        let lexemes = drain(&mut source);

        assert_eq!(lexemes.len(), 4);
        assert_matches!(
            &lexemes[3],
            Lexeme::Invalid(InvalidToken { error: LexicalError::TooManyTokens { limit: 3 }, .. })
        );
    }

    #[test]
    fn test_token_length_limit() {
        let mut source = classifier("abcdef x", false).with_limits(4, MAX_TOKEN_COUNT);
        let lexemes = drain(&mut source);

        assert_matches!(
            &lexemes[0],
            Lexeme::Invalid(InvalidToken { text, error: LexicalError::TokenTooLong { limit: 4 }, .. })
                if text == "abcdef"
        );
        assert_matches!(&lexemes[2], Lexeme::Valid(t) if t.text == "x");
    }

    #[test]
    fn test_source_fault_becomes_invalid_token() {
        let bytes = vec![b'a', b'\n', b'b', 0xFF];
        let mut source = Classifier::new("u", Cursor::new(bytes), TinyLexicon);
        let lexemes = drain(&mut source);

        assert_eq!(lexemes.len(), 4);
        assert_matches!(
            &lexemes[3],
            Lexeme::Invalid(InvalidToken { text, error: LexicalError::Split(_), span })
                if text.is_empty() && span.start == SourceLocation::new("u", 2, 2)
        );
        assert_matches!(source.get_token(), Lexeme::EndOfInput);
    }
}
