//! Grammar-agnostic parser core
//!
//! Owns the lexer for one unit and offers `expect` primitives that skip
//! trivia centrally. Grammar drivers are plugged in through [`Grammar`];
//! `parse` on its own drains the token stream and only rejects on lexical
//! errors.

use super::diagnostics::DiagnosticSink;
use crate::config::compile_time::syntax::MAX_SKIPPED_TOKENS;
use crate::config::runtime::{LexicalPreferences, SyntaxPreferences};
use crate::lexical::{Classifier, Lexicon};
use crate::logging::codes;
use crate::tokens::{InvalidToken, Lexeme, Terminal, Token, TokenSource, TokenStream};
use crate::utils::{SourceLocation, SourceSpan};
use crate::{log_debug, log_error, log_success};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParserState {
    Running,
    Accepted,
    Rejected,
}

impl ParserState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserState::Running => "running",
            ParserState::Accepted => "accepted",
            ParserState::Rejected => "rejected",
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, ParserState::Running)
    }
}

/// Result of an `expect` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected<T> {
    Matched(Token<T>),
    /// Wrong terminal; already reported and counted
    Mismatched(Token<T>),
    /// Input ended; reported but not counted
    EndOfInput(SourceLocation),
    /// Lexical error; the parse is aborted
    Invalid(InvalidToken),
}

impl<T: Terminal> Expected<T> {
    pub fn is_matched(&self) -> bool {
        matches!(self, Expected::Matched(_))
    }

    pub fn token(&self) -> Option<&Token<T>> {
        match self {
            Expected::Matched(token) | Expected::Mismatched(token) => Some(token),
            _ => None,
        }
    }

    /// The token, only if it matched
    pub fn matched(self) -> Option<Token<T>> {
        match self {
            Expected::Matched(token) => Some(token),
            _ => None,
        }
    }
}

/// Final record of one parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseOutcome {
    pub unit: String,
    pub state: ParserState,
    pub accepted: bool,
    pub error_count: usize,
    pub aborted: bool,
    pub tokens_consumed: usize,
}

/// A grammar driver: consumes tokens through the parser's primitives.
///
/// `step` is called repeatedly until the input is exhausted or the parse
/// aborts. A step that consumes nothing has one token consumed for it and
/// reported as unexpected.
pub trait Grammar<T: Terminal> {
    fn step<S, D>(&mut self, parser: &mut Parser<S, D>)
    where
        S: TokenSource<Terminal = T>,
        D: DiagnosticSink;
}

/// Consumes one significant token per step and checks nothing
struct Drain;

impl<T: Terminal> Grammar<T> for Drain {
    fn step<S, D>(&mut self, parser: &mut Parser<S, D>)
    where
        S: TokenSource<Terminal = T>,
        D: DiagnosticSink,
    {
        parser.advance();
    }
}

pub struct Parser<S: TokenSource, D: DiagnosticSink> {
    tokens: TokenStream<S>,
    sink: D,
    state: ParserState,
    error_count: usize,
    aborted: bool,
    skip_limit: usize,
    preferences: SyntaxPreferences,
    outcome: Option<ParseOutcome>,
}

impl<R: BufRead, L: Lexicon, D: DiagnosticSink> Parser<Classifier<R, L>, D> {
    /// Parser over `reader`, classified with `lexicon`
    pub fn new(unit: impl Into<Arc<str>>, reader: R, lexicon: L, sink: D) -> Self {
        Self::from_source(Classifier::new(unit, reader, lexicon), sink)
    }

    pub fn with_lexical_preferences(
        unit: impl Into<Arc<str>>,
        reader: R,
        lexicon: L,
        preferences: LexicalPreferences,
        sink: D,
    ) -> Self {
        Self::from_source(Classifier::with_preferences(unit, reader, lexicon, preferences), sink)
    }
}

impl<S: TokenSource, D: DiagnosticSink> Parser<S, D> {
    pub fn from_source(source: S, sink: D) -> Self {
        Self::from_stream(TokenStream::new(source), sink)
    }

    pub fn from_stream(tokens: TokenStream<S>, sink: D) -> Self {
        log_debug!("Creating parser", "unit" => tokens.unit());

        Self {
            tokens,
            sink,
            state: ParserState::Running,
            error_count: 0,
            aborted: false,
            skip_limit: MAX_SKIPPED_TOKENS,
            preferences: SyntaxPreferences::default(),
            outcome: None,
        }
    }

    pub fn with_preferences(mut self, preferences: SyntaxPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Tokens a grammar driver may fail to consume before the parse is aborted
    pub fn with_skip_limit(mut self, limit: usize) -> Self {
        self.skip_limit = limit;
        self
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Unexpected tokens reported so far
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn is_at_end(&self) -> bool {
        self.tokens.is_at_end()
    }

    pub fn tokens_consumed(&self) -> usize {
        self.tokens.consumed()
    }

    pub fn unit(&self) -> &Arc<str> {
        self.tokens.unit()
    }

    pub fn end_location(&self) -> SourceLocation {
        self.tokens.end_location()
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut D {
        &mut self.sink
    }

    pub fn into_sink(self) -> D {
        self.sink
    }

    /// Consume trivia up to the next significant lexeme; returns how many
    pub fn skip_trivia(&mut self) -> usize {
        let mut skipped = 0;
        while matches!(self.tokens.peek(), Lexeme::Valid(token) if token.is_trivia()) {
            self.tokens.next_token();
            skipped += 1;
        }
        skipped
    }

    /// Next significant lexeme, without consuming it
    pub fn peek(&mut self) -> &Lexeme<S::Terminal> {
        self.skip_trivia();
        self.tokens.peek()
    }

    pub fn peek_terminal(&mut self) -> Option<S::Terminal> {
        self.peek().terminal()
    }

    /// Take the next lexeme as is, trivia included. An invalid one aborts the parse.
    pub fn advance(&mut self) -> Lexeme<S::Terminal> {
        let lexeme = self.tokens.next_token();
        if let Lexeme::Invalid(invalid) = &lexeme {
            self.abort(invalid);
        }
        lexeme
    }

    pub fn expect(&mut self, terminal: S::Terminal) -> Expected<S::Terminal> {
        if self.preferences.log_expectations {
            log_debug!("Expecting token", "expected" => terminal.name());
        }
        self.expect_where(|t| t == terminal)
    }

    pub fn expect_any(&mut self, terminals: &[S::Terminal]) -> Expected<S::Terminal> {
        if self.preferences.log_expectations {
            let names: Vec<&str> = terminals.iter().map(|t| t.name()).collect();
            log_debug!("Expecting one of", "expected" => names.join(", "));
        }
        self.expect_where(|t| terminals.contains(&t))
    }

    fn expect_where(&mut self, accept: impl Fn(S::Terminal) -> bool) -> Expected<S::Terminal> {
        if self.aborted {
            return Expected::EndOfInput(self.tokens.end_location());
        }

        loop {
            match self.tokens.next_token() {
                Lexeme::Valid(token) if token.is_trivia() => continue,
                Lexeme::Valid(token) => {
                    if accept(token.terminal) {
                        return Expected::Matched(token);
                    }
                    self.report_error(&token.text, &token.span);
                    return Expected::Mismatched(token);
                }
                Lexeme::EndOfInput => {
                    let location = self.tokens.end_location();
                    self.sink.on_no_more_token(&location);
                    return Expected::EndOfInput(location);
                }
                Lexeme::Invalid(invalid) => {
                    self.abort(&invalid);
                    return Expected::Invalid(invalid);
                }
            }
        }
    }

    /// Report an unexpected token found by a grammar driver. Counted once.
    pub fn report_error(&mut self, text: &str, span: &SourceSpan) {
        self.error_count += 1;
        self.sink.on_parse_error(text, &span.start, &span.end);

        log_debug!("Unexpected token",
            "unit" => self.tokens.unit(),
            "text" => text,
            "span" => span,
            "error_count" => self.error_count
        );
    }

    fn abort(&mut self, invalid: &InvalidToken) {
        if self.aborted {
            return;
        }
        self.aborted = true;
        self.sink.on_invalid_token(invalid);

        log_error!(codes::syntax::PARSE_ABORTED, "Parse aborted on invalid token",
            span = invalid.span.clone(),
            "unit" => self.tokens.unit(),
            "reason" => invalid.error
        );
    }

    /// Drain the token stream. Accepts unless a lexical error occurs.
    pub fn parse(&mut self) -> bool {
        self.parse_with(&mut Drain)
    }

    /// Run `grammar` until the input is exhausted or the parse aborts
    pub fn parse_with<G: Grammar<S::Terminal>>(&mut self, grammar: &mut G) -> bool {
        if let Some(outcome) = &self.outcome {
            return outcome.accepted;
        }

        let mut forced = 0;
        loop {
            self.skip_trivia();
            if self.aborted || self.tokens.is_at_end() {
                break;
            }

            let before = self.tokens.consumed();
            grammar.step(self);

            if self.tokens.consumed() == before && !self.aborted && !self.tokens.is_at_end() {
                forced += 1;
                if forced > self.skip_limit {
                    log_error!(codes::syntax::NO_PROGRESS, "Grammar driver stopped consuming tokens",
                        "unit" => self.tokens.unit(),
                        "forced" => forced,
                        "limit" => self.skip_limit
                    );
                    self.aborted = true;
                    break;
                }

                if let Lexeme::Valid(token) = self.advance() {
                    self.report_error(&token.text, &token.span);
                }
            }
        }

        self.finish().accepted
    }

    /// Settle the outcome: accepted only when not aborted, at end of input, and error free.
    /// Later calls return the same outcome.
    pub fn finish(&mut self) -> ParseOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        if !self.aborted {
            self.skip_trivia();
        }

        let accepted = !self.aborted && self.tokens.is_at_end() && self.error_count == 0;
        self.state = if accepted {
            ParserState::Accepted
        } else {
            ParserState::Rejected
        };

        let outcome = ParseOutcome {
            unit: self.tokens.unit().to_string(),
            state: self.state,
            accepted,
            error_count: self.error_count,
            aborted: self.aborted,
            tokens_consumed: self.tokens.consumed(),
        };

        if accepted {
            log_success!(codes::success::PARSE_ACCEPTED, "Parse accepted",
                "unit" => outcome.unit,
                "tokens" => outcome.tokens_consumed
            );
        } else {
            log_error!(codes::syntax::PARSE_REJECTED, "Parse rejected",
                "unit" => outcome.unit,
                "error_count" => outcome.error_count,
                "aborted" => outcome.aborted,
                "at_end" => self.tokens.is_at_end()
            );
        }

        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Outcome of a finished parse
    pub fn outcome(&self) -> Option<&ParseOutcome> {
        self.outcome.as_ref()
    }
}
