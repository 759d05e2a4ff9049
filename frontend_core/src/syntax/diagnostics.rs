//! Diagnostics and the sinks that receive them
//!
//! The parser reports through a `DiagnosticSink` it owns for the duration of
//! one parse. Sinks never influence parsing; the parser keeps its own error
//! count.

use crate::config::compile_time::syntax::MAX_DIAGNOSTICS;
use crate::logging::{codes, Code};
use crate::tokens::InvalidToken;
use crate::utils::{SourceLocation, SourceSpan};
use crate::{log_debug, log_error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Input ended where a token was expected
    NoMoreToken,
    /// A token of the wrong terminal was found
    UnexpectedToken,
    /// Lexical error that aborted the parse
    InvalidToken,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::NoMoreToken => "no_more_token",
            DiagnosticKind::UnexpectedToken => "unexpected_token",
            DiagnosticKind::InvalidToken => "invalid_token",
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            DiagnosticKind::NoMoreToken => codes::syntax::NO_MORE_TOKEN,
            DiagnosticKind::UnexpectedToken => codes::syntax::UNEXPECTED_TOKEN,
            DiagnosticKind::InvalidToken => codes::syntax::PARSE_ABORTED,
        }
    }

    /// Only unexpected tokens count towards the parser's error total
    pub fn is_counted(&self) -> bool {
        matches!(self, DiagnosticKind::UnexpectedToken)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Offending text, empty for `NoMoreToken`
    pub text: String,
    pub span: SourceSpan,
    /// Lexical error message for `InvalidToken`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Diagnostic {
    pub fn no_more_token(location: &SourceLocation) -> Self {
        Self {
            kind: DiagnosticKind::NoMoreToken,
            text: String::new(),
            span: SourceSpan::point(location.clone()),
            reason: None,
        }
    }

    pub fn unexpected_token(text: &str, start: &SourceLocation, end: &SourceLocation) -> Self {
        Self {
            kind: DiagnosticKind::UnexpectedToken,
            text: text.to_string(),
            span: SourceSpan::ordered(start.clone(), end.clone()),
            reason: None,
        }
    }

    pub fn invalid_token(token: &InvalidToken) -> Self {
        Self {
            kind: DiagnosticKind::InvalidToken,
            text: token.text.clone(),
            span: token.span.clone(),
            reason: Some(token.error.to_string()),
        }
    }

    pub fn unit(&self) -> &str {
        self.span.unit()
    }

    pub fn error_code(&self) -> Code {
        self.kind.error_code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::UnexpectedToken => write!(
                f,
                "{}: unexpected token {} at location {}",
                self.unit(),
                self.text,
                self.span
            ),
            DiagnosticKind::NoMoreToken => write!(
                f,
                "{}: unexpected end of input at location {}",
                self.unit(),
                self.span.start
            ),
            DiagnosticKind::InvalidToken => {
                write!(
                    f,
                    "{}: invalid token {} at location {}",
                    self.unit(),
                    self.text.escape_debug(),
                    self.span
                )?;
                match &self.reason {
                    Some(reason) => write!(f, " ({})", reason),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Hooks the parser calls while it runs
pub trait DiagnosticSink {
    /// Expected continuation met end of input
    fn on_no_more_token(&mut self, location: &SourceLocation);

    /// A mismatched token; the parser has already counted it
    fn on_parse_error(&mut self, text: &str, start: &SourceLocation, end: &SourceLocation);

    /// The parse was aborted by a lexical error
    fn on_invalid_token(&mut self, _token: &InvalidToken) {}
}

/// Discards everything
impl DiagnosticSink for () {
    fn on_no_more_token(&mut self, _location: &SourceLocation) {}

    fn on_parse_error(&mut self, _text: &str, _start: &SourceLocation, _end: &SourceLocation) {}
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn on_no_more_token(&mut self, location: &SourceLocation) {
        (**self).on_no_more_token(location)
    }

    fn on_parse_error(&mut self, text: &str, start: &SourceLocation, end: &SourceLocation) {
        (**self).on_parse_error(text, start, end)
    }

    fn on_invalid_token(&mut self, token: &InvalidToken) {
        (**self).on_invalid_token(token)
    }
}

/// Fan out to both sinks, first then second
impl<A: DiagnosticSink, B: DiagnosticSink> DiagnosticSink for (A, B) {
    fn on_no_more_token(&mut self, location: &SourceLocation) {
        self.0.on_no_more_token(location);
        self.1.on_no_more_token(location);
    }

    fn on_parse_error(&mut self, text: &str, start: &SourceLocation, end: &SourceLocation) {
        self.0.on_parse_error(text, start, end);
        self.1.on_parse_error(text, start, end);
    }

    fn on_invalid_token(&mut self, token: &InvalidToken) {
        self.0.on_invalid_token(token);
        self.1.on_invalid_token(token);
    }
}

/// Keeps diagnostics in order, up to a fixed number.
///
/// Counters keep running past the limit; only the stored entries stop.
#[derive(Debug, Clone)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
    capacity: usize,
    dropped: usize,
    parse_errors: usize,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::with_capacity(MAX_DIAGNOSTICS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            diagnostics: Vec::new(),
            capacity,
            dropped: 0,
            parse_errors: 0,
        }
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.len() < self.capacity {
            self.diagnostics.push(diagnostic);
        } else {
            self.dropped += 1;
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Every `on_parse_error` call seen, stored or not
    pub fn parse_errors(&self) -> usize {
        self.parse_errors
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for CollectingSink {
    fn on_no_more_token(&mut self, location: &SourceLocation) {
        self.push(Diagnostic::no_more_token(location));
    }

    fn on_parse_error(&mut self, text: &str, start: &SourceLocation, end: &SourceLocation) {
        self.parse_errors += 1;
        self.push(Diagnostic::unexpected_token(text, start, end));
    }

    fn on_invalid_token(&mut self, token: &InvalidToken) {
        self.push(Diagnostic::invalid_token(token));
    }
}

/// Renders each diagnostic as one line on an injected writer
pub struct WriterSink<W: io::Write> {
    writer: W,
    written: usize,
    last_error: Option<io::Error>,
}

impl<W: io::Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            last_error: None,
        }
    }

    fn write(&mut self, diagnostic: &Diagnostic) {
        match writeln!(self.writer, "{}", diagnostic) {
            Ok(()) => self.written += 1,
            Err(e) => self.last_error = Some(e),
        }
    }

    /// Lines written successfully
    pub fn written(&self) -> usize {
        self.written
    }

    /// Most recent write failure, if any
    pub fn last_error(&self) -> Option<&io::Error> {
        self.last_error.as_ref()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> DiagnosticSink for WriterSink<W> {
    fn on_no_more_token(&mut self, location: &SourceLocation) {
        self.write(&Diagnostic::no_more_token(location));
    }

    fn on_parse_error(&mut self, text: &str, start: &SourceLocation, end: &SourceLocation) {
        self.write(&Diagnostic::unexpected_token(text, start, end));
    }

    fn on_invalid_token(&mut self, token: &InvalidToken) {
        self.write(&Diagnostic::invalid_token(token));
    }
}

/// Routes diagnostics to the global logging service
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl DiagnosticSink for LoggingSink {
    fn on_no_more_token(&mut self, location: &SourceLocation) {
        log_error!(codes::syntax::NO_MORE_TOKEN, "Unexpected end of input",
            span = SourceSpan::point(location.clone()),
            "unit" => location.unit()
        );
    }

    fn on_parse_error(&mut self, text: &str, start: &SourceLocation, end: &SourceLocation) {
        log_error!(codes::syntax::UNEXPECTED_TOKEN, "Unexpected token",
            span = SourceSpan::ordered(start.clone(), end.clone()),
            "unit" => start.unit(),
            "text" => text
        );
    }

    fn on_invalid_token(&mut self, token: &InvalidToken) {
        // the classifier has already logged the lexical error itself
        log_debug!("Parse aborted on invalid token",
            "unit" => token.span.unit(),
            "span" => token.span
        );
    }
}
