//! First lexical pass: physical lines out of a character stream

use super::term::{LineTerminator, Term};
use crate::config::compile_time::lexical::MAX_TERM_LENGTH;
use crate::logging::codes;
use crate::source::{CharReader, SourceError};
use crate::utils::SourceLocation;
use crate::{log_debug, log_error, log_success};
use std::io::BufRead;
use std::sync::Arc;

/// Why splitting stopped before the end of the unit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Line {line} exceeds maximum term length of {limit} bytes")]
    TermTooLong { line: u32, limit: usize },
}

impl SplitError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            SplitError::Source(source) => source.error_code(),
            SplitError::TermTooLong { .. } => codes::lexical::TERM_TOO_LONG,
        }
    }
}

/// Splits a unit into one term per physical line.
///
/// `\n`, `\r\n` and a bare `\r` each end a line. A final line without a
/// terminator is still a term; an empty unit has none.
pub struct TermSplitter<R> {
    reader: CharReader<R>,
    unit: Arc<str>,
    line: u32,
    max_term_length: usize,
    emitted: usize,
    fault: Option<SplitError>,
    done: bool,
}

impl<R: BufRead> TermSplitter<R> {
    pub fn new(unit: impl Into<Arc<str>>, reader: R) -> Self {
        Self::with_reader(unit, CharReader::new(reader), MAX_TERM_LENGTH)
    }

    pub fn with_reader(
        unit: impl Into<Arc<str>>,
        reader: CharReader<R>,
        max_term_length: usize,
    ) -> Self {
        Self {
            reader,
            unit: unit.into(),
            line: 1,
            max_term_length,
            emitted: 0,
            fault: None,
            done: false,
        }
    }

    pub fn unit(&self) -> &Arc<str> {
        &self.unit
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Error that ended splitting early, if any
    pub fn take_fault(&mut self) -> Option<SplitError> {
        self.fault.take()
    }

    pub fn next_term(&mut self) -> Option<Term> {
        if self.done {
            return None;
        }

        let location = SourceLocation::new(Arc::clone(&self.unit), self.line, 1);
        let mut text = String::new();

        loop {
            let ch = match self.reader.next_char() {
                Ok(Some(ch)) => ch,
                Ok(None) => return self.finish(location, text, None),
                Err(e) => return self.finish(location, text, Some(e.into())),
            };

            match ch {
                '\n' => return Some(self.end_line(location, text, LineTerminator::Lf)),
                '\r' => {
                    return match self.reader.peek_char() {
                        Ok(Some('\n')) => {
                            let _ = self.reader.next_char();
                            Some(self.end_line(location, text, LineTerminator::CrLf))
                        }
                        Ok(_) => Some(self.end_line(location, text, LineTerminator::Cr)),
                        Err(e) => {
                            let term = self.end_line(location, text, LineTerminator::Cr);
                            self.stop(Some(e.into()));
                            Some(term)
                        }
                    };
                }
                _ => {
                    text.push(ch);
                    if text.len() > self.max_term_length {
                        let fault = SplitError::TermTooLong {
                            line: self.line,
                            limit: self.max_term_length,
                        };
                        return self.finish(location, text, Some(fault));
                    }
                }
            }
        }
    }

    /// Materialise every remaining term
    pub fn split_all(mut self) -> (Vec<Term>, Option<SplitError>) {
        let mut terms = Vec::new();
        while let Some(term) = self.next_term() {
            terms.push(term);
        }

        let fault = self.take_fault();
        match &fault {
            None => log_success!(codes::success::TERM_SPLITTING_COMPLETE, "Term splitting complete",
                "unit" => self.unit,
                "terms" => terms.len(),
                "bytes" => self.reader.offset()
            ),
            Some(e) => log_error!(e.error_code(), "Term splitting stopped early",
                "unit" => self.unit,
                "terms" => terms.len(),
                "error" => e
            ),
        }

        (terms, fault)
    }

    fn end_line(&mut self, location: SourceLocation, text: String, terminator: LineTerminator) -> Term {
        self.line += 1;
        self.emitted += 1;
        Term::new(location, text, terminator)
    }

    /// End of input or failure: flush a pending partial line
    fn finish(
        &mut self,
        location: SourceLocation,
        text: String,
        fault: Option<SplitError>,
    ) -> Option<Term> {
        let term = if text.is_empty() {
            None
        } else {
            self.emitted += 1;
            Some(Term::new(location, text, LineTerminator::None))
        };
        self.stop(fault);
        term
    }

    fn stop(&mut self, fault: Option<SplitError>) {
        self.done = true;
        self.fault = fault;
        log_debug!("Term splitter stopped",
            "unit" => self.unit,
            "terms" => self.emitted,
            "faulted" => self.fault.is_some()
        );
    }
}
