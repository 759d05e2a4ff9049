//! Cursor over the terms of one unit

use super::splitter::{SplitError, TermSplitter};
use super::term::Term;
use crate::utils::SourceLocation;
use std::io::BufRead;
use std::sync::Arc;

enum Strategy<R> {
    Eager(std::vec::IntoIter<Term>),
    Lazy(TermSplitter<R>),
}

/// Single-pass term stream with one term of lookahead.
///
/// The lookahead makes `is_at_end` exact: it turns true right after the last
/// term is taken, never later.
pub struct TermStream<R> {
    strategy: Strategy<R>,
    unit: Arc<str>,
    lookahead: Option<Term>,
    end: SourceLocation,
    consumed: usize,
    fault: Option<SplitError>,
}

impl<R: BufRead> TermStream<R> {
    /// Split the whole unit before the first term is handed out
    pub fn eager(splitter: TermSplitter<R>) -> Self {
        let unit = Arc::clone(splitter.unit());
        let (terms, fault) = splitter.split_all();
        let mut terms = terms.into_iter();
        let lookahead = terms.next();

        Self {
            strategy: Strategy::Eager(terms),
            end: SourceLocation::start(Arc::clone(&unit)),
            unit,
            lookahead,
            consumed: 0,
            fault,
        }
    }

    /// Split on demand, one term ahead of the reader
    pub fn lazy(splitter: TermSplitter<R>) -> Self {
        let unit = Arc::clone(splitter.unit());
        let mut stream = Self {
            strategy: Strategy::Lazy(splitter),
            end: SourceLocation::start(Arc::clone(&unit)),
            unit,
            lookahead: None,
            consumed: 0,
            fault: None,
        };
        stream.lookahead = stream.pull();
        stream
    }

    fn pull(&mut self) -> Option<Term> {
        match &mut self.strategy {
            Strategy::Eager(terms) => terms.next(),
            Strategy::Lazy(splitter) => {
                let term = splitter.next_term();
                if term.is_none() {
                    if let Some(fault) = splitter.take_fault() {
                        self.fault = Some(fault);
                    }
                }
                term
            }
        }
    }

    pub fn next_term(&mut self) -> Option<Term> {
        let current = self.lookahead.take()?;
        self.end = current.end_location();
        self.consumed += 1;
        self.lookahead = self.pull();
        Some(current)
    }

    pub fn peek_term(&self) -> Option<&Term> {
        self.lookahead.as_ref()
    }

    /// True once every term has been taken
    pub fn is_at_end(&self) -> bool {
        self.lookahead.is_none()
    }

    /// The error that cut the unit short, available once the stream is at its end
    pub fn take_fault(&mut self) -> Option<SplitError> {
        if self.is_at_end() {
            self.fault.take()
        } else {
            None
        }
    }

    pub fn unit(&self) -> &Arc<str> {
        &self.unit
    }

    /// Location just past the last term taken
    pub fn end_location(&self) -> &SourceLocation {
        &self.end
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn is_eager(&self) -> bool {
        matches!(self.strategy, Strategy::Eager(_))
    }
}

impl<R: BufRead> Iterator for TermStream<R> {
    type Item = Term;

    fn next(&mut self) -> Option<Term> {
        self.next_term()
    }
}
