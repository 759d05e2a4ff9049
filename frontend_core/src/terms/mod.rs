//! Terms: located, untyped physical lines
//!
//! The first lexical pass. A [`TermSplitter`] turns a character source into
//! one [`Term`] per line and a [`TermStream`] hands them out in order.

mod splitter;
mod term;
mod term_stream;

pub use splitter::{SplitError, TermSplitter};
pub use term::{LineTerminator, Term};
pub use term_stream::TermStream;

use std::io::BufRead;
use std::sync::Arc;

/// Split `reader` into a term stream, either up front or on demand
pub fn split_into_terms<R: BufRead>(unit: impl Into<Arc<str>>, reader: R, eager: bool) -> TermStream<R> {
    let splitter = TermSplitter::new(unit, reader);
    if eager {
        TermStream::eager(splitter)
    } else {
        TermStream::lazy(splitter)
    }
}
