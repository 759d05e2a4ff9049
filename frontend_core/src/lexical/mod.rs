//! Lexical analysis: lexicon tables and the token classifier
//!
//! A `Lexer` is the full per-unit lexical pipeline: term splitter, term
//! stream, classifier and token stream.

pub mod analyzer;
pub mod rules;

pub use analyzer::{Classifier, LexicalMetrics};
pub use rules::{longest_match, verbatim, LexRule, Lexicon, MatchOutcome, Scan};

use crate::config::runtime::LexicalPreferences;
use crate::tokens::TokenStream;
use std::io::BufRead;
use std::sync::Arc;

/// Token stream over a classifier
pub type Lexer<R, L> = TokenStream<Classifier<R, L>>;

/// Build the lexer for one unit with default preferences
pub fn create_lexer<R: BufRead, L: Lexicon>(unit: impl Into<Arc<str>>, reader: R, lexicon: L) -> Lexer<R, L> {
    TokenStream::new(Classifier::new(unit, reader, lexicon))
}

pub fn create_lexer_with_preferences<R: BufRead, L: Lexicon>(
    unit: impl Into<Arc<str>>,
    reader: R,
    lexicon: L,
    preferences: LexicalPreferences,
) -> Lexer<R, L> {
    TokenStream::new(Classifier::with_preferences(unit, reader, lexicon, preferences))
}

/// Check that every lexical error code has registry metadata
pub fn validate_lexical_codes() -> Result<(), String> {
    use crate::logging::codes;

    let lexical_codes = [
        codes::lexical::UNRECOGNIZED_INPUT,
        codes::lexical::UNTERMINATED_CONSTRUCT,
        codes::lexical::TERM_TOO_LONG,
        codes::lexical::TOKEN_TOO_LONG,
        codes::lexical::TOO_MANY_TOKENS,
        codes::lexical::SOURCE_FAULT,
    ];

    for code in &lexical_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Lexical error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    Ok(())
}
