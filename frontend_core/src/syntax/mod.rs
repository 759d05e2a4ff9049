//! Syntax analysis: the parser core and its diagnostics
//!
//! The parser is grammar-agnostic. Language drivers implement [`Grammar`]
//! and consume tokens through `expect`/`expect_any`; diagnostics flow to an
//! injected [`DiagnosticSink`].

pub mod diagnostics;
pub mod parser;

pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, LoggingSink, WriterSink,
};
pub use parser::{Expected, Grammar, ParseOutcome, Parser, ParserState};

use crate::logging::codes;

/// Check that every syntax error code has registry metadata
pub fn validate_syntax_codes() -> Result<(), String> {
    let syntax_codes = [
        codes::syntax::NO_MORE_TOKEN,
        codes::syntax::UNEXPECTED_TOKEN,
        codes::syntax::PARSE_ABORTED,
        codes::syntax::NO_PROGRESS,
        codes::syntax::PARSE_REJECTED,
    ];

    for code in &syntax_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Syntax error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_codes_are_registered() {
        assert!(validate_syntax_codes().is_ok());
    }
}
