// Internal modules
#[macro_use]
pub mod logging;
pub mod config;
pub mod grammar;
pub mod lexical;
pub mod pipeline;
pub mod source;
pub mod syntax;
pub mod terms;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use lexical::{create_lexer, create_lexer_with_preferences, Classifier, Lexer, Lexicon};
pub use pipeline::{parse_unit, tokenize_unit, Language, PipelineError, TokenRecord, UnitReport};
pub use source::{SourceError, SourceUnit};
pub use syntax::{CollectingSink, Diagnostic, DiagnosticSink, Grammar, ParseOutcome, Parser};
pub use tokens::{Lexeme, Terminal, Token, TokenSource, TokenStream};
pub use utils::{SourceLocation, SourceSpan};
