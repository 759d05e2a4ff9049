//! Shared primitive types and pure helpers used by the lexer and parser.

pub mod span;
pub mod text;

pub use span::{SourceLocation, SourceSpan};
