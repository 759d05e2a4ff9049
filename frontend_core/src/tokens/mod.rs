//! Token definitions and the token stream
//!
//! Tokens are generic over a grammar's `Terminal` set. A token source yields
//! `Lexeme`s: a valid token, an invalid stretch of input, or end of input.

pub mod token;
pub mod token_stream;

pub use token::{InvalidToken, Lexeme, LexicalError, Terminal, Token, TokenCategory};
pub use token_stream::{TokenSource, TokenStream, VecTokenSource};
