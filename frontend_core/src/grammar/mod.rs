//! Language lexicons
//!
//! Each lexicon pairs a `Terminal` enumeration with its ordered rule table.
//! Production rules are left to grammar drivers built on the parser core.

pub mod cmake;
pub mod cpp;

pub use cmake::{CMakeLexicon, CMakeTerminal};
pub use cpp::{CppLexicon, CppTerminal};
