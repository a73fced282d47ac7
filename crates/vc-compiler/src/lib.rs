//! Front end for the VC teaching language.
//!
//! `lexer` turns source text into tokens, `parser` builds the syntax tree
//! and `semantic` checks and decorates it.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use semantic::analyze;
