//! Script source parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens), including indentation
//!   tokens and f-string sub-lexing
//! - [`parse`]: the [`Parser`] struct, helpers and the program entry point
//! - `statements` / `expressions`: the grammar, as `impl Parser` blocks
//! - [`ast`]: AST node definitions
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators. Ambiguous prefixes (assignment targets, anonymous function
//! parameter lists) are resolved by rewinding the token cursor.

pub mod ast;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{parse, Parser};
