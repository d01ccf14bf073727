//! Operator evaluation and variable access, as `impl Interpreter` blocks.

pub mod access;
pub mod assign;
pub mod binary;
pub mod unary;
