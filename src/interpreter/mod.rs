//! Tree-walking evaluator
//!
//! This module provides the core execution logic:
//! - [`engine`]: the [`Interpreter`](engine::Interpreter), its configuration
//!   and the per-node dispatch
//! - [`ops`]: operators, variable reads and assignment
//! - [`loops`], [`jumps`]: `pro`/`dum`, `si`, `tempta` and `redi`
//! - [`functions`]: closures, calls and argument binding
//! - [`builtins`]: the global built-in functions
//! - [`constants`]: fixed limits and names
//!
//! # Execution Model
//!
//! Evaluation is a depth-first recursion over the AST. Every step returns an
//! [`RTResult`](engine::RTResult): a value (or nothing), or a
//! [`Signal`](engine::Signal) that carries an error, a `redi` value, or a loop
//! jump outward until something handles it.
//!
//! # Scoping
//!
//! Each call gets a fresh [`Context`](crate::memory::Context) whose symbol
//! table reads through to the scope the function was *defined* in. Loops and
//! branches do not open scopes of their own.

pub mod builtins;
pub mod constants;
pub mod engine;
pub mod functions;
pub mod jumps;
pub mod loops;
pub mod ops;

pub use engine::{Interpreter, InterpreterConfig, RTResult, Signal};
