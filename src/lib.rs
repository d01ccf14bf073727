//! # Introduction
//!
//! Quirinus is a small dynamically typed scripting language with Latin
//! keywords, indentation-delimited blocks and a first-class Roman numeral
//! type: `IV + 1` is `V`, while `1 + IV` is `5`.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Interpreter
//! ```
//!
//! 1. [`parser`]: tokenises the source (tracking indentation and f-string
//!    interpolations) and builds an AST by recursive descent.
//! 2. [`interpreter`]: walks the AST with closures, `tempta`/`praeter`
//!    recovery and a recursion ceiling.
//! 3. [`memory`]: values and the scope chain they live in.
//! 4. [`numeral`]: the Roman numeral codec.
//! 5. [`console`] and [`loader`]: the interpreter's view of standard streams
//!    and of other script files.
//!
//! ## Example
//!
//! ```
//! use quirinus::console::Console;
//! use quirinus::interpreter::{Interpreter, InterpreterConfig};
//!
//! let mut interpreter = Interpreter::new(InterpreterConfig::new().console(Console::captured()));
//! interpreter
//!     .run_source("<doc>", "opus dupla(n) -> n * 2\nscribe(dupla(XXI))")
//!     .unwrap();
//! assert_eq!(interpreter.console().get_output(), vec!["XLII"]);
//! ```

pub mod console;
pub mod error;
pub mod interpreter;
pub mod loader;
pub mod memory;
pub mod numeral;
pub mod parser;
