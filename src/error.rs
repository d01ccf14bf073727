//! Error type shared by every stage of the pipeline.
//!
//! Lexing, parsing and evaluation all report failures through one [`Error`]
//! struct. The [`ErrorKind`] splits into a static tier (raised before any
//! statement runs) and a dynamic tier (raised while evaluating, catchable by
//! `tempta`/`praeter`).

use crate::memory::scope::Context;
use crate::parser::ast::{SourceLocation, Span};
use std::fmt;
use std::rc::Rc;

/// Category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Static
    IllegalChar,
    Indent,
    InvalidNumeral,
    ExpectedItem,
    InvalidSyntax,

    // Dynamic
    Runtime,
    Typing,
    Naming,
    Attr,
    Indexing,
    Recursing,
    DivisionByZero,
}

impl ErrorKind {
    /// Every dynamic kind, in declaration order.
    pub const DYNAMIC: [ErrorKind; 7] = [
        ErrorKind::Runtime,
        ErrorKind::Typing,
        ErrorKind::Naming,
        ErrorKind::Attr,
        ErrorKind::Indexing,
        ErrorKind::Recursing,
        ErrorKind::DivisionByZero,
    ];

    /// Name shown to users and matched by `praeter` clauses.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::IllegalChar => "IllegalCharacterError",
            ErrorKind::Indent => "IndentationError",
            ErrorKind::InvalidNumeral => "InvalidNumeralError",
            ErrorKind::ExpectedItem => "ExpectedItemError",
            ErrorKind::InvalidSyntax => "SyntaxError",
            ErrorKind::Runtime => "RuntimeError",
            ErrorKind::Typing => "TypeError",
            ErrorKind::Naming => "NameError",
            ErrorKind::Attr => "AttributeError",
            ErrorKind::Indexing => "IndexError",
            ErrorKind::Recursing => "RecursionError",
            ErrorKind::DivisionByZero => "ZeroDivisionError",
        }
    }

    /// Lexical and syntactic errors abort the pipeline before evaluation.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            ErrorKind::IllegalChar
                | ErrorKind::Indent
                | ErrorKind::InvalidNumeral
                | ErrorKind::ExpectedItem
                | ErrorKind::InvalidSyntax
        )
    }

    /// Looks up a dynamic kind by its display name.
    pub fn from_name(name: &str) -> Option<ErrorKind> {
        Self::DYNAMIC.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a rendered call chain, outermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFrame {
    pub file: Rc<str>,
    pub location: SourceLocation,
    pub display_name: String,
}

#[derive(thiserror::Error, Debug, Clone)]
#[error(
    "{kind}: {message}\nFile {file}, line {}, column {}",
    .span.start.line,
    .span.start.column
)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub file: Rc<str>,
    /// Call chain at the point the error was raised. Empty for static errors.
    pub traceback: Vec<TraceFrame>,
    /// Set when the input ended where more could have been typed, such as
    /// right after a block header.
    pub interactive: bool,
}

impl Error {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        span: Span,
        file: Rc<str>,
    ) -> Self {
        Error {
            kind,
            message: message.into(),
            span,
            file,
            traceback: Vec::new(),
            interactive: false,
        }
    }

    /// Builds a dynamic error attributed to `context`, capturing its call chain.
    pub fn in_context(
        kind: ErrorKind,
        message: impl Into<String>,
        span: Span,
        context: &Context,
    ) -> Self {
        let mut err = Error::new(kind, message, span, context.file.clone());
        err.traceback = context.trace(span.start);
        err
    }

    /// Like [`Error::in_context`] but tolerates a value that was never
    /// attributed to a context.
    pub fn maybe_in_context(
        kind: ErrorKind,
        message: impl Into<String>,
        span: Span,
        context: Option<&Context>,
    ) -> Self {
        match context {
            Some(ctx) => Error::in_context(kind, message, span, ctx),
            None => Error::new(kind, message, span, Rc::from("<program>")),
        }
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn is_static(&self) -> bool {
        self.kind.is_static()
    }

    /// Renders the call chain the way a traceback is printed, followed by the
    /// error line itself.
    pub fn traceback_string(&self) -> String {
        let mut out = String::new();
        if !self.traceback.is_empty() {
            out.push_str("Traceback (most recent call last):\n");
            for frame in &self.traceback {
                out.push_str(&format!(
                    "  File {}, line {}, in {}\n",
                    frame.file, frame.location.line, frame.display_name
                ));
            }
        }
        out.push_str(&format!("{}: {}", self.kind, self.message));
        out
    }
}
