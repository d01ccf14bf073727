//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! cursor helpers, error construction and the program entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `statements`: indented blocks, statements and the block-bodied constructs
//!   (`si`, `tempta`, `pro`, `dum`, `opus`)
//! - `expressions`: expressions with precedence climbing
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! Block depth is a counter on the parser rather than a property of nodes:
//! a block at depth `n` expects every statement line to start with exactly
//! `n` [`TokenKind::Tab`] tokens.

use crate::error::{Error, ErrorKind};
use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Lexer, Token, TokenKind};
use std::rc::Rc;
use tracing::debug;

/// Failed speculative parse: how far to back up, and why it failed.
#[derive(Debug)]
pub(crate) struct Rewind {
    pub consumed: usize,
    pub error: Error,
}

/// Recursive descent parser
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) file: Rc<str>,
    /// Required indentation of the block being parsed.
    pub(crate) indent_count: usize,
    pub(crate) in_loop: bool,
    pub(crate) in_func: bool,
}

impl Parser {
    /// Lexes `source` and prepares a parser over its tokens.
    pub fn new(source: &str, file: &str) -> Result<Self, Error> {
        let tokens = Lexer::new(source, file).tokenize()?;
        Ok(Self::from_tokens(tokens, Rc::from(file)))
    }

    /// `tokens` must end with an `Eof` token.
    pub fn from_tokens(tokens: Vec<Token>, file: Rc<str>) -> Self {
        Self {
            tokens,
            position: 0,
            file,
            indent_count: 0,
            in_loop: false,
            in_func: false,
        }
    }

    /// Parse the entire token stream as a program.
    pub fn parse_program(&mut self) -> Result<Program, Error> {
        let statements = self.block_statements()?;

        if !self.is_at_end() {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                "Token cannot appear after previous tokens",
            ));
        }

        debug!(file = %self.file, statements = statements.len(), "parsed program");
        Ok(Program { statements })
    }

    /// Parses the tokens of an f-string interpolation: one expression and
    /// nothing after it.
    pub(crate) fn parse_interpolation(&mut self) -> Result<AstNode, Error> {
        let node = self.expr(false)?;
        if !self.is_at_end() {
            return Err(self.error(
                ErrorKind::InvalidSyntax,
                "Token cannot appear after previous tokens",
            ));
        }
        Ok(node)
    }

    // ===== Helper methods =====

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_keyword(keyword)
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.previous().span
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Span from `start` through the last consumed token.
    pub(crate) fn span_from(&self, start: Span) -> Span {
        start.to(self.previous_span())
    }

    pub(crate) fn error(&self, kind: ErrorKind, message: impl Into<String>) -> Error {
        Error::new(kind, message, self.current_span(), self.file.clone())
    }

    pub(crate) fn error_at(&self, kind: ErrorKind, message: impl Into<String>, span: Span) -> Error {
        Error::new(kind, message, span, self.file.clone())
    }

    pub(crate) fn expect_token(&mut self, kind: &TokenKind, message: &str) -> Result<Span, Error> {
        if self.check(kind) {
            Ok(self.advance().span)
        } else {
            Err(self.error(ErrorKind::ExpectedItem, message))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> Result<Span, Error> {
        if self.check_keyword(keyword) {
            Ok(self.advance().span)
        } else {
            Err(self.error(
                ErrorKind::ExpectedItem,
                format!("Expected '{}'", keyword.as_str()),
            ))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<(String, Span), Error> {
        if let TokenKind::Identifier(name) = self.peek_kind() {
            let name = name.clone();
            let span = self.advance().span;
            Ok((name, span))
        } else {
            Err(self.error(ErrorKind::ExpectedItem, "Expected identifier"))
        }
    }

    pub(crate) fn rewind_from(&self, start: usize, error: Error) -> Rewind {
        Rewind {
            consumed: self.position - start,
            error,
        }
    }
}

/// Lexes and parses `source` in one step.
pub fn parse(file: &str, source: &str) -> Result<Program, Error> {
    Parser::new(source, file)?.parse_program()
}
