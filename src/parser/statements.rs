//! Statement and block parsing.
//!
//! # Grammar
//!
//! ```text
//! block      ::= line (NEWLINE line)*          each line led by `indent` TABs
//! statement  ::= 'redi' expr? | 'continua' | 'confringe' | expr
//! body       ::= ':' NEWLINE block | ':' statement
//! if         ::= 'si' expr body ('alioquinsi' expr body)* ('alioquin' body)?
//! try        ::= 'tempta' body ('praeter' NAME? ('tam' NAME)? body)?
//! for        ::= 'pro' NAME '=' expr 'ad' expr ('gradus' expr)? body
//! while      ::= 'dum' expr body
//! function   ::= 'opus' NAME? params (ARROW expr | ARROW NEWLINE block | body)
//! ```
//!
//! `si`, `tempta`, `pro`, `dum` and `opus` are atoms of the expression
//! grammar, so they may appear wherever a value is expected.

use crate::error::{Error, ErrorKind};
use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, TokenKind};
use crate::parser::parse::{Parser, Rewind};
use std::rc::Rc;

impl Parser {
    /// Parses statement lines at the current indentation until a shallower
    /// line or the end of input.
    ///
    /// On return the cursor sits on the newline that ended the block, so the
    /// enclosing block sees the line break it needs.
    pub(crate) fn block_statements(&mut self) -> Result<Vec<AstNode>, Error> {
        let mut statements = Vec::new();

        loop {
            let line_start = self.position;
            self.skip_blank_lines();

            let tabs = self.count_tabs()?;
            if tabs < self.indent_count {
                if statements.is_empty() {
                    let err = self.error(ErrorKind::ExpectedItem, "Expected Tab");
                    return Err(if self.is_at_end() { err.interactive() } else { err });
                }
                self.position = line_start;
                break;
            }
            if self.is_at_end() {
                if statements.is_empty() && self.indent_count > 0 {
                    return Err(self
                        .error(ErrorKind::ExpectedItem, "Expected statement")
                        .interactive());
                }
                break;
            }

            statements.push(self.statement()?);

            if !self.check(&TokenKind::Newline) {
                break;
            }
        }

        Ok(statements)
    }

    /// Skips empty lines, including lines holding nothing but indentation.
    fn skip_blank_lines(&mut self) {
        loop {
            if self.match_token(&TokenKind::Newline) {
                continue;
            }
            let mut tabs = 0;
            while self
                .peek_ahead(tabs)
                .is_some_and(|t| t.kind == TokenKind::Tab)
            {
                tabs += 1;
            }
            if tabs > 0
                && self
                    .peek_ahead(tabs)
                    .is_some_and(|t| matches!(t.kind, TokenKind::Newline | TokenKind::Eof))
            {
                self.position += tabs;
                continue;
            }
            break;
        }
    }

    /// Consumes leading `Tab` tokens; more than the block expects is an error.
    fn count_tabs(&mut self) -> Result<usize, Error> {
        let mut tabs = 0;
        while self.match_token(&TokenKind::Tab) {
            tabs += 1;
        }
        if tabs > self.indent_count {
            return Err(self.error(ErrorKind::Indent, "Incorrect number of tabs!"));
        }
        Ok(tabs)
    }

    /// Parse a statement
    pub(crate) fn statement(&mut self) -> Result<AstNode, Error> {
        let start = self.current_span();

        if self.match_keyword(Keyword::Redi) {
            if !self.in_func {
                return Err(self.error_at(
                    ErrorKind::InvalidSyntax,
                    "'redi' outside of a function",
                    start,
                ));
            }
            let mark = self.position;
            let value = match self.expr(false) {
                Ok(value) => Some(Box::new(value)),
                Err(_) => {
                    self.position = mark;
                    None
                }
            };
            return Ok(AstNode::Return {
                value,
                span: self.span_from(start),
            });
        }

        if self.match_keyword(Keyword::Continua) {
            if !self.in_loop {
                return Err(self.error_at(
                    ErrorKind::InvalidSyntax,
                    "'continua' outside of a loop",
                    start,
                ));
            }
            return Ok(AstNode::Continue { span: start });
        }

        if self.match_keyword(Keyword::Confringe) {
            if !self.in_loop {
                return Err(self.error_at(
                    ErrorKind::InvalidSyntax,
                    "'confringe' outside of a loop",
                    start,
                ));
            }
            return Ok(AstNode::Break { span: start });
        }

        self.expr(true)
    }

    /// Parses the part after a header's `:`. Returns the body and whether it
    /// was an indented block.
    pub(crate) fn parse_body(&mut self) -> Result<(AstNode, bool), Error> {
        self.expect_token(&TokenKind::Colon, "Expected ':'")?;
        self.body_after_colon()
    }

    fn body_after_colon(&mut self) -> Result<(AstNode, bool), Error> {
        if self.is_at_end() {
            return Err(self
                .error(ErrorKind::ExpectedItem, "Expected statement")
                .interactive());
        }
        if self.check(&TokenKind::Newline) {
            return Ok((self.indented_block()?, true));
        }
        Ok((self.statement()?, false))
    }

    /// Parses `NEWLINE block` one level deeper than the current block.
    pub(crate) fn indented_block(&mut self) -> Result<AstNode, Error> {
        let start = self.current_span();
        self.expect_token(&TokenKind::Newline, "Expected a newline")?;

        self.indent_count += 1;
        let statements = self.block_statements();
        self.indent_count -= 1;
        let statements = statements?;

        Ok(AstNode::Block {
            span: self.span_from(start),
            statements,
        })
    }

    /// Looks past line breaks for `keyword` at the current indentation.
    /// Leaves the cursor on the keyword when found, untouched otherwise.
    fn continues_with(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            return true;
        }
        let mark = self.position;
        self.skip_blank_lines();
        let mut tabs = 0;
        while self.match_token(&TokenKind::Tab) {
            tabs += 1;
        }
        if tabs == self.indent_count && self.check_keyword(keyword) {
            return true;
        }
        self.position = mark;
        false
    }

    pub(crate) fn parse_if(&mut self) -> Result<AstNode, Error> {
        let start = self.expect_keyword(Keyword::Si)?;
        let mut cases = Vec::new();

        loop {
            let condition = self.expr(false)?;
            let (body, is_block) = self.parse_body()?;
            cases.push(IfCase {
                condition,
                body,
                returns_null: is_block,
            });
            if self.continues_with(Keyword::Alioquinsi) {
                self.advance();
            } else {
                break;
            }
        }

        let else_case = if self.continues_with(Keyword::Alioquin) {
            self.advance();
            let (body, is_block) = self.parse_body()?;
            Some(Box::new(ElseCase {
                body,
                returns_null: is_block,
            }))
        } else {
            None
        };

        Ok(AstNode::If {
            cases,
            else_case,
            span: self.span_from(start),
        })
    }

    pub(crate) fn parse_try(&mut self) -> Result<AstNode, Error> {
        let start = self.expect_keyword(Keyword::Tempta)?;
        let (body, _) = self.parse_body()?;

        let handler = if self.continues_with(Keyword::Praeter) {
            self.advance();
            let name_span = self.current_span();
            let name = match self.peek_kind() {
                TokenKind::Identifier(name) => {
                    let name = name.clone();
                    self.advance();
                    Some(name)
                }
                _ => None,
            };
            let as_name = if self.match_keyword(Keyword::Tam) {
                Some(self.expect_identifier()?.0)
            } else {
                None
            };
            let (body, _) = self.parse_body()?;
            Some(Box::new(ExceptClause {
                name,
                name_span,
                as_name,
                body,
            }))
        } else {
            None
        };

        Ok(AstNode::Try {
            body: Box::new(body),
            handler,
            span: self.span_from(start),
        })
    }

    pub(crate) fn parse_for(&mut self) -> Result<AstNode, Error> {
        let start = self.expect_keyword(Keyword::Pro)?;
        let (var, _) = self.expect_identifier()?;
        self.expect_token(&TokenKind::Eq, "Expected '='")?;
        let from = self.expr(false)?;
        self.expect_keyword(Keyword::Ad)?;
        let to = self.expr(false)?;
        let step = if self.match_keyword(Keyword::Gradus) {
            Some(Box::new(self.expr(false)?))
        } else {
            None
        };

        let (body, is_block) = self.loop_body()?;
        Ok(AstNode::For {
            var,
            start: Box::new(from),
            end: Box::new(to),
            step,
            body: Box::new(body),
            returns_null: is_block,
            span: self.span_from(start),
        })
    }

    pub(crate) fn parse_while(&mut self) -> Result<AstNode, Error> {
        let start = self.expect_keyword(Keyword::Dum)?;
        let condition = self.expr(false)?;
        let (body, is_block) = self.loop_body()?;
        Ok(AstNode::While {
            condition: Box::new(condition),
            body: Box::new(body),
            returns_null: is_block,
            span: self.span_from(start),
        })
    }

    fn loop_body(&mut self) -> Result<(AstNode, bool), Error> {
        let outer = std::mem::replace(&mut self.in_loop, true);
        let body = self.parse_body();
        self.in_loop = outer;
        body
    }

    /// `opus [name](params) ...`
    pub(crate) fn parse_function(&mut self) -> Result<AstNode, Error> {
        let start = self.expect_keyword(Keyword::Opus)?;
        let name = match self.peek_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        if !self.check(&TokenKind::LParen) {
            let message = if name.is_some() {
                "Expected '('"
            } else {
                "Expected identifier or '('"
            };
            return Err(self.error(ErrorKind::ExpectedItem, message));
        }

        let params = self
            .param_list()
            .map_err(|rewind: Rewind| rewind.error)?;
        self.validate_params(&params)?;
        self.function_body(name, params, start)
    }

    /// Parses what follows a parameter list and wraps it up as a definition.
    pub(crate) fn function_body(
        &mut self,
        name: Option<String>,
        params: Vec<Param>,
        start: Span,
    ) -> Result<AstNode, Error> {
        let outer_loop = std::mem::replace(&mut self.in_loop, false);
        let outer_func = std::mem::replace(&mut self.in_func, true);
        let body = self.function_body_inner();
        self.in_loop = outer_loop;
        self.in_func = outer_func;
        let (body, auto_return) = body?;

        let span = self.span_from(start);
        Ok(AstNode::FuncDef {
            decl: Rc::new(FunctionDecl {
                name,
                params,
                body,
                auto_return,
                span,
            }),
            span,
        })
    }

    fn function_body_inner(&mut self) -> Result<(AstNode, bool), Error> {
        if self.match_token(&TokenKind::Arrow) {
            if self.check(&TokenKind::Newline) {
                return Ok((self.indented_block()?, false));
            }
            return Ok((self.expr(false)?, true));
        }
        if self.match_token(&TokenKind::Colon) {
            let (body, _) = self.body_after_colon()?;
            return Ok((body, false));
        }
        Err(self.error(ErrorKind::ExpectedItem, "Expected '->' or ':'"))
    }

    /// `( NAME ('=' expr)? (',' NAME ('=' expr)?)* )`
    ///
    /// Reports the number of consumed tokens on failure so that a caller
    /// probing for an anonymous function can back up exactly.
    pub(crate) fn param_list(&mut self) -> Result<Vec<Param>, Rewind> {
        let start = self.position;
        if !self.match_token(&TokenKind::LParen) {
            let err = self.error(ErrorKind::ExpectedItem, "Expected '('");
            return Err(self.rewind_from(start, err));
        }

        let mut params = Vec::new();
        if self.match_token(&TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            let (name, span) = match self.expect_identifier() {
                Ok(found) => found,
                Err(err) => return Err(self.rewind_from(start, err)),
            };
            let default = if self.match_token(&TokenKind::Eq) {
                match self.expr(false) {
                    Ok(value) => Some(value),
                    Err(err) => return Err(self.rewind_from(start, err)),
                }
            } else {
                None
            };
            params.push(Param {
                name,
                default,
                span,
            });

            if self.match_token(&TokenKind::Comma) {
                continue;
            }
            if self.match_token(&TokenKind::RParen) {
                return Ok(params);
            }
            let err = self.error(ErrorKind::ExpectedItem, "Expected ',' or ')'");
            return Err(self.rewind_from(start, err));
        }
    }

    pub(crate) fn validate_params(&self, params: &[Param]) -> Result<(), Error> {
        let mut seen_default = false;
        for (i, param) in params.iter().enumerate() {
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(self.error_at(
                    ErrorKind::InvalidSyntax,
                    format!("Duplicate parameter '{}'", param.name),
                    param.span,
                ));
            }
            if param.default.is_some() {
                seen_default = true;
            } else if seen_default {
                return Err(self.error_at(
                    ErrorKind::InvalidSyntax,
                    "Non-default parameter follows default parameter",
                    param.span,
                ));
            }
        }
        Ok(())
    }
}
