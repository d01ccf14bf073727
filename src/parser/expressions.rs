//! Expression parsing with precedence climbing
//!
//! Precedence, lowest first:
//!
//! ```text
//! assignment   NAME ([expr])* (',' NAME ([expr])*)* OP expr (',' expr)*
//! logical      et aut
//! comparison   == != < > <= >=  and prefix `non`
//! additive     + -
//! term         * /
//! unary        + -
//! power        ^   (right associative)
//! call         atom ( '(' args ')' )*
//! atom         literals, names with [index] and .attr suffixes, (expr),
//!              anonymous functions, lists, dicts, si/tempta/pro/dum/opus
//! ```

use crate::error::{Error, ErrorKind};
use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, StrPiece, TokenKind};
use crate::parser::parse::Parser;
use tracing::trace;

type OperandFn = fn(&mut Parser) -> Result<AstNode, Error>;

impl Parser {
    /// Parses an expression. With `allow_assign`, a leading name list followed
    /// by an assignment operator parses as an assignment.
    pub(crate) fn expr(&mut self, allow_assign: bool) -> Result<AstNode, Error> {
        if allow_assign && self.check(&TokenKind::Identifier(String::new())) {
            let mark = self.position;
            if let Some(assign) = self.assignment()? {
                return Ok(assign);
            }
            self.position = mark;
        }

        self.bin_op(Self::comp_expr, logical_op, Self::comp_expr)
    }

    /// Returns `None` when the names are not followed by an assignment
    /// operator; the caller rewinds.
    fn assignment(&mut self) -> Result<Option<AstNode>, Error> {
        let start = self.current_span();
        let mut targets = Vec::new();

        loop {
            let (name, name_span) = match self.expect_identifier() {
                Ok(found) => found,
                Err(_) => return Ok(None),
            };
            let indices = self.index_suffixes()?;
            targets.push(AssignTarget {
                name,
                indices,
                span: self.span_from(name_span),
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        let op = match self.peek_kind() {
            TokenKind::Eq => AssignOp::Set,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            _ => return Ok(None),
        };
        self.advance();

        let mut values = vec![self.expr(false)?];
        while self.match_token(&TokenKind::Comma) {
            values.push(self.expr(false)?);
        }

        Ok(Some(AstNode::VarAssign {
            targets,
            values,
            op,
            span: self.span_from(start),
        }))
    }

    /// Left-associative binary operator loop. `right` parses every operand
    /// after the first.
    fn bin_op(
        &mut self,
        left: OperandFn,
        op_of: fn(&TokenKind) -> Option<BinOp>,
        right: OperandFn,
    ) -> Result<AstNode, Error> {
        let mut node = left(self)?;

        while let Some(op) = op_of(self.peek_kind()) {
            self.advance();
            let rhs = right(self)?;
            let span = node.span().to(rhs.span());
            node = AstNode::BinaryOp {
                op,
                left: Box::new(node),
                right: Box::new(rhs),
                span,
            };
        }

        Ok(node)
    }

    fn comp_expr(&mut self) -> Result<AstNode, Error> {
        let start = self.current_span();
        if self.match_keyword(Keyword::Non) {
            let operand = self.comp_expr()?;
            return Ok(AstNode::UnaryOp {
                op: UnaryOp::Not,
                span: start.to(operand.span()),
                operand: Box::new(operand),
            });
        }

        self.bin_op(Self::arith_expr, comparison_op, Self::arith_expr)
    }

    fn arith_expr(&mut self) -> Result<AstNode, Error> {
        self.bin_op(Self::term, additive_op, Self::term)
    }

    fn term(&mut self) -> Result<AstNode, Error> {
        self.bin_op(Self::factor, multiplicative_op, Self::factor)
    }

    fn factor(&mut self) -> Result<AstNode, Error> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.factor()?;
            return Ok(AstNode::UnaryOp {
                op,
                span: start.to(operand.span()),
                operand: Box::new(operand),
            });
        }

        self.power()
    }

    fn power(&mut self) -> Result<AstNode, Error> {
        // The right side climbs back through `factor`, making `^` right
        // associative and letting `2 ^ -1` parse.
        self.bin_op(Self::call, power_op, Self::factor)
    }

    fn call(&mut self) -> Result<AstNode, Error> {
        let mut node = self.atom()?;

        while self.match_token(&TokenKind::LParen) {
            let (args, kwargs) = self.call_arguments()?;
            let span = self.span_from(node.span());
            node = AstNode::Call {
                callee: Box::new(node),
                args,
                kwargs,
                span,
            };
        }

        Ok(node)
    }

    /// Arguments after `(` through the closing `)`.
    fn call_arguments(&mut self) -> Result<(Vec<AstNode>, Vec<KeywordArg>), Error> {
        let mut args = Vec::new();
        let mut kwargs: Vec<KeywordArg> = Vec::new();

        if self.match_token(&TokenKind::RParen) {
            return Ok((args, kwargs));
        }

        loop {
            let is_keyword = matches!(self.peek_kind(), TokenKind::Identifier(_))
                && self
                    .peek_ahead(1)
                    .is_some_and(|t| t.kind == TokenKind::Eq);

            if is_keyword {
                let (name, name_span) = self.expect_identifier()?;
                self.advance();
                let value = self.expr(false)?;
                if kwargs.iter().any(|kw| kw.name == name) {
                    return Err(self.error_at(
                        ErrorKind::InvalidSyntax,
                        format!("Duplicate keyword argument '{}'", name),
                        name_span,
                    ));
                }
                kwargs.push(KeywordArg {
                    name,
                    span: self.span_from(name_span),
                    value,
                });
            } else {
                let arg = self.expr(false)?;
                if !kwargs.is_empty() {
                    return Err(self.error_at(
                        ErrorKind::InvalidSyntax,
                        "Positional argument follows keyword argument",
                        arg.span(),
                    ));
                }
                args.push(arg);
            }

            if self.match_token(&TokenKind::Comma) {
                continue;
            }
            self.expect_token(&TokenKind::RParen, "Expected ',' or ')'")?;
            return Ok((args, kwargs));
        }
    }

    /// Zero or more `[expr]` suffixes.
    pub(crate) fn index_suffixes(&mut self) -> Result<Vec<AstNode>, Error> {
        let mut indices = Vec::new();
        while self.match_token(&TokenKind::LBracket) {
            indices.push(self.expr(false)?);
            self.expect_token(&TokenKind::RBracket, "Expected ']'")?;
        }
        Ok(indices)
    }

    fn atom(&mut self) -> Result<AstNode, Error> {
        let token = self.peek().clone();
        let span = token.span;

        match token.kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(AstNode::Number {
                    value: n as f64,
                    span,
                })
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(AstNode::Number { value, span })
            }
            TokenKind::Numeral(value) => {
                self.advance();
                Ok(AstNode::Numeral { value, span })
            }
            TokenKind::Str(pieces) => {
                self.advance();
                let parts = pieces
                    .into_iter()
                    .map(|piece| match piece {
                        StrPiece::Text(text) => Ok(StringPart::Text(text)),
                        StrPiece::Interp(tokens) => {
                            Parser::from_tokens(tokens, self.file.clone())
                                .parse_interpolation()
                                .map(StringPart::Expr)
                        }
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(AstNode::Str { parts, span })
            }
            TokenKind::Keyword(Keyword::Verus) => {
                self.advance();
                Ok(AstNode::Bool { value: true, span })
            }
            TokenKind::Keyword(Keyword::Falsus) => {
                self.advance();
                Ok(AstNode::Bool { value: false, span })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                let indices = self.index_suffixes()?;
                let mut attrs = Vec::new();
                while self.match_token(&TokenKind::Dot) {
                    attrs.push(self.expect_identifier()?.0);
                }
                Ok(AstNode::VarAccess {
                    name,
                    indices,
                    attrs,
                    span: self.span_from(span),
                })
            }
            TokenKind::LParen => self.paren_or_anonymous(),
            TokenKind::LBracket => self.list_expr(),
            TokenKind::LBrace => self.dict_expr(),
            TokenKind::Keyword(Keyword::Si) => self.parse_if(),
            TokenKind::Keyword(Keyword::Tempta) => self.parse_try(),
            TokenKind::Keyword(Keyword::Pro) => self.parse_for(),
            TokenKind::Keyword(Keyword::Dum) => self.parse_while(),
            TokenKind::Keyword(Keyword::Opus) => self.parse_function(),
            _ => Err(self.error(ErrorKind::ExpectedItem, "Expected expression")),
        }
    }

    /// `(params) => ...` is an anonymous function; anything else starting
    /// with `(` is a grouped expression.
    fn paren_or_anonymous(&mut self) -> Result<AstNode, Error> {
        let start = self.position;
        let start_span = self.current_span();

        match self.param_list() {
            Ok(params) if self.check(&TokenKind::Arrow) => {
                self.validate_params(&params)?;
                return self.function_body(None, params, start_span);
            }
            Ok(_) => self.position = start,
            Err(rewind) => {
                trace!(
                    consumed = rewind.consumed,
                    reason = %rewind.error.message,
                    "not a parameter list, rewinding"
                );
                self.position -= rewind.consumed;
            }
        }

        self.expect_token(&TokenKind::LParen, "Expected '('")?;
        let expr = self.expr(false)?;
        self.expect_token(&TokenKind::RParen, "Expected ')'")?;
        Ok(expr)
    }

    fn list_expr(&mut self) -> Result<AstNode, Error> {
        let start = self.expect_token(&TokenKind::LBracket, "Expected '['")?;
        let mut elements = Vec::new();

        if !self.match_token(&TokenKind::RBracket) {
            loop {
                elements.push(self.expr(false)?);
                if self.match_token(&TokenKind::Comma) {
                    continue;
                }
                self.expect_token(&TokenKind::RBracket, "Expected ',' or ']'")?;
                break;
            }
        }

        Ok(AstNode::List {
            elements,
            span: self.span_from(start),
        })
    }

    fn dict_expr(&mut self) -> Result<AstNode, Error> {
        let start = self.expect_token(&TokenKind::LBrace, "Expected '{'")?;
        let mut entries: Vec<(AstNode, AstNode)> = Vec::new();

        if !self.match_token(&TokenKind::RBrace) {
            loop {
                let key = self.expr(false)?;
                self.expect_token(&TokenKind::Colon, "Expected ':'")?;
                let value = self.expr(false)?;

                if let Some(literal) = LiteralKey::of(&key) {
                    if entries
                        .iter()
                        .any(|(k, _)| LiteralKey::of(k).as_ref() == Some(&literal))
                    {
                        return Err(self.error_at(
                            ErrorKind::InvalidSyntax,
                            "Duplicate key in dictionary",
                            key.span(),
                        ));
                    }
                }
                entries.push((key, value));

                if self.match_token(&TokenKind::Comma) {
                    continue;
                }
                self.expect_token(&TokenKind::RBrace, "Expected ',' or '}'")?;
                break;
            }
        }

        Ok(AstNode::Dict {
            entries,
            span: self.span_from(start),
        })
    }
}

/// Constant dict key, for spotting duplicates before evaluation.
#[derive(Debug, PartialEq)]
enum LiteralKey {
    Number(u64),
    Text(String),
    Bool(bool),
}

impl LiteralKey {
    fn of(node: &AstNode) -> Option<LiteralKey> {
        match node {
            AstNode::Number { value, .. } | AstNode::Numeral { value, .. } => {
                Some(LiteralKey::Number((value + 0.0).to_bits()))
            }
            AstNode::Bool { value, .. } => Some(LiteralKey::Bool(*value)),
            AstNode::Str { parts, .. } => match parts.as_slice() {
                [] => Some(LiteralKey::Text(String::new())),
                [StringPart::Text(text)] => Some(LiteralKey::Text(text.clone())),
                _ => None,
            },
            _ => None,
        }
    }
}

fn logical_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Keyword(Keyword::Et) => Some(BinOp::And),
        TokenKind::Keyword(Keyword::Aut) => Some(BinOp::Or),
        _ => None,
    }
}

fn comparison_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::EqEq => Some(BinOp::Eq),
        TokenKind::NotEq => Some(BinOp::Ne),
        TokenKind::Lt => Some(BinOp::Lt),
        TokenKind::Gt => Some(BinOp::Gt),
        TokenKind::Le => Some(BinOp::Le),
        TokenKind::Ge => Some(BinOp::Ge),
        _ => None,
    }
}

fn additive_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        _ => None,
    }
}

fn multiplicative_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Star => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        _ => None,
    }
}

fn power_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Caret => Some(BinOp::Pow),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::parser::ast::*;
    use crate::parser::parse::parse;
    use rstest::rstest;

    fn single(src: &str) -> AstNode {
        let mut program = parse("<test>", src).expect("parsing failed");
        assert_eq!(program.statements.len(), 1);
        program.statements.remove(0)
    }

    fn binary_op(node: &AstNode) -> BinOp {
        match node {
            AstNode::BinaryOp { op, .. } => *op,
            other => panic!("expected binary op, got {:?}", other),
        }
    }

    #[rstest]
    #[case("1 + 2 * 3", BinOp::Add)]
    #[case("1 * 2 + 3", BinOp::Add)]
    #[case("1 < 2 et 3 > 4", BinOp::And)]
    #[case("a == b aut c", BinOp::Or)]
    #[case("2 ^ 3 ^ 2", BinOp::Pow)]
    fn precedence(#[case] src: &str, #[case] root: BinOp) {
        assert_eq!(binary_op(&single(src)), root);
    }

    #[test]
    fn power_is_right_associative() {
        let AstNode::BinaryOp { left, right, .. } = single("2 ^ 3 ^ 2") else {
            panic!("expected binary op");
        };
        assert!(matches!(*left, AstNode::Number { value, .. } if value == 2.0));
        assert_eq!(binary_op(&right), BinOp::Pow);
    }

    #[test]
    fn unary_minus_binds_tighter_than_multiplication() {
        let AstNode::BinaryOp { left, .. } = single("-a * b") else {
            panic!("expected binary op");
        };
        assert!(matches!(*left, AstNode::UnaryOp { op: UnaryOp::Minus, .. }));
    }

    #[test]
    fn multiple_assignment_with_indices() {
        let AstNode::VarAssign {
            targets,
            values,
            op,
            ..
        } = single("a, b[0][1] = 1, 2")
        else {
            panic!("expected assignment");
        };
        assert_eq!(op, AssignOp::Set);
        assert_eq!(targets[0].name, "a");
        assert!(targets[0].indices.is_empty());
        assert_eq!(targets[1].indices.len(), 2);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn compound_assignment() {
        assert!(matches!(
            single("x += 1"),
            AstNode::VarAssign {
                op: AssignOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn access_without_assignment_rewinds() {
        let AstNode::VarAccess {
            name,
            indices,
            attrs,
            ..
        } = single("items[2].length")
        else {
            panic!("expected access");
        };
        assert_eq!(name, "items");
        assert_eq!(indices.len(), 1);
        assert_eq!(attrs, vec!["length".to_string()]);
    }

    #[test]
    fn call_with_keyword_arguments() {
        let AstNode::Call { args, kwargs, .. } = single("f(1, b=2)") else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert_eq!(kwargs[0].name, "b");
    }

    #[rstest]
    #[case("f(a=1, 2)", "Positional argument follows keyword argument")]
    #[case("f(a=1, a=2)", "Duplicate keyword argument 'a'")]
    #[case("{1: 2, I: 3}", "Duplicate key in dictionary")]
    #[case("{'k': 1, \"k\": 2}", "Duplicate key in dictionary")]
    fn invalid_syntax(#[case] src: &str, #[case] message: &str) {
        let err = parse("<test>", src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSyntax);
        assert_eq!(err.message, message);
    }

    #[test]
    fn parenthesised_expression_is_not_a_function() {
        assert_eq!(binary_op(&single("(a) * 2")), BinOp::Mul);
        assert_eq!(binary_op(&single("(1 + 2) * 3")), BinOp::Mul);
    }

    #[test]
    fn anonymous_functions() {
        let AstNode::FuncDef { decl, .. } = single("(a, b) => a + b") else {
            panic!("expected function");
        };
        assert!(decl.name.is_none());
        assert!(decl.auto_return);
        assert_eq!(decl.params.len(), 2);

        let AstNode::FuncDef { decl, .. } = single("() =>\n    redi 1") else {
            panic!("expected function");
        };
        assert!(!decl.auto_return);
    }

    #[test]
    fn immediate_call_of_anonymous_function() {
        assert!(matches!(single("((x) => x * 2)(4)"), AstNode::Call { .. }));
    }

    #[test]
    fn fstring_parts_are_parsed() {
        let AstNode::Str { parts, .. } = single("f\"sum {a + b}\"") else {
            panic!("expected string");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[1], StringPart::Expr(node) if binary_op(node) == BinOp::Add));
    }

    #[test]
    fn missing_expression() {
        let err = parse("<test>", "1 +").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpectedItem);
        assert_eq!(err.message, "Expected expression");
    }
}
