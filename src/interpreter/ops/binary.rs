//! Binary operator evaluation

use crate::error::Error;
use crate::interpreter::engine::{Interpreter, RTResult};
use crate::memory::{Context, Value};
use crate::parser::ast::{AstNode, BinOp, Span};
use std::rc::Rc;

impl Interpreter {
    /// Both operands are always evaluated, `et` and `aut` included.
    pub(crate) fn evaluate_binary(
        &mut self,
        op: BinOp,
        left: &AstNode,
        right: &AstNode,
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        let left = self.value_of(left, ctx)?;
        let right = self.value_of(right, ctx)?;
        let result = Self::apply_binary(op, &left, &right)?;
        Ok(Some(result.with_span(span)))
    }

    /// Dispatches `op` to the left operand's operator method.
    pub(crate) fn apply_binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, Error> {
        match op {
            BinOp::Add => left.added_to(right),
            BinOp::Sub => left.subbed_by(right),
            BinOp::Mul => left.multed_by(right),
            BinOp::Div => left.dived_by(right),
            BinOp::Pow => left.powed_by(right),
            BinOp::Eq => left.get_comparison_eq(right),
            BinOp::Ne => left.get_comparison_ne(right),
            BinOp::Lt => left.get_comparison_lt(right),
            BinOp::Gt => left.get_comparison_gt(right),
            BinOp::Le => left.get_comparison_lte(right),
            BinOp::Ge => left.get_comparison_gte(right),
            BinOp::And => left.anded_by(right),
            BinOp::Or => left.ored_by(right),
        }
    }
}
