//! Loop evaluation (`pro`, `dum`).
//!
//! Adds `impl Interpreter` methods for both loop forms. `confringe` and
//! `continua` come back from the body as [`Signal::Break`] and
//! [`Signal::Continue`]; [`Interpreter::run_loop_body`] folds them into a
//! [`LoopBodyResult`] so the drivers never inspect signals directly. Any
//! other signal (an error, or `redi` from an enclosing function) unwinds
//! the loop.
//!
//! Unless the body is a block, each loop evaluates to the list of values its
//! iterations produced.

use crate::error::ErrorKind;
use crate::interpreter::engine::{fail, Interpreter, RTResult, Signal};
use crate::memory::{Context, Data, Value};
use crate::parser::ast::{AstNode, Span};
use std::rc::Rc;

/// How one pass through a loop body ended.
pub(crate) enum LoopBodyResult {
    /// Body ran to completion.
    Value(Option<Value>),
    /// `continua`: skip to the next iteration without recording a value.
    Continue,
    /// `confringe`: leave the loop.
    Break,
}

impl Interpreter {
    pub(crate) fn run_loop_body(
        &mut self,
        body: &AstNode,
        ctx: &Rc<Context>,
    ) -> Result<LoopBodyResult, Signal> {
        match self.evaluate(body, ctx) {
            Ok(value) => Ok(LoopBodyResult::Value(value)),
            Err(Signal::Continue) => Ok(LoopBodyResult::Continue),
            Err(Signal::Break) => Ok(LoopBodyResult::Break),
            Err(other) => Err(other),
        }
    }

    /// `pro var = start ad end [gradus step]`
    ///
    /// Bounds and step are evaluated once. The end is exclusive and the sign
    /// of the step picks the direction. The variable is rebound in the
    /// current scope on every iteration and removed once the loop ends.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn evaluate_for(
        &mut self,
        var: &str,
        start: &AstNode,
        end: &AstNode,
        step: Option<&AstNode>,
        body: &AstNode,
        returns_null: bool,
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        let first = self.value_of(start, ctx)?;
        let from = Self::loop_number(&first, start.span(), ctx)?;
        let to = self.value_of(end, ctx)?;
        let to = Self::loop_number(&to, end.span(), ctx)?;
        let by = match step {
            Some(step) => {
                let value = self.value_of(step, ctx)?;
                Self::loop_number(&value, step.span(), ctx)?
            }
            None => 1.0,
        };
        if by == 0.0 {
            let at = step.map_or(span, AstNode::span);
            return Err(fail(ErrorKind::Runtime, "Loop step cannot be zero", at, ctx));
        }

        let counter = |n: f64| match first.data {
            Data::Numeral(_) => Value::numeral(n),
            _ => Value::number(n),
        };

        let mut elements = Vec::new();
        let in_range = |i: f64| if by > 0.0 { i < to } else { i > to };
        let mut i = from;
        while in_range(i) {
            ctx.symbol_table.set(var, counter(i));
            i += by;

            match self.run_loop_body(body, ctx)? {
                LoopBodyResult::Value(value) => {
                    if let Some(value) = value.filter(|_| !returns_null) {
                        elements.push(value.detached());
                    }
                }
                LoopBodyResult::Continue => continue,
                LoopBodyResult::Break => break,
            }
        }
        ctx.symbol_table.remove(var);

        Ok(Self::loop_result(elements, returns_null, span, ctx))
    }

    /// `dum condition: body`, with the condition re-evaluated before every
    /// iteration.
    pub(crate) fn evaluate_while(
        &mut self,
        condition: &AstNode,
        body: &AstNode,
        returns_null: bool,
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        let mut elements = Vec::new();

        loop {
            if !self.value_of(condition, ctx)?.is_true() {
                break;
            }

            match self.run_loop_body(body, ctx)? {
                LoopBodyResult::Value(value) => {
                    if let Some(value) = value.filter(|_| !returns_null) {
                        elements.push(value.detached());
                    }
                }
                LoopBodyResult::Continue => continue,
                LoopBodyResult::Break => break,
            }
        }

        Ok(Self::loop_result(elements, returns_null, span, ctx))
    }

    fn loop_number(value: &Value, span: Span, ctx: &Context) -> Result<f64, Signal> {
        value.as_number().ok_or_else(|| {
            fail(
                ErrorKind::Typing,
                format!("Loop bounds must be numbers, not {}", value.type_name()),
                span,
                ctx,
            )
        })
    }

    fn loop_result(
        elements: Vec<Value>,
        returns_null: bool,
        span: Span,
        ctx: &Rc<Context>,
    ) -> Option<Value> {
        if returns_null {
            None
        } else {
            Some(Value::list(elements).with_span(span).with_context(ctx))
        }
    }
}
