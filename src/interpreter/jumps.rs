//! Branching and non-local exits: `si`, `tempta`/`praeter` and `redi`.

use crate::error::{Error, ErrorKind};
use crate::interpreter::constants::EXCEPTION_NAMES;
use crate::interpreter::engine::{fail, Interpreter, RTResult, Signal};
use crate::memory::{Context, Value};
use crate::parser::ast::{AstNode, ElseCase, ExceptClause, IfCase};
use std::rc::Rc;
use tracing::debug;

impl Interpreter {
    /// Runs the first case whose condition is truthy, else the `alioquin`
    /// branch. Block bodies evaluate to nothing.
    pub(crate) fn evaluate_if(
        &mut self,
        cases: &[IfCase],
        else_case: Option<&ElseCase>,
        ctx: &Rc<Context>,
    ) -> RTResult {
        for case in cases {
            if self.value_of(&case.condition, ctx)?.is_true() {
                let value = self.evaluate(&case.body, ctx)?;
                return Ok(if case.returns_null { None } else { value });
            }
        }

        match else_case {
            Some(else_case) => {
                let value = self.evaluate(&else_case.body, ctx)?;
                Ok(if else_case.returns_null { None } else { value })
            }
            None => Ok(None),
        }
    }

    /// The value of a `tempta` is the last value of whichever body ran.
    ///
    /// The `praeter` name is checked once the protected body has finished,
    /// whether or not it failed.
    pub(crate) fn evaluate_try(
        &mut self,
        body: &AstNode,
        handler: Option<&ExceptClause>,
        ctx: &Rc<Context>,
    ) -> RTResult {
        let outcome = self.evaluate_last(body, ctx);
        let Some(handler) = handler else {
            return outcome;
        };

        if let Some(name) = &handler.name {
            if !EXCEPTION_NAMES.contains(&name.as_str()) {
                return Err(fail(
                    ErrorKind::Naming,
                    "Exception type not supported",
                    handler.name_span,
                    ctx,
                ));
            }
        }

        match outcome {
            Err(Signal::Error(err)) if Self::catches(handler, &err) => {
                debug!(kind = %err.kind, message = %err.message, "caught error");
                if let Some(as_name) = &handler.as_name {
                    ctx.symbol_table
                        .set(as_name, Value::string(err.message.as_str()));
                }
                let result = self.evaluate_last(&handler.body, ctx);
                if let Some(as_name) = &handler.as_name {
                    ctx.symbol_table.remove(as_name);
                }
                result
            }
            other => other,
        }
    }

    fn catches(handler: &ExceptClause, err: &Error) -> bool {
        if err.is_static() {
            return false;
        }
        match handler.name.as_deref() {
            None | Some("Exception") => true,
            Some(name) => ErrorKind::from_name(name) == Some(err.kind),
        }
    }

    pub(crate) fn evaluate_return(&mut self, value: Option<&AstNode>, ctx: &Rc<Context>) -> RTResult {
        let value = match value {
            Some(node) => self.evaluate(node, ctx)?,
            None => None,
        };
        Err(Signal::Return(value))
    }
}
