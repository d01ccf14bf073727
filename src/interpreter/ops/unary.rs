//! Unary operator evaluation

use crate::error::{Error, ErrorKind};
use crate::interpreter::engine::{fail, Interpreter, RTResult};
use crate::memory::{Context, Value};
use crate::parser::ast::{AstNode, Span, UnaryOp};
use std::rc::Rc;

impl Interpreter {
    pub(crate) fn evaluate_unary(
        &mut self,
        op: UnaryOp,
        operand: &AstNode,
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        let value = self.value_of(operand, ctx)?;

        let result = match op {
            UnaryOp::Not => value.notted()?,
            UnaryOp::Plus | UnaryOp::Minus if value.as_number().is_none() => {
                return Err(fail(
                    ErrorKind::Typing,
                    format!("Bad operand type for unary operator: {}", value.type_name()),
                    span,
                    ctx,
                ));
            }
            UnaryOp::Plus => value,
            UnaryOp::Minus => Self::negate(&value)?,
        };
        Ok(Some(result.with_span(span)))
    }

    /// Keeps the Number/Numeral variant of `value`.
    fn negate(value: &Value) -> Result<Value, Error> {
        value.multed_by(&Value::number(-1.0))
    }
}

#[cfg(test)]
mod tests {
    use crate::console::Console;
    use crate::error::ErrorKind;
    use crate::interpreter::engine::{Interpreter, InterpreterConfig};

    fn eval(source: &str) -> Result<String, crate::error::Error> {
        let mut interpreter =
            Interpreter::new(InterpreterConfig::new().console(Console::captured()));
        let results = interpreter.run_source("<test>", source)?;
        Ok(results
            .last()
            .and_then(|v| v.as_ref())
            .map(ToString::to_string)
            .unwrap_or_default())
    }

    #[test]
    fn negation_keeps_the_variant() {
        assert_eq!(eval("-3").unwrap(), "-3");
        assert_eq!(eval("-IV").unwrap(), "-IV");
        assert_eq!(eval("+V").unwrap(), "V");
        assert_eq!(eval("--2").unwrap(), "2");
    }

    #[test]
    fn non_inverts_truthiness() {
        assert_eq!(eval("non Verus").unwrap(), "Falsus");
        assert_eq!(eval("non \"\"").unwrap(), "Verus");
        assert_eq!(eval("non []").unwrap(), "Verus");
    }

    #[test]
    fn minus_needs_a_number() {
        let err = eval("-\"a\"").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Typing);
    }
}
