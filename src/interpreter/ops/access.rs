//! Reading variables through `[index]` and `.attr` chains
//!
//! Reading a name yields a fresh envelope over the stored data: span and
//! context are reset to the access site while list and dict storage stays
//! shared with the variable.

use crate::error::ErrorKind;
use crate::interpreter::engine::{fail, Interpreter, RTResult, Signal};
use crate::memory::{Context, Data, Value};
use crate::parser::ast::{AstNode, Span};
use std::rc::Rc;

impl Interpreter {
    pub(crate) fn evaluate_access(
        &mut self,
        name: &str,
        indices: &[AstNode],
        attrs: &[String],
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        let mut value = Self::lookup(name, span, ctx)?;

        for index in indices {
            let index = self.value_of(index, ctx)?;
            value = Self::index_into(&value, &index, span, ctx)?
                .with_span(span)
                .with_context(ctx);
        }

        for attr in attrs {
            value = value
                .attribute(attr)
                .ok_or_else(|| {
                    fail(
                        ErrorKind::Attr,
                        format!("'{}' does not have the attribute '{}'", name, attr),
                        span,
                        ctx,
                    )
                })?
                .with_span(span)
                .with_context(ctx);
        }

        Ok(Some(value))
    }

    /// Value bound to `name` in the scope chain, attributed to `ctx`.
    pub(crate) fn lookup(name: &str, span: Span, ctx: &Rc<Context>) -> Result<Value, Signal> {
        match ctx.symbol_table.get(name) {
            Some(value) => Ok(value.with_span(span).with_context(ctx)),
            None => Err(fail(
                ErrorKind::Naming,
                format!("'{}' is not defined", name),
                span,
                ctx,
            )),
        }
    }

    /// One `[index]` step of a read.
    pub(crate) fn index_into(
        container: &Value,
        index: &Value,
        span: Span,
        ctx: &Context,
    ) -> Result<Value, Signal> {
        match &container.data {
            Data::List(list) => {
                let list = list.borrow();
                let position = Self::position(index, list.len(), "List", span, ctx)?;
                Ok(list[position].clone())
            }
            Data::Dict(dict) => {
                let key = Self::hash_key(index, span, ctx)?;
                dict.borrow().get(&key).cloned().ok_or_else(|| {
                    fail(
                        ErrorKind::Indexing,
                        format!("Key {} not found in Dict", index.repr()),
                        span,
                        ctx,
                    )
                })
            }
            Data::Str(text) => {
                let length = text.chars().count();
                let position = Self::position(index, length, "String", span, ctx)?;
                let ch: String = text.chars().skip(position).take(1).collect();
                Ok(Value::string(ch))
            }
            _ => Err(fail(
                ErrorKind::Typing,
                format!("Cannot index into a {}", container.type_name()),
                span,
                ctx,
            )),
        }
    }

    /// Validates `index` as a position in a sequence of `length` elements.
    pub(crate) fn position(
        index: &Value,
        length: usize,
        what: &str,
        span: Span,
        ctx: &Context,
    ) -> Result<usize, Signal> {
        let n = match index.as_number() {
            Some(n) if n.is_finite() && n.fract() == 0.0 => n,
            _ => {
                return Err(fail(
                    ErrorKind::Indexing,
                    format!("{} index must be an int", what),
                    span,
                    ctx,
                ))
            }
        };
        if n < 0.0 || n >= length as f64 {
            return Err(fail(
                ErrorKind::Indexing,
                format!("{} index out of bounds", what),
                span,
                ctx,
            ));
        }
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use crate::console::Console;
    use crate::error::{Error, ErrorKind};
    use crate::interpreter::engine::{Interpreter, InterpreterConfig};
    use rstest::rstest;

    fn eval(source: &str) -> Result<String, Error> {
        let mut interpreter =
            Interpreter::new(InterpreterConfig::new().console(Console::captured()));
        let results = interpreter.run_source("<test>", source)?;
        Ok(results
            .last()
            .and_then(|v| v.as_ref())
            .map(ToString::to_string)
            .unwrap_or_default())
    }

    #[rstest]
    #[case("a = [1, [2, 3]]\na[1][0]", "2")]
    #[case("a = [I, II]\na[1]", "II")]
    #[case("d = {\"k\": [4]}\nd[\"k\"][0]", "4")]
    #[case("d = {IV: \"four\"}\nd[4]", "four")]
    #[case("s = \"salve\"\ns[1]", "a")]
    #[case("s = \"salve\"\ns.length", "5")]
    #[case("a = [1, 2, 3]\na.length", "3")]
    fn reads(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[rstest]
    #[case("x", ErrorKind::Naming, "'x' is not defined")]
    #[case("a = [1]\na[1]", ErrorKind::Indexing, "List index out of bounds")]
    #[case("a = [1]\na[0.5]", ErrorKind::Indexing, "List index must be an int")]
    #[case("s = \"ab\"\ns[\"a\"]", ErrorKind::Indexing, "String index must be an int")]
    #[case("s = \"ab\"\ns[2]", ErrorKind::Indexing, "String index out of bounds")]
    #[case("d = {1: 2}\nd[3]", ErrorKind::Indexing, "Key 3 not found in Dict")]
    #[case("n = 1\nn.length", ErrorKind::Attr, "'n' does not have the attribute 'length'")]
    #[case("n = 1\nn[0]", ErrorKind::Typing, "Cannot index into a Number")]
    fn read_errors(#[case] source: &str, #[case] kind: ErrorKind, #[case] message: &str) {
        let err = eval(source).unwrap_err();
        assert_eq!(err.kind, kind);
        assert_eq!(err.message, message);
    }
}
