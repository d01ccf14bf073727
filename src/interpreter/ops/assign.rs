//! Assignment: plain and compound, to names and through index paths.
//!
//! A bare `name = value` binds in the current scope. Compound operators and
//! indexed targets write to whichever enclosing scope already holds the
//! name, and indexed writes land in the shared list/dict storage itself.

use crate::error::ErrorKind;
use crate::interpreter::engine::{fail, Interpreter, RTResult, Signal};
use crate::memory::{Context, Data, Value};
use crate::parser::ast::{AssignOp, AssignTarget, AstNode, Span};
use std::rc::Rc;

impl Interpreter {
    pub(crate) fn evaluate_assign(
        &mut self,
        targets: &[AssignTarget],
        values: &[AstNode],
        op: AssignOp,
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        if targets.len() != values.len() {
            return Err(fail(
                ErrorKind::Typing,
                "Must have the same number of variables and values",
                span,
                ctx,
            ));
        }

        // Every right-hand side is evaluated before any name is rebound.
        let mut evaluated = Vec::with_capacity(values.len());
        for value in values {
            evaluated.push(self.value_of(value, ctx)?);
        }

        for (target, value) in targets.iter().zip(evaluated) {
            if target.indices.is_empty() {
                Self::assign_name(target, value, op, ctx)?;
            } else {
                let root = Self::lookup(&target.name, target.span, ctx)?;
                self.assign_path(&root, &target.indices, value, op, target.span, ctx)?;
            }
        }

        Ok(None)
    }

    fn assign_name(
        target: &AssignTarget,
        value: Value,
        op: AssignOp,
        ctx: &Rc<Context>,
    ) -> Result<(), Signal> {
        match op.binary() {
            None => ctx.symbol_table.set(&target.name, value),
            Some(bin) => {
                let old = Self::lookup(&target.name, target.span, ctx)?;
                let new = Self::apply_binary(bin, &old, &value)?;
                ctx.symbol_table.assign_existing(&target.name, new);
            }
        }
        Ok(())
    }

    /// Walks all but the last index, then writes through the last one.
    /// Every container on the way must be a List or Dict.
    fn assign_path(
        &mut self,
        root: &Value,
        indices: &[AstNode],
        value: Value,
        op: AssignOp,
        span: Span,
        ctx: &Rc<Context>,
    ) -> Result<(), Signal> {
        let Some((last, walk)) = indices.split_last() else {
            return Ok(());
        };

        let mut container = root.clone();
        for index in walk {
            Self::require_container(&container, span, ctx)?;
            let index = self.value_of(index, ctx)?;
            container = Self::index_into(&container, &index, span, ctx)?;
        }
        Self::require_container(&container, span, ctx)?;
        let index = self.value_of(last, ctx)?;

        let combine = |old: Option<Value>| -> Result<Value, Signal> {
            match (op.binary(), old) {
                (None, _) => Ok(value.detached()),
                (Some(bin), Some(old)) => {
                    let old = old.with_span(span).with_context(ctx);
                    Ok(Self::apply_binary(bin, &old, &value)?.detached())
                }
                (Some(_), None) => Err(fail(
                    ErrorKind::Indexing,
                    format!("Key {} not found in Dict", index.repr()),
                    span,
                    ctx,
                )),
            }
        };

        match &container.data {
            Data::List(list) => {
                let length = list.borrow().len();
                let position = Self::position(&index, length, "List", span, ctx)?;
                let old = list.borrow().get(position).cloned();
                let new = combine(old)?;
                list.borrow_mut()[position] = new;
            }
            Data::Dict(dict) => {
                let key = Self::hash_key(&index, span, ctx)?;
                let old = dict.borrow().get(&key).cloned();
                let new = combine(old)?;
                dict.borrow_mut().insert(key, index.detached(), new);
            }
            _ => {}
        }
        Ok(())
    }

    fn require_container(container: &Value, span: Span, ctx: &Context) -> Result<(), Signal> {
        match container.data {
            Data::List(_) | Data::Dict(_) => Ok(()),
            _ => Err(fail(
                ErrorKind::Indexing,
                format!("Cannot set an index of a {}", container.type_name()),
                span,
                ctx,
            )),
        }
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
    #[case("a = 1\na += 2\na", "3")]
    #[case("a = X\na -= 1\na", "IX")]
    #[case("a = 2\na *= 3\na /= 4\na", "1.5")]
    #[case("s = \"ab\"\ns += \"c\"\ns", "abc")]
    #[case("a, b = 1, 2\nb", "2")]
    #[case("a, b = 1, 2\na, b = b, a\n[a, b]", "[2, 1]")]
    #[case("a = [1, 2]\na[0] = 5\na", "[5, 2]")]
    #[case("a = [[1, 2], [3]]\na[0][1] = 9\na", "[[1, 9], [3]]")]
    #[case("a = [1]\na[0] += 4\na", "[5]")]
    #[case("d = {}\nd[\"k\"] = 1\nd[\"k\"] += 1\nd", "{\"k\": 2}")]
    #[case("d = {\"l\": [0]}\nd[\"l\"][0] = \"x\"\nd", "{\"l\": [\"x\"]}")]
    fn assignments(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[test]
    fn index_writes_are_seen_through_aliases() {
        assert_eq!(eval("a = [1]\nb = a\nb[0] = 2\na").unwrap(), "[2]");
    }

    #[rstest]
    #[case("a, b = 1", ErrorKind::Typing, "Must have the same number of variables and values")]
    #[case("x += 1", ErrorKind::Naming, "'x' is not defined")]
    #[case("a[0] = 1", ErrorKind::Naming, "'a' is not defined")]
    #[case("a = [1]\na[3] = 1", ErrorKind::Indexing, "List index out of bounds")]
    #[case("s = \"ab\"\ns[0] = \"c\"", ErrorKind::Indexing, "Cannot set an index of a String")]
    #[case("a = [1]\na[0][0] = 2", ErrorKind::Indexing, "Cannot set an index of a Number")]
    #[case("d = {}\nd[[1]] = 2", ErrorKind::Typing, "Key cannot be a list")]
    fn assignment_errors(#[case] source: &str, #[case] kind: ErrorKind, #[case] message: &str) {
        let err = eval(source).unwrap_err();
        assert_eq!(err.kind, kind);
        assert_eq!(err.message, message);
    }
}
