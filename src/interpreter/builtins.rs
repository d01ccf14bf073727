//! Built-in function implementations
//!
//! Built-ins are values like any other function: they live in the global
//! scope under their Latin names and bind arguments through the same
//! positional/keyword rules. Each one declares its parameter names in
//! [`BuiltIn::params`] and reads its arguments back from the symbol table of
//! the call context it runs in.
//!
//! # Supported Built-ins
//!
//! - `scribe(value)`: print the display form of a value
//! - `initus()`: read a line of input
//! - `purgo()`: clear the screen
//! - `est_numerus` / `est_filum` / `est_album` / `est_opus` `(value)`:
//!   type predicates
//! - `adde(list, value)`, `remove(list, index)`, `extende(listA, listB)`:
//!   in-place list edits
//! - `longitudo(input)`: length of a string, list or dict
//! - `finde(string, separator)`: split a string
//! - `curre(fn)`: load and run another script

use crate::error::ErrorKind;
use crate::interpreter::constants::PROGRAM_CONTEXT;
use crate::interpreter::engine::{fail, Interpreter, RTResult, Signal};
use crate::memory::{Context, Data, Value};
use crate::parser::ast::Span;
use crate::parser::parse;
use std::io;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltIn {
    Print,
    Input,
    Clear,
    IsNumber,
    IsString,
    IsList,
    IsFunction,
    Append,
    Pop,
    Extend,
    Len,
    Run,
    Split,
}

impl BuiltIn {
    /// Every built-in, in the order they are installed as globals.
    pub const ALL: [BuiltIn; 13] = [
        BuiltIn::Print,
        BuiltIn::Input,
        BuiltIn::Clear,
        BuiltIn::IsNumber,
        BuiltIn::IsString,
        BuiltIn::IsList,
        BuiltIn::IsFunction,
        BuiltIn::Append,
        BuiltIn::Pop,
        BuiltIn::Extend,
        BuiltIn::Len,
        BuiltIn::Run,
        BuiltIn::Split,
    ];

    /// Name the built-in is bound to in the global scope.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltIn::Print => "scribe",
            BuiltIn::Input => "initus",
            BuiltIn::Clear => "purgo",
            BuiltIn::IsNumber => "est_numerus",
            BuiltIn::IsString => "est_filum",
            BuiltIn::IsList => "est_album",
            BuiltIn::IsFunction => "est_opus",
            BuiltIn::Append => "adde",
            BuiltIn::Pop => "remove",
            BuiltIn::Extend => "extende",
            BuiltIn::Len => "longitudo",
            BuiltIn::Run => "curre",
            BuiltIn::Split => "finde",
        }
    }

    pub fn params(&self) -> &'static [&'static str] {
        match self {
            BuiltIn::Print
            | BuiltIn::IsNumber
            | BuiltIn::IsString
            | BuiltIn::IsList
            | BuiltIn::IsFunction => &["value"],
            BuiltIn::Input | BuiltIn::Clear => &[],
            BuiltIn::Append => &["list", "value"],
            BuiltIn::Pop => &["list", "index"],
            BuiltIn::Extend => &["listA", "listB"],
            BuiltIn::Len => &["input"],
            BuiltIn::Run => &["fn"],
            BuiltIn::Split => &["string", "separator"],
        }
    }
}

/// Argument `name`, already bound in the built-in's own scope.
fn arg(ctx: &Context, name: &str, span: Span) -> Result<Value, Signal> {
    ctx.symbol_table.get(name).ok_or_else(|| {
        fail(
            ErrorKind::Runtime,
            format!("Missing argument '{}'", name),
            span,
            ctx,
        )
    })
}

fn io_failure(err: io::Error, span: Span, ctx: &Context) -> Signal {
    fail(ErrorKind::Runtime, format!("I/O error: {}", err), span, ctx)
}

impl Interpreter {
    pub(crate) fn execute_builtin(
        &mut self,
        builtin: BuiltIn,
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        match builtin {
            BuiltIn::Print => {
                let value = arg(ctx, "value", span)?;
                self.console
                    .print(&value.to_string())
                    .map_err(|e| io_failure(e, span, ctx))?;
                Ok(None)
            }
            BuiltIn::Input => {
                let line = self
                    .console
                    .read_line()
                    .map_err(|e| io_failure(e, span, ctx))?;
                Ok(Some(Value::string(line)))
            }
            BuiltIn::Clear => {
                self.console.clear().map_err(|e| io_failure(e, span, ctx))?;
                Ok(None)
            }
            BuiltIn::IsNumber => {
                let value = arg(ctx, "value", span)?;
                Ok(Some(Value::boolean(value.as_number().is_some())))
            }
            BuiltIn::IsString => {
                let value = arg(ctx, "value", span)?;
                Ok(Some(Value::boolean(matches!(value.data, Data::Str(_)))))
            }
            BuiltIn::IsList => {
                let value = arg(ctx, "value", span)?;
                Ok(Some(Value::boolean(matches!(value.data, Data::List(_)))))
            }
            BuiltIn::IsFunction => {
                let value = arg(ctx, "value", span)?;
                Ok(Some(Value::boolean(matches!(
                    value.data,
                    Data::Function(_) | Data::BuiltIn(_)
                ))))
            }
            BuiltIn::Append => Self::builtin_append(span, ctx),
            BuiltIn::Pop => Self::builtin_pop(span, ctx),
            BuiltIn::Extend => Self::builtin_extend(span, ctx),
            BuiltIn::Len => Self::builtin_len(span, ctx),
            BuiltIn::Split => Self::builtin_split(span, ctx),
            BuiltIn::Run => self.builtin_run(span, ctx),
        }
    }

    fn list_arg(
        ctx: &Context,
        name: &str,
        position: &str,
        span: Span,
    ) -> Result<Value, Signal> {
        let value = arg(ctx, name, span)?;
        if value.as_list().is_none() {
            return Err(fail(
                ErrorKind::Typing,
                format!("{} argument must be list", position),
                span,
                ctx,
            ));
        }
        Ok(value)
    }

    fn builtin_append(span: Span, ctx: &Rc<Context>) -> RTResult {
        let list = Self::list_arg(ctx, "list", "First", span)?;
        let value = arg(ctx, "value", span)?;
        if let Some(elements) = list.as_list() {
            elements.borrow_mut().push(value.detached());
        }
        Ok(None)
    }

    /// Removes and returns the element at `index`.
    fn builtin_pop(span: Span, ctx: &Rc<Context>) -> RTResult {
        let list = Self::list_arg(ctx, "list", "First", span)?;
        let index = arg(ctx, "index", span)?;
        let Some(n) = index.as_number() else {
            return Err(fail(
                ErrorKind::Typing,
                "Second argument must be number",
                span,
                ctx,
            ));
        };

        let Some(elements) = list.as_list() else {
            return Ok(None);
        };
        let length = elements.borrow().len();
        if n.fract() != 0.0 || n < 0.0 || n >= length as f64 {
            return Err(fail(
                ErrorKind::Indexing,
                "Element at this index could not be removed from list because index is out of bounds",
                span,
                ctx,
            ));
        }
        let removed = elements.borrow_mut().remove(n as usize);
        Ok(Some(removed))
    }

    fn builtin_extend(span: Span, ctx: &Rc<Context>) -> RTResult {
        let target = Self::list_arg(ctx, "listA", "First", span)?;
        let source = Self::list_arg(ctx, "listB", "Second", span)?;
        if let (Some(target), Some(source)) = (target.as_list(), source.as_list()) {
            // Copied out first: both arguments may be the same list.
            let extra: Vec<Value> = source.borrow().clone();
            target.borrow_mut().extend(extra);
        }
        Ok(None)
    }

    fn builtin_len(span: Span, ctx: &Rc<Context>) -> RTResult {
        let input = arg(ctx, "input", span)?;
        let length = match &input.data {
            Data::Str(text) => text.chars().count(),
            Data::List(list) => list.borrow().len(),
            Data::Dict(dict) => dict.borrow().len(),
            _ => {
                return Err(fail(
                    ErrorKind::Typing,
                    "Argument must be list, string or dict",
                    span,
                    ctx,
                ))
            }
        };
        Ok(Some(Value::number(length as f64)))
    }

    fn builtin_split(span: Span, ctx: &Rc<Context>) -> RTResult {
        let string = arg(ctx, "string", span)?;
        let separator = arg(ctx, "separator", span)?;
        let (Some(string), Some(separator)) = (string.as_str(), separator.as_str()) else {
            return Err(fail(
                ErrorKind::Typing,
                "Arguments must be strings",
                span,
                ctx,
            ));
        };
        if separator.is_empty() {
            return Err(fail(ErrorKind::Runtime, "Empty separator", span, ctx));
        }

        let pieces = string.split(separator).map(Value::string).collect();
        Ok(Some(Value::list(pieces)))
    }

    /// Runs another script in a fresh top-level context that shares this
    /// interpreter's globals and recursion budget.
    fn builtin_run(&mut self, span: Span, ctx: &Rc<Context>) -> RTResult {
        let file = arg(ctx, "fn", span)?;
        let Some(file) = file.as_str() else {
            return Err(fail(
                ErrorKind::Typing,
                "Argument must be string",
                span,
                ctx,
            ));
        };

        let source = self.loader.load(file).map_err(|err| {
            debug!(script = file, error = %err, "failed to load script");
            fail(
                ErrorKind::Runtime,
                format!("Failed to load script \"{}\"", file),
                span,
                ctx,
            )
        })?;
        debug!(script = file, "running script");

        let script_ctx = Rc::new(Context {
            display_name: PROGRAM_CONTEXT.to_string(),
            parent: Some(ctx.clone()),
            parent_entry_pos: Some(span.start),
            symbol_table: self.globals.clone(),
            file: Rc::from(file),
        });
        let outcome = parse(file, &source).and_then(|program| self.run_in(&program, &script_ctx));

        match outcome {
            Ok(_) => Ok(None),
            Err(err) => Err(fail(
                ErrorKind::Runtime,
                format!(
                    "Failed to finish executing script \"{}\"\n{}",
                    file,
                    err.traceback_string()
                ),
                span,
                ctx,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use crate::error::Error;
    use crate::interpreter::engine::InterpreterConfig;
    use crate::loader::MemoryLoader;
    use rstest::rstest;

    fn interpreter() -> Interpreter {
        Interpreter::new(InterpreterConfig::new().console(Console::captured()))
    }

    fn eval(source: &str) -> Result<String, Error> {
        let results = interpreter().run_source("<test>", source)?;
        Ok(results
            .last()
            .and_then(|v| v.as_ref())
            .map(ToString::to_string)
            .unwrap_or_default())
    }

    #[test]
    fn names_and_params_line_up() {
        for builtin in BuiltIn::ALL {
            assert!(!builtin.name().is_empty());
        }
        assert_eq!(BuiltIn::Extend.params(), &["listA", "listB"]);
        assert!(BuiltIn::Input.params().is_empty());
    }

    #[test]
    fn scribe_writes_display_forms() {
        let mut interpreter = interpreter();
        interpreter
            .run_source("<test>", "scribe(\"salve\")\nscribe(XII)\nscribe([1, \"a\"])")
            .unwrap();
        assert_eq!(
            interpreter.console().get_output(),
            vec!["salve", "XII", "[1, \"a\"]"]
        );
    }

    #[test]
    fn initus_reads_queued_input() {
        let mut interpreter = Interpreter::new(
            InterpreterConfig::new().console(Console::captured().with_input(["Marcus"])),
        );
        interpreter
            .run_source("<test>", "name = initus()\nscribe(f\"Salve, {name}\")")
            .unwrap();
        assert_eq!(interpreter.console().get_output(), vec!["Salve, Marcus"]);
    }

    #[test]
    fn purgo_clears_captured_output() {
        let mut interpreter = interpreter();
        interpreter
            .run_source("<test>", "scribe(1)\npurgo()\nscribe(2)")
            .unwrap();
        assert_eq!(interpreter.console().get_output(), vec!["2"]);
    }

    #[rstest]
    #[case("est_numerus(IV)", "Verus")]
    #[case("est_numerus(\"4\")", "Falsus")]
    #[case("est_filum(\"4\")", "Verus")]
    #[case("est_album([])", "Verus")]
    #[case("est_opus(scribe)", "Verus")]
    #[case("est_opus((x) => x)", "Verus")]
    #[case("est_opus(1)", "Falsus")]
    #[case("longitudo(\"abc\")", "3")]
    #[case("longitudo([1, 2])", "2")]
    #[case("longitudo({1: 2})", "1")]
    #[case("a = [1]\nadde(a, 2)\na", "[1, 2]")]
    #[case("a = [1, 2, 3]\nremove(a, 1)", "2")]
    #[case("a = [1, 2, 3]\nremove(a, 1)\na", "[1, 3]")]
    #[case("a = [1]\nextende(a, [2, 3])\na", "[1, 2, 3]")]
    #[case("a = [1]\nextende(a, a)\na", "[1, 1]")]
    #[case("finde(\"a,b,c\", \",\")", "[\"a\", \"b\", \"c\"]")]
    #[case("a = []\nadde(value=1, list=a)\na", "[1]")]
    fn builtin_results(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(eval(source).unwrap(), expected);
    }

    #[rstest]
    #[case("adde(1, 2)", ErrorKind::Typing, "First argument must be list")]
    #[case("remove([1], \"0\")", ErrorKind::Typing, "Second argument must be number")]
    #[case(
        "remove([1], 3)",
        ErrorKind::Indexing,
        "Element at this index could not be removed from list because index is out of bounds"
    )]
    #[case("extende([1], 2)", ErrorKind::Typing, "Second argument must be list")]
    #[case("longitudo(1)", ErrorKind::Typing, "Argument must be list, string or dict")]
    #[case("finde(\"abc\", \"\")", ErrorKind::Runtime, "Empty separator")]
    fn builtin_errors(#[case] source: &str, #[case] kind: ErrorKind, #[case] message: &str) {
        let err = eval(source).unwrap_err();
        assert_eq!(err.kind, kind);
        assert_eq!(err.message, message);
        assert_eq!(err.traceback.last().unwrap().display_name, source.split('(').next().unwrap());
    }

    #[test]
    fn curre_shares_globals() {
        let loader = MemoryLoader::new().with_script("lib.qr", "opus dupla(n) -> n * 2\nbase = X");
        let mut interpreter = Interpreter::new(
            InterpreterConfig::new()
                .console(Console::captured())
                .loader(loader),
        );
        let results = interpreter
            .run_source("<test>", "curre(\"lib.qr\")\ndupla(base)")
            .unwrap();
        assert_eq!(results[1].as_ref().unwrap().to_string(), "XX");
    }

    #[test]
    fn curre_reports_missing_scripts() {
        let err = eval("curre(\"missing.qr\")").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Runtime);
        assert_eq!(err.message, "Failed to load script \"missing.qr\"");
    }

    #[test]
    fn curre_wraps_script_errors() {
        let loader = MemoryLoader::new().with_script("bad.qr", "1 / 0");
        let mut interpreter = Interpreter::new(
            InterpreterConfig::new()
                .console(Console::captured())
                .loader(loader),
        );
        let err = interpreter
            .run_source("<test>", "curre(\"bad.qr\")")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Runtime);
        assert!(err
            .message
            .starts_with("Failed to finish executing script \"bad.qr\"\n"));
        assert!(err.message.ends_with("ZeroDivisionError: Division by zero"));
    }
}
