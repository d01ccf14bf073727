//! Function definition, invocation and argument binding.
//!
//! User functions and built-ins share one calling convention: arguments
//! bind by position, then by keyword, against a list of named parameters.
//! Each invocation runs in its own [`Context`] and counts one level of
//! recursion depth.

use crate::error::ErrorKind;
use crate::interpreter::builtins::BuiltIn;
use crate::interpreter::engine::{fail, Interpreter, RTResult, Signal};
use crate::memory::{Context, Data, Function, SymbolTable, Value};
use crate::parser::ast::{AstNode, FunctionDecl, KeywordArg, Span};
use std::rc::Rc;
use tracing::debug;

/// A parameter as seen by argument binding: its name and optional default.
pub(crate) type ParamSpec<'a> = (&'a str, Option<&'a AstNode>);

impl Interpreter {
    /// Creates a closure over the current scope. A named definition is also
    /// bound in that scope.
    pub(crate) fn evaluate_func_def(
        &mut self,
        decl: &Rc<FunctionDecl>,
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        let function = Value::function(decl.clone(), ctx.symbol_table.clone());
        if let Some(name) = &decl.name {
            ctx.symbol_table.set(name, function.clone());
        }
        Ok(Some(function.with_span(span).with_context(ctx)))
    }

    pub(crate) fn evaluate_call(
        &mut self,
        callee: &AstNode,
        args: &[AstNode],
        kwargs: &[KeywordArg],
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        let callee = self.value_of(callee, ctx)?;

        let mut positional = Vec::with_capacity(args.len());
        for arg in args {
            positional.push(self.value_of(arg, ctx)?);
        }
        let mut keywords = Vec::with_capacity(kwargs.len());
        for kwarg in kwargs {
            keywords.push((kwarg.name.as_str(), self.value_of(&kwarg.value, ctx)?));
        }

        let result = self.call_value(&callee, positional, keywords, span, ctx)?;
        Ok(result.map(|value| value.with_span(span).with_context(ctx)))
    }

    /// Invokes a function or built-in value, tracking recursion depth.
    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Vec<(&str, Value)>,
        span: Span,
        caller: &Rc<Context>,
    ) -> RTResult {
        if !matches!(callee.data, Data::Function(_) | Data::BuiltIn(_)) {
            return Err(fail(
                ErrorKind::Typing,
                format!("'{}' is not callable", callee.type_name()),
                span,
                caller,
            ));
        }

        if self.depth >= self.max_depth {
            return Err(fail(
                ErrorKind::Recursing,
                "Maximum recursion depth exceeded",
                span,
                caller,
            ));
        }
        self.depth += 1;

        let result = match &callee.data {
            Data::Function(function) => self.call_function(function, args, kwargs, span, caller),
            Data::BuiltIn(builtin) => self.call_builtin(*builtin, args, kwargs, span, caller),
            _ => Ok(None),
        };

        self.depth -= 1;
        result
    }

    fn call_function(
        &mut self,
        function: &Rc<Function>,
        args: Vec<Value>,
        kwargs: Vec<(&str, Value)>,
        span: Span,
        caller: &Rc<Context>,
    ) -> RTResult {
        let name = function.name();
        let table = Rc::new(SymbolTable::new(Some(function.scope.clone())));
        let call_ctx = Rc::new(Context::child(name, caller, span.start, table.clone()));

        let params: Vec<ParamSpec> = function
            .decl
            .params
            .iter()
            .map(|param| (param.name.as_str(), param.default.as_ref()))
            .collect();
        self.bind_arguments(name, &params, args, kwargs, span, caller, &table)?;

        debug!(function = name, depth = self.depth, "calling function");
        match self.evaluate(&function.decl.body, &call_ctx) {
            Ok(value) if function.decl.auto_return => Ok(value),
            Ok(_) => Ok(None),
            Err(Signal::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }

    fn call_builtin(
        &mut self,
        builtin: BuiltIn,
        args: Vec<Value>,
        kwargs: Vec<(&str, Value)>,
        span: Span,
        caller: &Rc<Context>,
    ) -> RTResult {
        let table = Rc::new(SymbolTable::new(Some(caller.symbol_table.clone())));
        let exec_ctx = Rc::new(Context::child(builtin.name(), caller, span.start, table.clone()));

        let params: Vec<ParamSpec> = builtin.params().iter().map(|name| (*name, None)).collect();
        self.bind_arguments(builtin.name(), &params, args, kwargs, span, caller, &table)?;

        self.execute_builtin(builtin, span, &exec_ctx)
    }

    /// Binds `args` then `kwargs` to `params` in `table`. Parameters left
    /// unbound take their default, evaluated in the caller's context.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn bind_arguments(
        &mut self,
        name: &str,
        params: &[ParamSpec],
        args: Vec<Value>,
        kwargs: Vec<(&str, Value)>,
        span: Span,
        caller: &Rc<Context>,
        table: &SymbolTable,
    ) -> Result<(), Signal> {
        if args.len() > params.len() {
            return Err(fail(
                ErrorKind::Typing,
                format!("{} too many args passed into {}()", args.len() - params.len(), name),
                span,
                caller,
            ));
        }

        let mut bound: Vec<Option<Value>> = vec![None; params.len()];
        for (slot, arg) in bound.iter_mut().zip(args) {
            *slot = Some(arg);
        }

        for (keyword, value) in kwargs {
            let Some(index) = params.iter().position(|(param, _)| *param == keyword) else {
                return Err(fail(
                    ErrorKind::Typing,
                    format!("{}() got an unexpected keyword argument '{}'", name, keyword),
                    span,
                    caller,
                ));
            };
            if bound[index].is_some() {
                return Err(fail(
                    ErrorKind::Typing,
                    format!("{}() got multiple values for argument '{}'", name, keyword),
                    span,
                    caller,
                ));
            }
            bound[index] = Some(value);
        }

        let mut missing = 0;
        for (slot, (_, default)) in bound.iter_mut().zip(params) {
            if slot.is_some() {
                continue;
            }
            match default {
                Some(default) => *slot = Some(self.value_of(default, caller)?),
                None => missing += 1,
            }
        }
        if missing > 0 {
            return Err(fail(
                ErrorKind::Typing,
                format!("{} too few args passed into {}()", missing, name),
                span,
                caller,
            ));
        }

        for ((param, _), value) in params.iter().zip(bound) {
            if let Some(value) = value {
                table.set(param, value);
            }
        }
        Ok(())
    }
}
