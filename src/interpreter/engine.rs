// Execution engine for the scripting language

use crate::console::Console;
use crate::error::{Error, ErrorKind};
use crate::interpreter::builtins::BuiltIn;
use crate::interpreter::constants::MAX_RECURSION_DEPTH;
use crate::loader::{FsLoader, ScriptLoader};
use crate::memory::{Context, DictStore, HashKey, SymbolTable, Value};
use crate::parser::ast::{AstNode, Program, Span, StringPart};
use crate::parser::parse;
use std::f64::consts::PI;
use std::rc::Rc;
use tracing::debug;

/// Non-value outcome of evaluating a node.
///
/// `Return`, `Break` and `Continue` travel outward through `?` until the
/// enclosing call or loop turns them back into ordinary values.
#[derive(Debug)]
pub enum Signal {
    Error(Box<Error>),
    Return(Option<Value>),
    Break,
    Continue,
}

impl From<Error> for Signal {
    fn from(err: Error) -> Self {
        Signal::Error(Box::new(err))
    }
}

/// Outcome of one evaluation step. `Ok(None)` is a statement that produced
/// no value.
pub type RTResult = Result<Option<Value>, Signal>;

/// Builds a dynamic error raised inside `context`.
pub(crate) fn fail(
    kind: ErrorKind,
    message: impl Into<String>,
    span: Span,
    context: &Context,
) -> Signal {
    Error::in_context(kind, message, span, context).into()
}

/// Embedder-facing settings for an [`Interpreter`].
pub struct InterpreterConfig {
    pub max_depth: usize,
    pub console: Console,
    pub loader: Box<dyn ScriptLoader>,
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn loader(mut self, loader: impl ScriptLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_depth: MAX_RECURSION_DEPTH,
            console: Console::stdio(),
            loader: Box::new(FsLoader::new()),
        }
    }
}

/// Tree-walking evaluator
pub struct Interpreter {
    /// Number of invocations currently in progress
    pub(crate) depth: usize,

    pub(crate) max_depth: usize,

    /// Where `scribe`, `initus` and `purgo` go
    pub(crate) console: Console,

    /// Source of scripts for `curre`
    pub(crate) loader: Box<dyn ScriptLoader>,

    /// Global scope, shared by every script this interpreter runs
    pub(crate) globals: Rc<SymbolTable>,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        let globals = Rc::new(SymbolTable::new(None));
        globals.set("nil", Value::number(0.0));
        globals.set("pi", Value::number(PI));
        for builtin in BuiltIn::ALL {
            globals.set(builtin.name(), Value::builtin(builtin));
        }

        Interpreter {
            depth: 0,
            max_depth: config.max_depth,
            console: config.console,
            loader: config.loader,
            globals,
        }
    }

    pub fn globals(&self) -> &Rc<SymbolTable> {
        &self.globals
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Evaluates every top-level statement of `program` in order and
    /// returns each statement's value. The first uncaught error stops the
    /// run.
    pub fn run(&mut self, program: &Program, file: &str) -> Result<Vec<Option<Value>>, Error> {
        let context = Rc::new(Context::program(Rc::from(file), self.globals.clone()));
        self.run_in(program, &context)
    }

    /// Lexes, parses and runs `source`.
    pub fn run_source(&mut self, file: &str, source: &str) -> Result<Vec<Option<Value>>, Error> {
        let program = parse(file, source)?;
        self.run(&program, file)
    }

    pub(crate) fn run_in(
        &mut self,
        program: &Program,
        context: &Rc<Context>,
    ) -> Result<Vec<Option<Value>>, Error> {
        debug!(
            file = %context.file,
            statements = program.statements.len(),
            "running program"
        );
        let mut results = Vec::with_capacity(program.statements.len());
        for statement in &program.statements {
            match self.evaluate(statement, context) {
                Ok(value) => results.push(value),
                Err(Signal::Error(err)) => return Err(*err),
                // `redi`, `continua` and `confringe` are rejected at parse
                // time outside functions and loops.
                Err(Signal::Return(value)) => results.push(value),
                Err(Signal::Break | Signal::Continue) => results.push(None),
            }
        }
        Ok(results)
    }

    /// Evaluates one node.
    pub(crate) fn evaluate(&mut self, node: &AstNode, ctx: &Rc<Context>) -> RTResult {
        match node {
            AstNode::Number { value, span } => Ok(Some(Self::literal(Value::number(*value), *span, ctx))),
            AstNode::Numeral { value, span } => Ok(Some(Self::literal(Value::numeral(*value), *span, ctx))),
            AstNode::Bool { value, span } => Ok(Some(Self::literal(Value::boolean(*value), *span, ctx))),
            AstNode::Str { parts, span } => self.evaluate_string(parts, *span, ctx),
            AstNode::List { elements, span } => self.evaluate_list(elements, *span, ctx),
            AstNode::Dict { entries, span } => self.evaluate_dict(entries, *span, ctx),
            AstNode::Block { statements, span } => self.evaluate_block(statements, *span, ctx),
            AstNode::VarAccess {
                name,
                indices,
                attrs,
                span,
            } => self.evaluate_access(name, indices, attrs, *span, ctx),
            AstNode::VarAssign {
                targets,
                values,
                op,
                span,
            } => self.evaluate_assign(targets, values, *op, *span, ctx),
            AstNode::BinaryOp {
                op,
                left,
                right,
                span,
            } => self.evaluate_binary(*op, left, right, *span, ctx),
            AstNode::UnaryOp { op, operand, span } => self.evaluate_unary(*op, operand, *span, ctx),
            AstNode::If {
                cases, else_case, ..
            } => self.evaluate_if(cases, else_case.as_deref(), ctx),
            AstNode::Try { body, handler, .. } => self.evaluate_try(body, handler.as_deref(), ctx),
            AstNode::For {
                var,
                start,
                end,
                step,
                body,
                returns_null,
                span,
            } => self.evaluate_for(
                var,
                start,
                end,
                step.as_deref(),
                body,
                *returns_null,
                *span,
                ctx,
            ),
            AstNode::While {
                condition,
                body,
                returns_null,
                span,
            } => self.evaluate_while(condition, body, *returns_null, *span, ctx),
            AstNode::FuncDef { decl, span } => self.evaluate_func_def(decl, *span, ctx),
            AstNode::Call {
                callee,
                args,
                kwargs,
                span,
            } => self.evaluate_call(callee, args, kwargs, *span, ctx),
            AstNode::Return { value, .. } => self.evaluate_return(value.as_deref(), ctx),
            AstNode::Continue { .. } => Err(Signal::Continue),
            AstNode::Break { .. } => Err(Signal::Break),
        }
    }

    /// Evaluates a node that must produce a value.
    pub(crate) fn value_of(&mut self, node: &AstNode, ctx: &Rc<Context>) -> Result<Value, Signal> {
        match self.evaluate(node, ctx)? {
            Some(value) => Ok(value),
            None => Err(fail(
                ErrorKind::Runtime,
                "Expression does not have a value",
                node.span(),
                ctx,
            )),
        }
    }

    /// Like [`Interpreter::evaluate`], but a block yields the value of its
    /// last statement instead of a list of all of them.
    pub(crate) fn evaluate_last(&mut self, node: &AstNode, ctx: &Rc<Context>) -> RTResult {
        match node {
            AstNode::Block { statements, .. } => {
                let mut last = None;
                for statement in statements {
                    last = self.evaluate(statement, ctx)?;
                }
                Ok(last)
            }
            _ => self.evaluate(node, ctx),
        }
    }

    fn literal(value: Value, span: Span, ctx: &Rc<Context>) -> Value {
        value.with_span(span).with_context(ctx)
    }

    fn evaluate_string(&mut self, parts: &[StringPart], span: Span, ctx: &Rc<Context>) -> RTResult {
        let mut text = String::new();
        for part in parts {
            match part {
                StringPart::Text(chunk) => text.push_str(chunk),
                StringPart::Expr(expr) => {
                    let value = self.value_of(expr, ctx)?;
                    text.push_str(&value.to_string());
                }
            }
        }
        Ok(Some(Self::literal(Value::string(text), span, ctx)))
    }

    fn evaluate_list(&mut self, elements: &[AstNode], span: Span, ctx: &Rc<Context>) -> RTResult {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            values.push(self.value_of(element, ctx)?.detached());
        }
        Ok(Some(Self::literal(Value::list(values), span, ctx)))
    }

    fn evaluate_dict(
        &mut self,
        entries: &[(AstNode, AstNode)],
        span: Span,
        ctx: &Rc<Context>,
    ) -> RTResult {
        let mut store = DictStore::new();
        for (key_node, value_node) in entries {
            let key = self.value_of(key_node, ctx)?;
            let hash = Self::hash_key(&key, key_node.span(), ctx)?;
            let value = self.value_of(value_node, ctx)?;
            store.insert(hash, key.detached(), value.detached());
        }
        Ok(Some(Self::literal(Value::dict(store), span, ctx)))
    }

    /// Dict key of `key`, or a type error naming its type.
    pub(crate) fn hash_key(key: &Value, span: Span, ctx: &Context) -> Result<HashKey, Signal> {
        HashKey::of(key).ok_or_else(|| {
            fail(
                ErrorKind::Typing,
                format!("Key cannot be a {}", key.type_name().to_lowercase()),
                span,
                ctx,
            )
        })
    }

    /// A block evaluates to the list of values its statements produced.
    fn evaluate_block(&mut self, statements: &[AstNode], span: Span, ctx: &Rc<Context>) -> RTResult {
        let mut values = Vec::new();
        for statement in statements {
            if let Some(value) = self.evaluate(statement, ctx)? {
                values.push(value.detached());
            }
        }
        Ok(Some(Self::literal(Value::list(values), span, ctx)))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}
