//! Lexical scopes and call contexts
//!
//! - [`SymbolTable`]: one scope's name → value bindings plus a link to the
//!   enclosing scope. Reads walk outward through the chain; fresh bindings
//!   always land in the local table.
//! - [`Context`]: one activation (the program, a function call, a built-in
//!   call, a `curre`'d script). Contexts form the call chain that tracebacks
//!   are rendered from.
//!
//! The parent link of a table is a strong `Rc`: a closure keeps its defining
//! scope alive after the defining call has returned.

use crate::error::TraceFrame;
use crate::interpreter::constants::PROGRAM_CONTEXT;
use crate::memory::value::Value;
use crate::parser::ast::SourceLocation;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: RefCell<FxHashMap<String, Value>>,
    parent: Option<Rc<SymbolTable>>,
}

impl SymbolTable {
    pub fn new(parent: Option<Rc<SymbolTable>>) -> Self {
        Self {
            symbols: RefCell::new(FxHashMap::default()),
            parent,
        }
    }

    pub fn parent(&self) -> Option<&Rc<SymbolTable>> {
        self.parent.as_ref()
    }

    /// Looks `name` up here, then in each enclosing scope.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut table = self;
        loop {
            if let Some(value) = table.symbols.borrow().get(name) {
                return Some(value.clone());
            }
            table = table.parent.as_deref()?;
        }
    }

    /// Binds `name` in this table. The stored value carries no span or
    /// context.
    pub fn set(&self, name: &str, value: Value) {
        self.symbols
            .borrow_mut()
            .insert(name.to_string(), value.detached());
    }

    /// Rebinds `name` in the nearest table that already defines it.
    /// Returns `false` when no table in the chain does.
    pub fn assign_existing(&self, name: &str, value: Value) -> bool {
        let mut table = self;
        loop {
            if table.symbols.borrow().contains_key(name) {
                table.set(name, value);
                return true;
            }
            match table.parent.as_deref() {
                Some(parent) => table = parent,
                None => return false,
            }
        }
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.symbols.borrow_mut().remove(name)
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.symbols.borrow().contains_key(name)
    }
}

/// An activation record used for scoping and traceback rendering.
pub struct Context {
    pub display_name: String,
    pub parent: Option<Rc<Context>>,
    /// Where the parent was when it entered this context.
    pub parent_entry_pos: Option<SourceLocation>,
    pub symbol_table: Rc<SymbolTable>,
    pub file: Rc<str>,
}

impl Context {
    /// Top-level context of a script.
    pub fn program(file: Rc<str>, symbol_table: Rc<SymbolTable>) -> Self {
        Context {
            display_name: PROGRAM_CONTEXT.to_string(),
            parent: None,
            parent_entry_pos: None,
            symbol_table,
            file,
        }
    }

    /// Context entered from `parent` at `entry`.
    pub fn child(
        display_name: impl Into<String>,
        parent: &Rc<Context>,
        entry: SourceLocation,
        symbol_table: Rc<SymbolTable>,
    ) -> Self {
        Context {
            display_name: display_name.into(),
            parent: Some(parent.clone()),
            parent_entry_pos: Some(entry),
            symbol_table,
            file: parent.file.clone(),
        }
    }

    /// Frames from the outermost context down to this one, with `at` as the
    /// position inside this context.
    pub fn trace(&self, at: SourceLocation) -> Vec<TraceFrame> {
        let mut frames = Vec::new();
        let mut location = at;
        let mut context = Some(self);

        while let Some(ctx) = context {
            frames.push(TraceFrame {
                file: ctx.file.clone(),
                location,
                display_name: ctx.display_name.clone(),
            });
            location = ctx.parent_entry_pos.unwrap_or_default();
            context = ctx.parent.as_deref();
        }

        frames.reverse();
        frames
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("display_name", &self.display_name)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}
