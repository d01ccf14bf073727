//! Runtime value representation
//!
//! A [`Value`] is a cheap envelope around its [`Data`]: the source span it
//! was produced at and the [`Context`] it was last evaluated in, both used
//! only for error attribution. Lists and dicts keep their elements behind
//! `Rc<RefCell<..>>`, so cloning a value (which is what reading a variable
//! does) yields a new envelope over the *same* storage and in-place
//! mutations are seen through every alias.
//!
//! # Operator table
//!
//! Every binary operator is a method returning `Result<Value, Error>`; an
//! operand pair with no rule is an "Illegal operation" type error. Between
//! `Number` and `Numeral` the result keeps the variant of the left operand.

use crate::error::{Error, ErrorKind};
use crate::interpreter::builtins::BuiltIn;
use crate::interpreter::constants::MAX_STRING_LENGTH;
use crate::memory::scope::{Context, SymbolTable};
use crate::numeral;
use crate::parser::ast::{FunctionDecl, Span};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable list storage.
pub type ListRef = Rc<RefCell<Vec<Value>>>;
/// Shared, mutable dict storage.
pub type DictRef = Rc<RefCell<DictStore>>;

#[derive(Debug, Clone)]
pub enum Data {
    Number(f64),
    /// Numeric value printed as Roman numerals.
    Numeral(f64),
    Str(Rc<str>),
    Bool(bool),
    List(ListRef),
    Dict(DictRef),
    Function(Rc<Function>),
    BuiltIn(BuiltIn),
}

/// A user-defined function closed over the scope it was defined in.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub scope: Rc<SymbolTable>,
}

impl Function {
    pub fn name(&self) -> &str {
        self.decl.display_name()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured scope may contain this very function.
        write!(f, "Function({})", self.name())
    }
}

/// Hashable projection of the values allowed as dict keys. `Number` and
/// `Numeral` of equal value map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Number(u64),
    Str(Rc<str>),
    Bool(bool),
}

impl HashKey {
    pub fn of(value: &Value) -> Option<HashKey> {
        match &value.data {
            // `+ 0.0` folds -0.0 into 0.0
            Data::Number(n) | Data::Numeral(n) => Some(HashKey::Number((n + 0.0).to_bits())),
            Data::Str(s) => Some(HashKey::Str(s.clone())),
            Data::Bool(b) => Some(HashKey::Bool(*b)),
            _ => None,
        }
    }
}

/// Dict entries in insertion order, indexed by [`HashKey`].
#[derive(Debug, Clone, Default)]
pub struct DictStore {
    index: FxHashMap<HashKey, usize>,
    entries: Vec<(Value, Value)>,
}

impl DictStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &HashKey) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Inserts or replaces; an existing entry keeps its original key value.
    pub fn insert(&mut self, key: HashKey, key_value: Value, value: Value) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key_value, value));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }
}

/// Runtime values in the interpreter
#[derive(Debug, Clone)]
pub struct Value {
    pub data: Data,
    pub span: Option<Span>,
    pub context: Option<Rc<Context>>,
}

impl From<Data> for Value {
    fn from(data: Data) -> Self {
        Value::new(data)
    }
}

impl Value {
    pub fn new(data: Data) -> Self {
        Value {
            data,
            span: None,
            context: None,
        }
    }

    pub fn number(n: f64) -> Self {
        Value::new(Data::Number(n))
    }

    pub fn numeral(n: f64) -> Self {
        Value::new(Data::Numeral(n))
    }

    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::new(Data::Str(s.into()))
    }

    pub fn boolean(b: bool) -> Self {
        Value::new(Data::Bool(b))
    }

    pub fn list(elements: Vec<Value>) -> Self {
        Value::new(Data::List(Rc::new(RefCell::new(elements))))
    }

    pub fn dict(store: DictStore) -> Self {
        Value::new(Data::Dict(Rc::new(RefCell::new(store))))
    }

    pub fn function(decl: Rc<FunctionDecl>, scope: Rc<SymbolTable>) -> Self {
        Value::new(Data::Function(Rc::new(Function { decl, scope })))
    }

    pub fn builtin(builtin: BuiltIn) -> Self {
        Value::new(Data::BuiltIn(builtin))
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, context: &Rc<Context>) -> Self {
        self.context = Some(context.clone());
        self
    }

    /// Same data with no position or context attached.
    pub fn detached(&self) -> Self {
        Value::new(self.data.clone())
    }

    pub fn type_name(&self) -> &'static str {
        match self.data {
            Data::Number(_) => "Number",
            Data::Numeral(_) => "Numeral",
            Data::Str(_) => "String",
            Data::Bool(_) => "Bool",
            Data::List(_) => "List",
            Data::Dict(_) => "Dict",
            Data::Function(_) => "Function",
            Data::BuiltIn(_) => "BuiltInFunction",
        }
    }

    /// Numeric payload of a `Number` or `Numeral`.
    pub fn as_number(&self) -> Option<f64> {
        match self.data {
            Data::Number(n) | Data::Numeral(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match &self.data {
            Data::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        match &self.data {
            Data::Number(n) | Data::Numeral(n) => *n != 0.0,
            Data::Str(s) => !s.is_empty(),
            Data::Bool(b) => *b,
            Data::List(list) => !list.borrow().is_empty(),
            Data::Dict(dict) => !dict.borrow().is_empty(),
            Data::Function(_) | Data::BuiltIn(_) => true,
        }
    }

    /// Built-in read-only properties such as `length`.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match (&self.data, name) {
            (Data::Str(s), "length") => Some(Value::number(s.chars().count() as f64)),
            (Data::List(list), "length") => Some(Value::number(list.borrow().len() as f64)),
            _ => None,
        }
    }

    /// Form used inside lists and dicts: like `Display`, but strings are quoted.
    pub fn repr(&self) -> String {
        match &self.data {
            Data::Str(s) => format!("\"{}\"", s),
            _ => self.to_string(),
        }
    }

    // ===== Operators =====

    fn span_with(&self, other: &Value) -> Span {
        match (self.span, other.span) {
            (Some(a), Some(b)) => a.to(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => Span::default(),
        }
    }

    fn fail(&self, kind: ErrorKind, message: impl Into<String>, span: Span) -> Error {
        Error::maybe_in_context(kind, message, span, self.context.as_deref())
    }

    fn illegal_operation(&self, other: &Value) -> Error {
        self.fail(
            ErrorKind::Typing,
            format!(
                "Illegal operation between {} and {}",
                self.type_name(),
                other.type_name()
            ),
            self.span_with(other),
        )
    }

    /// Wraps a result computed from `self`, keeping its attribution.
    fn derive(&self, data: Data) -> Value {
        Value {
            data,
            span: None,
            context: self.context.clone(),
        }
    }

    /// Numeric result in the variant of the left operand.
    fn numeric_like_self(&self, n: f64) -> Value {
        match self.data {
            Data::Numeral(_) => self.derive(Data::Numeral(n)),
            _ => self.derive(Data::Number(n)),
        }
    }

    fn numeric_pair(&self, other: &Value) -> Option<(f64, f64)> {
        Some((self.as_number()?, other.as_number()?))
    }

    pub fn added_to(&self, other: &Value) -> Result<Value, Error> {
        if let Some((a, b)) = self.numeric_pair(other) {
            return Ok(self.numeric_like_self(a + b));
        }
        match (&self.data, &other.data) {
            (Data::Str(a), Data::Str(b)) => Ok(self.derive(Data::Str(format!("{a}{b}").into()))),
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn subbed_by(&self, other: &Value) -> Result<Value, Error> {
        match self.numeric_pair(other) {
            Some((a, b)) => Ok(self.numeric_like_self(a - b)),
            None => Err(self.illegal_operation(other)),
        }
    }

    pub fn multed_by(&self, other: &Value) -> Result<Value, Error> {
        if let Some((a, b)) = self.numeric_pair(other) {
            return Ok(self.numeric_like_self(a * b));
        }
        match (&self.data, &other.data) {
            (Data::Str(s), Data::Number(n)) => {
                if n.fract() != 0.0 || !n.is_finite() {
                    return Err(self.fail(
                        ErrorKind::Typing,
                        "Can't multiply a String by a non-integer",
                        self.span_with(other),
                    ));
                }
                let count = if *n < 0.0 { 0 } else { *n as usize };
                match count.checked_mul(s.len()) {
                    Some(len) if len <= MAX_STRING_LENGTH => {
                        Ok(self.derive(Data::Str(s.repeat(count).into())))
                    }
                    _ => Err(self.fail(
                        ErrorKind::Runtime,
                        "String repetition result is too long",
                        self.span_with(other),
                    )),
                }
            }
            _ => Err(self.illegal_operation(other)),
        }
    }

    pub fn dived_by(&self, other: &Value) -> Result<Value, Error> {
        match self.numeric_pair(other) {
            Some((_, b)) if b == 0.0 => Err(self.fail(
                ErrorKind::DivisionByZero,
                "Division by zero",
                other.span.unwrap_or_default(),
            )),
            Some((a, b)) => Ok(self.numeric_like_self(a / b)),
            None => Err(self.illegal_operation(other)),
        }
    }

    pub fn powed_by(&self, other: &Value) -> Result<Value, Error> {
        match self.numeric_pair(other) {
            Some((a, b)) => Ok(self.numeric_like_self(a.powf(b))),
            None => Err(self.illegal_operation(other)),
        }
    }

    pub fn get_comparison_eq(&self, other: &Value) -> Result<Value, Error> {
        self.compare(other, |o| o.is_eq())
    }

    pub fn get_comparison_ne(&self, other: &Value) -> Result<Value, Error> {
        self.compare(other, |o| o.is_ne())
    }

    pub fn get_comparison_lt(&self, other: &Value) -> Result<Value, Error> {
        self.compare(other, |o| o.is_lt())
    }

    pub fn get_comparison_gt(&self, other: &Value) -> Result<Value, Error> {
        self.compare(other, |o| o.is_gt())
    }

    pub fn get_comparison_lte(&self, other: &Value) -> Result<Value, Error> {
        self.compare(other, |o| o.is_le())
    }

    pub fn get_comparison_gte(&self, other: &Value) -> Result<Value, Error> {
        self.compare(other, |o| o.is_ge())
    }

    /// Orders two comparable values and turns the ordering into a `Bool`.
    /// NaN compares unequal to everything.
    fn compare(
        &self,
        other: &Value,
        test: fn(std::cmp::Ordering) -> bool,
    ) -> Result<Value, Error> {
        let ordering = match (&self.data, &other.data) {
            (Data::Str(a), Data::Str(b)) => Some(a.cmp(b)),
            (Data::Bool(a), Data::Bool(b)) => Some(a.cmp(b)),
            _ => match self.numeric_pair(other) {
                Some((a, b)) => a.partial_cmp(&b),
                None => return Err(self.illegal_operation(other)),
            },
        };
        let result = match ordering {
            Some(ordering) => test(ordering),
            None => test(std::cmp::Ordering::Less) && test(std::cmp::Ordering::Greater),
        };
        Ok(self.derive(Data::Bool(result)))
    }

    /// `et`: the left operand when it is falsy, else the right one, within
    /// one type family.
    pub fn anded_by(&self, other: &Value) -> Result<Value, Error> {
        self.logical(other, false)
    }

    /// `aut`: the left operand when it is truthy, else the right one.
    pub fn ored_by(&self, other: &Value) -> Result<Value, Error> {
        self.logical(other, true)
    }

    fn logical(&self, other: &Value, keep_truthy_left: bool) -> Result<Value, Error> {
        let same_family = matches!(
            (&self.data, &other.data),
            (Data::Number(_) | Data::Numeral(_), Data::Number(_) | Data::Numeral(_))
                | (Data::Bool(_), Data::Bool(_))
                | (Data::Str(_), Data::Str(_))
        );
        if !same_family {
            return Err(self.illegal_operation(other));
        }

        let pick_left = self.is_true() == keep_truthy_left;
        Ok(match (&self.data, pick_left) {
            (Data::Number(_) | Data::Numeral(_), _) => {
                let chosen = if pick_left { self } else { other };
                self.numeric_like_self(chosen.as_number().unwrap_or_default())
            }
            (_, true) => self.derive(self.data.clone()),
            (_, false) => self.derive(other.data.clone()),
        })
    }

    pub fn notted(&self) -> Result<Value, Error> {
        Ok(self.derive(Data::Bool(!self.is_true())))
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n == 0.0 {
        // avoids "-0"
        write!(f, "0")
    } else {
        write!(f, "{}", n)
    }
}

impl Value {
    /// `seen` holds the containers currently being written. One met again
    /// inside itself prints as `[...]` or `{...}`.
    fn write_display(
        &self,
        f: &mut fmt::Formatter<'_>,
        seen: &mut Vec<*const ()>,
    ) -> fmt::Result {
        match &self.data {
            Data::Number(n) => write_number(f, *n),
            Data::Numeral(n) => write!(f, "{}", numeral::encode(*n)),
            Data::Str(s) => write!(f, "{}", s),
            Data::Bool(true) => write!(f, "Verus"),
            Data::Bool(false) => write!(f, "Falsus"),
            Data::List(list) => {
                let ptr = Rc::as_ptr(list) as *const ();
                if seen.contains(&ptr) {
                    return write!(f, "[...]");
                }
                seen.push(ptr);
                write!(f, "[")?;
                for (i, item) in list.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.write_repr(f, seen)?;
                }
                seen.pop();
                write!(f, "]")
            }
            Data::Dict(dict) => {
                let ptr = Rc::as_ptr(dict) as *const ();
                if seen.contains(&ptr) {
                    return write!(f, "{{...}}");
                }
                seen.push(ptr);
                write!(f, "{{")?;
                for (i, (key, value)) in dict.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    key.write_repr(f, seen)?;
                    write!(f, ": ")?;
                    value.write_repr(f, seen)?;
                }
                seen.pop();
                write!(f, "}}")
            }
            Data::Function(func) => write!(f, "<function {}>", func.name()),
            Data::BuiltIn(builtin) => write!(f, "<built-in function {}>", builtin.name()),
        }
    }

    fn write_repr(&self, f: &mut fmt::Formatter<'_>, seen: &mut Vec<*const ()>) -> fmt::Result {
        match &self.data {
            Data::Str(s) => write!(f, "\"{}\"", s),
            _ => self.write_display(f, seen),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f, &mut Vec::new())
    }
}
