//! Runtime memory model
//!
//! This module provides the core runtime abstractions:
//! - [`value`]: tagged runtime values and their operator table
//! - [`scope`]: chained symbol tables and the call contexts that own them
//!
//! There is no manual memory management: list and dict storage is shared
//! through `Rc<RefCell<..>>`, and a scope lives as long as the call that
//! created it or any closure that captured it.

pub mod scope;
pub mod value;

pub use scope::{Context, SymbolTable};
pub use value::{Data, DictStore, Function, HashKey, Value};
