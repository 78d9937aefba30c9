// Environment for variable bindings and scope management

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Symbol;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::values::Value;

/// Lexically scoped environment. Each scope holds its own bindings plus a
/// shared reference to the enclosing scope; extending a scope never mutates
/// the parent, so closures capture exactly the chain they were built over.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    /// Current scope bindings
    bindings: HashMap<String, Value>,
    /// Parent environment for lexical scoping
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    pub fn with_parent(parent: Rc<Environment>) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Define a binding in the current scope, shadowing any outer binding
    /// of the same name.
    pub fn define(&mut self, symbol: &Symbol, value: Value) {
        self.bindings.insert(symbol.0.clone(), value);
    }

    /// Look up a symbol here or in enclosing scopes; the innermost binding
    /// wins. Absence is fatal.
    pub fn lookup(&self, symbol: &Symbol) -> RuntimeResult<Value> {
        if let Some(value) = self.bindings.get(&symbol.0) {
            Ok(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.lookup(symbol)
        } else {
            Err(RuntimeError::UndefinedSymbol(symbol.clone()))
        }
    }
}
