// Runtime value system: what expressions evaluate to, as opposed to the
// AST which represents the program itself.

use std::fmt;
use std::rc::Rc;

use itertools::Itertools;

use crate::ast::{Expression, Symbol};
use crate::runtime::automaton::{Automaton, Transition};
use crate::runtime::environment::Environment;
use crate::runtime::security::PermissionSet;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Char(char),
    Transition(Transition),
    List(Vec<Value>),
    Function(Function),
    Automaton(Rc<Automaton>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Char(_) => "char",
            Value::Transition(_) => "transition",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Automaton(_) => "automaton",
        }
    }

    /// Booleans are integer-encoded: relational primitives produce 1/0,
    /// conditionals consume them. Anything else has no truth value.
    pub fn from_bool(b: bool) -> Value {
        Value::Integer(if b { 1 } else { 0 })
    }

    pub fn as_truth(&self) -> Option<bool> {
        match self {
            Value::Integer(1) => Some(true),
            Value::Integer(0) => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Char(c) => write!(f, "'{}'", c),
            Value::Transition(t) => write!(f, "{}", t),
            Value::List(items) => {
                write!(f, "[{}]", items.iter().map(|item| item.to_string()).join(" "))
            }
            Value::Function(_) => write!(f, "#<function>"),
            Value::Automaton(a) => write!(f, "{}", a),
        }
    }
}

#[derive(Clone)]
pub enum Function {
    Closure(Rc<Closure>),
    Rec(Rc<RecClosure>),
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Closure(_) => write!(f, "Closure"),
            Function::Rec(_) => write!(f, "RecClosure"),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            (Function::Rec(a), Function::Rec(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A function value: parameter, body, captured environment, and the
/// permission frame pushed when it is called (stack-inspection discipline).
#[derive(Clone)]
pub struct Closure {
    pub param: Symbol,
    pub body: Box<Expression>,
    pub env: Rc<Environment>,
    pub permissions: Option<PermissionSet>,
}

/// As `Closure`, plus the name the body uses to call itself.
#[derive(Clone)]
pub struct RecClosure {
    pub name: Symbol,
    pub param: Symbol,
    pub body: Box<Expression>,
    pub env: Rc<Environment>,
}
