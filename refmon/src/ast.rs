// Abstract syntax for the reference-monitored expression language.
// Programs arrive as pre-built trees from an external front end and are
// never mutated after construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::runtime::security::{AccessMode, PermissionSet};

/// A variable name.
#[derive(Debug, PartialEq, Clone, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: &str) -> Self {
        Symbol(s.to_string())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Char(char),
}

/// Binary primitives. They operate on integers only; relational results are
/// integer-encoded booleans (1/0).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum PrimOp {
    Add,
    Sub,
    Mul,
    Eq,
    Lt,
    Gt,
}

impl fmt::Display for PrimOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            PrimOp::Add => "+",
            PrimOp::Sub => "-",
            PrimOp::Mul => "*",
            PrimOp::Eq => "=",
            PrimOp::Lt => "<",
            PrimOp::Gt => ">",
        };
        write!(f, "{}", op)
    }
}

/// `let symbol = value in body`. A body-less let defines into the current
/// scope instead of opening a new one, which is what makes sequential
/// top-level definitions work.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LetExpr {
    pub symbol: Symbol,
    pub value: Box<Expression>,
    pub body: Option<Box<Expression>>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct IfExpr {
    pub condition: Box<Expression>,
    pub then_branch: Box<Expression>,
    pub else_branch: Box<Expression>,
}

/// Single-parameter function abstraction. `permissions` is the set this
/// function grants to privileged operations performed while its activation
/// record is live; `None` declares no frame at all.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FnExpr {
    pub param: Symbol,
    pub body: Box<Expression>,
    pub permissions: Option<PermissionSet>,
}

/// Recursive function abstraction; `name` is bound to the function itself
/// inside `body`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RecFnExpr {
    pub name: Symbol,
    pub param: Symbol,
    pub body: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Box<Expression>,
    pub argument: Box<Expression>,
}

/// Ordered sequencing: earlier expressions are evaluated for their effects
/// on the environment and monitor state, the last value is the result.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DoExpr {
    pub expressions: Vec<Expression>,
}

/// A privileged operation on a named resource. The resource name is purely
/// symbolic; no real I/O happens behind it.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AccessExpr {
    pub mode: AccessMode,
    pub resource: String,
}

/// One automaton transition written as data: state, symbol, state.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TransitionExpr {
    pub from: Box<Expression>,
    pub symbol: Box<Expression>,
    pub to: Box<Expression>,
}

/// Builds a security automaton from ordinary expressions: integers for
/// states, characters for symbols, a list of transition triples.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PolicyExpr {
    pub start: Box<Expression>,
    pub transitions: Box<Expression>,
    pub accepting: Box<Expression>,
}

/// Narrowing scope: evaluate `body` with `policy` installed on top of the
/// currently active monitors. The installation is invisible outside `body`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EnforceExpr {
    pub policy: Box<Expression>,
    pub body: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    Symbol(Symbol),
    Primitive {
        op: PrimOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    If(IfExpr),
    Let(LetExpr),
    Fn(FnExpr),
    Rec(RecFnExpr),
    Call(CallExpr),
    Do(DoExpr),
    List(Vec<Expression>),
    Transition(TransitionExpr),
    Access(AccessExpr),
    Policy(PolicyExpr),
    Enforce(EnforceExpr),
}
