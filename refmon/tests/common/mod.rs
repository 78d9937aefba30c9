// Shared AST construction helpers for the integration tests. The front end
// that would normally build these trees is out of scope, so tests assemble
// programs directly.

#![allow(dead_code)]

use refmon::ast::{
    AccessExpr, CallExpr, DoExpr, EnforceExpr, Expression, FnExpr, IfExpr, LetExpr, Literal,
    PolicyExpr, PrimOp, RecFnExpr, Symbol, TransitionExpr,
};
use refmon::runtime::security::{AccessMode, Permission, PermissionSet};

pub fn int(n: i64) -> Expression {
    Expression::Literal(Literal::Integer(n))
}

pub fn ch(c: char) -> Expression {
    Expression::Literal(Literal::Char(c))
}

pub fn sym(name: &str) -> Expression {
    Expression::Symbol(Symbol::new(name))
}

pub fn prim(op: PrimOp, left: Expression, right: Expression) -> Expression {
    Expression::Primitive {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn if_(condition: Expression, then_branch: Expression, else_branch: Expression) -> Expression {
    Expression::If(IfExpr {
        condition: Box::new(condition),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
    })
}

pub fn let_in(name: &str, value: Expression, body: Expression) -> Expression {
    Expression::Let(LetExpr {
        symbol: Symbol::new(name),
        value: Box::new(value),
        body: Some(Box::new(body)),
    })
}

pub fn let_def(name: &str, value: Expression) -> Expression {
    Expression::Let(LetExpr {
        symbol: Symbol::new(name),
        value: Box::new(value),
        body: None,
    })
}

/// Closure with no declared permission set: pushes no frame at call time.
pub fn lam(param: &str, body: Expression) -> Expression {
    Expression::Fn(FnExpr {
        param: Symbol::new(param),
        body: Box::new(body),
        permissions: None,
    })
}

/// Closure that declares the given permissions for its activation records.
pub fn lam_granting(param: &str, permissions: &[Permission], body: Expression) -> Expression {
    Expression::Fn(FnExpr {
        param: Symbol::new(param),
        body: Box::new(body),
        permissions: Some(PermissionSet::of(permissions)),
    })
}

pub fn rec(name: &str, param: &str, body: Expression) -> Expression {
    Expression::Rec(RecFnExpr {
        name: Symbol::new(name),
        param: Symbol::new(param),
        body: Box::new(body),
    })
}

pub fn call(callee: Expression, argument: Expression) -> Expression {
    Expression::Call(CallExpr {
        callee: Box::new(callee),
        argument: Box::new(argument),
    })
}

pub fn seq(expressions: Vec<Expression>) -> Expression {
    Expression::Do(DoExpr { expressions })
}

pub fn list(items: Vec<Expression>) -> Expression {
    Expression::List(items)
}

pub fn read(resource: &str) -> Expression {
    access(AccessMode::Read, resource)
}

pub fn write(resource: &str) -> Expression {
    access(AccessMode::Write, resource)
}

pub fn open(resource: &str) -> Expression {
    access(AccessMode::Open, resource)
}

pub fn access(mode: AccessMode, resource: &str) -> Expression {
    Expression::Access(AccessExpr {
        mode,
        resource: resource.to_string(),
    })
}

pub fn transition(from: Expression, symbol: Expression, to: Expression) -> Expression {
    Expression::Transition(TransitionExpr {
        from: Box::new(from),
        symbol: Box::new(symbol),
        to: Box::new(to),
    })
}

pub fn policy(start: Expression, transitions: Expression, accepting: Expression) -> Expression {
    Expression::Policy(PolicyExpr {
        start: Box::new(start),
        transitions: Box::new(transitions),
        accepting: Box::new(accepting),
    })
}

pub fn enforce(policy: Expression, body: Expression) -> Expression {
    Expression::Enforce(EnforceExpr {
        policy: Box::new(policy),
        body: Box::new(body),
    })
}

/// "No read after write" written in the expression language itself: state 0
/// until the first write, state 1 afterwards, dead state 2 once a read
/// follows a write. Accepting states are 0 and 1.
pub fn no_read_after_write() -> Expression {
    policy(
        int(0),
        list(vec![
            transition(int(0), ch('r'), int(0)),
            transition(int(0), ch('w'), int(1)),
            transition(int(1), ch('w'), int(1)),
            transition(int(1), ch('r'), int(2)),
            transition(int(2), ch('r'), int(2)),
            transition(int(2), ch('w'), int(2)),
        ]),
        list(vec![int(0), int(1)]),
    )
}

/// Mirror image of `no_read_after_write`.
pub fn no_write_after_read() -> Expression {
    policy(
        int(0),
        list(vec![
            transition(int(0), ch('w'), int(0)),
            transition(int(0), ch('r'), int(1)),
            transition(int(1), ch('r'), int(1)),
            transition(int(1), ch('w'), int(2)),
            transition(int(2), ch('r'), int(2)),
            transition(int(2), ch('w'), int(2)),
        ]),
        list(vec![int(0), int(1)]),
    )
}
