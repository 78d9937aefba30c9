// Tree-walking evaluator. Big-step, strict, left-to-right; the environment,
// permission stack, active-monitor list, and event trace are all threaded
// through the evaluation calls, never held as globals.

use std::rc::Rc;

use log::warn;

use crate::ast::{
    AccessExpr, CallExpr, DoExpr, EnforceExpr, Expression, FnExpr, IfExpr, LetExpr, Literal,
    PolicyExpr, PrimOp, RecFnExpr, TransitionExpr,
};
use crate::runtime::automaton::{Automaton, EventTrace, SecurityContext, Transition};
use crate::runtime::environment::Environment;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::security;
use crate::runtime::values::{Closure, Function, RecClosure, Value};

pub struct Evaluator {
    /// Global environment seeding each evaluation
    pub env: Environment,
    max_recursion_depth: usize,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator {
            env: Environment::new(),
            max_recursion_depth: 1000,
        }
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Evaluate one program over fresh state: empty permission stack, no
    /// active monitors, empty event trace.
    pub fn evaluate(&self, expr: &Expression) -> RuntimeResult<Value> {
        let mut env = self.env.clone();
        let sec = SecurityContext::new();
        let mut trace = EventTrace::new();
        self.eval_expr(expr, &mut env, &sec, &mut trace, 0)
    }

    /// Evaluate top-level forms in order, threading the environment so that
    /// bare `let` definitions are visible to later forms. Yields the last
    /// value.
    pub fn eval_toplevel(&self, forms: &[Expression]) -> RuntimeResult<Value> {
        let mut env = self.env.clone();
        let sec = SecurityContext::new();
        let mut trace = EventTrace::new();
        let mut result = Value::Integer(0);
        for form in forms {
            result = self.eval_expr(form, &mut env, &sec, &mut trace, 0)?;
        }
        Ok(result)
    }

    fn eval_expr(
        &self,
        expr: &Expression,
        env: &mut Environment,
        sec: &SecurityContext,
        trace: &mut EventTrace,
        depth: usize,
    ) -> RuntimeResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(self.eval_literal(lit)),
            Expression::Symbol(sym) => env.lookup(sym),
            Expression::Primitive { op, left, right } => {
                let left = self.eval_expr(left, env, sec, trace, depth)?;
                let right = self.eval_expr(right, env, sec, trace, depth)?;
                self.apply_primitive(*op, &left, &right)
            }
            Expression::If(if_expr) => self.eval_if(if_expr, env, sec, trace, depth),
            Expression::Let(let_expr) => self.eval_let(let_expr, env, sec, trace, depth),
            Expression::Fn(fn_expr) => Ok(self.eval_fn(fn_expr, env)),
            Expression::Rec(rec_expr) => Ok(self.eval_rec(rec_expr, env)),
            Expression::Call(call_expr) => self.eval_call(call_expr, env, sec, trace, depth),
            Expression::Do(do_expr) => self.eval_do(do_expr, env, sec, trace, depth),
            Expression::List(exprs) => {
                let mut items = Vec::with_capacity(exprs.len());
                for e in exprs {
                    items.push(self.eval_expr(e, env, sec, trace, depth)?);
                }
                Ok(Value::List(items))
            }
            Expression::Transition(t) => self.eval_transition(t, env, sec, trace, depth),
            Expression::Access(access) => self.eval_access(access, sec, trace),
            Expression::Policy(policy) => self.eval_policy(policy, env, sec, trace, depth),
            Expression::Enforce(enforce) => self.eval_enforce(enforce, env, sec, trace, depth),
        }
    }

    fn eval_literal(&self, lit: &Literal) -> Value {
        match lit {
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Char(c) => Value::Char(*c),
        }
    }

    fn apply_primitive(&self, op: PrimOp, left: &Value, right: &Value) -> RuntimeResult<Value> {
        let (a, b) = match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => (*a, *b),
            (Value::Integer(_), other) | (other, _) => {
                return Err(RuntimeError::TypeError {
                    expected: "integer".to_string(),
                    actual: other.type_name().to_string(),
                    operation: op.to_string(),
                })
            }
        };
        let overflow = || RuntimeError::ArithmeticOverflow {
            operation: op.to_string(),
        };
        let result = match op {
            PrimOp::Add => Value::Integer(a.checked_add(b).ok_or_else(overflow)?),
            PrimOp::Sub => Value::Integer(a.checked_sub(b).ok_or_else(overflow)?),
            PrimOp::Mul => Value::Integer(a.checked_mul(b).ok_or_else(overflow)?),
            PrimOp::Eq => Value::from_bool(a == b),
            PrimOp::Lt => Value::from_bool(a < b),
            PrimOp::Gt => Value::from_bool(a > b),
        };
        Ok(result)
    }

    fn eval_if(
        &self,
        if_expr: &IfExpr,
        env: &mut Environment,
        sec: &SecurityContext,
        trace: &mut EventTrace,
        depth: usize,
    ) -> RuntimeResult<Value> {
        let condition = self.eval_expr(&if_expr.condition, env, sec, trace, depth)?;
        match condition.as_truth() {
            Some(true) => self.eval_expr(&if_expr.then_branch, env, sec, trace, depth),
            Some(false) => self.eval_expr(&if_expr.else_branch, env, sec, trace, depth),
            None => Err(RuntimeError::TypeError {
                expected: "boolean integer (0 or 1)".to_string(),
                actual: condition.to_string(),
                operation: "if condition".to_string(),
            }),
        }
    }

    fn eval_let(
        &self,
        let_expr: &LetExpr,
        env: &mut Environment,
        sec: &SecurityContext,
        trace: &mut EventTrace,
        depth: usize,
    ) -> RuntimeResult<Value> {
        let value = self.eval_expr(&let_expr.value, env, sec, trace, depth)?;
        match &let_expr.body {
            Some(body) => {
                // The binding lives in a child scope; the caller's
                // environment is untouched once the body returns.
                let mut let_env = Environment::with_parent(Rc::new(env.clone()));
                let_env.define(&let_expr.symbol, value);
                self.eval_expr(body, &mut let_env, sec, trace, depth)
            }
            None => {
                // Bare let: extend the current scope for later forms.
                env.define(&let_expr.symbol, value.clone());
                Ok(value)
            }
        }
    }

    fn eval_fn(&self, fn_expr: &FnExpr, env: &Environment) -> Value {
        Value::Function(Function::Closure(Rc::new(Closure {
            param: fn_expr.param.clone(),
            body: fn_expr.body.clone(),
            env: Rc::new(env.clone()),
            permissions: fn_expr.permissions,
        })))
    }

    fn eval_rec(&self, rec_expr: &RecFnExpr, env: &Environment) -> Value {
        Value::Function(Function::Rec(Rc::new(RecClosure {
            name: rec_expr.name.clone(),
            param: rec_expr.param.clone(),
            body: rec_expr.body.clone(),
            env: Rc::new(env.clone()),
        })))
    }

    fn eval_call(
        &self,
        call_expr: &CallExpr,
        env: &mut Environment,
        sec: &SecurityContext,
        trace: &mut EventTrace,
        depth: usize,
    ) -> RuntimeResult<Value> {
        let callee = self.eval_expr(&call_expr.callee, env, sec, trace, depth)?;
        // The operand is evaluated in the caller's environment.
        let argument = self.eval_expr(&call_expr.argument, env, sec, trace, depth)?;
        self.call_function(callee, argument, sec, trace, depth)
    }

    fn call_function(
        &self,
        callee: Value,
        argument: Value,
        sec: &SecurityContext,
        trace: &mut EventTrace,
        depth: usize,
    ) -> RuntimeResult<Value> {
        if depth >= self.max_recursion_depth {
            return Err(RuntimeError::StackOverflow {
                max_depth: self.max_recursion_depth,
            });
        }
        match callee {
            Value::Function(Function::Closure(closure)) => {
                let mut func_env = Environment::with_parent(closure.env.clone());
                func_env.define(&closure.param, argument);
                // Frame push happens at call time, not definition time; a
                // closure with no declared set leaves the caller's chain
                // as it stands.
                match closure.permissions {
                    Some(granted) => {
                        let callee_sec = sec.with_frame(granted);
                        self.eval_expr(&closure.body, &mut func_env, &callee_sec, trace, depth + 1)
                    }
                    None => self.eval_expr(&closure.body, &mut func_env, sec, trace, depth + 1),
                }
            }
            Value::Function(Function::Rec(rec)) => {
                let mut func_env = Environment::with_parent(rec.env.clone());
                func_env.define(&rec.name, Value::Function(Function::Rec(rec.clone())));
                func_env.define(&rec.param, argument);
                self.eval_expr(&rec.body, &mut func_env, sec, trace, depth + 1)
            }
            other => Err(RuntimeError::TypeError {
                expected: "function".to_string(),
                actual: other.type_name().to_string(),
                operation: "function call".to_string(),
            }),
        }
    }

    fn eval_do(
        &self,
        do_expr: &DoExpr,
        env: &mut Environment,
        sec: &SecurityContext,
        trace: &mut EventTrace,
        depth: usize,
    ) -> RuntimeResult<Value> {
        // Earlier values are discarded; their environment and monitor
        // effects carry forward. An empty body yields 0.
        let mut result = Value::Integer(0);
        for expr in &do_expr.expressions {
            result = self.eval_expr(expr, env, sec, trace, depth)?;
        }
        Ok(result)
    }

    fn eval_transition(
        &self,
        t: &TransitionExpr,
        env: &mut Environment,
        sec: &SecurityContext,
        trace: &mut EventTrace,
        depth: usize,
    ) -> RuntimeResult<Value> {
        let from = match self.eval_expr(&t.from, env, sec, trace, depth)? {
            Value::Integer(n) => n,
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "integer".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "transition source state".to_string(),
                })
            }
        };
        let symbol = match self.eval_expr(&t.symbol, env, sec, trace, depth)? {
            Value::Char(c) => c,
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "char".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "transition symbol".to_string(),
                })
            }
        };
        let to = match self.eval_expr(&t.to, env, sec, trace, depth)? {
            Value::Integer(n) => n,
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "integer".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "transition target state".to_string(),
                })
            }
        };
        Ok(Value::Transition(Transition { from, symbol, to }))
    }

    /// Privileged operation: first the stack-inspection walk, then the
    /// conjunctive automaton admission. Either monitor denying aborts the
    /// whole evaluation; only a fully admitted operation is recorded.
    fn eval_access(
        &self,
        access: &AccessExpr,
        sec: &SecurityContext,
        trace: &mut EventTrace,
    ) -> RuntimeResult<Value> {
        let required = access.mode.required();
        if let Some(missing) = security::deny_reason(required, sec.permissions()) {
            warn!(
                "stack inspection denied {} on '{}': missing {}",
                access.mode, access.resource, missing
            );
            return Err(RuntimeError::PermissionDenied {
                resource: access.resource.clone(),
                missing,
            });
        }
        sec.admit(trace, access.mode.symbol(), &access.resource)?;
        // Reads and writes are symbolic; the operation itself yields 0.
        Ok(Value::Integer(0))
    }

    fn eval_policy(
        &self,
        policy: &PolicyExpr,
        env: &mut Environment,
        sec: &SecurityContext,
        trace: &mut EventTrace,
        depth: usize,
    ) -> RuntimeResult<Value> {
        let start = self.eval_expr(&policy.start, env, sec, trace, depth)?;
        let transitions = self.eval_expr(&policy.transitions, env, sec, trace, depth)?;
        let accepting = self.eval_expr(&policy.accepting, env, sec, trace, depth)?;
        let automaton = Automaton::from_values(&start, &transitions, &accepting)?;
        Ok(Value::Automaton(Rc::new(automaton)))
    }

    fn eval_enforce(
        &self,
        enforce: &EnforceExpr,
        env: &mut Environment,
        sec: &SecurityContext,
        trace: &mut EventTrace,
        depth: usize,
    ) -> RuntimeResult<Value> {
        let policy = self.eval_expr(&enforce.policy, env, sec, trace, depth)?;
        let automaton = match policy {
            Value::Automaton(a) => a,
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "automaton".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "monitor installation".to_string(),
                })
            }
        };
        // The extended context is handed to the body only; evaluation of
        // sibling expressions resumes under the enclosing context.
        let narrowed = sec.with_monitor(automaton);
        self.eval_expr(&enforce.body, env, &narrowed, trace, depth)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
