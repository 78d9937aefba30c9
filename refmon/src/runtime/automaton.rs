//! Trace-automaton reference monitor.
//!
//! Privileged operations emit symbols into a running event trace; every
//! automaton in the lexically active list must accept the extended trace
//! before the operation commits.

use std::fmt;
use std::rc::Rc;

use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::security::{PermissionSet, PermissionStack};
use crate::runtime::values::Value;

pub type State = i64;

/// One automaton transition: `(from, symbol, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: State,
    pub symbol: char,
    pub to: State,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} '{}' {})", self.from, self.symbol, self.to)
    }
}

/// A compiled security automaton over the privileged-operation alphabet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automaton {
    pub start: State,
    /// Searched in declaration order; the first match wins.
    pub transitions: Vec<Transition>,
    pub accepting: Vec<State>,
}

impl Automaton {
    /// Folds `trace` left-to-right from the start state, taking the first
    /// matching transition for each symbol. The automaton is assumed total
    /// for symbols it actually sees; a missing transition is fatal.
    pub fn accepts(&self, trace: &[char]) -> RuntimeResult<bool> {
        let mut state = self.start;
        for &symbol in trace {
            state = self
                .transitions
                .iter()
                .find(|t| t.from == state && t.symbol == symbol)
                .map(|t| t.to)
                .ok_or(RuntimeError::TransitionNotFound { state, symbol })?;
        }
        Ok(self.accepting.contains(&state))
    }

    /// Decomposes evaluated policy parts into automaton fields: an integer
    /// start state, a list of transition triples, a list of integer
    /// accepting states. Anything else is a shape error.
    pub fn from_values(
        start: &Value,
        transitions: &Value,
        accepting: &Value,
    ) -> RuntimeResult<Automaton> {
        let start = expect_state(start, "policy start state")?;

        let transitions = match transitions {
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::Transition(t) => Ok(*t),
                    other => Err(RuntimeError::TypeError {
                        expected: "transition".to_string(),
                        actual: other.type_name().to_string(),
                        operation: "policy transition list".to_string(),
                    }),
                })
                .collect::<RuntimeResult<Vec<Transition>>>()?,
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "list of transitions".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "policy construction".to_string(),
                })
            }
        };

        let accepting = match accepting {
            Value::List(items) => items
                .iter()
                .map(|item| expect_state(item, "policy accepting state"))
                .collect::<RuntimeResult<Vec<State>>>()?,
            other => {
                return Err(RuntimeError::TypeError {
                    expected: "list of states".to_string(),
                    actual: other.type_name().to_string(),
                    operation: "policy construction".to_string(),
                })
            }
        };

        Ok(Automaton {
            start,
            transitions,
            accepting,
        })
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<automaton start={} [{}] accepting={{{}}}>",
            self.start,
            self.transitions.iter().map(|t| t.to_string()).join(" "),
            self.accepting.iter().map(|s| s.to_string()).join(", "),
        )
    }
}

fn expect_state(value: &Value, operation: &str) -> RuntimeResult<State> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(RuntimeError::TypeError {
            expected: "integer".to_string(),
            actual: other.type_name().to_string(),
            operation: operation.to_string(),
        }),
    }
}

/// Append-only record of privileged-operation symbols in program order.
/// Fresh per `run` and threaded down the evaluation call chain, never
/// ambient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTrace {
    symbols: Vec<char>,
}

impl EventTrace {
    pub fn new() -> Self {
        EventTrace {
            symbols: Vec::new(),
        }
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    fn extended(&self, symbol: char) -> Vec<char> {
        let mut candidate = Vec::with_capacity(self.symbols.len() + 1);
        candidate.extend_from_slice(&self.symbols);
        candidate.push(symbol);
        candidate
    }

    fn commit(&mut self, symbol: char) {
        self.symbols.push(symbol);
    }
}

/// Monitor state in force for one lexical extent: the permission stack for
/// stack inspection plus the automata active for trace monitoring.
/// Extension builds a fresh context handed to the sub-evaluation only; the
/// enclosing context resumes once that evaluation returns, so there is no
/// global push/pop anywhere.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    permissions: PermissionStack,
    monitors: Vec<Rc<Automaton>>,
}

impl SecurityContext {
    pub fn new() -> Self {
        SecurityContext {
            permissions: PermissionStack::new(),
            monitors: Vec::new(),
        }
    }

    pub fn permissions(&self) -> &PermissionStack {
        &self.permissions
    }

    pub fn monitors(&self) -> &[Rc<Automaton>] {
        &self.monitors
    }

    /// Context for a callee whose closure declares `granted`.
    pub fn with_frame(&self, granted: PermissionSet) -> SecurityContext {
        SecurityContext {
            permissions: self.permissions.pushed(granted),
            monitors: self.monitors.clone(),
        }
    }

    /// Context for the body of a monitor installation.
    pub fn with_monitor(&self, automaton: Rc<Automaton>) -> SecurityContext {
        let mut monitors = Vec::with_capacity(self.monitors.len() + 1);
        monitors.push(automaton);
        monitors.extend(self.monitors.iter().cloned());
        SecurityContext {
            permissions: self.permissions.clone(),
            monitors,
        }
    }

    /// Conjunctive admission: every active automaton must accept the trace
    /// extended with `symbol`. Only on unanimous acceptance is the symbol
    /// committed; on denial the trace is left as it was.
    pub fn admit(&self, trace: &mut EventTrace, symbol: char, resource: &str) -> RuntimeResult<()> {
        let candidate = trace.extended(symbol);
        for automaton in &self.monitors {
            if !automaton.accepts(&candidate)? {
                warn!(
                    "policy restricted '{}' on '{}' (trace {:?})",
                    symbol, resource, candidate
                );
                return Err(RuntimeError::PolicyRestricted {
                    resource: resource.to_string(),
                    symbol,
                });
            }
        }
        trace.commit(symbol);
        debug!("admitted '{}' on '{}'", symbol, resource);
        Ok(())
    }
}
