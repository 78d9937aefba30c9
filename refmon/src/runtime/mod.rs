// Runtime system: the evaluator, the value system, and the two reference
// monitors (stack inspection and trace automata).

pub mod automaton;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod security;
pub mod values;

pub use automaton::{Automaton, EventTrace, SecurityContext, State, Transition};
pub use environment::Environment;
pub use error::{RuntimeError, RuntimeResult};
pub use evaluator::Evaluator;
pub use security::{AccessMode, Permission, PermissionSet, PermissionStack};
pub use values::{Function, Value};

use crate::ast::Expression;

/// Entry point over fresh state: one pre-built program tree in, the final
/// value or the first fatal error out. Re-running the same program always
/// yields the same result; nothing persists between calls.
pub struct Runtime {
    evaluator: Evaluator,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            evaluator: Evaluator::new(),
        }
    }

    pub fn run(&self, program: &Expression) -> Result<Value, RuntimeError> {
        self.evaluator.evaluate(program)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
