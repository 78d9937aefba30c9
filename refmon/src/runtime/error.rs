// Error handling for the refmon runtime

use thiserror::Error;

use crate::ast::Symbol;
use crate::runtime::security::PermissionSet;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Fatal evaluation errors. None of these are caught internally: any
/// violation anywhere in the call chain voids the whole `run`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Variable not found in the environment
    #[error("Undefined symbol: {0}")]
    UndefinedSymbol(Symbol),

    /// Wrong value shape for a primitive, conditional, call target, or
    /// policy decomposition
    #[error("Type error in {operation}: expected {expected}, got {actual}")]
    TypeError {
        expected: String,
        actual: String,
        operation: String,
    },

    /// The stack-inspection walk found a frame that does not grant the
    /// requested capabilities
    #[error("Permission denied: missing {missing} for resource '{resource}'")]
    PermissionDenied {
        resource: String,
        missing: PermissionSet,
    },

    /// At least one active automaton rejected the extended event trace
    #[error("Policy restricted: '{symbol}' on resource '{resource}'")]
    PolicyRestricted { resource: String, symbol: char },

    /// An automaton had no transition for the current (state, symbol)
    #[error("No transition from state {state} on '{symbol}'")]
    TransitionNotFound { state: i64, symbol: char },

    /// Arithmetic primitive left the integer range
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: String },

    /// Recursion-depth guard tripped
    #[error("Stack overflow: recursion deeper than {max_depth}")]
    StackOverflow { max_depth: usize },
}
