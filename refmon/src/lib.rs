// refmon - reference-monitored expression language runtime
//
// A small interpreted expression language whose privileged operations are
// guarded by two reference monitors working side by side: Java-style stack
// inspection over declared permission sets, and lexically installed
// security automata judging the running event trace.

pub mod ast;
pub mod runtime;

pub use ast::{Expression, Literal, PrimOp, Symbol};
pub use runtime::evaluator::Evaluator;
pub use runtime::{
    AccessMode, Automaton, Permission, PermissionSet, Runtime, RuntimeError, RuntimeResult,
    Transition, Value,
};
