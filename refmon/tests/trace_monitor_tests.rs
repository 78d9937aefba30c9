mod common;

use common::*;
use pretty_assertions::assert_eq;
use refmon::{Runtime, RuntimeError, Value};

fn run(program: refmon::Expression) -> Result<Value, RuntimeError> {
    Runtime::new().run(&program)
}

#[test]
fn read_then_write_permitted_under_no_read_after_write() {
    let program = enforce(no_read_after_write(), seq(vec![read("db"), write("db")]));
    assert_eq!(run(program), Ok(Value::Integer(0)));
}

#[test]
fn write_then_read_denied_under_no_read_after_write() {
    let program = enforce(no_read_after_write(), seq(vec![write("db"), read("db")]));
    assert_eq!(
        run(program),
        Err(RuntimeError::PolicyRestricted {
            resource: "db".to_string(),
            symbol: 'r',
        })
    );
}

#[test]
fn dual_policies_enforce_conjunctively() {
    // Both directions installed via nesting: an all-read trace satisfies
    // both automata.
    let program = enforce(
        no_read_after_write(),
        enforce(no_write_after_read(), seq(vec![read("db"), read("db")])),
    );
    assert_eq!(run(program), Ok(Value::Integer(0)));

    // read then write trips "no write after read" even though the other
    // automaton would have accepted it.
    let program = enforce(
        no_read_after_write(),
        enforce(no_write_after_read(), seq(vec![read("db"), write("db")])),
    );
    assert_eq!(
        run(program),
        Err(RuntimeError::PolicyRestricted {
            resource: "db".to_string(),
            symbol: 'w',
        })
    );
}

#[test]
fn installation_is_invisible_to_siblings() {
    // The write inside the installation moves the installed automaton to
    // its after-write state, but the sibling read evaluated after the
    // installation returns is judged against no monitors at all.
    let program = seq(vec![
        enforce(no_read_after_write(), write("db")),
        read("db"),
    ]);
    assert_eq!(run(program), Ok(Value::Integer(0)));
}

#[test]
fn installed_automaton_judges_the_whole_trace() {
    // The write happened before installation, but acceptance is over the
    // entire event string from program start; the later read is denied.
    let program = seq(vec![
        write("db"),
        enforce(no_read_after_write(), read("db")),
    ]);
    assert_eq!(
        run(program),
        Err(RuntimeError::PolicyRestricted {
            resource: "db".to_string(),
            symbol: 'r',
        })
    );
}

#[test]
fn denied_operation_is_not_recorded() {
    // After a denial nothing was committed: re-running the same program
    // fails identically, and a permitted prefix stays permitted.
    let program = enforce(no_read_after_write(), seq(vec![write("db"), read("db")]));
    let first = run(program.clone());
    let second = run(program);
    assert_eq!(first, second);
}

#[test]
fn policies_can_be_bound_and_reused() {
    // A compiled automaton is an ordinary value: bind it, install it twice.
    let program = let_in(
        "p",
        no_read_after_write(),
        seq(vec![
            enforce(sym("p"), read("a")),
            enforce(sym("p"), write("b")),
        ]),
    );
    assert_eq!(run(program), Ok(Value::Integer(0)));
}

#[test]
fn missing_transition_is_fatal() {
    // The installed automaton is total for 'r' and 'w' only; an open has
    // no transition anywhere.
    let program = enforce(no_read_after_write(), open("db"));
    assert_eq!(
        run(program),
        Err(RuntimeError::TransitionNotFound {
            state: 0,
            symbol: 'o',
        })
    );
}

#[test]
fn malformed_policy_parts_are_type_errors() {
    // Transition list containing a plain integer.
    let program = enforce(
        policy(
            int(0),
            list(vec![transition(int(0), ch('r'), int(0)), int(7)]),
            list(vec![int(0)]),
        ),
        read("db"),
    );
    assert!(matches!(run(program), Err(RuntimeError::TypeError { .. })));

    // Accepting list containing a character.
    let program = enforce(
        policy(
            int(0),
            list(vec![transition(int(0), ch('r'), int(0))]),
            list(vec![ch('x')]),
        ),
        read("db"),
    );
    assert!(matches!(run(program), Err(RuntimeError::TypeError { .. })));

    // Installing something that is not an automaton.
    let program = enforce(int(3), read("db"));
    assert!(matches!(run(program), Err(RuntimeError::TypeError { .. })));
}

#[test]
fn monitors_and_stack_inspection_compose() {
    use refmon::runtime::security::Permission;

    // The closure's declared frame satisfies stack inspection; the
    // installed automaton still vetoes the second operation.
    let body = seq(vec![write("db"), read("db")]);
    let f = lam_granting("x", &[Permission::Read, Permission::Write], body);
    let program = enforce(no_read_after_write(), let_in("f", f, call(sym("f"), int(0))));
    assert_eq!(
        run(program),
        Err(RuntimeError::PolicyRestricted {
            resource: "db".to_string(),
            symbol: 'r',
        })
    );
}
