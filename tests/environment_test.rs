use pardal::environment::{Environment, BASE_SCOPE_LEVEL};
use pardal::value::{error::RuntimeErrorKind, Value};

fn number(environment: &Environment, name: &str) -> Option<f64> {
    environment.lookup(name).ok()?.as_number()
}

#[test]
fn test_define_rejects_duplicates_in_same_scope() {
    let mut environment = Environment::new();
    environment
        .define("x", Value::Number(1.0))
        .expect("First definition");
    assert!(matches!(
        environment.define("x", Value::Number(2.0)),
        Err(RuntimeErrorKind::AlreadyDefined(_))
    ));
    assert_eq!(number(&environment, "x"), Some(1.0));
}

#[test]
fn test_shadowing_is_pruned_on_leave() {
    let mut environment = Environment::new();
    environment
        .define("x", Value::Number(1.0))
        .expect("First definition");
    environment.enter_scope();
    assert_eq!(environment.scope_level(), BASE_SCOPE_LEVEL + 1);
    environment
        .define("x", Value::Number(2.0))
        .expect("Shadows the outer binding");
    environment
        .define("y", Value::Number(3.0))
        .expect("Fresh name");
    assert_eq!(number(&environment, "x"), Some(2.0));

    environment.leave_scope();
    assert_eq!(environment.scope_level(), BASE_SCOPE_LEVEL);
    assert_eq!(number(&environment, "x"), Some(1.0));
    assert!(matches!(
        environment.lookup("y"),
        Err(RuntimeErrorKind::UnknownName(_))
    ));
}

#[test]
fn test_assign_requires_a_binding() {
    let mut environment = Environment::new();
    assert!(matches!(
        environment.assign("x", Value::Null),
        Err(RuntimeErrorKind::NotDefined(_))
    ));
    environment
        .define("x", Value::Number(1.0))
        .expect("First definition");
    environment.enter_scope();
    environment
        .assign("x", Value::Number(5.0))
        .expect("Outer binding is visible");
    environment.leave_scope();
    assert_eq!(number(&environment, "x"), Some(5.0));
}

#[test]
fn test_child_shares_parent_bindings() {
    let mut parent = Environment::new();
    parent
        .define("n", Value::Number(0.0))
        .expect("First definition");

    let mut child = parent.child();
    assert!(!child.ptr_eq(&parent));
    child
        .assign("n", Value::Number(7.0))
        .expect("Parent binding is visible");
    child
        .define("n", Value::Number(1.0))
        .expect("Child has its own scope");
    assert_eq!(number(&child, "n"), Some(1.0));
    assert_eq!(number(&parent, "n"), Some(7.0));
    assert!(parent.clone().ptr_eq(&parent));
}

#[test]
fn test_locals_only_show_current_level() {
    let mut environment = Environment::new();
    environment
        .define("a", Value::Number(1.0))
        .expect("First definition");
    environment.enter_scope();
    environment
        .define("b", Value::Number(2.0))
        .expect("First definition");
    let names: Vec<String> = environment
        .locals_at_current_level()
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    assert_eq!(names, ["b"]);
}

#[test]
fn test_builtins_live_below_the_base_level() {
    let environment = Environment::with_builtins();
    assert_eq!(environment.scope_level(), BASE_SCOPE_LEVEL);
    assert!(environment.locals_at_current_level().is_empty());
    for library in ["math", "console", "sleep"] {
        assert!(environment.lookup(library).is_ok(), "Missing {library}");
    }

    // Scripts may shadow a library name in their own scope.
    let mut environment = environment;
    environment
        .define("math", Value::Null)
        .expect("Base level is separate from the built-in level");
}

#[test]
fn test_loop_frames() {
    let mut environment = Environment::new();
    assert_eq!(
        environment.mark_break(),
        Err(RuntimeErrorKind::NoLoopContext)
    );
    assert_eq!(
        environment.mark_continue(),
        Err(RuntimeErrorKind::NoLoopContext)
    );

    environment.push_loop();
    environment.push_loop();
    environment.mark_break().expect("Inside a loop");
    assert!(environment.peek_loop().expect("Inside a loop").broken);
    let inner = environment.pop_loop().expect("Inside a loop");
    assert!(inner.broken && !inner.continued);

    let outer = environment.peek_loop().expect("Inside a loop");
    assert!(!outer.broken);
    environment.pop_loop().expect("Inside a loop");
    assert!(!environment.has_loop());
}

#[test]
fn test_function_frames() {
    let mut environment = Environment::new();
    assert_eq!(
        environment.push_returns(vec![Value::Null]),
        Err(RuntimeErrorKind::NoFunctionContext)
    );
    assert!(!environment.has_returned());

    environment.push_function();
    assert!(!environment.has_returned());
    environment
        .push_returns(vec![Value::Number(1.0), Value::Number(2.0)])
        .expect("Inside a call");
    assert!(environment.has_returned());

    let frame = environment.pop_function().expect("Inside a call");
    assert_eq!(frame.returns.len(), 2);
    assert!(!environment.has_returned());
    assert_eq!(
        environment.pop_function().map(|frame| frame.returns.len()),
        Err(RuntimeErrorKind::NoFunctionContext)
    );
}
