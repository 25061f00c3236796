//! Call protocol integration tests
//!
//! Exercises invocation through the public embedding API: stack balance
//! across failures, recursion with independent frames, and the script/native
//! transparency of the callable abstraction.

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;
use vela_runtime::{Engine, Func, Instr, Prototype, RuntimeError, SecurityContext, Value};

fn engine() -> Engine {
    Engine::with_security(SecurityContext::allow_all())
}

/// `sum(n) = if n <= 0 { 0 } else { n + sum(n - 1) }`, recursing through
/// `LoadSelf`.
fn sum_prototype() -> Arc<Prototype> {
    Arc::new(Prototype {
        name: "sum".to_string(),
        expected_args: 1,
        stack_size: 1,
        constants: vec![Value::Number(0.0), Value::Number(1.0)],
        local_names: vec!["n".to_string()],
        code: vec![
            Instr::GetLocal(0),
            Instr::Const(0),
            Instr::Le,
            Instr::JumpIfFalse(6),
            Instr::Const(0),
            Instr::Return,
            Instr::GetLocal(0),
            Instr::LoadSelf,
            Instr::GetLocal(0),
            Instr::Const(1),
            Instr::Sub,
            Instr::Call(1),
            Instr::Add,
            Instr::Return,
        ],
        parent: None,
    })
}

/// `apply(f, x) = f(x)`.
fn apply_prototype() -> Arc<Prototype> {
    Arc::new(Prototype {
        name: "apply".to_string(),
        expected_args: 2,
        stack_size: 2,
        constants: Vec::new(),
        local_names: vec!["f".to_string(), "x".to_string()],
        code: vec![
            Instr::GetLocal(0),
            Instr::GetLocal(1),
            Instr::Call(1),
            Instr::Return,
        ],
        parent: None,
    })
}

#[rstest]
#[case(0, 0.0)]
#[case(1, 1.0)]
#[case(10, 55.0)]
fn recursive_sum(#[case] n: u32, #[case] expected: f64) {
    let engine = engine();
    let sum = engine.script_fn("main", sum_prototype());
    let result = engine
        .call(&sum, Value::Nil, &[Value::Number(n as f64)])
        .unwrap();
    // Each recursive call got its own frame; no shared locals leaked.
    assert_eq!(result, Value::Number(expected));
    assert_eq!(engine.context().depth(), 0);
}

#[test]
fn stack_is_balanced_after_success() {
    let engine = engine();
    let sum = engine.script_fn("main", sum_prototype());
    for _ in 0..3 {
        engine
            .call(&sum, Value::Nil, &[Value::Number(5.0)])
            .unwrap();
        assert_eq!(engine.context().depth(), 0);
    }
}

#[test]
fn stack_is_balanced_after_deep_failure() {
    let engine = engine();
    let fail = engine.native_fn("deep_fail", |_| {
        Err(RuntimeError::Type {
            msg: "boom".to_string(),
        })
    });
    // outer(x) -> apply(fail, x): two script frames above the failing native.
    let apply = engine.script_fn("main", apply_prototype());
    let outer_proto = Arc::new(Prototype {
        name: "outer".to_string(),
        expected_args: 2,
        stack_size: 2,
        constants: Vec::new(),
        local_names: vec!["f".to_string(), "g".to_string()],
        code: vec![
            Instr::GetLocal(0),
            Instr::GetLocal(1),
            Instr::Nil,
            Instr::Call(2),
            Instr::Return,
        ],
        parent: None,
    });
    let outer = engine.script_fn("main", outer_proto);

    let fault = engine
        .call(
            &outer,
            Value::Nil,
            &[Value::Func(apply.clone()), Value::Func(fail.clone())],
        )
        .unwrap_err();

    assert!(matches!(fault.error, RuntimeError::Type { .. }));
    // Innermost first, captured before any entry was popped.
    assert_eq!(fault.call_chain, vec!["deep_fail", "apply", "outer"]);
    assert_eq!(engine.context().depth(), 0);

    // The context is reusable after the failure.
    let sum = engine.script_fn("main", sum_prototype());
    assert_eq!(
        engine.call(&sum, Value::Nil, &[Value::Number(3.0)]).unwrap(),
        Value::Number(6.0)
    );
}

#[test]
fn native_and_script_callables_are_interchangeable() {
    let engine = engine();
    let apply = engine.script_fn("main", apply_prototype());

    let native_double = engine.native_fn("double", |args| {
        Ok(Value::Number(args[0].as_number()? * 2.0))
    });
    let script_double = engine.script_fn(
        "main",
        Arc::new(Prototype {
            name: "double".to_string(),
            expected_args: 1,
            stack_size: 1,
            constants: vec![Value::Number(2.0)],
            local_names: vec!["x".to_string()],
            code: vec![
                Instr::GetLocal(0),
                Instr::Const(0),
                Instr::Mul,
                Instr::Return,
            ],
            parent: None,
        }),
    );

    for double in [&native_double, &script_double] {
        let result = engine
            .call(
                &apply,
                Value::Nil,
                &[Value::Func(double.clone()), Value::Number(21.0)],
            )
            .unwrap();
        assert_eq!(result, Value::Number(42.0));
    }
}

#[test]
fn missing_arguments_are_padded_with_nil() {
    let engine = engine();
    // second(a, b) = b
    let second = engine.script_fn(
        "main",
        Arc::new(Prototype {
            name: "second".to_string(),
            expected_args: 2,
            stack_size: 2,
            constants: Vec::new(),
            local_names: vec!["a".to_string(), "b".to_string()],
            code: vec![Instr::GetLocal(1), Instr::Return],
            parent: None,
        }),
    );
    let result = engine
        .call(&second, Value::Nil, &[Value::Number(1.0)])
        .unwrap();
    assert_eq!(result, Value::Nil);
}

#[test]
fn functions_are_first_class_values() {
    let engine = engine();
    let sum = engine.script_fn("main", sum_prototype());
    let boxed = Value::Func(sum.clone());
    match &boxed {
        Value::Func(f) => {
            assert_eq!(f.name(), "sum");
            assert_eq!(*f, sum);
        }
        other => panic!("expected a callable, got {}", other.type_name()),
    }
    assert_eq!(boxed.to_string(), "<fn sum>");
}

#[test]
fn distinct_callables_are_never_equal() {
    let engine = engine();
    let a: Func = engine.native_fn("noop", |_| Ok(Value::Nil));
    let b: Func = engine.native_fn("noop", |_| Ok(Value::Nil));
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
}
