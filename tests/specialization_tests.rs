//! Behavior of the lazy specialization pipeline: registry reuse, error
//! recovery per top-level expression, and the failure modes of misuse
//! (unknown names, wrong arity, unresolvable types).

use hannac::ast::{mangle, TypeTag};
use hannac::frontend::lexer::Lexer;
use hannac::frontend::parser::Parser;
use hannac::jit::Jit;
use hannac::runtime::executor::Executor;
use hannac::runtime::value::Value;

fn run_with_jit(input: &str) -> (Vec<Value>, Jit) {
    let mut parser = Parser::new(Lexer::new(input));
    let program = parser.parse_program().expect("program should parse");

    let mut jit = Jit::new(0).expect("jit setup");
    jit.registry.load_definitions(program.methods);
    let results = Executor::new(program.toplevel)
        .run(&mut jit)
        .expect("execution");
    (results, jit)
}

fn run(input: &str) -> Vec<Value> {
    run_with_jit(input).0
}

#[test]
fn specializations_persist_in_the_registry() {
    let (results, jit) = run_with_jit(
        "method add(a, b) return a + b
         main
         add(1, 2)
         add(1.0, 2.0)",
    );
    assert_eq!(results, vec![Value::Integer(3), Value::Float(3.0)]);

    let int_spec = jit
        .registry
        .spec(&mangle("add", &[TypeTag::Int, TypeTag::Int]))
        .expect("int specialization registered");
    assert_eq!(int_spec.ret, TypeTag::Int);
    assert_eq!(int_spec.decl.params.len(), 2);

    let real_spec = jit
        .registry
        .spec(&mangle("add", &[TypeTag::Real, TypeTag::Real]))
        .expect("real specialization registered");
    assert_eq!(real_spec.ret, TypeTag::Real);
}

#[test]
fn wrapper_specialization_is_disposed_after_each_step() {
    let (_, jit) = run_with_jit("main  1  2");
    assert!(jit.registry.spec("__hanna_execution").is_none());
}

#[test]
fn methods_are_never_emitted_when_never_called() {
    let (_, jit) = run_with_jit("method unused(x) return x  main  1");
    assert!(jit
        .registry
        .spec(&mangle("unused", &[TypeTag::Int]))
        .is_none());
}

#[test]
fn unknown_callee_skips_only_that_step() {
    let results = run(
        "method id(x) return x
         main
         missing(1)
         id(2)",
    );
    assert_eq!(results, vec![Value::Integer(2)]);
}

#[test]
fn unknown_variable_in_method_body_skips_the_step() {
    let results = run(
        "method broken(a) return b
         main
         broken(1)
         2 + 2",
    );
    assert_eq!(results, vec![Value::Integer(4)]);
}

#[test]
fn unknown_variable_in_call_argument_skips_the_step() {
    let results = run(
        "method id(x) return x
         method broken(a) return id(b)
         main
         broken(1)
         id(3)",
    );
    assert_eq!(results, vec![Value::Integer(3)]);
}

#[test]
fn wrong_arity_skips_the_step() {
    let results = run(
        "method add(a, b) return a + b
         main
         add(1, 2)
         add(1, 2, 3)
         add(4, 4)",
    );
    assert_eq!(results, vec![Value::Integer(3), Value::Integer(8)]);
}

#[test]
fn calls_inside_binaries_need_an_existing_specialization() {
    // A call embedded in a binary expression resolves against the registry
    // only; the direct call on the first line is what creates the
    // specialization the second line reuses.
    let results = run(
        "method dbl(x) return x + x
         main
         dbl(2) + 1",
    );
    assert!(results.is_empty());

    let results = run(
        "method dbl(x) return x + x
         main
         dbl(2)
         dbl(2) + 1",
    );
    assert_eq!(results, vec![Value::Integer(4), Value::Integer(5)]);
}

#[test]
fn mixed_operand_types_are_not_coerced() {
    // No implicit widening: an int/real binary is a type error and the
    // step is skipped.
    let results = run("main  1 + 2.0  3 + 3");
    assert_eq!(results, vec![Value::Integer(6)]);
}

#[test]
fn recursive_methods_are_rejected_not_looped() {
    let results = run(
        "method loop(x) return loop(x)
         main
         loop(1)
         7",
    );
    assert_eq!(results, vec![Value::Integer(7)]);
}

#[test]
fn mutually_recursive_methods_are_rejected() {
    let results = run(
        "method ping(x) return pong(x)
         method pong(x) return ping(x)
         main
         ping(1)
         7",
    );
    assert_eq!(results, vec![Value::Integer(7)]);
}

#[test]
fn mixed_type_specializations_coexist() {
    let results = run(
        "method mul(a, b) return a * b
         main
         mul(3, 4)
         mul(0.5, 8.0)
         mul(3, 4)
         mul(0.5, 8.0)",
    );
    assert_eq!(
        results,
        vec![
            Value::Integer(12),
            Value::Float(4.0),
            Value::Integer(12),
            Value::Float(4.0),
        ]
    );
}

#[test]
fn nested_calls_with_literal_arguments_chain() {
    let results = run(
        "method sq(x) return x * x
         method quad() return sq(sq(2))
         main
         quad()",
    );
    assert_eq!(results, vec![Value::Integer(16)]);
}

#[test]
fn nested_call_forwarding_a_parameter_is_rejected() {
    // A nested-call argument is specialized under an empty binding, so a
    // parameter forwarded into it never resolves to a concrete type and
    // the step is skipped.
    let results = run(
        "method sq(x) return x * x
         method quad(x) return sq(sq(x))
         main
         quad(2)
         9",
    );
    assert_eq!(results, vec![Value::Integer(9)]);
}

#[test]
fn each_specialization_gets_its_own_compilation_unit() {
    let (_, jit) = run_with_jit(
        "method dbl(x) return x + x
         method sq(x) return x * x
         main
         dbl(sq(2))",
    );
    // sq_int, dbl_MethodCall, and the sealed wrapper modules in between;
    // the released wrapper itself is not retained.
    assert!(jit.host.permanent_units() >= 2);
    assert!(jit.host.lookup("sq_int").is_ok());
    assert!(jit.host.lookup("dbl_MethodCall").is_ok());
    assert!(jit.host.lookup("__hanna_execution").is_err());
}
