use hannac::frontend::lexer::Lexer;
use hannac::frontend::parser::Parser;
use hannac::jit::Jit;
use hannac::runtime::executor::Executor;
use hannac::runtime::value::Value;

fn run(input: &str) -> Vec<Value> {
    let mut parser = Parser::new(Lexer::new(input));
    let program = parser.parse_program().expect("program should parse");

    let mut jit = Jit::new(0).expect("jit setup");
    jit.registry.load_definitions(program.methods);
    Executor::new(program.toplevel)
        .run(&mut jit)
        .expect("execution")
}

#[test]
fn integer_method_and_arithmetic() {
    let results = run(
        "method add(a, b) return a + b
         main
         add(2, 3)
         100 + 150 * 67",
    );
    assert_eq!(results, vec![Value::Integer(5), Value::Integer(10150)]);
}

#[test]
fn real_method_specialization() {
    let results = run(
        "method add(a, b) return a + b
         main
         add(1.0, 0.5)
         add(1.1, 0.05)",
    );
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], Value::Float(1.5));
    assert_eq!(results[1], Value::Float(1.1 + 0.05));
}

#[test]
fn one_method_specializes_for_ints_and_reals() {
    let results = run(
        "method add(a, b) return a + b
         main
         add(2, 3)
         add(1.5, 20.0)",
    );
    assert_eq!(results, vec![Value::Integer(5), Value::Float(21.5)]);
}

#[test]
fn operand_order_survives_specialization_reuse() {
    let results = run(
        "method div(a, b) return a / b
         main
         div(10, 5)
         div(5, 10)
         div(5, 10)
         div(10, 5)",
    );
    assert_eq!(
        results,
        vec![
            Value::Integer(2),
            Value::Integer(0),
            Value::Integer(0),
            Value::Integer(2),
        ]
    );
}

#[test]
fn expressions_as_arguments_pick_the_right_specialization() {
    let results = run(
        "method id(x) return x
         main
         id(50 + 50)
         id(50.5 + 67.1)
         id(100 + 12)
         id(1.1 + 1.1)
         id(8 + 8)",
    );
    assert_eq!(
        results,
        vec![
            Value::Integer(100),
            Value::Float(50.5 + 67.1),
            Value::Integer(112),
            Value::Float(1.1 + 1.1),
            Value::Integer(16),
        ]
    );
}

#[test]
fn call_of_call() {
    let results = run(
        "method dbl(x) return x + x
         method sq(x) return x * x
         main
         dbl(sq(2))
         dbl(sq(2)) + sq(-1)",
    );
    assert_eq!(results, vec![Value::Integer(8), Value::Integer(9)]);
}

#[test]
fn bare_literals_evaluate() {
    let results = run("main  5  2.5");
    assert_eq!(results, vec![Value::Integer(5), Value::Float(2.5)]);

    let results = run("main  -3");
    assert_eq!(results, vec![Value::Integer(-3)]);
}

#[test]
fn integer_division_truncates_like_i64() {
    let results = run("main  7 / 2");
    assert_eq!(results, vec![Value::Integer(3)]);

    let results = run("main  -7 / 2");
    assert_eq!(results, vec![Value::Integer(-3)]);
}

#[test]
fn real_arithmetic_follows_ieee_754() {
    let results = run("main  1.5 * 3.0  1.0 / 3.0");
    assert_eq!(results, vec![Value::Float(4.5), Value::Float(1.0 / 3.0)]);
}

#[test]
fn method_calling_method_with_parameter_forwarding() {
    let results = run(
        "method sq(x) return x * x
         method apply(a) return sq(a)
         main
         apply(3)
         apply(1.5)",
    );
    assert_eq!(results, vec![Value::Integer(9), Value::Float(2.25)]);
}

#[test]
fn results_are_deterministic_across_fresh_runs() {
    let source = "method add(a, b) return a + b
         main
         add(2, 3)
         add(0.5, 0.25)
         add(2, 3) * 2";
    let first = run(source);
    let second = run(source);
    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![Value::Integer(5), Value::Float(0.75), Value::Integer(10)]
    );
}

#[test]
fn many_toplevel_expressions_reuse_the_synthetic_wrapper() {
    let results = run("main  1  2  3  4  5  6  7  8");
    let expected: Vec<Value> = (1..=8).map(Value::Integer).collect();
    assert_eq!(results, expected);
}

#[test]
fn zero_parameter_method() {
    let results = run("method five() return 5  main  five()  five() + 1");
    assert_eq!(results, vec![Value::Integer(5), Value::Integer(6)]);
}
