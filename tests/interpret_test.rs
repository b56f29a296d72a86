//! Source-to-output tests through the public API.

use loxvm::{compile, InterpretResult, LoxError, RuntimeError, Value, Vm, VmConfig, VmState};
use pretty_assertions::assert_eq;

fn run(source: &str) -> (Result<Value, LoxError>, String) {
    let mut vm = Vm::with_writer(VmConfig::default(), Vec::new());
    let result = vm.interpret(source);
    let out = String::from_utf8(vm.into_writer()).unwrap();
    (result, out)
}

fn printed(source: &str) -> String {
    let (result, out) = run(source);
    if let Err(e) = result {
        panic!("{:?} failed: {}", source, e);
    }
    out
}

fn compile_error(source: &str) -> String {
    match run(source).0 {
        Err(LoxError::Compile(errors)) => errors.to_string(),
        other => panic!("expected compile error for {:?}, got {:?}", source, other),
    }
}

#[test]
fn test_number_formatting() {
    assert_eq!(printed("1"), "1\n");
    assert_eq!(printed("1.5"), "1.5\n");
    assert_eq!(printed("0.1 + 0.2"), "0.3\n");
    assert_eq!(printed("1 / 3"), "0.333333\n");
    assert_eq!(printed("1000000"), "1e+06\n");
    assert_eq!(printed("123456"), "123456\n");
    assert_eq!(printed("0.0001"), "0.0001\n");
    assert_eq!(printed("0.00001"), "1e-05\n");
    assert_eq!(printed("-0"), "-0\n");
    assert_eq!(printed("0 / 0").trim_start_matches('-'), "nan\n");
}

#[test]
fn test_operators() {
    assert_eq!(printed("2 + 3"), "5\n");
    assert_eq!(printed("2 - 3"), "-1\n");
    assert_eq!(printed("2 * 3"), "6\n");
    assert_eq!(printed("3 / 2"), "1.5\n");
    assert_eq!(printed("-2"), "-2\n");
    assert_eq!(printed("--2"), "2\n");
}

#[test]
fn test_precedence() {
    assert_eq!(printed("1 + 2 * 3"), "7\n");
    assert_eq!(printed("(1 + 2) * 3"), "9\n");
    assert_eq!(printed("2 * 3 + 4 * 5"), "26\n");
    assert_eq!(printed("10 - 2 - 3"), "5\n");
    assert_eq!(printed("64 / 4 / 2"), "8\n");
    assert_eq!(printed("-2 * -3"), "6\n");
    assert_eq!(printed("-(2 + 3) * 2"), "-10\n");
    assert_eq!(printed("((((1))))"), "1\n");
}

#[test]
fn test_whitespace_and_comments() {
    assert_eq!(printed("  1 +\n\t2 // trailing comment\n"), "3\n");
    assert_eq!(printed("// leading comment\n4"), "4\n");
}

#[test]
fn test_compile_errors() {
    assert_eq!(compile_error(""), "[line 1] Error at end: Expect expression.");
    assert_eq!(compile_error("1 +"), "[line 1] Error at end: Expect expression.");
    assert_eq!(compile_error("(1"), "[line 1] Error at end: Expect ')' after expression.");
    assert_eq!(compile_error("1 2"), "[line 1] Error at '2': Expect end of expression.");
    assert_eq!(compile_error("1 +\n\n*"), "[line 3] Error at '*': Expect expression.");
    assert_eq!(compile_error("1 + $"), "[line 1] Error: Unexpected character.");
    assert_eq!(compile_error("\"open\nstring"), "[line 2] Error: Unterminated string.");
}

#[test]
fn test_tokens_without_prefix_rule() {
    for source in ["true", "nil", "x", "\"str\"", "!1", "1 == 1", "print 1"] {
        let message = compile_error(source);
        assert!(
            message.contains("Expect expression.") || message.contains("Expect end of expression."),
            "{:?}: {}",
            source,
            message
        );
    }
}

#[test]
fn test_compile_error_prints_nothing() {
    let (result, out) = run("1 + ");
    assert_eq!(InterpretResult::from(&result), InterpretResult::CompileError);
    assert_eq!(out, "");
}

#[test]
fn test_constant_pool_limit() {
    let ok = vec!["2"; 256].join(" * ");
    assert!(compile(&ok).is_ok());

    let too_many = vec!["2"; 257].join(" * ");
    let errors = compile(&too_many).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.first().unwrap().message,
        "Too many constants in one chunk."
    );
}

#[test]
fn test_stack_limit_is_configurable() {
    let source = "1 + (2 + (3 + (4 + 5)))";

    let mut vm = Vm::with_writer(VmConfig::default().with_stack_max(4), Vec::new());
    let err = vm.interpret(source).unwrap_err();
    assert!(matches!(
        err,
        LoxError::Runtime(RuntimeError::StackOverflow { .. })
    ));
    assert_eq!(InterpretResult::from(&err), InterpretResult::RuntimeError);
    assert_eq!(vm.state(), VmState::HaltedRuntimeError);

    let mut vm = Vm::with_writer(VmConfig::default().with_stack_max(5), Vec::new());
    assert_eq!(vm.interpret(source).unwrap(), Value::Number(15.0));
}

#[test]
fn test_vm_is_reusable() {
    let mut vm = Vm::with_writer(VmConfig::default(), Vec::new());
    for n in 1..=3 {
        vm.interpret(&format!("{} * 10", n)).unwrap();
    }
    assert_eq!(String::from_utf8(vm.into_writer()).unwrap(), "10\n20\n30\n");
}

#[test]
fn test_literal_round_trip() {
    let mut vm = Vm::with_writer(VmConfig::default(), Vec::new());
    assert_eq!(vm.interpret("1.2").unwrap(), Value::Number(1.2));
    assert!(vm.stack().is_empty());
    assert_eq!(String::from_utf8(vm.into_writer()).unwrap(), "1.2\n");
}

#[test]
fn test_reference_expressions() {
    let (result, _) = run("1.2 + 3.4 * 2");
    assert_eq!(result.unwrap(), Value::Number(1.2 + 3.4 * 2.0));

    let (result, _) = run("8 / 4 / 2");
    assert_eq!(result.unwrap(), Value::Number(1.0));

    let (result, out) = run("-(1.2 + 3.4)");
    assert_eq!(result.unwrap(), Value::Number(-(1.2 + 3.4)));
    assert_eq!(out, "-4.6\n");

    let (result, out) = run("(1 +");
    assert_eq!(InterpretResult::from(&result), InterpretResult::CompileError);
    assert_eq!(out, "");
}

#[test]
fn test_deep_nesting_reports_instead_of_aborting() {
    for source in [
        format!("{}1", "(".repeat(100_000)),
        format!("{}1", "-".repeat(100_000)),
        format!("{}1", "(-".repeat(50_000)),
    ] {
        let (result, out) = run(&source);
        assert_eq!(InterpretResult::from(&result), InterpretResult::CompileError);
        assert_eq!(InterpretResult::from(&result).exit_code(), 65);
        assert!(compile_error(&source).ends_with("Expression nests too deeply."));
        assert_eq!(out, "");
    }
}
