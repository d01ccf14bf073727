// Integration tests for the scripting language

use proptest::prelude::*;
use quirinus::console::Console;
use quirinus::error::{Error, ErrorKind};
use quirinus::interpreter::constants::EVALUATOR_STACK_SIZE;
use quirinus::interpreter::{Interpreter, InterpreterConfig};
use quirinus::loader::MemoryLoader;
use quirinus::memory::{Data, Value};
use quirinus::parser::{parse, Parser};
use std::thread;

fn interpreter() -> Interpreter {
    Interpreter::new(InterpreterConfig::new().console(Console::captured()))
}

fn run(source: &str) -> Result<Vec<Option<Value>>, Error> {
    interpreter().run_source("<test>", source)
}

fn last_value(source: &str) -> Value {
    let results = run(source).expect("Execution failed");
    results
        .into_iter()
        .last()
        .flatten()
        .expect("Last statement has no value")
}

/// Runs `source` and returns what it printed.
fn output_of(source: &str) -> Vec<String> {
    let mut interpreter = interpreter();
    interpreter
        .run_source("<test>", source)
        .expect("Execution failed");
    interpreter.console().get_output()
}

/// Runs `f` on a thread with the evaluator's stack size.
fn on_big_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    thread::Builder::new()
        .stack_size(EVALUATOR_STACK_SIZE)
        .spawn(f)
        .expect("Failed to spawn evaluator thread")
        .join()
        .expect("Evaluator thread panicked")
}

#[test]
fn test_number_literal() {
    let value = last_value("1");
    assert!(matches!(value.data, Data::Number(n) if n == 1.0));
}

#[test]
fn test_numeral_literal() {
    let value = last_value("IV");
    assert!(matches!(value.data, Data::Numeral(n) if n == 4.0));
    assert_eq!(value.to_string(), "IV");
}

#[test]
fn test_simple_addition() {
    let value = last_value("1+1");
    assert!(matches!(value.data, Data::Number(n) if n == 2.0));
}

#[test]
fn test_statements_separated_by_semicolon() {
    let results = run("a = [1]; a[0]").expect("Execution failed");
    assert_eq!(results.len(), 2);
    let value = results[1].as_ref().expect("Index has no value");
    assert!(matches!(value.data, Data::Number(n) if n == 1.0));
}

#[test]
fn test_function_call() {
    let value = last_value("opus x(n): redi n+1 \n x(4)");
    assert!(matches!(value.data, Data::Number(n) if n == 5.0));
}

#[test]
fn test_try_except_binds_message() {
    let value = last_value("tempta:\n    1/0\npraeter ZeroDivisionError tam e:\n    e");
    match &value.data {
        Data::Str(message) => assert_eq!(&**message, "Division by zero"),
        other => panic!("Expected a string, got {:?}", other),
    }
}

#[test]
fn test_scope_shadowing() {
    let source = "\
x = 1
opus f():
    x = 2
    inner = x
    redi inner
scribe(f())
scribe(x)
scribe(est_numerus(x))";
    assert_eq!(output_of(source), vec!["2", "1", "Verus"]);

    let err = run("opus f():\n    local = 1\nf()\nlocal").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Naming);
    assert_eq!(err.message, "'local' is not defined");
}

#[test]
fn test_outer_variables_mutable_from_inner_scopes() {
    let source = "\
count = 0
opus bump():
    count += 1
pro i = 0 ad 3:
    bump()
count";
    assert_eq!(last_value(source).to_string(), "3");
}

#[test]
fn test_closure_sees_defining_scope_from_any_caller() {
    let source = "\
opus make():
    secret = \"captured\"
    redi () => secret
reveal = make()
opus first():
    secret = \"first caller\"
    redi reveal()
opus second():
    secret = \"second caller\"
    redi reveal()
scribe(first())
scribe(second())";
    assert_eq!(output_of(source), vec!["captured", "captured"]);
}

#[test]
fn test_recursion_guard() {
    let err = on_big_stack(|| {
        run("opus forever(n) -> forever(n + 1)\nforever(0)").map(|_| ())
            .map_err(|err| (err.kind, err.message))
    })
    .unwrap_err();
    assert_eq!(err.0, ErrorKind::Recursing);
    assert_eq!(err.1, "Maximum recursion depth exceeded");
}

#[test]
fn test_deep_but_bounded_recursion() {
    let printed = on_big_stack(|| {
        output_of(
            "\
opus fact(n):
    si n <= 1:
        redi 1
    redi n * fact(n - 1)
scribe(fact(XX) == 2432902008176640000)
scribe(fact(V))",
        )
    });
    assert_eq!(printed, vec!["Verus", "CXX"]);
}

#[test]
fn test_recursion_error_is_catchable() {
    let printed = on_big_stack(|| {
        output_of(
            "\
opus forever() -> forever()
tempta:
    forever()
praeter RecursionError:
    scribe(\"stopped\")",
        )
    });
    assert_eq!(printed, vec!["stopped"]);
}

#[test]
fn test_fizzbuzz() {
    let source = "\
opus divides(d, n):
    q = n / d
    pro k = 0 ad n + 1:
        si k == q:
            redi Verus
    redi Falsus
pro i = 1 ad 16:
    si divides(15, i):
        scribe(\"FizzBuzz\")
    alioquinsi divides(3, i):
        scribe(\"Fizz\")
    alioquinsi divides(5, i):
        scribe(\"Buzz\")
    alioquin:
        scribe(i)";
    let expected: Vec<String> = (1..16)
        .map(|i| match (i % 3, i % 5) {
            (0, 0) => "FizzBuzz".to_string(),
            (0, _) => "Fizz".to_string(),
            (_, 0) => "Buzz".to_string(),
            _ => i.to_string(),
        })
        .collect();
    assert_eq!(output_of(source), expected);
}

#[test]
fn test_lists_and_dicts_share_storage() {
    let source = "\
grid = [[0, 0], [0, 0]]
row = grid[1]
row[0] = 7
ages = {\"Marcus\": XL}
ages[\"Julia\"] = XXX
ages[\"Marcus\"] += 1
scribe(grid)
scribe(ages)
scribe(longitudo(ages))";
    assert_eq!(
        output_of(source),
        vec!["[[0, 0], [7, 0]]", "{\"Marcus\": XLI, \"Julia\": XXX}", "2"]
    );
}

#[test]
fn test_fstrings() {
    let source = "\
name = \"Quirinus\"
year = MMXXVI
scribe(f\"{name} in {year}: {[year - MM, longitudo(name)]}\")
scribe(f'single {1 + 1} quotes')
scribe(\"plain {braces}\")";
    assert_eq!(
        output_of(source),
        vec!["Quirinus in MMXXVI: [XXVI, 8]", "single 2 quotes", "plain {braces}"]
    );
}

#[test]
fn test_curre_runs_loaded_scripts() {
    let loader = MemoryLoader::new()
        .with_script("util.qr", "opus salve(who) -> f\"Salve, {who}!\"\nscribe(\"loaded\")");
    let mut interpreter = Interpreter::new(
        InterpreterConfig::new()
            .console(Console::captured())
            .loader(loader),
    );
    interpreter
        .run_source("main.qr", "curre(\"util.qr\")\nscribe(salve(\"Roma\"))")
        .expect("Execution failed");
    assert_eq!(
        interpreter.console().get_output(),
        vec!["loaded", "Salve, Roma!"]
    );
}

#[test]
fn test_static_errors_prevent_evaluation() {
    let mut interpreter = interpreter();
    let err = interpreter
        .run_source("<test>", "scribe(\"never\")\nx = (1 + \n")
        .unwrap_err();
    assert!(err.is_static());
    assert!(interpreter.console().get_output().is_empty());
}

#[test]
fn test_dynamic_error_stops_the_script() {
    let mut interpreter = interpreter();
    let err = interpreter
        .run_source("<test>", "scribe(1)\nscribe(missing)\nscribe(3)")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Naming);
    assert_eq!(err.span.start.line, 2);
    assert_eq!(interpreter.console().get_output(), vec!["1"]);
}

#[test]
fn test_unfinished_block_is_interactive() {
    let err = parse("<stdin>", "si Verus:").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExpectedItem);
    assert!(err.interactive);

    let err = parse("<stdin>", "si Verus: )").unwrap_err();
    assert!(!err.interactive);
}

#[test]
fn test_parser_reports_trailing_tokens() {
    let mut parser = Parser::new("1 2", "<test>").expect("Lexing failed");
    let err = parser.parse_program().unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidSyntax);
}

#[test]
fn test_traceback_rendering() {
    let source = "opus inner() -> 1 / 0\nopus outer() -> inner()\nouter()";
    let mut interpreter = interpreter();
    let err = interpreter.run_source("main.qr", source).unwrap_err();
    assert_eq!(
        err.traceback_string(),
        "Traceback (most recent call last):\n\
         \x20 File main.qr, line 3, in <program>\n\
         \x20 File main.qr, line 2, in outer\n\
         \x20 File main.qr, line 1, in inner\n\
         ZeroDivisionError: Division by zero"
    );
}

#[test]
fn test_numerals_too_large_to_spell() {
    assert_eq!(output_of("scribe(M ^ M)\nscribe(-(M ^ M))"), vec!["inf", "-inf"]);
}

#[test]
fn test_self_containing_list_prints() {
    assert_eq!(output_of("a = [1]\nadde(a, a)\nscribe(a)"), vec!["[1, [...]]"]);
}

#[test]
fn test_oversized_string_repetition_is_catchable() {
    let source = "\
tempta:
    \"ab\" * 10 ^ XIX
praeter RuntimeError tam e:
    scribe(e)";
    assert_eq!(output_of(source), vec!["String repetition result is too long"]);
}

#[test]
fn test_f_prefix_may_stand_apart_from_its_string() {
    assert_eq!(output_of("x = III\nscribe(f  \"x = {x}\")"), vec!["x = III"]);
}

#[test]
fn test_short_indent_inside_a_block_is_rejected() {
    let err = parse("<test>", "si a:\n    b\n  c").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Indent);
    assert_eq!(err.message, "Improper indentation");
}

/// Nested `si` blocks, `depth` levels deep, indented with `unit`.
fn nested_blocks(depth: usize, unit: &str) -> String {
    let mut source = String::new();
    for level in 0..depth {
        source.push_str(&unit.repeat(level));
        source.push_str("si Verus:\n");
    }
    source.push_str(&unit.repeat(depth));
    source.push_str("x = 1\n");
    source
}

proptest! {
    #[test]
    fn single_style_indentation_always_parses(depth in 1usize..12, tabs in any::<bool>()) {
        let unit = if tabs { "\t" } else { "    " };
        prop_assert!(parse("<test>", &nested_blocks(depth, unit)).is_ok());
    }

    #[test]
    fn mixed_indentation_is_rejected(depth in 3usize..10, switch_at in 2usize..10, spaces_first in any::<bool>()) {
        let switch_at = switch_at.min(depth - 1);
        let (first, second) = if spaces_first { ("    ", "\t") } else { ("\t", "    ") };

        let mut source = String::new();
        for level in 0..depth {
            let unit = if level < switch_at { first } else { second };
            source.push_str(&unit.repeat(level));
            source.push_str("si Verus:\n");
        }
        source.push_str(&second.repeat(depth));
        source.push_str("x = 1\n");

        let err = parse("<test>", &source).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::Indent);
    }
}
