// End-to-end explanation tests

use pysplain::explain;
use rstest::rstest;

fn texts(source: &str) -> Vec<String> {
    explain(source)
        .iter()
        .map(|e| e.text().to_string())
        .collect()
}

#[test]
fn test_if_else_program() {
    let source = "x = 1\nif x:\n    y = 2\nelse:\n    y = 3\n";

    assert_eq!(
        texts(source),
        vec![
            "(Line 1) Assigns 1 to x.",
            "(Line 2) Checks the condition: 'x'.",
            "(Line 3) Assigns 2 to y.",
            "(Line 5) Executes the else block if the condition is False.",
            "(Line 5) Assigns 3 to y.",
        ]
    );
}

#[test]
fn test_function_with_return() {
    let records = explain("def add(a, b):\n    return a + b\n");

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].text(),
        "(Line 1) Defines a function 'add' with arguments: a, b."
    );
    assert_eq!(
        records[0].paragraph(),
        "The function 'add' is created with parameters: a, b. It groups related code together."
    );
    assert_eq!(records[1].text(), "(Line 2) Returns a + b.");
    assert_eq!(
        records[1].paragraph(),
        "This line ends the function and returns the value 'a + b' to the caller."
    );
}

#[rstest]
#[case("a = b = 1", "(Line 1) Assigns 1 to a, b.")]
#[case("a, b = 1, 2", "(Line 1) Assigns (1, 2) to (a, b).")]
#[case("s = 'hi'", "(Line 1) Assigns 'hi' to s.")]
#[case("n = 0x10", "(Line 1) Assigns 16 to n.")]
#[case("while n > 0:\n    pass", "(Line 1) Runs a while loop with condition: 'n > 0'.")]
#[case("obj.method(1, k=2)", "(Line 1) Executes a function call: 'obj.method(1, k=2)'.")]
#[case("for a, b in pairs:\n    pass", "(Line 1) Loops over 'pairs' using variable '(a, b)'.")]
#[case("def f():\n    pass", "(Line 1) Defines a function 'f' with arguments: .")]
#[case(
    "def f(a, /, b, *args, c, **kw):\n    pass",
    "(Line 1) Defines a function 'f' with arguments: b."
)]
#[case("match = 1", "(Line 1) Assigns 1 to match.")]
#[case("def f(a, a):\n    pass", "(Line 1) Defines a function 'f' with arguments: a, a.")]
#[case("f(a=1, a=2)", "(Line 1) Executes a function call: 'f(a=1, a=2)'.")]
#[case("s = u'a'", "(Line 1) Assigns u'a' to s.")]
#[case("s = 'a' f'b'", "(Line 1) Assigns f'ab' to s.")]
#[case("msg = F'{x}'", "(Line 1) Assigns f'{x}' to msg.")]
#[case("msg = f'{x=}'", "(Line 1) Assigns f'x={x!r}' to msg.")]
#[case("v = a[*b]", "(Line 1) Assigns a[*b,] to v.")]
fn test_single_record(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(texts(source), vec![expected]);
}

#[test]
fn test_bare_return() {
    let records = explain("def f():\n    return\n");

    assert_eq!(records[1].text(), "(Line 2) Returns nothing.");
    assert_eq!(
        records[1].paragraph(),
        "This line ends the function and returns the value 'nothing' to the caller."
    );
}

#[test]
fn test_else_anchored_to_first_statement() {
    let source = "if a:\n    pass\nelse:\n\n    # note\n    y = 3\n";

    assert_eq!(
        texts(source),
        vec![
            "(Line 1) Checks the condition: 'a'.",
            "(Line 6) Executes the else block if the condition is False.",
            "(Line 6) Assigns 3 to y.",
        ]
    );
}

#[test]
fn test_elif_chain() {
    let source = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n";

    assert_eq!(
        texts(source),
        vec![
            "(Line 1) Checks the condition: 'a'.",
            "(Line 2) Assigns 1 to x.",
            "(Line 3) Executes the else block if the condition is False.",
            "(Line 3) Checks the condition: 'b'.",
            "(Line 4) Assigns 2 to x.",
            "(Line 6) Executes the else block if the condition is False.",
            "(Line 6) Assigns 3 to x.",
        ]
    );
}

#[test]
fn test_loop_else_has_no_marker() {
    let source = "for i in range(3):\n    print(i)\nelse:\n    done()\n";

    assert_eq!(
        texts(source),
        vec![
            "(Line 1) Loops over 'range(3)' using variable 'i'.",
            "(Line 2) Executes a function call: 'print(i)'.",
            "(Line 4) Executes a function call: 'done()'.",
        ]
    );
}

#[test]
fn test_unrecognized_statements_are_entered() {
    let source = "\
import os
class C:
    def m(self, x):
        return x
try:
    f()
except E as e:
    g(e)
finally:
    h()
with open(p) as fh:
    x += 1
";

    assert_eq!(
        texts(source),
        vec![
            "(Line 3) Defines a function 'm' with arguments: self, x.",
            "(Line 4) Returns x.",
            "(Line 6) Executes a function call: 'f()'.",
            "(Line 8) Executes a function call: 'g(e)'.",
            "(Line 10) Executes a function call: 'h()'.",
        ]
    );
}

#[test]
fn test_decorated_function_anchors_to_def() {
    let records = explain("@cache\ndef f(x):\n    pass\n");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].line(), Some(2));
}

#[test]
fn test_async_definition_is_silent_but_entered() {
    assert_eq!(
        texts("async def f():\n    x = 1\n"),
        vec!["(Line 2) Assigns 1 to x."]
    );
}

#[test]
fn test_non_call_expressions_are_silent() {
    assert!(explain("x\n1 + 2\n'doc'\n").is_empty());
}

#[test]
fn test_same_line_suite() {
    assert_eq!(
        texts("if x: y = 1; print(y)\n"),
        vec![
            "(Line 1) Checks the condition: 'x'.",
            "(Line 1) Assigns 1 to y.",
            "(Line 1) Executes a function call: 'print(y)'.",
        ]
    );
}

#[rstest]
#[case("")]
#[case("\n\n")]
#[case("# only a comment\n")]
fn test_empty_sources(#[case] source: &str) {
    assert!(explain(source).is_empty());
}

#[rstest]
#[case("def f(:")]
#[case("x = ")]
#[case("if x\n    pass\n")]
#[case("  x = 1\n")]
#[case("s = 'open\n")]
#[case("f(1\n")]
fn test_parse_failure_yields_one_record(#[case] source: &str) {
    let records = explain(source);

    assert_eq!(records.len(), 1);
    assert!(records[0].text().starts_with("Error parsing code: "));
    assert!(records[0].text().contains("Syntax error"));
    assert_eq!(records[0].paragraph(), "");
    assert_eq!(records[0].line(), None);
}

#[test]
fn test_explain_is_idempotent() {
    let source = "x = 1\nwhile x < 10:\n    x = x * 2\nprint(x)\n";

    assert_eq!(explain(source), explain(source));
}

#[test]
fn test_match_case_bodies_are_explained() {
    let source = "match command:\n    case 'go':\n        x = 1\n    case [first, *rest] if rest:\n        print(first)\n    case _:\n        pass\n";

    assert_eq!(
        texts(source),
        vec![
            "(Line 3) Assigns 1 to x.",
            "(Line 5) Executes a function call: 'print(first)'.",
        ]
    );
}

#[test]
fn test_windows_line_endings() {
    let source = "s = 'abc\\\r\ndef'\r\nif s:\r\n    y = 1\r\n";

    assert_eq!(
        texts(source),
        vec![
            "(Line 1) Assigns 'abcdef' to s.",
            "(Line 3) Checks the condition: 's'.",
            "(Line 4) Assigns 1 to y.",
        ]
    );
    assert_eq!(explain("x = 1\r\ny = 2\r\n"), explain("x = 1\ny = 2\n"));
}

#[test]
fn test_long_flat_chains_fail_cleanly() {
    let sources = [
        format!("x = {}\n", vec!["a"; 20_000].join(" + ")),
        format!("x = {}\n", vec!["a"; 20_000].join(".")),
        format!("x = f{}\n", "()".repeat(20_000)),
        format!("x = a{}\n", "[0]".repeat(20_000)),
    ];

    for source in &sources {
        let records = explain(source);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_error());
        assert!(
            records[0].text().contains("too many nested expressions"),
            "{}",
            records[0].text()
        );
    }
}

#[test]
fn test_moderate_chains_are_explained() {
    let source = format!("total = {}\n", vec!["n"; 150].join(" + "));

    let records = explain(&source);
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_error());
}
