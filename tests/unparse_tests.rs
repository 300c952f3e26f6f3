// Expression unparsing through the full parser

use pysplain::parser::{ast::Stmt, parse, unparse};
use rstest::rstest;

/// Unparse the value of a single expression or assignment statement
fn unparse_source(source: &str) -> String {
    let module = parse(source).expect("Parsing failed");
    match &module.body[0] {
        Stmt::Expr { value, .. } | Stmt::Assign { value, .. } => unparse(value),
        other => panic!("unexpected statement: {:?}", other),
    }
}

#[rstest]
#[case("(a + b) * c", "(a + b) * c")]
#[case("a + b * c", "a + b * c")]
#[case("a - (b - c)", "a - (b - c)")]
#[case("(a - b) - c", "a - b - c")]
#[case("2 ** 3 ** 2", "2 ** 3 ** 2")]
#[case("(2 ** 3) ** 2", "(2 ** 3) ** 2")]
#[case("-x ** 2", "-x ** 2")]
#[case("(-x) ** 2", "(-x) ** 2")]
#[case("not (a and b)", "not (a and b)")]
#[case("(a if b else c) + 1", "(a if b else c) + 1")]
#[case("a  if  b  else  c", "a if b else c")]
#[case("a is not b", "a is not b")]
#[case("a not in b", "a not in b")]
#[case("x.y(z)", "x.y(z)")]
fn test_precedence_parentheses(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(unparse_source(source), expected);
}

#[rstest]
#[case("a, b", "(a, b)")]
#[case("(a,)", "(a,)")]
#[case("()", "()")]
#[case("x = 1, 2", "(1, 2)")]
#[case("a[1, 2]", "a[1, 2]")]
#[case("a[1:2]", "a[1:2]")]
#[case("a[::2]", "a[::2]")]
fn test_tuples_and_subscripts(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(unparse_source(source), expected);
}

#[rstest]
#[case(r#""hi""#, "'hi'")]
#[case(r#"'it\'s'"#, r#""it's""#)]
#[case(r#"'a' "b""#, "'ab'")]
#[case(r#"b"raw""#, "b'raw'")]
#[case("0x10", "16")]
#[case("0b101", "5")]
#[case("1_000", "1000")]
#[case("1e3", "1000.0")]
#[case("1.5", "1.5")]
#[case("None", "None")]
#[case("...", "...")]
fn test_literals(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(unparse_source(source), expected);
}

#[rstest]
#[case("f(k=1, *b)", "f(*b, k=1)")]
#[case("f(a, *b, k=1, **kw)", "f(a, *b, k=1, **kw)")]
#[case("f()", "f()")]
#[case("[x * 2 for x in xs if x]", "[x * 2 for x in xs if x]")]
#[case("{k: v for k, v in items}", "{k: v for k, v in items}")]
#[case("{'a': 1, **d}", "{'a': 1, **d}")]
#[case("{1, 2}", "{1, 2}")]
#[case("lambda a, b=1: a", "lambda a, b=1: a")]
#[case("lambda: 0", "lambda: 0")]
fn test_calls_and_displays(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(unparse_source(source), expected);
}

#[rstest]
#[case("f'{name}!'", "f'{name}!'")]
#[case("F'{x}'", "f'{x}'")]
#[case("'a' f'b'", "f'ab'")]
#[case("f'{x!r:>10}'", "f'{x!r:>10}'")]
#[case("f'{x:{width}}'", "f'{x:{width}}'")]
#[case("f'{x=}'", "f'x={x!r}'")]
#[case(r#"f"it's {x}""#, r#"f"it's {x}""#)]
#[case("f'{a if b else c}'", "f'{(a if b else c)}'")]
#[case("f'{ {1: 2}[1] }'", "f'{ {1: 2}[1]}'")]
#[case("f'{{braces}}'", "f'{{braces}}'")]
#[case(r"f'tab\t{x}'", r"f'tab\t{x}'")]
#[case("f''", "f''")]
fn test_formatted_strings(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(unparse_source(source), expected);
}

#[rstest]
#[case("u'a'", "u'a'")]
#[case("u'a' 'b'", "u'ab'")]
#[case("a[*b]", "a[*b,]")]
#[case("a[*b, c]", "a[*b, c]")]
fn test_prefix_and_starred_subscript(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(unparse_source(source), expected);
}
