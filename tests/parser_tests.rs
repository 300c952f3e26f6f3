// Parser integration tests

use pysplain::parser::ast::{Expr, Stmt};
use pysplain::parser::{parse, SyntaxError};
use rstest::rstest;

fn parse_error(source: &str) -> SyntaxError {
    parse(source).expect_err("Parsing should fail")
}

#[test]
fn test_statement_lines() {
    let source = "\
import sys

@decorator
def main(argv):
    # comment
    total = 0
    for arg in argv:
        total = total + len(arg)
    return total
";
    let module = parse(source).expect("Parsing failed");

    assert_eq!(module.body.len(), 2);
    assert_eq!(module.body[0].line(), 1);
    assert_eq!(module.body[1].line(), 4);

    let Stmt::FunctionDef {
        name,
        body,
        decorators,
        ..
    } = &module.body[1]
    else {
        panic!("expected a function definition");
    };
    assert_eq!(name, "main");
    assert_eq!(decorators, &vec![Expr::name("decorator")]);

    let lines: Vec<usize> = body.iter().map(Stmt::line).collect();
    assert_eq!(lines, vec![6, 7, 9]);
    assert_eq!(module.statement_count(), 6);
}

#[test]
fn test_elif_nests_in_orelse() {
    let module = parse("if a:\n    pass\nelif b:\n    pass\n").expect("Parsing failed");

    let Stmt::If { orelse, .. } = &module.body[0] else {
        panic!("expected an if statement");
    };
    assert_eq!(orelse.len(), 1);
    assert!(matches!(orelse[0], Stmt::If { .. }));
    assert_eq!(orelse[0].line(), 3);
}

#[test]
fn test_chained_assignment_targets() {
    let module = parse("a = b = c = 0\n").expect("Parsing failed");

    let Stmt::Assign { targets, value, .. } = &module.body[0] else {
        panic!("expected an assignment");
    };
    assert_eq!(
        targets,
        &vec![Expr::name("a"), Expr::name("b"), Expr::name("c")]
    );
    assert_eq!(value, &Expr::int(0));
}

#[test]
fn test_implicit_and_explicit_line_joining() {
    let source = "x = (1 +\n     2)\ny = 3 + \\\n    4\nz = 5\n";
    let module = parse(source).expect("Parsing failed");

    let lines: Vec<usize> = module.body.iter().map(Stmt::line).collect();
    assert_eq!(lines, vec![1, 3, 5]);
}

#[rstest]
#[case("from . import x")]
#[case("from ..pkg.mod import (a as b, c,)")]
#[case("from m import *")]
#[case("import a.b as c, d")]
#[case("global a, b")]
#[case("raise ValueError('x') from err")]
#[case("assert x, 'message'")]
#[case("del a[0], b.c")]
#[case("x: int = 1")]
#[case("x //= 2")]
#[case("first, *rest = items")]
#[case("async def f():\n    async for x in y:\n        await x\n    async with a as b:\n        pass")]
#[case("try:\n    pass\nexcept* ValueError:\n    pass")]
#[case("with (open(a) as f, open(b) as g):\n    pass")]
#[case("class C(Base, metaclass=Meta):\n    x = 1")]
#[case("def f(a, b=1, *args, c, d=2, **kw) -> int:\n    pass")]
#[case("if (n := len(a)) > 10:\n    pass")]
#[case("x = [*a, *b]\ny = {**c}")]
#[case("while True:\n    break\nelse:\n    pass")]
#[case("lambda *args, **kw: 0")]
#[case("x = yield")]
#[case("def f(a, a):\n    pass")]
#[case("f(a=1, a=2)")]
#[case("match = 1\nmatch(x)\ncase = match")]
#[case("match point:\n    case Point(x=0) | [0, _]:\n        pass\n    case {'k': v, **rest} if v:\n        pass")]
#[case("x = f'{a!r:>{w}} {b=}'")]
#[case("x = a[*b]")]
fn test_accepts_valid_python(#[case] source: &str) {
    assert!(parse(source).is_ok(), "failed to parse {:?}", source);
}

#[rstest]
#[case("def f(:", "Syntax error")]
#[case("1 = x", "cannot assign to literal")]
#[case("f() = 1", "cannot assign to function call")]
#[case("a, b += 1", "illegal expression for augmented assignment")]
#[case("def f(a=1, b):\n    pass", "default")]
#[case("f(a=1, b)", "positional argument follows keyword argument")]
#[case("try:\n    pass\n", "expected 'except' or 'finally' block")]
#[case("if x:\npass\n", "expected an indented block")]
#[case("  x = 1", "unexpected indent")]
#[case("if x:\n        a\n    b\n", "unindent does not match any outer indentation level")]
#[case("x = (1, 2", "")]
#[case("x = 'abc", "")]
#[case("*a = b", "starred assignment target must be in a list or tuple")]
fn test_rejects_invalid_python(#[case] source: &str, #[case] fragment: &str) {
    let error = parse_error(source);

    assert!(
        error.to_string().contains(fragment),
        "{:?} gave {:?}",
        source,
        error.to_string()
    );
    assert!(error.location.line >= 1);
}

#[test]
fn test_error_location() {
    let error = parse_error("x = 1\ny = )\n");

    assert_eq!(error.location.line, 2);
    assert!(error.to_string().starts_with("Syntax error at line 2, column"));
}

#[test]
fn test_deep_nesting_is_an_error_not_a_crash() {
    let source = format!("x = {}1{}", "(".repeat(1000), ")".repeat(1000));

    assert!(parse(&source).is_err());
}
