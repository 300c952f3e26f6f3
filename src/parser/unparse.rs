//! Expression unparser
//!
//! Turns an [`Expr`] back into Python source text. Parentheses are inserted
//! only where operator precedence requires them, and literals print the way
//! Python's `repr` prints them, so `0x10` comes back as `16` and `"a"` as
//! `'a'`. An expression printed on its own sits in a "test" context, which is
//! why a bare tuple prints parenthesized.

use crate::parser::ast::*;

/// Binding strength of the context an expression is printed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Precedence(u8);

impl Precedence {
    const NAMED_EXPR: Precedence = Precedence(0);
    const TUPLE: Precedence = Precedence(1);
    const YIELD: Precedence = Precedence(2);
    const TEST: Precedence = Precedence(3);
    const OR: Precedence = Precedence(4);
    const AND: Precedence = Precedence(5);
    const NOT: Precedence = Precedence(6);
    const CMP: Precedence = Precedence(7);
    const EXPR: Precedence = Precedence(8);
    const BOR: Precedence = Precedence::EXPR;
    const BXOR: Precedence = Precedence(9);
    const BAND: Precedence = Precedence(10);
    const SHIFT: Precedence = Precedence(11);
    const ARITH: Precedence = Precedence(12);
    const TERM: Precedence = Precedence(13);
    const FACTOR: Precedence = Precedence(14);
    const POWER: Precedence = Precedence(15);
    const AWAIT: Precedence = Precedence(16);
    const ATOM: Precedence = Precedence(17);

    fn next(self) -> Precedence {
        Precedence(self.0.saturating_add(1))
    }

    fn of_binary(op: BinOperator) -> Precedence {
        match op {
            BinOperator::Add | BinOperator::Sub => Precedence::ARITH,
            BinOperator::Mult
            | BinOperator::MatMult
            | BinOperator::Div
            | BinOperator::FloorDiv
            | BinOperator::Mod => Precedence::TERM,
            BinOperator::LShift | BinOperator::RShift => Precedence::SHIFT,
            BinOperator::BitOr => Precedence::BOR,
            BinOperator::BitXor => Precedence::BXOR,
            BinOperator::BitAnd => Precedence::BAND,
            BinOperator::Pow => Precedence::POWER,
        }
    }
}

/// Render an expression as Python source
pub fn unparse(expr: &Expr) -> String {
    let mut unparser = Unparser::default();
    unparser.expr(expr, Precedence::TEST);
    unparser.out
}

#[derive(Default)]
struct Unparser {
    out: String,
}

impl Unparser {
    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Write `body` wrapped in parentheses when `needed`
    fn parens_if(&mut self, needed: bool, body: impl FnOnce(&mut Self)) {
        if needed {
            self.write("(");
        }
        body(self);
        if needed {
            self.write(")");
        }
    }

    /// Comma-separated items, each in a test context
    fn items(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(item, Precedence::TEST);
        }
    }

    fn expr(&mut self, expr: &Expr, context: Precedence) {
        match expr {
            Expr::Name(id) => self.write(id),
            Expr::Constant(constant) => self.constant(constant),
            Expr::FormattedString(parts) => self.joined_str(parts),

            Expr::BoolOp { op, values } => {
                let own = match op {
                    BoolOperator::Or => Precedence::OR,
                    BoolOperator::And => Precedence::AND,
                };
                self.parens_if(context > own, |u| {
                    let mut level = own;
                    for (i, value) in values.iter().enumerate() {
                        if i > 0 {
                            u.write(" ");
                            u.write(op.keyword());
                            u.write(" ");
                        }
                        // Each later operand binds one level tighter
                        level = level.next();
                        u.expr(value, level);
                    }
                });
            }

            Expr::NamedExpr { target, value } => {
                self.parens_if(context > Precedence::NAMED_EXPR, |u| {
                    u.expr(target, Precedence::ATOM);
                    u.write(" := ");
                    u.expr(value, Precedence::TEST);
                });
            }

            Expr::BinOp { left, op, right } => {
                let own = Precedence::of_binary(*op);
                let (left_context, right_context) = if *op == BinOperator::Pow {
                    (own.next(), own)
                } else {
                    (own, own.next())
                };
                self.parens_if(context > own, |u| {
                    u.expr(left, left_context);
                    u.write(" ");
                    u.write(op.symbol());
                    u.write(" ");
                    u.expr(right, right_context);
                });
            }

            Expr::UnaryOp { op, operand } => {
                let own = match op {
                    UnaryOperator::Not => Precedence::NOT,
                    _ => Precedence::FACTOR,
                };
                self.parens_if(context > own, |u| {
                    u.write(op.symbol());
                    u.expr(operand, own);
                });
            }

            Expr::Lambda { params, body } => {
                self.parens_if(context > Precedence::TEST, |u| {
                    u.write("lambda");
                    if !params.is_empty() {
                        u.write(" ");
                        u.parameters(params);
                    }
                    u.write(": ");
                    u.expr(body, Precedence::TEST);
                });
            }

            Expr::IfExp { test, body, orelse } => {
                self.parens_if(context > Precedence::TEST, |u| {
                    u.expr(body, Precedence::TEST.next());
                    u.write(" if ");
                    u.expr(test, Precedence::TEST.next());
                    u.write(" else ");
                    u.expr(orelse, Precedence::TEST);
                });
            }

            Expr::Dict(entries) => {
                self.write("{");
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    match &entry.key {
                        Some(key) => {
                            self.expr(key, Precedence::TEST);
                            self.write(": ");
                            self.expr(&entry.value, Precedence::TEST);
                        }
                        None => {
                            self.write("**");
                            self.expr(&entry.value, Precedence::EXPR);
                        }
                    }
                }
                self.write("}");
            }

            Expr::Set(elements) => {
                if elements.is_empty() {
                    self.write("{*()}");
                } else {
                    self.write("{");
                    self.items(elements);
                    self.write("}");
                }
            }

            Expr::ListComp { elt, generators } => {
                self.write("[");
                self.expr(elt, Precedence::TEST);
                self.comprehensions(generators);
                self.write("]");
            }
            Expr::SetComp { elt, generators } => {
                self.write("{");
                self.expr(elt, Precedence::TEST);
                self.comprehensions(generators);
                self.write("}");
            }
            Expr::GeneratorExp { elt, generators } => {
                self.write("(");
                self.expr(elt, Precedence::TEST);
                self.comprehensions(generators);
                self.write(")");
            }
            Expr::DictComp {
                key,
                value,
                generators,
            } => {
                self.write("{");
                self.expr(key, Precedence::TEST);
                self.write(": ");
                self.expr(value, Precedence::TEST);
                self.comprehensions(generators);
                self.write("}");
            }

            Expr::Await(value) => {
                self.parens_if(context > Precedence::AWAIT, |u| {
                    u.write("await ");
                    u.expr(value, Precedence::ATOM);
                });
            }
            Expr::Yield(value) => {
                self.parens_if(context > Precedence::YIELD, |u| {
                    u.write("yield");
                    if let Some(value) = value {
                        u.write(" ");
                        u.expr(value, Precedence::TEST);
                    }
                });
            }
            Expr::YieldFrom(value) => {
                self.parens_if(context > Precedence::YIELD, |u| {
                    u.write("yield from ");
                    u.expr(value, Precedence::TEST);
                });
            }

            Expr::Compare {
                left,
                ops,
                comparators,
            } => {
                self.parens_if(context > Precedence::CMP, |u| {
                    u.expr(left, Precedence::CMP.next());
                    for (op, comparator) in ops.iter().zip(comparators) {
                        u.write(" ");
                        u.write(op.symbol());
                        u.write(" ");
                        u.expr(comparator, Precedence::CMP.next());
                    }
                });
            }

            Expr::Call {
                func,
                args,
                keywords,
            } => {
                self.expr(func, Precedence::ATOM);
                self.write("(");
                self.items(args);
                for (i, keyword) in keywords.iter().enumerate() {
                    if i > 0 || !args.is_empty() {
                        self.write(", ");
                    }
                    match &keyword.arg {
                        Some(arg) => {
                            self.write(arg);
                            self.write("=");
                        }
                        None => self.write("**"),
                    }
                    self.expr(&keyword.value, Precedence::TEST);
                }
                self.write(")");
            }

            Expr::Attribute { value, attr } => {
                self.expr(value, Precedence::ATOM);
                // `1 .real`, since `1.real` would lex as a float
                if matches!(**value, Expr::Constant(Constant::Int(_))) {
                    self.write(" ");
                }
                self.write(".");
                self.write(attr);
            }

            Expr::Subscript { value, slice } => {
                self.expr(value, Precedence::ATOM);
                self.write("[");
                match &**slice {
                    Expr::Tuple(elements) if !elements.is_empty() => self.tuple_items(elements),
                    other => self.expr(other, Precedence::TEST),
                }
                self.write("]");
            }

            Expr::Starred(value) => {
                self.write("*");
                self.expr(value, Precedence::EXPR);
            }

            Expr::List(elements) => {
                self.write("[");
                self.items(elements);
                self.write("]");
            }

            Expr::Tuple(elements) => {
                self.parens_if(elements.is_empty() || context > Precedence::TUPLE, |u| {
                    u.tuple_items(elements)
                });
            }

            Expr::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    self.expr(lower, Precedence::TEST);
                }
                self.write(":");
                if let Some(upper) = upper {
                    self.expr(upper, Precedence::TEST);
                }
                if let Some(step) = step {
                    self.write(":");
                    self.expr(step, Precedence::TEST);
                }
            }
        }
    }

    /// Tuple elements; a single element keeps its trailing comma
    fn tuple_items(&mut self, elements: &[Expr]) {
        self.items(elements);
        if elements.len() == 1 {
            self.write(",");
        }
    }

    fn comprehensions(&mut self, generators: &[Comprehension]) {
        for generator in generators {
            self.write(if generator.is_async {
                " async for "
            } else {
                " for "
            });
            self.expr(&generator.target, Precedence::TUPLE);
            self.write(" in ");
            self.expr(&generator.iter, Precedence::TEST.next());
            for condition in &generator.ifs {
                self.write(" if ");
                self.expr(condition, Precedence::TEST.next());
            }
        }
    }

    fn param(&mut self, param: &Param) {
        self.write(&param.name);
        if let Some(annotation) = &param.annotation {
            self.write(": ");
            self.expr(annotation, Precedence::TEST);
        }
    }

    fn parameters(&mut self, params: &Parameters) {
        let mut first = true;
        let mut separator = |u: &mut Self| {
            if !first {
                u.write(", ");
            }
            first = false;
        };

        let positional = params.posonly.iter().chain(&params.args);
        for (index, param) in positional.enumerate() {
            separator(self);
            self.param(param);
            if let Some(default) = &param.default {
                self.write("=");
                self.expr(default, Precedence::TEST);
            }
            if index + 1 == params.posonly.len() {
                self.write(", /");
            }
        }

        if params.vararg.is_some() || !params.kwonly.is_empty() {
            separator(self);
            self.write("*");
            if let Some(vararg) = &params.vararg {
                self.param(vararg);
            }
        }

        for param in &params.kwonly {
            separator(self);
            self.param(param);
            if let Some(default) = &param.default {
                self.write("=");
                self.expr(default, Precedence::TEST);
            }
        }

        if let Some(kwarg) = &params.kwarg {
            separator(self);
            self.write("**");
            self.param(kwarg);
        }
    }

    /// An f-string, with the quote choice `ast.unparse` makes: the first of
    /// `'`, `"`, `"""`, `'''` that no literal part contains
    fn joined_str(&mut self, parts: &[FStringPart]) {
        let pieces: Vec<(String, bool)> = parts
            .iter()
            .map(|part| {
                let mut inner = Unparser::default();
                inner.fstring_part(part, false);
                (inner.out, matches!(part, FStringPart::Literal(_)))
            })
            .collect();

        let mut quotes: Vec<&'static str> = FSTRING_QUOTES.to_vec();
        let mut body = String::new();
        let mut fallback = false;
        for (text, is_literal) in &pieces {
            if *is_literal {
                let (escaped, allowed) = fstring_literal(text, &quotes);
                if allowed.iter().all(|quote| !quotes.contains(quote)) {
                    fallback = true;
                    break;
                }
                quotes = allowed;
                body.push_str(&escaped);
            } else {
                if text.contains('\n') {
                    quotes.retain(|quote| quote.len() == 3);
                }
                body.push_str(text);
            }
        }

        if fallback {
            quotes = vec!["'''"];
            body.clear();
            for (text, is_literal) in &pieces {
                if *is_literal {
                    body.push_str(&repr_body(text, '\''));
                } else {
                    body.push_str(text);
                }
            }
        }

        let quote = quotes.first().copied().unwrap_or("'");
        self.write("f");
        self.write(quote);
        self.write(&body);
        self.write(quote);
    }

    fn fstring_part(&mut self, part: &FStringPart, in_spec: bool) {
        match part {
            FStringPart::Literal(text) => {
                let mut text = text.replace('{', "{{").replace('}', "}}");
                if in_spec {
                    text = text
                        .replace('\\', "\\\\")
                        .replace('\'', "\\'")
                        .replace('"', "\\\"")
                        .replace('\n', "\\n");
                }
                self.write(&text);
            }
            FStringPart::Field(field) => self.formatted_value(field),
        }
    }

    fn formatted_value(&mut self, field: &FormattedValue) {
        let mut inner = Unparser::default();
        inner.expr(&field.value, Precedence::TEST.next());

        self.write("{");
        // `{ {` keeps a set or dict from reading as an escaped brace
        if inner.out.starts_with('{') {
            self.write(" ");
        }
        self.write(&inner.out);
        if let Some(conversion) = field.conversion {
            self.write("!");
            self.out.push(conversion);
        }
        if let Some(spec) = &field.format_spec {
            self.write(":");
            for part in spec {
                self.fstring_part(part, true);
            }
        }
        self.write("}");
    }

    fn constant(&mut self, constant: &Constant) {
        match constant {
            Constant::Int(digits) => self.write(digits),
            Constant::Float(value) => self.write(&float_repr(*value)),
            Constant::Imaginary(value) => {
                let repr = float_repr(*value);
                let repr = repr.strip_suffix(".0").unwrap_or(&repr);
                self.write(repr);
                self.write("j");
            }
            Constant::Str { value, u_prefix } => {
                if *u_prefix {
                    self.write("u");
                }
                self.write(&str_repr(value));
            }
            Constant::Bytes(value) => self.write(&bytes_repr(value)),
            Constant::True => self.write("True"),
            Constant::False => self.write("False"),
            Constant::None => self.write("None"),
            Constant::Ellipsis => self.write("..."),
        }
    }
}

/// Python's `repr()` of a float: shortest round-trip digits, positional for
/// exponents in `-4..16`, scientific otherwise. Infinity prints as `1e309` so
/// that it reads back as a literal.
fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "1e309" } else { "-1e309" }.to_string();
    }

    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let sign = if value.is_sign_negative() { "-" } else { "" };

    if (-4..16).contains(&exponent) {
        let point = exponent + 1;
        let body = if point <= 0 {
            format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
        } else {
            let point = point as usize;
            if digits.len() <= point {
                format!("{}{}.0", digits, "0".repeat(point - digits.len()))
            } else {
                format!("{}.{}", &digits[..point], &digits[point..])
            }
        };
        format!("{}{}", sign, body)
    } else {
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}{}e{}{:02}",
            sign,
            mantissa,
            exponent_sign,
            exponent.unsigned_abs()
        )
    }
}

/// Quotes an f-string may use, in order of preference
const FSTRING_QUOTES: [&str; 4] = ["'", "\"", "\"\"\"", "'''"];

/// Escape one literal part of an f-string and narrow the usable quotes.
/// When no quote fits, the part is spelled as a `repr()` instead.
fn fstring_literal(text: &str, quotes: &[&'static str]) -> (String, Vec<&'static str>) {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\\' {
            escaped.push_str("\\\\");
        } else if !is_printable(ch) {
            push_escape(&mut escaped, ch);
        } else {
            escaped.push(ch);
        }
    }

    let mut allowed: Vec<&'static str> = quotes
        .iter()
        .copied()
        .filter(|quote| !escaped.contains(quote))
        .collect();

    if allowed.is_empty() {
        let repr = str_repr(text);
        let first = repr.chars().next().unwrap_or('\'');
        let quote = quotes.iter().copied().find(|quote| quote.contains(first));
        let inner = repr[1..repr.len() - 1].to_string();
        return (inner, quote.into_iter().collect());
    }

    if let Some(last) = escaped.chars().last() {
        // Stable, so the preference order holds among the rest
        allowed.sort_by_key(|quote| quote.starts_with(last));
        if allowed[0].starts_with(last) {
            escaped.pop();
            escaped.push('\\');
            escaped.push(last);
        }
    }

    (escaped, allowed)
}

/// Python's `repr()` of a str
fn str_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    format!("{}{}{}", quote, repr_body(value, quote), quote)
}

/// Inside of a `repr()` quoted with `quote`
fn repr_body(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => push_escape(&mut out, c),
            c => out.push(c),
        }
    }
    out
}

/// Close to `str.isprintable`: controls and whitespace other than space
fn is_printable(ch: char) -> bool {
    !(ch.is_control() || (ch.is_whitespace() && ch != ' '))
}

/// `unicode_escape` spelling of one character
fn push_escape(out: &mut String, ch: char) {
    match ch {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if (c as u32) < 0x100 => out.push_str(&format!("\\x{:02x}", c as u32)),
        c if (c as u32) < 0x10000 => out.push_str(&format!("\\u{:04x}", c as u32)),
        c => out.push_str(&format!("\\U{:08x}", c as u32)),
    }
}

/// Python's `repr()` of a bytes object
fn bytes_repr(value: &[u8]) -> String {
    let quote = if value.contains(&b'\'') && !value.contains(&b'"') {
        b'"'
    } else {
        b'\''
    };

    let mut out = String::with_capacity(value.len() + 3);
    out.push('b');
    out.push(quote as char);
    for &byte in value {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b == quote => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\x{:02x}", byte)),
        }
    }
    out.push(quote as char);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(2.5e-3), "0.0025");
        assert_eq!(float_repr(1e-5), "1e-05");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(123456.0), "123456.0");
        assert_eq!(float_repr(1.5e300), "1.5e+300");
        assert_eq!(float_repr(f64::INFINITY), "1e309");
    }

    #[test]
    fn test_str_repr() {
        assert_eq!(str_repr("hello"), "'hello'");
        assert_eq!(str_repr("it's"), "\"it's\"");
        assert_eq!(str_repr("a'b\"c"), "'a\\'b\"c'");
        assert_eq!(str_repr("line\n"), "'line\\n'");
        assert_eq!(str_repr("\u{7}"), "'\\x07'");
    }

    #[test]
    fn test_bytes_repr() {
        assert_eq!(bytes_repr(b"abc"), "b'abc'");
        assert_eq!(bytes_repr(&[0, 255]), "b'\\x00\\xff'");
    }

    #[test]
    fn test_bool_op_operands_tighten() {
        let expr = Expr::BoolOp {
            op: BoolOperator::Or,
            values: vec![
                Expr::name("a"),
                Expr::BoolOp {
                    op: BoolOperator::And,
                    values: vec![Expr::name("b"), Expr::name("c")],
                },
            ],
        };

        assert_eq!(unparse(&expr), "a or (b and c)");
    }
}
