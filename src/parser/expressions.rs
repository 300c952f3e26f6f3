//! Expression parsing implementation
//!
//! One method per precedence level, lowest binding first:
//!
//! 1. Lambda and conditional (`x if c else y`)
//! 2. `or`
//! 3. `and`
//! 4. `not`
//! 5. Comparisons (`<`, `==`, `in`, `not in`, `is`, `is not`, chained)
//! 6. `|`
//! 7. `^`
//! 8. `&`
//! 9. `<<`, `>>`
//! 10. `+`, `-`
//! 11. `*`, `@`, `/`, `//`, `%`
//! 12. Unary `+x`, `-x`, `~x`
//! 13. `**` (right associative, binds tighter than a unary operator on its left)
//! 14. `await`
//! 15. Primaries: attribute access, calls, subscripts
//! 16. Atoms: names, literals, displays, comprehensions, parenthesized forms
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::fstrings::push_literal;
use crate::parser::lexer::{StringLiteral, TokenKind};
use crate::parser::parse::{Parser, SyntaxError};
use crate::parser::targets::TargetContext;

impl Parser {
    /// Comma-separated expressions that may be starred; a comma makes a tuple
    pub(crate) fn parse_star_expressions(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_star_expression()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if !self.starts_expression() {
                break;
            }
            elements.push(self.parse_star_expression()?);
        }
        Ok(Expr::Tuple(elements))
    }

    /// Right-hand side of an assignment: a yield expression or star expressions
    pub(crate) fn parse_star_expressions_or_yield(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(&TokenKind::Yield) {
            self.parse_yield_expression()
        } else {
            self.parse_star_expressions()
        }
    }

    fn parse_star_expression(&mut self) -> Result<Expr, SyntaxError> {
        if self.match_token(&TokenKind::Star) {
            let value = self.parse_bitwise_or()?;
            return Ok(Expr::Starred(Box::new(value)));
        }
        self.parse_expression()
    }

    /// Like [`Parser::parse_star_expression`] but allowing `:=`
    pub(crate) fn parse_star_named_expression(&mut self) -> Result<Expr, SyntaxError> {
        if self.match_token(&TokenKind::Star) {
            let value = self.parse_bitwise_or()?;
            return Ok(Expr::Starred(Box::new(value)));
        }
        self.parse_named_expression()
    }

    /// Comma-separated plain expressions, as in `except (A, B)` or `except A, B`
    pub(crate) fn parse_expression_list(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_expression()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if !self.starts_expression() {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        Ok(Expr::Tuple(elements))
    }

    /// Target list of a `for` loop or comprehension; stops before `in`
    pub(crate) fn parse_target_list(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_target()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::In) {
                break;
            }
            elements.push(self.parse_target()?);
        }
        Ok(Expr::Tuple(elements))
    }

    pub(crate) fn parse_target(&mut self) -> Result<Expr, SyntaxError> {
        if self.match_token(&TokenKind::Star) {
            let value = self.parse_bitwise_or()?;
            return Ok(Expr::Starred(Box::new(value)));
        }
        self.parse_bitwise_or()
    }

    /// Expression that may be an assignment expression (`name := value`)
    pub(crate) fn parse_named_expression(&mut self) -> Result<Expr, SyntaxError> {
        let location = self.current_location();
        let expr = self.parse_expression()?;

        if self.match_token(&TokenKind::ColonEqual) {
            self.validate_named_target(&expr, location)?;
            let value = self.parse_expression()?;
            return Ok(Expr::NamedExpr {
                target: Box::new(expr),
                value: Box::new(value),
            });
        }

        Ok(expr)
    }

    /// Parse expression (entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(|parser| parser.parse_conditional())
    }

    /// Lambda or `body if test else orelse`
    fn parse_conditional(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(&TokenKind::Lambda) {
            return self.parse_lambda();
        }

        let body = self.parse_disjunction()?;

        if self.match_token(&TokenKind::If) {
            let test = self.parse_disjunction()?;
            self.expect_token(&TokenKind::Else, "expected 'else' after 'if' expression")?;
            let orelse = self.parse_expression()?;
            return Ok(Expr::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            });
        }

        Ok(body)
    }

    fn parse_lambda(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume 'lambda'

        let params = self.parse_parameters(&TokenKind::Colon, false)?;
        self.expect_token(&TokenKind::Colon, "expected ':'")?;
        let body = self.parse_expression()?;

        Ok(Expr::Lambda {
            params: Box::new(params),
            body: Box::new(body),
        })
    }

    /// Parse `yield`, `yield from x` or `yield a, b`
    pub(crate) fn parse_yield_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume 'yield'

        if self.match_token(&TokenKind::From) {
            let value = self.parse_expression()?;
            return Ok(Expr::YieldFrom(Box::new(value)));
        }

        if !self.starts_expression() {
            return Ok(Expr::Yield(None));
        }

        let value = self.parse_star_expressions()?;
        Ok(Expr::Yield(Some(Box::new(value))))
    }

    /// Parse `or` chains
    fn parse_disjunction(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_conjunction()?;
        if !self.check(&TokenKind::Or) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.match_token(&TokenKind::Or) {
            values.push(self.parse_conjunction()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOperator::Or,
            values,
        })
    }

    /// Parse `and` chains
    fn parse_conjunction(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_inversion()?;
        if !self.check(&TokenKind::And) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.match_token(&TokenKind::And) {
            values.push(self.parse_inversion()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOperator::And,
            values,
        })
    }

    fn parse_inversion(&mut self) -> Result<Expr, SyntaxError> {
        if self.match_token(&TokenKind::Not) {
            let operand = self.nested(|parser| parser.parse_inversion())?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    /// Parse comparison chains like `a < b <= c`
    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_bitwise_or()?;

        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.match_comparison_operator() {
            ops.push(op);
            comparators.push(self.parse_bitwise_or()?);
        }

        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            ops,
            comparators,
        })
    }

    fn match_comparison_operator(&mut self) -> Option<CmpOperator> {
        let op = match self.peek_kind() {
            TokenKind::Less => CmpOperator::Lt,
            TokenKind::Greater => CmpOperator::Gt,
            TokenKind::LessEqual => CmpOperator::LtE,
            TokenKind::GreaterEqual => CmpOperator::GtE,
            TokenKind::EqEqual => CmpOperator::Eq,
            TokenKind::NotEqual => CmpOperator::NotEq,
            TokenKind::In => CmpOperator::In,
            TokenKind::Is => {
                self.advance();
                if self.match_token(&TokenKind::Not) {
                    return Some(CmpOperator::IsNot);
                }
                return Some(CmpOperator::Is);
            }
            TokenKind::Not if self.check_ahead(1, &TokenKind::In) => {
                self.advance();
                self.advance();
                return Some(CmpOperator::NotIn);
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Parse bitwise OR
    pub(crate) fn parse_bitwise_or(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.parse_bitwise_xor()?;

            while parser.match_token(&TokenKind::Pipe) {
                parser.deepen()?;
                let right = parser.parse_bitwise_xor()?;
                left = binary(left, BinOperator::BitOr, right);
            }

            Ok(left)
        })
    }

    /// Parse bitwise XOR
    fn parse_bitwise_xor(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.parse_bitwise_and()?;

            while parser.match_token(&TokenKind::Caret) {
                parser.deepen()?;
                let right = parser.parse_bitwise_and()?;
                left = binary(left, BinOperator::BitXor, right);
            }

            Ok(left)
        })
    }

    /// Parse bitwise AND
    fn parse_bitwise_and(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.parse_shift()?;

            while parser.match_token(&TokenKind::Amp) {
                parser.deepen()?;
                let right = parser.parse_shift()?;
                left = binary(left, BinOperator::BitAnd, right);
            }

            Ok(left)
        })
    }

    /// Parse bit shift
    fn parse_shift(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.parse_sum()?;

            loop {
                let op = match parser.peek_kind() {
                    TokenKind::LeftShift => BinOperator::LShift,
                    TokenKind::RightShift => BinOperator::RShift,
                    _ => break,
                };
                parser.advance();
                parser.deepen()?;
                let right = parser.parse_sum()?;
                left = binary(left, op, right);
            }

            Ok(left)
        })
    }

    /// Parse addition and subtraction
    fn parse_sum(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.parse_term()?;

            loop {
                let op = match parser.peek_kind() {
                    TokenKind::Plus => BinOperator::Add,
                    TokenKind::Minus => BinOperator::Sub,
                    _ => break,
                };
                parser.advance();
                parser.deepen()?;
                let right = parser.parse_term()?;
                left = binary(left, op, right);
            }

            Ok(left)
        })
    }

    /// Parse multiplication, matrix multiplication, division and modulo
    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut left = parser.parse_factor()?;

            loop {
                let op = match parser.peek_kind() {
                    TokenKind::Star => BinOperator::Mult,
                    TokenKind::At => BinOperator::MatMult,
                    TokenKind::Slash => BinOperator::Div,
                    TokenKind::DoubleSlash => BinOperator::FloorDiv,
                    TokenKind::Percent => BinOperator::Mod,
                    _ => break,
                };
                parser.advance();
                parser.deepen()?;
                let right = parser.parse_factor()?;
                left = binary(left, op, right);
            }

            Ok(left)
        })
    }

    /// Parse unary `+`, `-` and `~`
    fn parse_factor(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek_kind() {
            TokenKind::Plus => UnaryOperator::UAdd,
            TokenKind::Minus => UnaryOperator::USub,
            TokenKind::Tilde => UnaryOperator::Invert,
            _ => return self.parse_power(),
        };
        self.advance();

        let operand = self.nested(|parser| parser.parse_factor())?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    /// Parse `**`; the exponent may itself carry a unary operator
    fn parse_power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.parse_await()?;

        if self.match_token(&TokenKind::DoubleStar) {
            let exponent = self.nested(|parser| parser.parse_factor())?;
            return Ok(binary(base, BinOperator::Pow, exponent));
        }

        Ok(base)
    }

    fn parse_await(&mut self) -> Result<Expr, SyntaxError> {
        if self.match_token(&TokenKind::Await) {
            let value = self.parse_primary()?;
            return Ok(Expr::Await(Box::new(value)));
        }
        self.parse_primary()
    }

    /// Parse an atom followed by any number of `.name`, `(...)` and `[...]`
    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        self.chain(|parser| {
            let mut expr = parser.parse_atom()?;

            loop {
                match parser.peek_kind() {
                    TokenKind::Dot => {
                        parser.advance();
                        parser.deepen()?;
                        let attr = parser.expect_identifier()?;
                        expr = Expr::Attribute {
                            value: Box::new(expr),
                            attr,
                        };
                    }
                    TokenKind::LParen => {
                        parser.advance();
                        parser.deepen()?;
                        let (args, keywords) = parser.parse_call_arguments()?;
                        parser.expect_rparen("after call arguments")?;
                        expr = Expr::Call {
                            func: Box::new(expr),
                            args,
                            keywords,
                        };
                    }
                    TokenKind::LBracket => {
                        parser.advance();
                        parser.deepen()?;
                        let slice = parser.parse_slices()?;
                        parser.expect_token(
                            &TokenKind::RBracket,
                            "expected ']' after subscript",
                        )?;
                        expr = Expr::Subscript {
                            value: Box::new(expr),
                            slice: Box::new(slice),
                        };
                    }
                    _ => break,
                }
            }

            Ok(expr)
        })
    }

    /// Parse call arguments up to (not including) the closing `)`.
    /// Also used for the base list of a class definition.
    pub(crate) fn parse_call_arguments(
        &mut self,
    ) -> Result<(Vec<Expr>, Vec<Keyword>), SyntaxError> {
        let mut args = Vec::new();
        let mut keywords: Vec<Keyword> = Vec::new();
        let mut seen_keyword_unpacking = false;

        while !self.check(&TokenKind::RParen) {
            let location = self.current_location();

            if self.match_token(&TokenKind::DoubleStar) {
                let value = self.parse_expression()?;
                keywords.push(Keyword { arg: None, value });
                seen_keyword_unpacking = true;
            } else if self.match_token(&TokenKind::Star) {
                if seen_keyword_unpacking {
                    return Err(SyntaxError::new(
                        "iterable argument unpacking follows keyword argument unpacking",
                        location,
                    ));
                }
                let value = self.parse_expression()?;
                args.push(Expr::Starred(Box::new(value)));
            } else if matches!(self.peek_kind(), TokenKind::Name(_))
                && self.check_ahead(1, &TokenKind::Equal)
            {
                let name = self.expect_identifier()?;
                self.advance(); // consume '='
                let value = self.parse_expression()?;
                keywords.push(Keyword {
                    arg: Some(name),
                    value,
                });
            } else {
                if seen_keyword_unpacking {
                    return Err(SyntaxError::new(
                        "positional argument follows keyword argument unpacking",
                        location,
                    ));
                }
                if !keywords.is_empty() {
                    return Err(SyntaxError::new(
                        "positional argument follows keyword argument",
                        location,
                    ));
                }

                let value = self.parse_named_expression()?;
                if self.starts_comprehension() {
                    let generators = self.parse_comprehension_clauses()?;
                    let genexp = Expr::GeneratorExp {
                        elt: Box::new(value),
                        generators,
                    };
                    if !args.is_empty() || !self.check(&TokenKind::RParen) {
                        return Err(SyntaxError::new(
                            "Generator expression must be parenthesized",
                            location,
                        ));
                    }
                    args.push(genexp);
                    break;
                }
                args.push(value);
            }

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok((args, keywords))
    }

    /// Contents of `[...]` after a primary: one slice or a tuple of them
    fn parse_slices(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_slice()?;
        if !self.check(&TokenKind::Comma) {
            // `a[*b]` subscripts with a one-element tuple
            if matches!(first, Expr::Starred(_)) {
                return Ok(Expr::Tuple(vec![first]));
            }
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_slice()?);
        }
        Ok(Expr::Tuple(elements))
    }

    fn parse_slice(&mut self) -> Result<Expr, SyntaxError> {
        let lower = if self.check(&TokenKind::Colon) {
            None
        } else {
            let expr = self.parse_star_named_expression()?;
            if !self.check(&TokenKind::Colon) {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };

        self.advance(); // consume ':'
        let upper = self.parse_slice_bound()?;
        let step = if self.match_token(&TokenKind::Colon) {
            self.parse_slice_bound()?
        } else {
            None
        };

        Ok(Expr::Slice { lower, upper, step })
    }

    fn parse_slice_bound(&mut self) -> Result<Option<Box<Expr>>, SyntaxError> {
        if matches!(
            self.peek_kind(),
            TokenKind::Colon | TokenKind::Comma | TokenKind::RBracket
        ) {
            return Ok(None);
        }
        Ok(Some(Box::new(self.parse_expression()?)))
    }

    fn starts_comprehension(&self) -> bool {
        self.check(&TokenKind::For)
            || (self.check(&TokenKind::Async) && self.check_ahead(1, &TokenKind::For))
    }

    /// Parse one or more `[async] for target in iter [if cond]...` clauses
    fn parse_comprehension_clauses(&mut self) -> Result<Vec<Comprehension>, SyntaxError> {
        let mut generators = Vec::new();

        while self.starts_comprehension() {
            let is_async = self.match_token(&TokenKind::Async);
            let location = self.current_location();
            self.advance(); // consume 'for'

            let target = self.parse_target_list()?;
            self.validate_target(&target, TargetContext::Comprehension, location)?;
            self.expect_token(&TokenKind::In, "expected 'in'")?;
            let iter = self.parse_disjunction()?;

            let mut ifs = Vec::new();
            while self.match_token(&TokenKind::If) {
                ifs.push(self.parse_disjunction()?);
            }

            generators.push(Comprehension {
                target,
                iter,
                ifs,
                is_async,
            });
        }

        Ok(generators)
    }

    /// Parse atoms: names, literals, and bracketed forms
    fn parse_atom(&mut self) -> Result<Expr, SyntaxError> {
        let expr = match self.peek_kind() {
            TokenKind::Name(name) => Expr::Name(name.clone()),
            TokenKind::Int(digits) => Expr::Constant(Constant::Int(digits.clone())),
            TokenKind::Float(value) => Expr::Constant(Constant::Float(*value)),
            TokenKind::Imaginary(value) => Expr::Constant(Constant::Imaginary(*value)),
            TokenKind::True => Expr::Constant(Constant::True),
            TokenKind::False => Expr::Constant(Constant::False),
            TokenKind::None => Expr::Constant(Constant::None),
            TokenKind::Ellipsis => Expr::Constant(Constant::Ellipsis),
            TokenKind::Str(_) => return self.parse_strings(),
            TokenKind::LParen => return self.parse_parenthesized(),
            TokenKind::LBracket => return self.parse_list_display(),
            TokenKind::LBrace => return self.parse_brace_display(),
            _ => return Err(self.invalid_syntax()),
        };
        self.advance();
        Ok(expr)
    }

    /// Adjacent string literals concatenate into one constant, or into one
    /// f-string when any piece is formatted
    pub(crate) fn parse_strings(&mut self) -> Result<Expr, SyntaxError> {
        let location = self.current_location();
        let mut pieces = Vec::new();
        while let TokenKind::Str(literal) = self.peek_kind() {
            pieces.push((literal.clone(), self.current_location()));
            self.advance();
        }

        let bytes = pieces
            .iter()
            .filter(|(p, _)| matches!(p, StringLiteral::Bytes { .. }))
            .count();
        if bytes > 0 && bytes < pieces.len() {
            return Err(SyntaxError::new(
                "cannot mix bytes and nonbytes literals",
                location,
            ));
        }

        if pieces
            .iter()
            .any(|(p, _)| matches!(p, StringLiteral::Formatted { .. }))
        {
            let mut parts = Vec::new();
            for (piece, piece_location) in &pieces {
                match piece {
                    StringLiteral::Text { value, .. } => push_literal(&mut parts, value),
                    StringLiteral::Formatted { content, raw } => {
                        for part in self.parse_fstring(content, *raw, *piece_location)? {
                            match part {
                                FStringPart::Literal(text) => push_literal(&mut parts, &text),
                                field => parts.push(field),
                            }
                        }
                    }
                    StringLiteral::Bytes { .. } => {}
                }
            }
            return Ok(Expr::FormattedString(parts));
        }

        if bytes > 0 {
            let mut value = Vec::new();
            for (piece, _) in pieces {
                if let StringLiteral::Bytes { value: part, .. } = piece {
                    value.extend(part);
                }
            }
            return Ok(Expr::Constant(Constant::Bytes(value)));
        }

        // Only the first piece decides whether the `u` prefix is kept
        let u_prefix = matches!(
            pieces.first(),
            Some((StringLiteral::Text { source, .. }, _))
                if source.starts_with('u') || source.starts_with('U')
        );
        let mut value = String::new();
        for (piece, _) in pieces {
            if let StringLiteral::Text { value: part, .. } = piece {
                value.push_str(&part);
            }
        }
        Ok(Expr::Constant(Constant::Str { value, u_prefix }))
    }

    /// `()`, `(x)`, `(x,)`, `(a, *b)`, `(x for x in y)`, `(yield x)`
    fn parse_parenthesized(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume '('

        if self.match_token(&TokenKind::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }

        if self.check(&TokenKind::Yield) {
            let value = self.parse_yield_expression()?;
            self.expect_rparen("after yield expression")?;
            return Ok(value);
        }

        let location = self.current_location();
        let first = self.parse_star_named_expression()?;

        if self.starts_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            self.expect_rparen("after generator expression")?;
            return Ok(Expr::GeneratorExp {
                elt: Box::new(first),
                generators,
            });
        }

        if !self.check(&TokenKind::Comma) {
            self.expect_rparen("after expression")?;
            if matches!(first, Expr::Starred(_)) {
                return Err(SyntaxError::new(
                    "cannot use starred expression here",
                    location,
                ));
            }
            return Ok(first);
        }

        let elements = self.parse_display_elements(first, &TokenKind::RParen)?;
        self.expect_rparen("after tuple elements")?;
        Ok(Expr::Tuple(elements))
    }

    fn parse_list_display(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume '['

        if self.match_token(&TokenKind::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }

        let first = self.parse_star_named_expression()?;

        if self.starts_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            self.expect_token(&TokenKind::RBracket, "expected ']' after list comprehension")?;
            return Ok(Expr::ListComp {
                elt: Box::new(first),
                generators,
            });
        }

        let elements = self.parse_display_elements(first, &TokenKind::RBracket)?;
        self.expect_token(&TokenKind::RBracket, "expected ']' after list elements")?;
        Ok(Expr::List(elements))
    }

    /// Dict and set displays and their comprehensions
    fn parse_brace_display(&mut self) -> Result<Expr, SyntaxError> {
        self.advance(); // consume '{'

        if self.match_token(&TokenKind::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }

        let first_entry = if self.match_token(&TokenKind::DoubleStar) {
            DictEntry {
                key: None,
                value: self.parse_bitwise_or()?,
            }
        } else {
            let first = self.parse_star_named_expression()?;
            if !self.match_token(&TokenKind::Colon) {
                return self.parse_set_display(first);
            }
            let value = self.parse_expression()?;

            if self.starts_comprehension() {
                let generators = self.parse_comprehension_clauses()?;
                self.expect_token(&TokenKind::RBrace, "expected '}' after dict comprehension")?;
                return Ok(Expr::DictComp {
                    key: Box::new(first),
                    value: Box::new(value),
                    generators,
                });
            }
            DictEntry {
                key: Some(first),
                value,
            }
        };

        let mut entries = vec![first_entry];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RBrace) {
                break;
            }
            if self.match_token(&TokenKind::DoubleStar) {
                let value = self.parse_bitwise_or()?;
                entries.push(DictEntry { key: None, value });
            } else {
                let key = self.parse_expression()?;
                self.expect_token(&TokenKind::Colon, "expected ':' after dict key")?;
                let value = self.parse_expression()?;
                entries.push(DictEntry {
                    key: Some(key),
                    value,
                });
            }
        }

        self.expect_token(&TokenKind::RBrace, "expected '}' after dict entries")?;
        Ok(Expr::Dict(entries))
    }

    fn parse_set_display(&mut self, first: Expr) -> Result<Expr, SyntaxError> {
        if self.starts_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            self.expect_token(&TokenKind::RBrace, "expected '}' after set comprehension")?;
            return Ok(Expr::SetComp {
                elt: Box::new(first),
                generators,
            });
        }

        let elements = self.parse_display_elements(first, &TokenKind::RBrace)?;
        self.expect_token(&TokenKind::RBrace, "expected '}' after set elements")?;
        Ok(Expr::Set(elements))
    }

    /// Remaining comma-separated elements of a display, up to `closing`
    fn parse_display_elements(
        &mut self,
        first: Expr,
        closing: &TokenKind,
    ) -> Result<Vec<Expr>, SyntaxError> {
        let mut elements = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(closing) {
                break;
            }
            elements.push(self.parse_star_named_expression()?);
        }
        Ok(elements)
    }

    /// True if the current token can begin an expression
    pub(crate) fn starts_expression(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Name(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Imaginary(_)
                | TokenKind::Str(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
                | TokenKind::Ellipsis
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Tilde
                | TokenKind::Not
                | TokenKind::Lambda
                | TokenKind::Await
                | TokenKind::Star
        )
    }
}

fn binary(left: Expr, op: BinOperator, right: Expr) -> Expr {
    Expr::BinOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn expr(source: &str) -> Expr {
        match parse(source).unwrap().body.remove(0) {
            Stmt::Expr { value, .. } => value,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            expr("1 + 2 * 3"),
            binary(Expr::int(1), BinOperator::Add, binary(Expr::int(2), BinOperator::Mult, Expr::int(3)))
        );
    }

    #[test]
    fn test_power_binds_tighter_than_unary() {
        match expr("-2 ** 2") {
            Expr::UnaryOp {
                op: UnaryOperator::USub,
                operand,
            } => assert!(matches!(*operand, Expr::BinOp { op: BinOperator::Pow, .. })),
            other => panic!("Expected unary minus, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_chain() {
        match expr("a < b is not c not in d") {
            Expr::Compare { ops, comparators, .. } => {
                assert_eq!(ops, vec![CmpOperator::Lt, CmpOperator::IsNot, CmpOperator::NotIn]);
                assert_eq!(comparators.len(), 3);
            }
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_call_arguments() {
        match expr("f(a, *b, c=1, **d)") {
            Expr::Call { args, keywords, .. } => {
                assert_eq!(args.len(), 2);
                assert!(matches!(args[1], Expr::Starred(_)));
                assert_eq!(keywords.len(), 2);
                assert_eq!(keywords[0].arg.as_deref(), Some("c"));
                assert_eq!(keywords[1].arg, None);
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_keywords_parse() {
        match expr("f(a=1, a=2)") {
            Expr::Call { keywords, .. } => assert_eq!(keywords.len(), 2),
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_call_argument_errors() {
        let err = parse("f(a=1, b)\n").unwrap_err();
        assert_eq!(err.message, "positional argument follows keyword argument");

        let err = parse("f(x for x in y, 1)\n").unwrap_err();
        assert_eq!(err.message, "Generator expression must be parenthesized");
    }

    #[test]
    fn test_generator_argument() {
        match expr("sum(x * x for x in range(10) if x)") {
            Expr::Call { args, .. } => match &args[0] {
                Expr::GeneratorExp { generators, .. } => assert_eq!(generators[0].ifs.len(), 1),
                other => panic!("Expected generator expression, got {:?}", other),
            },
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_displays() {
        assert!(matches!(expr("()"), Expr::Tuple(ref v) if v.is_empty()));
        assert!(matches!(expr("(1,)"), Expr::Tuple(ref v) if v.len() == 1));
        assert_eq!(expr("(1)"), Expr::int(1));
        assert!(matches!(expr("[1, 2,]"), Expr::List(ref v) if v.len() == 2));
        assert!(matches!(expr("{}"), Expr::Dict(ref v) if v.is_empty()));
        assert!(matches!(expr("{1, 2}"), Expr::Set(_)));
        assert!(matches!(expr("{'a': 1, **b}"), Expr::Dict(ref v) if v.len() == 2));
        assert!(matches!(expr("{k: v for k, v in x}"), Expr::DictComp { .. }));
        assert!(matches!(expr("{x for x in y}"), Expr::SetComp { .. }));
        assert!(matches!(expr("[x for x in y for z in x]"), Expr::ListComp { ref generators, .. } if generators.len() == 2));
    }

    #[test]
    fn test_subscripts_and_slices() {
        match expr("a[1:2, ::3]") {
            Expr::Subscript { slice, .. } => match *slice {
                Expr::Tuple(ref parts) => {
                    assert_eq!(parts.len(), 2);
                    assert!(matches!(
                        parts[1],
                        Expr::Slice { lower: None, upper: None, step: Some(_) }
                    ));
                }
                ref other => panic!("Expected tuple of slices, got {:?}", other),
            },
            other => panic!("Expected subscript, got {:?}", other),
        }

        match expr("a[*b]") {
            Expr::Subscript { slice, .. } => {
                assert_eq!(*slice, Expr::Tuple(vec![Expr::Starred(Box::new(Expr::name("b")))]))
            }
            other => panic!("Expected subscript, got {:?}", other),
        }
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(expr("'a' \"b\""), Expr::string("ab"));
        assert_eq!(
            expr("u'a' 'b'"),
            Expr::Constant(Constant::Str {
                value: "ab".to_string(),
                u_prefix: true
            })
        );
        assert_eq!(expr("'a' u'b'"), Expr::string("ab"));

        match expr("'a' f'b{c}' 'd' f'e'") {
            Expr::FormattedString(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], FStringPart::Literal("ab".to_string()));
                assert_eq!(parts[2], FStringPart::Literal("de".to_string()));
            }
            other => panic!("Expected f-string, got {:?}", other),
        }
        assert_eq!(expr("'' f''"), Expr::FormattedString(Vec::new()));

        let err = parse("b'a' 'b'\n").unwrap_err();
        assert_eq!(err.message, "cannot mix bytes and nonbytes literals");
    }

    #[test]
    fn test_lambda_and_conditional() {
        assert!(matches!(expr("lambda x, y=1: x + y"), Expr::Lambda { .. }));
        assert!(matches!(expr("a if b else c"), Expr::IfExp { .. }));
        assert!(matches!(expr("(y := 5)"), Expr::NamedExpr { .. }));
    }
}
