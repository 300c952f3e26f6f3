//! `match` statements and the pattern language of `case` clauses
//!
//! `match` and `case` are soft keywords, so they arrive as plain names. A
//! statement starting with `match` is only a match statement when a subject
//! followed by `:` NEWLINE INDENT can be read after it; otherwise the parser
//! rewinds and reads an ordinary simple statement (`match = 1`, `match(x)`).

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{Parser, SyntaxError};

impl Parser {
    /// True when the current token is the soft keyword `keyword`
    pub(crate) fn check_soft_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Name(name) if name == keyword)
    }

    /// Try to read a `match` statement; `None` leaves the position untouched
    pub(crate) fn try_parse_match_statement(&mut self) -> Result<Option<Stmt>, SyntaxError> {
        let start = self.position;
        let location = self.current_location();
        self.advance(); // consume 'match'

        let subject = match self.parse_match_subject() {
            Ok(subject)
                if self.check(&TokenKind::Colon) && self.check_ahead(1, &TokenKind::Newline) =>
            {
                subject
            }
            _ => {
                self.position = start;
                return Ok(None);
            }
        };
        self.advance(); // consume ':'
        self.advance(); // consume NEWLINE

        if !self.match_token(&TokenKind::Indent) {
            return Err(SyntaxError::new(
                format!(
                    "expected an indented block after 'match' statement on line {}",
                    location.line
                ),
                self.current_location(),
            ));
        }

        let mut cases = Vec::new();
        while self.check_soft_keyword("case") {
            cases.push(self.parse_case_block()?);
        }
        if cases.is_empty() || !(self.check(&TokenKind::Dedent) || self.is_at_end()) {
            return Err(self.error_here("expected 'case' block"));
        }
        self.match_token(&TokenKind::Dedent);

        Ok(Some(Stmt::Match {
            subject,
            cases,
            location,
        }))
    }

    /// `match a:` or `match a, *b:`
    fn parse_match_subject(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_star_named_expression()?;
        if !self.check(&TokenKind::Comma) {
            if matches!(first, Expr::Starred(_)) {
                return Err(self.invalid_syntax());
            }
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::Colon) {
                break;
            }
            elements.push(self.parse_star_named_expression()?);
        }
        Ok(Expr::Tuple(elements))
    }

    fn parse_case_block(&mut self) -> Result<MatchCase, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'case'

        let pattern = self.parse_case_patterns()?;
        let guard = if self.match_token(&TokenKind::If) {
            Some(self.parse_named_expression()?)
        } else {
            None
        };
        let body = self.parse_block("'case' statement", location)?;

        Ok(MatchCase {
            pattern,
            guard,
            body,
            location,
        })
    }

    /// Top level of a `case`, where `case a, b:` is an open sequence
    fn parse_case_patterns(&mut self) -> Result<Pattern, SyntaxError> {
        let first = self.parse_maybe_star_pattern()?;
        if !self.check(&TokenKind::Comma) {
            if matches!(first, Pattern::Star(_)) {
                return Err(self.invalid_syntax());
            }
            return Ok(first);
        }

        let mut patterns = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::Colon) || self.check(&TokenKind::If) {
                break;
            }
            patterns.push(self.parse_maybe_star_pattern()?);
        }
        Ok(Pattern::Sequence(patterns))
    }

    fn parse_maybe_star_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        if !self.match_token(&TokenKind::Star) {
            return self.parse_pattern();
        }
        let name = self.expect_identifier()?;
        Ok(Pattern::Star(if name == "_" { None } else { Some(name) }))
    }

    /// `or_pattern ['as' name]`
    fn parse_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        self.nested(|parser| {
            let pattern = parser.parse_or_pattern()?;
            if !parser.match_token(&TokenKind::As) {
                return Ok(pattern);
            }

            let location = parser.current_location();
            let name = parser.expect_identifier()?;
            if name == "_" {
                return Err(SyntaxError::new("cannot use '_' as a target", location));
            }
            Ok(Pattern::As {
                pattern: Box::new(pattern),
                name,
            })
        })
    }

    fn parse_or_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        let first = self.parse_closed_pattern()?;
        if !self.check(&TokenKind::Pipe) {
            return Ok(first);
        }

        let mut alternatives = vec![first];
        while self.match_token(&TokenKind::Pipe) {
            alternatives.push(self.parse_closed_pattern()?);
        }
        Ok(Pattern::Or(alternatives))
    }

    fn parse_closed_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        match self.peek_kind() {
            TokenKind::None => {
                self.advance();
                Ok(Pattern::Singleton(Constant::None))
            }
            TokenKind::True => {
                self.advance();
                Ok(Pattern::Singleton(Constant::True))
            }
            TokenKind::False => {
                self.advance();
                Ok(Pattern::Singleton(Constant::False))
            }
            TokenKind::Minus
            | TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Imaginary(_)
            | TokenKind::Str(_) => Ok(Pattern::Value(self.parse_literal_key()?)),
            TokenKind::Name(_) => self.parse_name_pattern(),
            TokenKind::LParen => self.parse_group_pattern(),
            TokenKind::LBracket => {
                self.advance(); // consume '['
                let patterns = self.parse_sequence_items(&TokenKind::RBracket)?;
                self.expect_token(&TokenKind::RBracket, "expected ']'")?;
                Ok(Pattern::Sequence(patterns))
            }
            TokenKind::LBrace => self.parse_mapping_pattern(),
            _ => Err(self.invalid_syntax()),
        }
    }

    /// Number, complex or string literal, as a pattern or a mapping key
    fn parse_literal_key(&mut self) -> Result<Expr, SyntaxError> {
        let location = self.current_location();
        if let TokenKind::Str(_) = self.peek_kind() {
            let value = self.parse_strings()?;
            if matches!(value, Expr::FormattedString(_)) {
                return Err(SyntaxError::new(
                    "patterns may only match literals and attribute lookups",
                    location,
                ));
            }
            return Ok(value);
        }

        let negative = self.match_token(&TokenKind::Minus);
        let number = self.parse_number_literal()?;
        let real = if negative {
            Expr::UnaryOp {
                op: UnaryOperator::USub,
                operand: Box::new(number),
            }
        } else {
            number
        };

        let op = match self.peek_kind() {
            TokenKind::Plus => BinOperator::Add,
            TokenKind::Minus => BinOperator::Sub,
            _ => return Ok(real),
        };
        if !matches!(self.peek_ahead(1).map(|t| &t.kind), Some(TokenKind::Imaginary(_))) {
            return Err(SyntaxError::new(
                "imaginary number required in complex literal",
                location,
            ));
        }
        self.advance(); // consume '+' or '-'
        let imaginary = self.parse_number_literal()?;

        Ok(Expr::BinOp {
            left: Box::new(real),
            op,
            right: Box::new(imaginary),
        })
    }

    fn parse_number_literal(&mut self) -> Result<Expr, SyntaxError> {
        let value = match self.peek_kind() {
            TokenKind::Int(digits) => Constant::Int(digits.clone()),
            TokenKind::Float(value) => Constant::Float(*value),
            TokenKind::Imaginary(value) => Constant::Imaginary(*value),
            _ => return Err(self.invalid_syntax()),
        };
        self.advance();
        Ok(Expr::Constant(value))
    }

    /// Dotted name: a capture, `_`, a value pattern or a class pattern
    fn parse_name_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        let name = self.expect_identifier()?;
        if !self.check(&TokenKind::Dot) && !self.check(&TokenKind::LParen) {
            return Ok(if name == "_" {
                Pattern::Wildcard
            } else {
                Pattern::Capture(name)
            });
        }

        let value = self.parse_dotted_tail(Expr::Name(name))?;
        if self.check(&TokenKind::LParen) {
            return self.parse_class_pattern(value);
        }
        Ok(Pattern::Value(value))
    }

    fn parse_dotted_tail(&mut self, mut value: Expr) -> Result<Expr, SyntaxError> {
        while self.match_token(&TokenKind::Dot) {
            let attr = self.expect_identifier()?;
            value = Expr::Attribute {
                value: Box::new(value),
                attr,
            };
        }
        Ok(value)
    }

    /// `Point(x, y=0)`; the class name has been read
    fn parse_class_pattern(&mut self, cls: Expr) -> Result<Pattern, SyntaxError> {
        self.advance(); // consume '('

        let mut patterns = Vec::new();
        let mut kwd_attrs = Vec::new();
        let mut kwd_patterns = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let is_keyword = matches!(self.peek_kind(), TokenKind::Name(_))
                && self.check_ahead(1, &TokenKind::Equal);
            if is_keyword {
                let attr = self.expect_identifier()?;
                self.advance(); // consume '='
                kwd_attrs.push(attr);
                kwd_patterns.push(self.parse_pattern()?);
            } else {
                let location = self.current_location();
                let pattern = self.parse_pattern()?;
                if !kwd_attrs.is_empty() {
                    return Err(SyntaxError::new(
                        "positional patterns follow keyword patterns",
                        location,
                    ));
                }
                patterns.push(pattern);
            }

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_rparen("in class pattern")?;

        Ok(Pattern::Class {
            cls,
            patterns,
            kwd_attrs,
            kwd_patterns,
        })
    }

    /// `(p)` groups, `()`, `(p,)` and `(a, b)` are sequences
    fn parse_group_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        self.advance(); // consume '('
        if self.match_token(&TokenKind::RParen) {
            return Ok(Pattern::Sequence(Vec::new()));
        }

        let first = self.parse_maybe_star_pattern()?;
        if !self.check(&TokenKind::Comma) {
            if matches!(first, Pattern::Star(_)) {
                return Err(self.invalid_syntax());
            }
            self.expect_rparen("in pattern")?;
            return Ok(first);
        }

        let mut patterns = vec![first];
        self.advance(); // consume ','
        patterns.extend(self.parse_sequence_items(&TokenKind::RParen)?);
        self.expect_rparen("in pattern")?;
        Ok(Pattern::Sequence(patterns))
    }

    /// Comma-separated patterns up to `close`, trailing comma allowed
    fn parse_sequence_items(&mut self, close: &TokenKind) -> Result<Vec<Pattern>, SyntaxError> {
        let mut patterns = Vec::new();
        while !self.check(close) {
            patterns.push(self.parse_maybe_star_pattern()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(patterns)
    }

    /// `{key: pattern, ..., **rest}`
    fn parse_mapping_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        self.advance(); // consume '{'

        let mut keys = Vec::new();
        let mut patterns = Vec::new();
        let mut rest = None;
        while !self.check(&TokenKind::RBrace) {
            if self.match_token(&TokenKind::DoubleStar) {
                let location = self.current_location();
                let name = self.expect_identifier()?;
                if name == "_" {
                    return Err(SyntaxError::new("invalid syntax", location));
                }
                rest = Some(name);
                self.match_token(&TokenKind::Comma);
                break;
            }

            keys.push(self.parse_mapping_key()?);
            self.expect_token(&TokenKind::Colon, "expected ':'")?;
            patterns.push(self.parse_pattern()?);

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_token(&TokenKind::RBrace, "expected '}'")?;

        Ok(Pattern::Mapping {
            keys,
            patterns,
            rest,
        })
    }

    fn parse_mapping_key(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek_kind() {
            TokenKind::None => {
                self.advance();
                Ok(Expr::Constant(Constant::None))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Constant(Constant::True))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Constant(Constant::False))
            }
            TokenKind::Name(_) => {
                let location = self.current_location();
                let name = self.expect_identifier()?;
                if !self.check(&TokenKind::Dot) {
                    return Err(SyntaxError::new(
                        "mapping pattern keys may only match literals and attribute lookups",
                        location,
                    ));
                }
                self.parse_dotted_tail(Expr::Name(name))
            }
            _ => self.parse_literal_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse;

    fn cases(source: &str) -> Vec<MatchCase> {
        match parse(source).unwrap().body.remove(0) {
            Stmt::Match { cases, .. } => cases,
            other => panic!("Expected match statement, got {:?}", other),
        }
    }

    fn pattern(text: &str) -> Pattern {
        let source = format!("match x:\n    case {}:\n        pass\n", text);
        cases(&source).remove(0).pattern
    }

    #[test]
    fn test_match_statement() {
        let source = "match command:\n    case 'go':\n        move()\n    case _ if ready:\n        wait()\n";
        let cases = cases(source);

        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].location.line, 2);
        assert_eq!(cases[0].pattern, Pattern::Value(Expr::string("go")));
        assert_eq!(cases[1].pattern, Pattern::Wildcard);
        assert_eq!(cases[1].guard, Some(Expr::name("ready")));
    }

    #[test]
    fn test_match_as_plain_name() {
        let module = parse("match = 1\nmatch(x)\nmatch.y = 2\ncase = 3\n").unwrap();

        assert_eq!(module.body.len(), 4);
        assert!(matches!(module.body[0], Stmt::Assign { .. }));
        assert!(matches!(module.body[1], Stmt::Expr { .. }));
        assert!(matches!(module.body[2], Stmt::Assign { .. }));
    }

    #[test]
    fn test_tuple_subject() {
        let module = parse("match a, *b:\n    case [x, *rest]:\n        pass\n").unwrap();
        match &module.body[0] {
            Stmt::Match { subject, .. } => assert!(matches!(subject, Expr::Tuple(items) if items.len() == 2)),
            other => panic!("Expected match statement, got {:?}", other),
        }
    }

    #[test]
    fn test_capture_and_sequence_patterns() {
        assert_eq!(pattern("point"), Pattern::Capture("point".to_string()));
        assert_eq!(
            pattern("a, *_"),
            Pattern::Sequence(vec![Pattern::Capture("a".to_string()), Pattern::Star(None)])
        );
        assert_eq!(pattern("()"), Pattern::Sequence(Vec::new()));
        assert_eq!(pattern("(a)"), Pattern::Capture("a".to_string()));
        assert_eq!(
            pattern("[first, *rest]"),
            Pattern::Sequence(vec![
                Pattern::Capture("first".to_string()),
                Pattern::Star(Some("rest".to_string()))
            ])
        );
    }

    #[test]
    fn test_literal_patterns() {
        assert_eq!(pattern("None"), Pattern::Singleton(Constant::None));
        assert!(matches!(
            pattern("-1"),
            Pattern::Value(Expr::UnaryOp { op: UnaryOperator::USub, .. })
        ));
        assert!(matches!(
            pattern("1 + 2j"),
            Pattern::Value(Expr::BinOp { op: BinOperator::Add, .. })
        ));
        assert!(matches!(pattern("Color.RED"), Pattern::Value(Expr::Attribute { .. })));
    }

    #[test]
    fn test_or_as_class_and_mapping_patterns() {
        assert!(matches!(pattern("1 | 2 | 3"), Pattern::Or(ref items) if items.len() == 3));
        assert!(matches!(pattern("[a] as whole"), Pattern::As { ref name, .. } if name == "whole"));

        match pattern("Point(0, y=yy)") {
            Pattern::Class {
                patterns,
                kwd_attrs,
                ..
            } => {
                assert_eq!(patterns.len(), 1);
                assert_eq!(kwd_attrs, vec!["y".to_string()]);
            }
            other => panic!("Expected class pattern, got {:?}", other),
        }

        match pattern("{'k': v, **rest}") {
            Pattern::Mapping { keys, rest, .. } => {
                assert_eq!(keys, vec![Expr::string("k")]);
                assert_eq!(rest, Some("rest".to_string()));
            }
            other => panic!("Expected mapping pattern, got {:?}", other),
        }
    }

    #[test]
    fn test_pattern_errors() {
        let error = |text: &str| {
            let source = format!("match x:\n    case {}:\n        pass\n", text);
            parse(&source).unwrap_err().message
        };

        assert_eq!(error("a as _"), "cannot use '_' as a target");
        assert_eq!(error("f'{a}'"), "patterns may only match literals and attribute lookups");
        assert_eq!(error("Point(x=1, 2)"), "positional patterns follow keyword patterns");
        assert_eq!(
            error("{k: 1}"),
            "mapping pattern keys may only match literals and attribute lookups"
        );
        assert_eq!(error("1 + 2"), "imaginary number required in complex literal");

        let missing = parse("match x:\n    y = 1\n").unwrap_err();
        assert!(missing.message.starts_with("expected 'case' block"));
    }
}
