//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, helper methods, and the module entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, blocks and coordination
//! - `declarations`: Function and class definitions, decorators, parameter lists
//! - `statements`: Simple and compound statements (if, while, for, try, ...)
//! - `expressions`: Expressions, one method per precedence level
//! - `fstrings`: Replacement fields inside f-strings
//! - `patterns`: `match` statements and `case` patterns
//! - `targets`: Checks that assignment and deletion targets are legal
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use thiserror::Error;
use tracing::debug;

/// Deepest expression nesting accepted before giving up
pub const MAX_EXPRESSION_DEPTH: usize = 200;

/// Longest `elif` chain accepted; each branch nests one `If` deeper
pub const MAX_ELIF_CHAIN: usize = 1000;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax error at line {}, column {}: {}", .location.line, .location.column, .message)]
pub struct SyntaxError {
    pub message: String,
    pub location: SourceLocation,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        SyntaxError {
            message: message.into(),
            location,
        }
    }
}

impl From<LexError> for SyntaxError {
    fn from(err: LexError) -> Self {
        SyntaxError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for Python source
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, SyntaxError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        debug!(tokens = tokens.len(), "tokenized source");
        Ok(Self {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    /// Parse the entire module (top-level statements)
    pub fn parse_module(&mut self) -> Result<Module, SyntaxError> {
        let mut module = Module::new();

        while !self.is_at_end() {
            if self.check(&TokenKind::Indent) {
                return Err(SyntaxError::new("unexpected indent", self.current_location()));
            }
            let statements = self.parse_statement()?;
            module.body.extend(statements);
        }

        Ok(module)
    }

    /// Parse the block after a compound statement header, starting at its `:`.
    ///
    /// `construct` names the header for error messages, e.g. `'if' statement`.
    pub(crate) fn parse_block(
        &mut self,
        construct: &str,
        header: SourceLocation,
    ) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect_token(&TokenKind::Colon, "expected ':'")?;

        if !self.match_token(&TokenKind::Newline) {
            // Same-line suite: `if x: y = 1; z = 2`
            return self.parse_simple_statements();
        }

        if !self.match_token(&TokenKind::Indent) {
            return Err(SyntaxError::new(
                format!(
                    "expected an indented block after {} on line {}",
                    construct, header.line
                ),
                self.current_location(),
            ));
        }

        let mut body = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            if self.check(&TokenKind::Indent) {
                return Err(SyntaxError::new("unexpected indent", self.current_location()));
            }
            body.extend(self.parse_statement()?);
        }
        self.match_token(&TokenKind::Dedent);

        Ok(body)
    }

    /// Run `parse` one nesting level deeper, failing once the nesting limit is hit
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_EXPRESSION_DEPTH {
            return Err(SyntaxError::new(
                "too many nested expressions",
                self.current_location(),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Run an operator or postfix chain. Each link added with [`Parser::deepen`]
    /// counts as one nesting level until the chain is finished.
    pub(crate) fn chain<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        let depth = self.depth;
        let result = parse(self);
        self.depth = depth;
        result
    }

    /// Charge one more link of the current chain against the nesting limit
    pub(crate) fn deepen(&mut self) -> Result<(), SyntaxError> {
        if self.depth >= MAX_EXPRESSION_DEPTH {
            return Err(SyntaxError::new(
                "too many nested expressions",
                self.current_location(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    /// True when the token `n` places ahead has the given kind
    pub(crate) fn check_ahead(&self, n: usize, kind: &TokenKind) -> bool {
        self.peek_ahead(n)
            .is_some_and(|token| std::mem::discriminant(&token.kind) == std::mem::discriminant(kind))
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// True at the end of a simple statement
    pub(crate) fn at_statement_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
        )
    }

    pub(crate) fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof, and `advance`
        // never moves past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn expect_token(
        &mut self,
        kind: &TokenKind,
        message: &str,
    ) -> Result<(), SyntaxError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), SyntaxError> {
        self.expect_token(&TokenKind::RParen, &format!("expected ')' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        if let TokenKind::Name(name) = self.peek_kind() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here("expected identifier"))
        }
    }

    /// Error at the current token, naming what was found instead
    pub(crate) fn error_here(&self, message: &str) -> SyntaxError {
        SyntaxError::new(
            format!("{}, found {}", message, self.peek()),
            self.current_location(),
        )
    }

    /// Generic failure at the current token
    pub(crate) fn invalid_syntax(&self) -> SyntaxError {
        SyntaxError::new(
            format!("invalid syntax: unexpected {}", self.peek()),
            self.current_location(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(source: &str) -> Result<Module, SyntaxError> {
        Parser::new(source)?.parse_module()
    }

    #[test]
    fn test_parse_simple_function() {
        let module = parse("def main():\n    return 0\n").unwrap();

        assert_eq!(module.body.len(), 1);
        match &module.body[0] {
            Stmt::FunctionDef {
                name, params, body, ..
            } => {
                assert_eq!(name, "main");
                assert!(params.is_empty());
                assert_eq!(body.len(), 1);
            }
            _ => panic!("Expected function definition"),
        }
    }

    #[test]
    fn test_parse_expression() {
        let module = parse("x = 1 + 2 * 3\n").unwrap();

        // Just check it parses without error
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn test_same_line_suite() {
        let module = parse("if x: y = 1; z = 2\n").unwrap();

        match &module.body[0] {
            Stmt::If { body, .. } => assert_eq!(body.len(), 2),
            _ => panic!("Expected if statement"),
        }
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse("x = 1\n    y = 2\n").unwrap_err();

        assert_eq!(err.message, "unexpected indent");
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_missing_block() {
        let err = parse("if x:\ny = 2\n").unwrap_err();

        assert_eq!(
            err.message,
            "expected an indented block after 'if' statement on line 1"
        );
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_error_display() {
        let err = parse("def f(:").unwrap_err();
        let text = err.to_string();

        assert!(text.starts_with("Syntax error at line 1, column "));
    }

    #[test]
    fn test_lex_error_becomes_syntax_error() {
        let err = parse("x = 'oops\n").unwrap_err();

        assert!(err.message.starts_with("unterminated string literal"));
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("x = {}1\n", "-".repeat(MAX_EXPRESSION_DEPTH + 10));
        let err = parse(&source).unwrap_err();

        assert_eq!(err.message, "too many nested expressions");
    }

    #[rstest]
    #[case::sum(" + ")]
    #[case::product(" * ")]
    #[case::bitwise_or(" | ")]
    #[case::shift(" << ")]
    #[case::attribute(".")]
    fn test_flat_chain_limit(#[case] separator: &str) {
        let source = format!("x = {}\n", vec!["a"; 20_000].join(separator));
        let err = parse(&source).unwrap_err();

        assert_eq!(err.message, "too many nested expressions");
    }

    #[test]
    fn test_call_chain_limit() {
        let source = format!("f{}\n", "()".repeat(20_000));
        let err = parse(&source).unwrap_err();

        assert_eq!(err.message, "too many nested expressions");
    }

    #[test]
    fn test_chain_depth_is_released() {
        // Sibling chains each get the full budget
        let chain = vec!["a"; MAX_EXPRESSION_DEPTH / 2].join(" + ");
        let source = format!("x = [{0}, {0}, {0}]\ny = {0}\n", chain);

        assert!(parse(&source).is_ok());
    }

    #[test]
    fn test_elif_chain_limit() {
        let mut source = String::from("if a:\n    pass\n");
        for _ in 0..=MAX_ELIF_CHAIN {
            source.push_str("elif a:\n    pass\n");
        }
        let err = parse(&source).unwrap_err();

        assert_eq!(err.message, "too many statically nested blocks");
    }
}
