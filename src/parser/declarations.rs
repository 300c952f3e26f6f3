//! Declaration parsing implementation
//!
//! This module handles parsing of definitions in Python programs:
//!
//! - Function definitions: `def name(params) -> ret: ...`
//! - Class definitions: `class Name(bases, metaclass=M): ...`
//! - Decorators: `@expr` lines preceding either
//! - Parameter lists, shared with `lambda`
//!
//! # Grammar
//!
//! ```text
//! decorated  ::= ("@" named_expr NEWLINE)+ (funcdef | classdef | "async" funcdef)
//! funcdef    ::= "def" identifier "(" [parameters] ")" ["->" expression] ":" block
//! classdef   ::= "class" identifier ["(" [arguments] ")"] ":" block
//! parameters ::= param ("," param)* with optional "/", "*" [param], "**" param
//! param      ::= identifier [":" expression] ["=" expression]
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{Parser, SyntaxError};

impl Parser {
    /// Parse decorators and the definition they apply to
    pub(crate) fn parse_decorated(&mut self) -> Result<Stmt, SyntaxError> {
        let mut decorators = Vec::new();

        while self.match_token(&TokenKind::At) {
            decorators.push(self.parse_named_expression()?);
            self.expect_token(&TokenKind::Newline, "expected newline after decorator")?;
        }

        match self.peek_kind() {
            TokenKind::Def => {
                let location = self.current_location();
                self.parse_function_definition(location, decorators, false)
            }
            TokenKind::Class => self.parse_class_definition(decorators),
            TokenKind::Async => self.parse_async_statement(decorators),
            _ => Err(self.error_here("expected function or class definition after decorator")),
        }
    }

    /// Parse function definition starting at `def`. `location` is the `async`
    /// token for coroutines.
    pub(crate) fn parse_function_definition(
        &mut self,
        location: SourceLocation,
        decorators: Vec<Expr>,
        is_async: bool,
    ) -> Result<Stmt, SyntaxError> {
        let header = self.current_location();
        self.advance(); // consume 'def'

        let name = self.expect_identifier()?;
        self.expect_token(&TokenKind::LParen, "expected '('")?;
        let params = self.parse_parameters(&TokenKind::RParen, true)?;
        self.expect_rparen("after parameters")?;

        let returns = if self.match_token(&TokenKind::Arrow) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let body = self.parse_block("function definition", header)?;

        Ok(Stmt::FunctionDef {
            name,
            params,
            body,
            decorators,
            returns,
            is_async,
            location,
        })
    }

    /// Parse class definition starting at `class`
    pub(crate) fn parse_class_definition(
        &mut self,
        decorators: Vec<Expr>,
    ) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'class'

        let name = self.expect_identifier()?;

        let (bases, keywords) = if self.match_token(&TokenKind::LParen) {
            let arguments = self.parse_call_arguments()?;
            self.expect_rparen("after class bases")?;
            arguments
        } else {
            (Vec::new(), Vec::new())
        };

        let body = self.parse_block("class definition", location)?;

        Ok(Stmt::ClassDef {
            name,
            bases,
            keywords,
            body,
            decorators,
            location,
        })
    }

    /// Parse a parameter list up to (not including) `closing`.
    ///
    /// Lambdas pass `allow_annotations = false`, since their `:` ends the list.
    pub(crate) fn parse_parameters(
        &mut self,
        closing: &TokenKind,
        allow_annotations: bool,
    ) -> Result<Parameters, SyntaxError> {
        let mut params = Parameters::default();
        let mut seen_slash = false;
        let mut seen_star = false;
        let mut bare_star = None;
        let mut seen_default = false;

        while !self.check(closing) {
            let location = self.current_location();

            if params.kwarg.is_some() {
                return Err(SyntaxError::new(
                    "arguments cannot follow var-keyword argument",
                    location,
                ));
            }

            if self.match_token(&TokenKind::Slash) {
                if seen_slash {
                    return Err(SyntaxError::new("/ may appear only once", location));
                }
                if seen_star {
                    return Err(SyntaxError::new("/ must be ahead of *", location));
                }
                if params.args.is_empty() {
                    return Err(SyntaxError::new(
                        "at least one argument must precede /",
                        location,
                    ));
                }
                params.posonly = std::mem::take(&mut params.args);
                seen_slash = true;
            } else if self.match_token(&TokenKind::DoubleStar) {
                let param = self.parse_param(allow_annotations)?;
                if param.default.is_some() {
                    return Err(SyntaxError::new(
                        "var-keyword argument cannot have default value",
                        location,
                    ));
                }
                params.kwarg = Some(param);
            } else if self.match_token(&TokenKind::Star) {
                if seen_star {
                    return Err(SyntaxError::new("* argument may appear only once", location));
                }
                seen_star = true;

                if self.check(&TokenKind::Comma) || self.check(closing) {
                    bare_star = Some(location);
                } else {
                    let param = self.parse_param(allow_annotations)?;
                    if param.default.is_some() {
                        return Err(SyntaxError::new(
                            "var-positional argument cannot have default value",
                            location,
                        ));
                    }
                    params.vararg = Some(param);
                }
            } else {
                let param = self.parse_param(allow_annotations)?;

                if seen_star {
                    params.kwonly.push(param);
                } else {
                    if param.default.is_some() {
                        seen_default = true;
                    } else if seen_default {
                        return Err(SyntaxError::new(
                            "parameter without a default follows parameter with a default",
                            location,
                        ));
                    }
                    params.args.push(param);
                }
            }

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        if let Some(location) = bare_star {
            if params.kwonly.is_empty() {
                return Err(SyntaxError::new("named arguments must follow bare *", location));
            }
        }

        Ok(params)
    }

    fn parse_param(&mut self, allow_annotations: bool) -> Result<Param, SyntaxError> {
        let name = self.expect_identifier()?;

        let annotation = if allow_annotations && self.match_token(&TokenKind::Colon) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let default = if self.match_token(&TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(Param {
            name,
            annotation,
            default,
        })
    }
}
