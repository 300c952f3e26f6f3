//! Statement parsing implementation
//!
//! This module handles parsing of all Python statement types:
//!
//! - Simple statements: expression statements, assignments (plain, augmented,
//!   annotated), `pass`, `break`, `continue`, `return`, `raise`, `del`,
//!   `assert`, `global`, `nonlocal`, `import`, `from ... import`
//! - Compound statements: `if`/`elif`/`else`, `while`, `for`, `try`, `with`,
//!   plus the `async` variants
//!
//! # Grammar
//!
//! ```text
//! statement    ::= compound_stmt | simple_stmts
//! simple_stmts ::= simple_stmt (';' simple_stmt)* [';'] NEWLINE
//! compound_stmt ::= if_stmt | while_stmt | for_stmt | try_stmt | with_stmt
//!                 | funcdef | classdef | decorated | async_stmt
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{Parser, SyntaxError, MAX_ELIF_CHAIN};
use crate::parser::targets::TargetContext;

impl Parser {
    /// Parse one logical statement. A line of `;`-separated simple statements
    /// yields several.
    pub(crate) fn parse_statement(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let loc = self.current_location();

        let stmt = match self.peek_kind() {
            TokenKind::If => self.parse_if_statement()?,
            TokenKind::While => self.parse_while_statement()?,
            TokenKind::For => self.parse_for_statement(loc, false)?,
            TokenKind::Try => self.parse_try_statement()?,
            TokenKind::With => self.parse_with_statement(loc, false)?,
            TokenKind::Def => self.parse_function_definition(loc, Vec::new(), false)?,
            TokenKind::Class => self.parse_class_definition(Vec::new())?,
            TokenKind::At => self.parse_decorated()?,
            TokenKind::Async => self.parse_async_statement(Vec::new())?,
            _ if self.check_soft_keyword("match") => match self.try_parse_match_statement()? {
                Some(stmt) => stmt,
                None => return self.parse_simple_statements(),
            },
            _ => return self.parse_simple_statements(),
        };

        Ok(vec![stmt])
    }

    /// Parse `simple_stmt (';' simple_stmt)* [';'] NEWLINE`
    pub(crate) fn parse_simple_statements(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut statements = vec![self.parse_simple_statement()?];

        while self.match_token(&TokenKind::Semicolon) {
            if self.check(&TokenKind::Newline) || self.is_at_end() {
                break;
            }
            statements.push(self.parse_simple_statement()?);
        }

        if !self.match_token(&TokenKind::Newline) && !self.is_at_end() {
            return Err(self.invalid_syntax());
        }

        Ok(statements)
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();

        match self.peek_kind() {
            TokenKind::Pass => {
                self.advance();
                Ok(Stmt::Pass { location })
            }
            TokenKind::Break => {
                self.advance();
                Ok(Stmt::Break { location })
            }
            TokenKind::Continue => {
                self.advance();
                Ok(Stmt::Continue { location })
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_star_expressions()?)
                };
                Ok(Stmt::Return { value, location })
            }
            TokenKind::Raise => self.parse_raise_statement(),
            TokenKind::Del => self.parse_delete_statement(),
            TokenKind::Assert => {
                self.advance();
                let test = self.parse_expression()?;
                let msg = if self.match_token(&TokenKind::Comma) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Ok(Stmt::Assert {
                    test,
                    msg,
                    location,
                })
            }
            TokenKind::Global => {
                self.advance();
                let names = self.parse_name_list()?;
                Ok(Stmt::Global { names, location })
            }
            TokenKind::Nonlocal => {
                self.advance();
                let names = self.parse_name_list()?;
                Ok(Stmt::Nonlocal { names, location })
            }
            TokenKind::Import => self.parse_import_statement(),
            TokenKind::From => self.parse_from_import_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// Expression statements and every assignment form
    fn parse_expression_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        let first = self.parse_star_expressions_or_yield()?;

        // Annotated assignment: `x: int = 5`
        if self.match_token(&TokenKind::Colon) {
            self.validate_annotation_target(&first, location)?;
            let annotation = self.parse_expression()?;
            let value = if self.match_token(&TokenKind::Equal) {
                Some(self.parse_star_expressions_or_yield()?)
            } else {
                None
            };
            return Ok(Stmt::AnnAssign {
                target: first,
                annotation,
                value,
                location,
            });
        }

        // Augmented assignment: `x += 1`
        if let Some(op) = augmented_operator(self.peek_kind()) {
            self.advance();
            self.validate_augmented_target(&first, location)?;
            let value = self.parse_star_expressions_or_yield()?;
            return Ok(Stmt::AugAssign {
                target: first,
                op,
                value,
                location,
            });
        }

        if !self.check(&TokenKind::Equal) {
            return Ok(Stmt::Expr {
                value: first,
                location,
            });
        }

        // Chained assignment: `a = b = value`
        let mut chain = vec![first];
        while self.match_token(&TokenKind::Equal) {
            chain.push(self.parse_star_expressions_or_yield()?);
        }
        let value = chain.pop().ok_or_else(|| self.invalid_syntax())?;
        for target in &chain {
            self.validate_target(target, TargetContext::Assign, location)?;
        }

        Ok(Stmt::Assign {
            targets: chain,
            value,
            location,
        })
    }

    fn parse_raise_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'raise'

        if self.at_statement_end() {
            return Ok(Stmt::Raise {
                exc: None,
                cause: None,
                location,
            });
        }

        let exc = self.parse_expression()?;
        let cause = if self.match_token(&TokenKind::From) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(Stmt::Raise {
            exc: Some(exc),
            cause,
            location,
        })
    }

    fn parse_delete_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'del'

        let mut targets = Vec::new();
        loop {
            let target = self.parse_bitwise_or()?;
            self.validate_target(&target, TargetContext::Delete, location)?;
            targets.push(target);

            if !self.match_token(&TokenKind::Comma) || self.at_statement_end() {
                break;
            }
        }

        Ok(Stmt::Delete { targets, location })
    }

    fn parse_name_list(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut names = vec![self.expect_identifier()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }

    /// `import a.b as c, d`
    fn parse_import_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'import'

        let mut names = Vec::new();
        loop {
            let name = self.parse_dotted_name()?;
            let asname = if self.match_token(&TokenKind::As) {
                Some(self.expect_identifier()?)
            } else {
                None
            };
            names.push(Alias { name, asname });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(Stmt::Import { names, location })
    }

    /// `from ..pkg import (x as y, z)` and `from m import *`
    fn parse_from_import_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'from'

        let mut level = 0;
        loop {
            if self.match_token(&TokenKind::Dot) {
                level += 1;
            } else if self.match_token(&TokenKind::Ellipsis) {
                level += 3;
            } else {
                break;
            }
        }

        let module = if matches!(self.peek_kind(), TokenKind::Name(_)) {
            Some(self.parse_dotted_name()?)
        } else if level == 0 {
            return Err(self.error_here("expected module name"));
        } else {
            None
        };

        self.expect_token(&TokenKind::Import, "expected 'import'")?;

        if self.match_token(&TokenKind::Star) {
            return Ok(Stmt::ImportFrom {
                module,
                names: vec![Alias {
                    name: "*".to_string(),
                    asname: None,
                }],
                level,
                location,
            });
        }

        let parenthesized = self.match_token(&TokenKind::LParen);
        let mut names = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let asname = if self.match_token(&TokenKind::As) {
                Some(self.expect_identifier()?)
            } else {
                None
            };
            names.push(Alias { name, asname });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            if parenthesized && self.check(&TokenKind::RParen) {
                break;
            }
            if !parenthesized && self.at_statement_end() {
                return Err(SyntaxError::new(
                    "trailing comma not allowed without surrounding parentheses",
                    self.previous_location(),
                ));
            }
        }

        if parenthesized {
            self.expect_rparen("after imported names")?;
        }

        Ok(Stmt::ImportFrom {
            module,
            names,
            level,
            location,
        })
    }

    fn parse_dotted_name(&mut self) -> Result<String, SyntaxError> {
        let mut name = self.expect_identifier()?;
        while self.match_token(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    /// Parse `if`/`elif`/`else`; an elif chain becomes nested `orelse` blocks
    fn parse_if_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'if'

        let test = self.parse_named_expression()?;
        let body = self.parse_block("'if' statement", location)?;

        let mut elifs = Vec::new();
        while self.check(&TokenKind::Elif) {
            let elif_location = self.current_location();
            if elifs.len() >= MAX_ELIF_CHAIN {
                return Err(SyntaxError::new(
                    "too many statically nested blocks",
                    elif_location,
                ));
            }
            self.advance();
            let elif_test = self.parse_named_expression()?;
            let elif_body = self.parse_block("'elif' statement", elif_location)?;
            elifs.push((elif_location, elif_test, elif_body));
        }

        let mut orelse = self.parse_else_block()?;

        // Fold from the last elif outwards
        while let Some((elif_location, elif_test, elif_body)) = elifs.pop() {
            orelse = vec![Stmt::If {
                test: elif_test,
                body: elif_body,
                orelse,
                location: elif_location,
            }];
        }

        Ok(Stmt::If {
            test,
            body,
            orelse,
            location,
        })
    }

    /// Optional `else:` block shared by if, while, for and try
    fn parse_else_block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        if self.check(&TokenKind::Else) {
            let else_location = self.current_location();
            self.advance();
            self.parse_block("'else' statement", else_location)
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'while'

        let test = self.parse_named_expression()?;
        let body = self.parse_block("'while' statement", location)?;
        let orelse = self.parse_else_block()?;

        Ok(Stmt::While {
            test,
            body,
            orelse,
            location,
        })
    }

    /// Parse `for target in iter:`. `location` is the `async` token for
    /// `async for`.
    pub(crate) fn parse_for_statement(
        &mut self,
        location: SourceLocation,
        is_async: bool,
    ) -> Result<Stmt, SyntaxError> {
        let header = self.current_location();
        self.advance(); // consume 'for'

        let target = self.parse_target_list()?;
        self.validate_target(&target, TargetContext::For, header)?;
        self.expect_token(&TokenKind::In, "expected 'in'")?;
        let iter = self.parse_star_expressions()?;

        let body = self.parse_block("'for' statement", header)?;
        let orelse = self.parse_else_block()?;

        Ok(Stmt::For {
            target,
            iter,
            body,
            orelse,
            is_async,
            location,
        })
    }

    fn parse_try_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'try'

        let body = self.parse_block("'try' statement", location)?;

        let mut handlers = Vec::new();
        let mut is_star = false;
        while self.check(&TokenKind::Except) {
            let handler_location = self.current_location();
            self.advance();

            let star = self.match_token(&TokenKind::Star);
            if !handlers.is_empty() && star != is_star {
                return Err(SyntaxError::new(
                    "cannot have both 'except' and 'except*' on the same 'try'",
                    handler_location,
                ));
            }
            is_star = star;

            let (exception, name) = if self.check(&TokenKind::Colon) {
                if star {
                    return Err(self.error_here("expected one or more exception types"));
                }
                (None, None)
            } else {
                let exception = self.parse_expression_list()?;
                let name = if self.match_token(&TokenKind::As) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                (Some(exception), name)
            };

            let construct = if star {
                "'except*' statement"
            } else {
                "'except' statement"
            };
            let handler_body = self.parse_block(construct, handler_location)?;
            handlers.push(ExceptHandler {
                exception,
                name,
                body: handler_body,
                location: handler_location,
            });
        }

        let orelse = if handlers.is_empty() {
            Vec::new()
        } else {
            self.parse_else_block()?
        };

        let finalbody = if self.check(&TokenKind::Finally) {
            let finally_location = self.current_location();
            self.advance();
            self.parse_block("'finally' statement", finally_location)?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.error_here("expected 'except' or 'finally' block"));
        }

        Ok(Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
            is_star,
            location,
        })
    }

    /// Parse `with a as b, c:` including the parenthesized item form
    pub(crate) fn parse_with_statement(
        &mut self,
        location: SourceLocation,
        is_async: bool,
    ) -> Result<Stmt, SyntaxError> {
        let header = self.current_location();
        self.advance(); // consume 'with'

        let items = match self.parse_parenthesized_with_items(header)? {
            Some(items) => items,
            None => self.parse_with_items(header)?,
        };

        let body = self.parse_block("'with' statement", header)?;

        Ok(Stmt::With {
            items,
            body,
            is_async,
            location,
        })
    }

    /// `with (a as b, c as d):`. Backtracks and returns `None` when the
    /// parentheses turn out to belong to an ordinary expression.
    fn parse_parenthesized_with_items(
        &mut self,
        header: SourceLocation,
    ) -> Result<Option<Vec<WithItem>>, SyntaxError> {
        if !self.check(&TokenKind::LParen) {
            return Ok(None);
        }

        let start = self.position;
        self.advance();

        let attempt = (|| -> Result<Vec<WithItem>, SyntaxError> {
            let mut items = Vec::new();
            loop {
                items.push(self.parse_with_item(header)?);
                if !self.match_token(&TokenKind::Comma) || self.check(&TokenKind::RParen) {
                    break;
                }
            }
            self.expect_rparen("after with items")?;
            self.expect_token(&TokenKind::Colon, "expected ':'")?;
            Ok(items)
        })();

        match attempt {
            Ok(items) => {
                // Leave the ':' for parse_block
                self.position -= 1;
                Ok(Some(items))
            }
            Err(_) => {
                self.position = start;
                Ok(None)
            }
        }
    }

    fn parse_with_items(&mut self, header: SourceLocation) -> Result<Vec<WithItem>, SyntaxError> {
        let mut items = vec![self.parse_with_item(header)?];
        while self.match_token(&TokenKind::Comma) {
            items.push(self.parse_with_item(header)?);
        }
        Ok(items)
    }

    fn parse_with_item(&mut self, header: SourceLocation) -> Result<WithItem, SyntaxError> {
        let context_expr = self.parse_expression()?;
        let optional_vars = if self.match_token(&TokenKind::As) {
            let target = self.parse_target()?;
            self.validate_target(&target, TargetContext::With, header)?;
            Some(target)
        } else {
            None
        };

        Ok(WithItem {
            context_expr,
            optional_vars,
        })
    }

    /// `async def`, `async for`, `async with`
    pub(crate) fn parse_async_statement(
        &mut self,
        decorators: Vec<Expr>,
    ) -> Result<Stmt, SyntaxError> {
        let location = self.current_location();
        self.advance(); // consume 'async'

        match self.peek_kind() {
            TokenKind::Def => self.parse_function_definition(location, decorators, true),
            TokenKind::For if decorators.is_empty() => self.parse_for_statement(location, true),
            TokenKind::With if decorators.is_empty() => self.parse_with_statement(location, true),
            _ => Err(self.invalid_syntax()),
        }
    }
}

fn augmented_operator(kind: &TokenKind) -> Option<BinOperator> {
    let op = match kind {
        TokenKind::PlusEqual => BinOperator::Add,
        TokenKind::MinusEqual => BinOperator::Sub,
        TokenKind::StarEqual => BinOperator::Mult,
        TokenKind::AtEqual => BinOperator::MatMult,
        TokenKind::SlashEqual => BinOperator::Div,
        TokenKind::DoubleSlashEqual => BinOperator::FloorDiv,
        TokenKind::PercentEqual => BinOperator::Mod,
        TokenKind::DoubleStarEqual => BinOperator::Pow,
        TokenKind::LeftShiftEqual => BinOperator::LShift,
        TokenKind::RightShiftEqual => BinOperator::RShift,
        TokenKind::PipeEqual => BinOperator::BitOr,
        TokenKind::CaretEqual => BinOperator::BitXor,
        TokenKind::AmpEqual => BinOperator::BitAnd,
        _ => return None,
    };
    Some(op)
}
