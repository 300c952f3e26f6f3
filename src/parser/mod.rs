//! Python source code parser
//!
//! This module transforms Python source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens, with INDENT/DEDENT)
//! - [`parse`](mod@parse): Parsing (tokens → AST), split across `impl Parser` blocks
//! - [`ast`]: AST node definitions
//! - [`unparse`](mod@unparse): AST expressions back to source text
//!
//! # Supported Python
//!
//! The grammar covers the statements and expressions of modern Python 3:
//! - Compound statements: `if`/`elif`/`else`, `while`, `for`, `try`
//!   (including `except*`), `with`, `def`, `class`, decorators, `async` forms,
//!   and `match` with the full pattern language
//! - Simple statements: every assignment form, `return`, `raise`, `del`,
//!   `assert`, `import`, `global`, `nonlocal`, `pass`, `break`, `continue`
//! - Expressions: the full operator precedence chain, comprehensions,
//!   lambdas, conditional and assignment expressions, starred unpacking
//! - f-strings, with replacement fields parsed as expressions
//! - No type parameter lists or `type` aliases
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
mod fstrings;
pub mod lexer;
pub mod parse;
mod patterns;
mod statements;
mod targets;
pub mod unparse;

pub use parse::{Parser, SyntaxError};
pub use unparse::unparse;

use tracing::debug;

/// Parse Python source into a [`Module`](ast::Module)
pub fn parse(source: &str) -> Result<ast::Module, SyntaxError> {
    let module = Parser::new(source)?.parse_module()?;
    debug!(
        statements = module.body.len(),
        total = module.statement_count(),
        "parsed module"
    );
    Ok(module)
}
