//! # Introduction
//!
//! pysplain reads Python source and explains it line by line in plain
//! English. Each recognized statement (assignments, function definitions,
//! conditions, loops, calls and returns) yields one record anchored to its
//! source line.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Explainer → Explanations → Text/JSON/TUI
//! ```
//!
//! 1. [`parser`]: tokenises the source, builds an AST and unparses
//!    expressions back into canonical Python.
//! 2. [`explainer`]: walks the AST depth-first and emits an
//!    [`Explanation`] for every recognized statement.
//! 3. [`output`]: plain-text and JSON renderings of the list.
//! 4. [`ui`]: ratatui-based viewer; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! let records = pysplain::explain("def add(a, b):\n    return a + b\n");
//!
//! assert_eq!(records[0].text(), "(Line 1) Defines a function 'add' with arguments: a, b.");
//! assert_eq!(records[1].text(), "(Line 2) Returns a + b.");
//! ```

pub mod explainer;
pub mod output;
pub mod parser;
pub mod ui;

pub use explainer::{explain, Explanation};
