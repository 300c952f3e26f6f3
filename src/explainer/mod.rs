//! Plain-English explanations of parsed Python
//!
//! This module turns a parsed [`Module`] into a list of [`Explanation`]s:
//! - [`walker`]: Depth-first traversal that decides which statements get a record
//! - [`templates`]: The sentence templates for each recognized construct
//! - [`record`]: The explanation record itself
//!
//! # Recognized statements
//!
//! Assignments, `def`, `if` (plus a marker for its `else` block), `for`,
//! `while`, function-call expression statements and `return`. Everything
//! else produces no record of its own, but nested blocks inside it are still
//! explained.

pub mod record;
pub mod templates;
pub mod walker;

pub use record::Explanation;
pub use walker::Explainer;

use crate::parser::{self, ast::Module};
use tracing::{debug, warn};

/// Explain an already-parsed module
pub fn explain_module(module: &Module) -> Vec<Explanation> {
    Explainer::new().explain(module)
}

/// Parse and explain Python source.
///
/// Source that does not parse yields a single record describing the error.
pub fn explain(source: &str) -> Vec<Explanation> {
    match parser::parse(source) {
        Ok(module) => {
            let explanations = explain_module(&module);
            debug!(
                lines = source.lines().count(),
                records = explanations.len(),
                "explained source"
            );
            explanations
        }
        Err(error) => {
            warn!(%error, "source did not parse");
            vec![Explanation::parse_failure(&error)]
        }
    }
}
