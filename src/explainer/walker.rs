// Statement walker that produces explanation records

use super::{templates, Explanation};
use crate::parser::ast::{Module, Stmt};
use crate::parser::unparse;
use tracing::trace;

/// Pending work on the traversal stack
enum Step<'a> {
    Visit(&'a Stmt),
    /// Marker record for the first statement of an `else` block
    ElseMarker(usize),
}

/// Accumulates explanations for one module, depth-first and pre-order.
///
/// The traversal keeps its own stack, so deeply nested blocks cannot
/// exhaust the call stack.
#[derive(Debug, Default)]
pub struct Explainer {
    explanations: Vec<Explanation>,
}

impl Explainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the module and return the records in traversal order
    pub fn explain(mut self, module: &Module) -> Vec<Explanation> {
        let mut pending: Vec<Step<'_>> = Vec::new();
        schedule(&mut pending, &[module.body.as_slice()]);

        while let Some(step) = pending.pop() {
            match step {
                Step::Visit(stmt) => self.visit(stmt, &mut pending),
                Step::ElseMarker(line) => self.emit(templates::else_block(line)),
            }
        }

        self.explanations
    }

    fn visit<'a>(&mut self, stmt: &'a Stmt, pending: &mut Vec<Step<'a>>) {
        let line = stmt.line();

        match stmt {
            Stmt::Assign { targets, value, .. } => {
                let targets: Vec<String> = targets.iter().map(unparse).collect();
                self.emit(templates::assignment(line, &targets, &unparse(value)));
            }

            Stmt::FunctionDef {
                name,
                params,
                body,
                is_async: false,
                ..
            } => {
                let args: Vec<&str> = params.args.iter().map(|p| p.name.as_str()).collect();
                self.emit(templates::function_definition(line, name, &args));
                schedule(pending, &[body.as_slice()]);
            }

            Stmt::If {
                test, body, orelse, ..
            } => {
                self.emit(templates::condition(line, &unparse(test)));
                // Reverse order: the stack pops the body first
                if let Some(first) = orelse.first() {
                    schedule(pending, &[orelse.as_slice()]);
                    pending.push(Step::ElseMarker(first.line()));
                }
                schedule(pending, &[body.as_slice()]);
            }

            Stmt::For {
                target,
                iter,
                body,
                orelse,
                is_async: false,
                ..
            } => {
                self.emit(templates::for_loop(line, &unparse(target), &unparse(iter)));
                schedule(pending, &[body.as_slice(), orelse.as_slice()]);
            }

            Stmt::While {
                test, body, orelse, ..
            } => {
                self.emit(templates::while_loop(line, &unparse(test)));
                schedule(pending, &[body.as_slice(), orelse.as_slice()]);
            }

            Stmt::Expr { value, .. } if value.is_call() => {
                self.emit(templates::function_call(line, &unparse(value)));
            }

            Stmt::Return { value, .. } => {
                let value = value.as_ref().map(unparse);
                self.emit(templates::return_value(line, value.as_deref()));
            }

            other => schedule(pending, &other.child_blocks()),
        }
    }

    fn emit(&mut self, explanation: Explanation) {
        trace!(line = ?explanation.line(), text = explanation.text(), "explained");
        self.explanations.push(explanation);
    }
}

/// Queue statement blocks so they are visited in source order
fn schedule<'a>(pending: &mut Vec<Step<'a>>, blocks: &[&'a [Stmt]]) {
    for block in blocks.iter().rev() {
        pending.extend(block.iter().rev().map(Step::Visit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn texts(source: &str) -> Vec<String> {
        let module = parse(source).unwrap();
        Explainer::new()
            .explain(&module)
            .iter()
            .map(|e| e.text().to_string())
            .collect()
    }

    #[test]
    fn test_pre_order() {
        let source = "def f(n):\n    while n:\n        n = n - 1\n    return n\nprint(f(3))\n";

        assert_eq!(
            texts(source),
            vec![
                "(Line 1) Defines a function 'f' with arguments: n.",
                "(Line 2) Runs a while loop with condition: 'n'.",
                "(Line 3) Assigns n - 1 to n.",
                "(Line 4) Returns n.",
                "(Line 5) Executes a function call: 'print(f(3))'.",
            ]
        );
    }

    #[test]
    fn test_unrecognized_statements_are_entered() {
        let source = "class A:\n    def m(self):\n        pass\ntry:\n    x = 1\nexcept E:\n    y = 2\nfinally:\n    z = 3\n";

        assert_eq!(
            texts(source),
            vec![
                "(Line 2) Defines a function 'm' with arguments: self.",
                "(Line 5) Assigns 1 to x.",
                "(Line 7) Assigns 2 to y.",
                "(Line 9) Assigns 3 to z.",
            ]
        );
    }

    #[test]
    fn test_loop_else_has_no_marker() {
        let source = "for i in x:\n    pass\nelse:\n    done()\n";

        assert_eq!(
            texts(source),
            vec![
                "(Line 1) Loops over 'x' using variable 'i'.",
                "(Line 4) Executes a function call: 'done()'.",
            ]
        );
    }

    #[test]
    fn test_async_definitions_are_entered_silently() {
        let source = "async def f():\n    return 1\n";

        assert_eq!(texts(source), vec!["(Line 2) Returns 1."]);
    }

    #[test]
    fn test_non_call_expression_is_silent() {
        assert!(texts("x\n'docstring'\nx + 1\n").is_empty());
    }

    #[test]
    fn test_deep_nesting() {
        let mut source = String::new();
        for depth in 0..50 {
            source.push_str(&"    ".repeat(depth));
            source.push_str("if x:\n");
        }
        source.push_str(&"    ".repeat(50));
        source.push_str("pass\n");

        assert_eq!(texts(&source).len(), 50);
    }
}
