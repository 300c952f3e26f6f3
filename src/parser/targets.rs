//! Target validation
//!
//! Targets are parsed as ordinary expressions and checked afterwards, the
//! same way CPython reports `cannot assign to literal` and friends.

use crate::parser::ast::*;
use crate::parser::parse::{Parser, SyntaxError};

/// Where a target appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TargetContext {
    Assign,
    Delete,
    For,
    With,
    Comprehension,
}

impl TargetContext {
    fn verb(self) -> &'static str {
        match self {
            TargetContext::Delete => "delete",
            _ => "assign to",
        }
    }
}

impl Parser {
    pub(crate) fn validate_target(
        &self,
        target: &Expr,
        context: TargetContext,
        location: SourceLocation,
    ) -> Result<(), SyntaxError> {
        if let Expr::Starred(_) = target {
            if context == TargetContext::Delete {
                return Err(SyntaxError::new("cannot delete starred", location));
            }
            return Err(SyntaxError::new(
                "starred assignment target must be in a list or tuple",
                location,
            ));
        }
        check_target(target, context, location)
    }

    pub(crate) fn validate_augmented_target(
        &self,
        target: &Expr,
        location: SourceLocation,
    ) -> Result<(), SyntaxError> {
        match target {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } => Ok(()),
            other => Err(SyntaxError::new(
                format!(
                    "'{}' is an illegal expression for augmented assignment",
                    other.describe()
                ),
                location,
            )),
        }
    }

    pub(crate) fn validate_annotation_target(
        &self,
        target: &Expr,
        location: SourceLocation,
    ) -> Result<(), SyntaxError> {
        match target {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } => Ok(()),
            Expr::Tuple(_) => Err(SyntaxError::new(
                "only single target (not tuple) can be annotated",
                location,
            )),
            Expr::List(_) => Err(SyntaxError::new(
                "only single target (not list) can be annotated",
                location,
            )),
            _ => Err(SyntaxError::new("illegal target for annotation", location)),
        }
    }

    pub(crate) fn validate_named_target(
        &self,
        target: &Expr,
        location: SourceLocation,
    ) -> Result<(), SyntaxError> {
        match target {
            Expr::Name(_) => Ok(()),
            other => Err(SyntaxError::new(
                format!(
                    "cannot use assignment expressions with {}",
                    other.describe()
                ),
                location,
            )),
        }
    }
}

fn check_target(
    target: &Expr,
    context: TargetContext,
    location: SourceLocation,
) -> Result<(), SyntaxError> {
    match target {
        Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } => Ok(()),
        Expr::Tuple(elements) | Expr::List(elements) => {
            let starred = elements
                .iter()
                .filter(|e| matches!(e, Expr::Starred(_)))
                .count();
            if starred > 1 && context != TargetContext::Delete {
                return Err(SyntaxError::new(
                    "multiple starred expressions in assignment",
                    location,
                ));
            }
            for element in elements {
                match element {
                    Expr::Starred(inner) if context != TargetContext::Delete => {
                        check_target(inner, context, location)?
                    }
                    other => check_target(other, context, location)?,
                }
            }
            Ok(())
        }
        Expr::Starred(_) => Err(SyntaxError::new(
            format!("cannot {} starred", context.verb()),
            location,
        )),
        other => Err(SyntaxError::new(
            format!("cannot {} {}", context.verb(), other.describe()),
            location,
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;

    fn message(source: &str) -> String {
        parse(source).unwrap_err().message
    }

    #[test]
    fn test_assignment_targets() {
        assert_eq!(message("1 = x\n"), "cannot assign to literal");
        assert_eq!(message("f() = 1\n"), "cannot assign to function call");
        assert_eq!(message("a, f() = 1, 2\n"), "cannot assign to function call");
        assert_eq!(message("None = 1\n"), "cannot assign to constant");
        assert!(parse("a, *b = c\n").is_ok());
        assert!(parse("[a, (b, c)] = d\n").is_ok());
        assert!(parse("x.y = z[0] = 1\n").is_ok());
    }

    #[test]
    fn test_starred_targets() {
        assert_eq!(
            message("*a = b\n"),
            "starred assignment target must be in a list or tuple"
        );
        assert_eq!(
            message("*a, *b = c\n"),
            "multiple starred expressions in assignment"
        );
    }

    #[test]
    fn test_augmented_targets() {
        assert_eq!(
            message("a, b += 1\n"),
            "'tuple' is an illegal expression for augmented assignment"
        );
        assert!(parse("a[0] += 1\n").is_ok());
    }

    #[test]
    fn test_annotation_targets() {
        assert_eq!(
            message("a, b: int\n"),
            "only single target (not tuple) can be annotated"
        );
        assert_eq!(message("f(): int\n"), "illegal target for annotation");
    }

    #[test]
    fn test_delete_and_loop_targets() {
        assert_eq!(message("del f()\n"), "cannot delete function call");
        assert_eq!(message("for 1 in x:\n    pass\n"), "cannot assign to literal");
        assert_eq!(
            message("with a as f():\n    pass\n"),
            "cannot assign to function call"
        );
        assert_eq!(
            message("(a.b := 1)\n"),
            "cannot use assignment expressions with attribute"
        );
    }
}
