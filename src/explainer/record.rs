// Explanation records produced by the walker

use crate::parser::SyntaxError;
use serde::{Deserialize, Serialize};

/// One explained line: a short summary and a longer paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    /// Summary prefixed with `(Line N) `
    #[serde(rename = "line")]
    text: String,
    paragraph: String,
    /// 1-indexed source line; `None` only for the parse-failure record
    line_number: Option<usize>,
}

impl Explanation {
    pub fn new(line: usize, summary: &str, paragraph: impl Into<String>) -> Self {
        Explanation {
            text: format!("(Line {}) {}", line, summary),
            paragraph: paragraph.into(),
            line_number: Some(line),
        }
    }

    /// The single record returned when the source does not parse
    pub fn parse_failure(error: &SyntaxError) -> Self {
        Explanation {
            text: format!("Error parsing code: {}", error),
            paragraph: String::new(),
            line_number: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn paragraph(&self) -> &str {
        &self.paragraph
    }

    pub fn line(&self) -> Option<usize> {
        self.line_number
    }

    pub fn is_error(&self) -> bool {
        self.line_number.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceLocation;

    #[test]
    fn test_line_prefix() {
        let record = Explanation::new(3, "Returns x.", "paragraph");

        assert_eq!(record.text(), "(Line 3) Returns x.");
        assert_eq!(record.line(), Some(3));
        assert!(!record.is_error());
    }

    #[test]
    fn test_parse_failure_record() {
        let error = SyntaxError::new("invalid syntax", SourceLocation::new(2, 4));
        let record = Explanation::parse_failure(&error);

        assert_eq!(
            record.text(),
            "Error parsing code: Syntax error at line 2, column 4: invalid syntax"
        );
        assert_eq!(record.paragraph(), "");
        assert!(record.is_error());
    }

    #[test]
    fn test_serialized_field_names() {
        let record = Explanation::new(1, "Assigns 1 to x.", "p");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["line"], "(Line 1) Assigns 1 to x.");
        assert_eq!(json["paragraph"], "p");
        assert_eq!(json["line_number"], 1);
    }
}
