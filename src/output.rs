//! Plain-text and JSON renderings of an explanation list

use crate::explainer::Explanation;
use clap::ValueEnum;

/// How the binary presents its explanations
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Interactive two-pane terminal viewer
    Tui,
    /// One record per line, paragraphs indented below
    Text,
    /// Pretty-printed JSON array
    Json,
}

/// One record per line; each non-empty paragraph follows on an indented line
pub fn render_text(explanations: &[Explanation], paragraphs: bool) -> String {
    let mut out = String::new();
    for explanation in explanations {
        out.push_str(explanation.text());
        out.push('\n');
        if paragraphs && !explanation.paragraph().is_empty() {
            out.push_str("    ");
            out.push_str(explanation.paragraph());
            out.push('\n');
        }
    }
    out
}

pub fn render_json(explanations: &[Explanation]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(explanations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explainer::explain;

    #[test]
    fn test_render_text() {
        let records = explain("x = 1\nprint(x)\n");

        assert_eq!(
            render_text(&records, false),
            "(Line 1) Assigns 1 to x.\n(Line 2) Executes a function call: 'print(x)'.\n"
        );

        let with_paragraphs = render_text(&records, true);
        assert!(with_paragraphs
            .contains("\n    This line assigns the value '1' to the variable(s) 'x'.\n"));
    }

    #[test]
    fn test_render_json_round_trips() {
        let records = explain("return\n");
        let json = render_json(&records).unwrap();
        let parsed: Vec<Explanation> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, records);
        assert!(json.contains("\"line\": \"(Line 1) Returns nothing.\""));
    }
}
