//! Explanation list pane
//!
//! Lists every record in traversal order. The selected record is highlighted
//! and expanded to show its paragraph beneath it.

use crate::explainer::Explanation;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const PARAGRAPH_INDENT: &str = "    ";

/// Greedy word wrap. Words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if row_len > 0 {
                rows.push(std::mem::take(&mut row));
                row_len = 0;
            }
            let rest = word.split_off(width);
            rows.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if row_len == 0 { word.len() } else { row_len + 1 + word.len() };
        if needed > width && row_len > 0 {
            rows.push(std::mem::take(&mut row));
            row_len = 0;
        }
        if row_len > 0 {
            row.push(' ');
            row_len += 1;
        }
        row_len += word.len();
        row.extend(word);
    }

    if row_len > 0 || rows.is_empty() {
        rows.push(row);
    }
    rows
}

/// Rows of one record: its wrapped text, plus the wrapped paragraph when selected
fn record_rows(explanation: &Explanation, selected: bool, width: usize) -> Vec<Line<'static>> {
    let text_style = if explanation.is_error() {
        Style::default().fg(DEFAULT_THEME.error)
    } else if selected {
        Style::default().fg(DEFAULT_THEME.fg)
    } else {
        Style::default().fg(DEFAULT_THEME.comment)
    };
    let text_style = if selected {
        text_style
            .bg(DEFAULT_THEME.current_line_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        text_style
    };

    let mut rows: Vec<Line<'static>> = wrap_text(explanation.text(), width)
        .into_iter()
        .map(|row| Line::from(Span::styled(row, text_style)))
        .collect();

    if selected && !explanation.paragraph().is_empty() {
        let inner = width.saturating_sub(PARAGRAPH_INDENT.len());
        rows.extend(wrap_text(explanation.paragraph(), inner).into_iter().map(|row| {
            Line::from(vec![
                Span::raw(PARAGRAPH_INDENT),
                Span::styled(row, Style::default().fg(DEFAULT_THEME.paragraph)),
            ])
        }));
    }

    rows
}

/// Render the explanations pane, scrolling so the selected record is visible
pub fn render_explanations_pane(
    frame: &mut Frame,
    area: Rect,
    explanations: &[Explanation],
    selected: usize,
    is_focused: bool,
    scroll: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" Explanations ({}) ", explanations.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let width = area.width.saturating_sub(2).max(1) as usize;
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    if explanations.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "Nothing to explain.",
            Style::default().fg(DEFAULT_THEME.comment),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut lines = Vec::new();
    let mut selected_span = (0, 0);
    for (index, explanation) in explanations.iter().enumerate() {
        let rows = record_rows(explanation, index == selected, width);
        if index == selected {
            selected_span = (lines.len(), lines.len() + rows.len());
        }
        lines.extend(rows);
    }

    *scroll = scroll_to_show(*scroll, selected_span, visible_height);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((u16::try_from(*scroll).unwrap_or(u16::MAX), 0));
    frame.render_widget(paragraph, area);
}

/// Adjust `offset` so rows `start..end` fit in the viewport, preferring the start
fn scroll_to_show(offset: usize, (start, end): (usize, usize), height: usize) -> usize {
    if start < offset {
        start
    } else if end > offset + height {
        end.saturating_sub(height).min(start)
    } else {
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_selected_record_expands() {
        let record = Explanation::new(1, "Assigns 1 to x.", "A longer paragraph.");

        assert_eq!(record_rows(&record, false, 80).len(), 1);
        assert_eq!(record_rows(&record, true, 80).len(), 2);
    }

    #[test]
    fn test_scroll_to_show() {
        assert_eq!(scroll_to_show(0, (2, 4), 10), 0);
        assert_eq!(scroll_to_show(5, (2, 4), 10), 2);
        assert_eq!(scroll_to_show(0, (12, 15), 10), 5);
        // Taller than the viewport: show the start
        assert_eq!(scroll_to_show(0, (12, 30), 10), 12);
    }
}
