//! Main TUI application state and logic

use crate::explainer::Explanation;
use crate::ui::panes::{self, SourceScrollState};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use rustc_hash::FxHashMap;
use std::io;

/// Records skipped by PgUp/PgDn
pub const PAGE_SIZE: usize = 10;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Explanations,
}

impl FocusedPane {
    /// Move focus to the other pane
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Explanations,
            FocusedPane::Explanations => FocusedPane::Source,
        }
    }
}

/// The main application state
pub struct App {
    /// The source code being explained
    pub source_code: String,

    /// Records in traversal order
    pub explanations: Vec<Explanation>,

    /// Index of the selected record
    pub selected: usize,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll state
    pub source_scroll: SourceScrollState,
    pub explanation_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Number of records per source line
    explained_lines: FxHashMap<usize, usize>,
}

impl App {
    /// Create a new app for the given source and its explanations
    pub fn new(source_code: String, explanations: Vec<Explanation>) -> Self {
        let mut explained_lines = FxHashMap::default();
        for line in explanations.iter().filter_map(Explanation::line) {
            *explained_lines.entry(line).or_insert(0) += 1;
        }

        let mut app = App {
            source_code,
            explanations,
            selected: 0,
            focused_pane: FocusedPane::Explanations,
            source_scroll: SourceScrollState::default(),
            explanation_scroll: 0,
            should_quit: false,
            status_message: String::new(),
            explained_lines,
        };
        app.update_status();
        app
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key_event(key);
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes on top, status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        // Source (left) | Explanations (right)
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        let selected_line = self.selected_line();

        panes::render_source_pane(
            frame,
            columns[0],
            &self.source_code,
            selected_line,
            &self.explained_lines,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_explanations_pane(
            frame,
            columns[1],
            &self.explanations,
            self.selected,
            self.focused_pane == FocusedPane::Explanations,
            &mut self.explanation_scroll,
        );

        panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.selected,
            self.explanations.len(),
            self.explanations.iter().any(Explanation::is_error),
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Up | KeyCode::Char('k') => match self.focused_pane {
                FocusedPane::Explanations => self.select(self.selected.saturating_sub(1)),
                FocusedPane::Source => self.select_previous_line(),
            },
            KeyCode::Down | KeyCode::Char('j') => match self.focused_pane {
                FocusedPane::Explanations => self.select(self.selected.saturating_add(1)),
                FocusedPane::Source => self.select_next_line(),
            },
            KeyCode::PageUp => self.select(self.selected.saturating_sub(PAGE_SIZE)),
            KeyCode::PageDown => self.select(self.selected.saturating_add(PAGE_SIZE)),
            KeyCode::Home => self.select(0),
            KeyCode::End => self.select(usize::MAX),
            _ => {}
        }
    }

    /// Source line of the selected record
    pub fn selected_line(&self) -> Option<usize> {
        self.explanations.get(self.selected).and_then(Explanation::line)
    }

    /// Select a record, clamping to the list
    fn select(&mut self, index: usize) {
        self.selected = index.min(self.explanations.len().saturating_sub(1));
        self.update_status();
    }

    /// Jump to the first record of the next explained line
    fn select_next_line(&mut self) {
        let current = self.selected_line();
        let next = self
            .explanations
            .iter()
            .enumerate()
            .skip(self.selected + 1)
            .find(|(_, e)| e.line() != current)
            .map(|(index, _)| index);

        if let Some(index) = next {
            self.select(index);
        }
    }

    /// Jump to the first record of the previous explained line
    fn select_previous_line(&mut self) {
        let current = self.selected_line();
        let Some(mut index) = self.explanations[..self.selected]
            .iter()
            .rposition(|e| e.line() != current)
        else {
            return;
        };

        let target = self.explanations[index].line();
        while index > 0 && self.explanations[index - 1].line() == target {
            index -= 1;
        }
        self.select(index);
    }

    fn update_status(&mut self) {
        self.status_message = match self.explanations.get(self.selected) {
            None => "No explanations for this source".to_string(),
            Some(e) if e.is_error() => "The source could not be parsed".to_string(),
            Some(e) => {
                let line = e.line().unwrap_or(0);
                let count = self.explained_lines.get(&line).copied().unwrap_or(0);
                format!(
                    "Line {}: {} explanation{}",
                    line,
                    count,
                    if count == 1 { "" } else { "s" }
                )
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explainer::explain;
    use crossterm::event::KeyModifiers;

    const SOURCE: &str = "x = 1\nif x:\n    y = 2\nelse:\n    y = 3\nprint(y)\n";

    fn app() -> App {
        App::new(SOURCE.to_string(), explain(SOURCE))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_initial_state() {
        let app = app();

        assert_eq!(app.selected, 0);
        assert_eq!(app.selected_line(), Some(1));
        assert_eq!(app.status_message, "Line 1: 1 explanation");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_record_navigation_clamps() {
        let mut app = app();

        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected, 0);

        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected, 2);

        press(&mut app, KeyCode::End);
        assert_eq!(app.selected, app.explanations.len() - 1);

        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.selected, app.explanations.len() - 1);

        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_source_focus_moves_by_line() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused_pane, FocusedPane::Source);

        // Lines 1, 2, 3, then the else marker and assignment on line 5
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_line(), Some(5));
        assert_eq!(app.status_message, "Line 5: 2 explanations");

        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_line(), Some(6));

        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_line(), Some(5));
        assert_eq!(app.selected, 3);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_empty_and_error_sources() {
        let mut empty = App::new(String::new(), Vec::new());
        press(&mut empty, KeyCode::Down);
        assert_eq!(empty.selected, 0);
        assert_eq!(empty.selected_line(), None);

        let broken = App::new("def f(:".to_string(), explain("def f(:"));
        assert_eq!(broken.status_message, "The source could not be parsed");
    }
}
