//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop and pane focus
//! - **[`panes`]**: render functions for each visible pane (source,
//!   explanations, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with the source and
//! its [`Explanation`]s and call [`App::run`] to start the event loop.
//!
//! [`Explanation`]: crate::explainer::Explanation
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
