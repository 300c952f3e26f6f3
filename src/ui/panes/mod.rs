//! TUI pane rendering modules
//!
//! This module provides the rendering logic for all visual panes in the TUI,
//! organized by responsibility.
//!
//! # Pane Modules
//!
//! - [`source`]: Source code display with syntax highlighting and explanation markers
//! - [`explanations`]: The explanation list with the selected record expanded
//! - [`status`]: Status bar with keybindings and the selection position
//!
//! # Architecture
//!
//! Each pane module exports a primary `render_*` function plus any scroll
//! state it keeps between frames.

pub mod explanations;
pub mod source;
pub mod status;

// Re-export render functions for convenience
pub use explanations::render_explanations_pane;
pub use source::{render_source_pane, SourceScrollState};
pub use status::render_status_bar;
