//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout and per-view rendering
//! - `input`: keyboard event handling
//! - `styles`: color palette and text styling

pub mod input;
pub mod render;
pub mod styles;
