//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout and per-screen rendering
//! - `input`: Keyboard event handling
//! - `styles`: Color scheme and text styling

pub mod input;
pub mod render;
pub mod styles;
