//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, card grid and overlays
//! - `input`: keyboard event handling
//! - `styles`: light and dark palettes

pub mod input;
pub mod render;
pub mod styles;
