//! Page controller: state, markup and user actions.

pub mod controller;
pub mod document;
pub mod render;
pub mod state;

pub use controller::{fetch_extensions, Page, PageOptions};
pub use document::Document;
pub use render::{render_html, EMPTY_MESSAGE};
pub use state::PageState;
