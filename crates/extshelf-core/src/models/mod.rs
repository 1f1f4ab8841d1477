//! Data models for extshelf.
//!
//! - `Extension`: one record from the data document
//! - `ExtensionEntry`, `ExtensionId`: a loaded record with its stable id
//! - `Filter`: which records the grid shows
//! - `Theme`: the persisted presentation preference

pub mod extension;
pub mod theme;

pub use extension::{Extension, ExtensionEntry, ExtensionId, Filter, ParseFilterError};
pub use theme::{Theme, THEME_KEY};
