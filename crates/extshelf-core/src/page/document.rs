use crate::models::{Filter, Theme};

use super::render::document_html;

/// The parts of the page the controller writes to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Contents of the grid container
    pub grid: String,
    /// Theme applied to the root element
    pub theme: Theme,
    /// Filter control currently marked active
    pub active_filter: Filter,
}

impl Document {
    /// Value of the root `data-theme` attribute
    pub fn data_theme(&self) -> &'static str {
        self.theme.stored_value()
    }

    pub fn to_html(&self) -> String {
        document_html(self)
    }
}
