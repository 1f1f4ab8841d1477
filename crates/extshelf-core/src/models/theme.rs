/// Key under which the theme preference is persisted
pub const THEME_KEY: &str = "theme";

/// Presentation theme applied to the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Default,
    Dark,
}

impl Theme {
    /// Interpret a persisted value. Anything but `"dark"` is the default theme.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            _ => Theme::Default,
        }
    }

    /// Value written to storage and to the root `data-theme` attribute.
    pub fn stored_value(&self) -> &'static str {
        match self {
            Theme::Default => "",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Default => Theme::Dark,
            Theme::Dark => Theme::Default,
        }
    }
}
