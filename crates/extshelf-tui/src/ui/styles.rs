use ratatui::style::{Color, Modifier, Style};

use extshelf_core::models::Theme;

/// Colours for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub active: Color,
    pub highlight: Color,
}

pub const LIGHT: Palette = Palette {
    background: Color::Rgb(235, 242, 252),
    surface: Color::Rgb(252, 253, 255),
    text: Color::Rgb(9, 21, 63),
    muted: Color::Rgb(84, 89, 107),
    accent: Color::Rgb(222, 71, 61),
    active: Color::Rgb(199, 34, 26),
    highlight: Color::Rgb(237, 237, 237),
};

pub const DARK: Palette = Palette {
    background: Color::Rgb(4, 12, 39),
    surface: Color::Rgb(33, 38, 57),
    text: Color::Rgb(251, 253, 254),
    muted: Color::Rgb(197, 198, 201),
    accent: Color::Rgb(245, 97, 87),
    active: Color::Rgb(245, 97, 87),
    highlight: Color::Rgb(84, 89, 107),
};

pub fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Default => &LIGHT,
        Theme::Dark => &DARK,
    }
}

pub fn base_style(p: &Palette) -> Style {
    Style::default().bg(p.background).fg(p.text)
}

pub fn title_style(p: &Palette) -> Style {
    Style::default().fg(p.text).add_modifier(Modifier::BOLD)
}

pub fn muted_style(p: &Palette) -> Style {
    Style::default().fg(p.muted)
}

pub fn card_style(p: &Palette) -> Style {
    Style::default().bg(p.surface).fg(p.text)
}

pub fn border_style(p: &Palette, focused: bool) -> Style {
    if focused {
        Style::default().fg(p.accent)
    } else {
        Style::default().fg(p.highlight)
    }
}

pub fn filter_style(p: &Palette, selected: bool) -> Style {
    if selected {
        Style::default()
            .bg(p.accent)
            .fg(p.surface)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(p.surface).fg(p.text)
    }
}

pub fn switch_style(p: &Palette, on: bool) -> Style {
    if on {
        Style::default().fg(p.active).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(p.muted)
    }
}

pub fn placeholder_style(p: &Palette) -> Style {
    Style::default().fg(p.highlight)
}

pub fn status_bar_style(p: &Palette) -> Style {
    Style::default().bg(p.surface).fg(p.muted)
}

pub fn help_key_style(p: &Palette) -> Style {
    Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style(p: &Palette) -> Style {
    Style::default().fg(p.text)
}
