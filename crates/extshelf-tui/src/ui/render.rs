use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use extshelf_core::models::{ExtensionEntry, Filter};
use extshelf_core::page::EMPTY_MESSAGE;
use extshelf_core::utils::truncate_string;

use crate::app::{App, AppState};

use super::styles::{self, Palette};

/// Card cell size in the grid
const CARD_WIDTH: u16 = 38;
const CARD_HEIGHT: u16 = 7;

pub fn render(frame: &mut Frame, app: &App) {
    let p = styles::palette(app.theme());
    frame.render_widget(Block::default().style(styles::base_style(p)), frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Filters
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, p, chunks[0]);
    render_filters(frame, app, p, chunks[1]);
    render_grid(frame, app, p, chunks[2]);
    render_status_bar(frame, app, p, chunks[3]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, p),
        AppState::ConfirmingQuit => render_quit_overlay(frame, p),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, p: &Palette, area: Rect) {
    let title = "  extshelf";
    let hint = "[t] Theme  [?] Help";

    let line = Line::from(vec![
        Span::styled(title, styles::title_style(p)),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + hint.len() as u16 + 2) as usize,
        )),
        Span::styled(hint, styles::muted_style(p)),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::border_style(p, false));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_filters(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let mut spans = vec![Span::styled("  Extensions List", styles::title_style(p))];
    let labels: usize = Filter::ALL.iter().map(|f| f.label().len() + 7).sum();
    spans.push(Span::raw(" ".repeat(
        (area.width as usize).saturating_sub(spans[0].content.len() + labels + 2),
    )));

    for (i, filter) in Filter::ALL.iter().enumerate() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!(" [{}] {} ", i + 1, filter.label()),
            styles::filter_style(p, *filter == app.filter()),
        ));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::border_style(p, false));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Where each card lands in the grid area.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GridLayout {
    columns: usize,
    first_row: usize,
    visible_rows: usize,
}

impl GridLayout {
    /// Fit cards into `area`, scrolling so the selected card stays visible.
    fn new(area: Rect, selection: usize) -> Self {
        let columns = (area.width / CARD_WIDTH).max(1) as usize;
        let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
        let selected_row = selection / columns;
        Self {
            columns,
            first_row: (selected_row + 1).saturating_sub(visible_rows),
            visible_rows,
        }
    }

    fn cell(&self, area: Rect, index: usize) -> Option<Rect> {
        let row = index / self.columns;
        if row < self.first_row || row >= self.first_row + self.visible_rows {
            return None;
        }
        let column = (index % self.columns) as u16;
        let width = area.width / self.columns as u16;
        Some(Rect::new(
            area.x + column * width,
            area.y + (row - self.first_row) as u16 * CARD_HEIGHT,
            width,
            CARD_HEIGHT.min(area.height),
        ))
    }
}

fn render_grid(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let area = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    };

    if app.is_loading() {
        let layout = GridLayout::new(area, 0);
        let count = app.runtime().page().options().placeholder_count;
        for index in 0..count {
            if let Some(cell) = layout.cell(area, index) {
                render_placeholder(frame, p, cell);
            }
        }
        return;
    }

    let visible = app.visible();
    if visible.is_empty() {
        let message = if app.runtime().page().state().all().is_empty() {
            EMPTY_MESSAGE
        } else {
            "Nothing matches this filter"
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(message, styles::muted_style(p))))
            .block(Block::default().borders(Borders::NONE));
        frame.render_widget(paragraph, Rect { height: area.height.min(1), ..area });
        return;
    }

    let layout = GridLayout::new(area, app.selection);
    for (index, entry) in visible.iter().enumerate() {
        if let Some(cell) = layout.cell(area, index) {
            render_card(frame, p, entry, index == app.selection, cell);
        }
    }
}

fn render_card(frame: &mut Frame, p: &Palette, entry: &ExtensionEntry, selected: bool, area: Rect) {
    let ext = &entry.extension;
    let inner_width = area.width.saturating_sub(4) as usize;

    let switch = if ext.is_active {
        Span::styled("━━● on ", styles::switch_style(p, true))
    } else {
        Span::styled("○━━ off", styles::switch_style(p, false))
    };
    let remove = Span::styled("[d] Remove", styles::muted_style(p));
    let gap = inner_width.saturating_sub(remove.content.len() + 7);

    let lines = vec![
        Line::from(Span::styled(
            truncate_string(&ext.description, inner_width * 2),
            styles::muted_style(p),
        )),
        Line::from(""),
        Line::from(vec![remove, Span::raw(" ".repeat(gap)), switch]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(p, selected))
        .title(Span::styled(
            format!(" {} ", truncate_string(&ext.name, inner_width)),
            styles::title_style(p),
        ))
        .style(styles::card_style(p));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_placeholder(frame: &mut Frame, p: &Palette, area: Rect) {
    let bar = |len: usize| Line::from(Span::styled("░".repeat(len), styles::placeholder_style(p)));
    let width = area.width.saturating_sub(4) as usize;
    let lines = vec![bar(width / 2), bar(width), Line::from(""), bar(width / 3)];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(p, false))
        .style(styles::card_style(p));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let left = format!(" {} ", app.status_message.as_deref().unwrap_or(""));

    let worker = match app.runtime().worker() {
        Some(worker) => format!("worker {} | {} cached", worker.state(), app.cached_entries),
        None => "no worker".to_string(),
    };
    let network = if app.is_online() { "online" } else { "offline" };
    let right = format!(" {} | {} | [q]uit ", worker, network);

    let padding = (area.width as usize)
        .saturating_sub(left.chars().count())
        .saturating_sub(right.chars().count());
    let line = Line::from(vec![
        Span::raw(left),
        Span::raw(" ".repeat(padding)),
        Span::raw(right),
    ]);
    frame.render_widget(Paragraph::new(line).style(styles::status_bar_style(p)), area);
}

fn help_line<'a>(p: &Palette, key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style(p)),
        Span::styled(desc, styles::help_desc_style(p)),
    ])
}

fn render_help_overlay(frame: &mut Frame, p: &Palette) {
    let area = centered_rect_fixed(44, 17, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let lines = vec![
        Line::from(Span::styled(format!("  extshelf {}", version), styles::title_style(p))),
        Line::from(""),
        help_line(p, "1/2/3", "Show all/active/inactive"),
        help_line(p, "↑/↓ j/k", "Move selection"),
        help_line(p, "←/→ h/l", "Move selection"),
        help_line(p, "space", "Toggle extension"),
        help_line(p, "d/Del", "Remove extension"),
        help_line(p, "t", "Toggle theme"),
        help_line(p, "r", "Reload data"),
        help_line(p, "o", "Toggle network"),
        help_line(p, "q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style(p)),
            Span::styled("?", styles::help_key_style(p)),
            Span::styled(" or ", styles::muted_style(p)),
            Span::styled("Esc", styles::help_key_style(p)),
            Span::styled(" to close", styles::muted_style(p)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(p, true))
        .style(styles::card_style(p));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame, p: &Palette) {
    let area = centered_rect_fixed(40, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Are you sure you want to quit?", styles::title_style(p))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style(p)),
            Span::styled("[Y]", styles::help_key_style(p)),
            Span::styled(" to quit, ", styles::muted_style(p)),
            Span::styled("[N]", styles::help_key_style(p)),
            Span::styled(" to cancel", styles::muted_style(p)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(p, true))
        .style(styles::card_style(p));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_columns_follow_width() {
        assert_eq!(GridLayout::new(Rect::new(0, 0, 120, 21), 0).columns, 3);
        assert_eq!(GridLayout::new(Rect::new(0, 0, 20, 21), 0).columns, 1);
    }

    #[test]
    fn test_grid_scrolls_to_selection() {
        let area = Rect::new(0, 0, 76, 14);
        let layout = GridLayout::new(area, 5);
        assert_eq!(layout.columns, 2);
        assert_eq!(layout.visible_rows, 2);
        assert_eq!(layout.first_row, 1);

        assert!(layout.cell(area, 0).is_none());
        assert_eq!(layout.cell(area, 2), Some(Rect::new(0, 0, 38, 7)));
        assert_eq!(layout.cell(area, 5), Some(Rect::new(38, 7, 38, 7)));
        assert!(layout.cell(area, 6).is_none());
    }

    #[test]
    fn test_centered_rect_fits_small_area() {
        let rect = centered_rect_fixed(44, 17, Rect::new(0, 0, 30, 10));
        assert_eq!(rect, Rect::new(0, 0, 30, 10));
    }
}
