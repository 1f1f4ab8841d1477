//! Markup for the grid and the controls around it.
//!
//! Every function here is pure: data in, markup out. The grid is always
//! replaced wholesale.

use crate::models::{ExtensionEntry, Filter};
use crate::utils::escape_html;

use super::document::Document;

pub const EMPTY_MESSAGE: &str = "No extensions found";
pub const FETCH_ERROR_MESSAGE: &str = "Error when trying to fetch data";

/// Grid markup for the given entries, in order.
pub fn render_html<'a>(entries: impl IntoIterator<Item = &'a ExtensionEntry>) -> String {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| render_card(index, entry))
        .collect()
}

fn render_card(index: usize, entry: &ExtensionEntry) -> String {
    let ext = &entry.extension;
    let name = escape_html(&ext.name);
    let id = entry.id;
    let checked = if ext.is_active { " checked" } else { "" };

    format!(
        r#"<div class="extension" data-index="{index}" data-id="{id}">
  <div class="extension-info">
    <img src="{logo}" alt="{name} logo" width="48" height="48" loading="lazy" decoding="async">
    <div>
      <h2>{name}</h2>
      <p class="extension-description">{description}</p>
    </div>
  </div>
  <div class="extension-options">
    <button class="remove-btn" type="button" data-index="{index}" data-id="{id}" aria-label="Remove {name} extension">Remove</button>
    <label class="switch" aria-label="Toggle {name} extension">
      <input type="checkbox" data-id="{id}"{checked} aria-label="Enable or disable {name}">
      <span class="slider"></span>
    </label>
  </div>
</div>
"#,
        logo = escape_html(&ext.logo),
        description = escape_html(&ext.description),
    )
}

/// Fixed-shape skeleton cells that hold the layout while data loads.
pub fn placeholders_html(count: usize) -> String {
    const PLACEHOLDER: &str = r#"<div class="extension-placeholder" aria-hidden="true" style="min-height: 160px;">
  <div class="placeholder-header">
    <div class="placeholder-logo"></div>
    <div class="placeholder-text">
      <div class="placeholder-title"></div>
      <div class="placeholder-line"></div>
    </div>
  </div>
  <div class="placeholder-footer">
    <div class="placeholder-button"></div>
    <div class="placeholder-switch"></div>
  </div>
</div>
"#;
    PLACEHOLDER.repeat(count)
}

pub fn empty_html() -> String {
    format!(r#"<div class="grid-message"><p>{}</p></div>"#, EMPTY_MESSAGE)
}

pub fn fetch_error_html() -> String {
    format!(r#"<p class="grid-message">{}</p>"#, FETCH_ERROR_MESSAGE)
}

/// The three filter controls, with the selected one marked.
pub fn filter_bar_html(active: Filter) -> String {
    let buttons: String = Filter::ALL
        .iter()
        .map(|filter| {
            let selected = *filter == active;
            format!(
                r#"<button id="filter-{value}" class="filter-btn{class}" type="button" aria-pressed="{selected}">{label}</button>"#,
                value = filter.as_str(),
                class = if selected { " active" } else { "" },
                label = filter.label(),
            )
        })
        .collect();
    format!(r#"<nav class="filters">{}</nav>"#, buttons)
}

/// Whole-page markup: root theme attribute, theme toggle, filters and grid.
pub fn document_html(document: &Document) -> String {
    format!(
        r#"<body data-theme="{theme}">
<header><h1>Extensions List</h1><button id="toggle-theme-btn" type="button" aria-label="Toggle theme">Theme</button></header>
{filters}
<main id="grid">
{grid}</main>
</body>
"#,
        theme = document.data_theme(),
        filters = filter_bar_html(document.active_filter),
        grid = document.grid,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Extension, ExtensionId, Theme};

    fn entry(id: u64, name: &str, active: bool) -> ExtensionEntry {
        ExtensionEntry {
            id: ExtensionId(id),
            extension: Extension::new(name, format!("{name} description"), format!("./{name}.svg"), active),
        }
    }

    #[test]
    fn test_one_cell_per_entry_in_order() {
        let entries = vec![entry(7, "DevLens", true), entry(9, "StyleSpy", false)];
        let html = render_html(&entries);

        assert_eq!(html.matches(r#"<div class="extension" "#).count(), 2);
        let first = html.find("DevLens").unwrap();
        let second = html.find("StyleSpy").unwrap();
        assert!(first < second);
        assert!(html.contains(r#"data-index="0" data-id="7""#));
        assert!(html.contains(r#"data-index="1" data-id="9""#));
    }

    #[test]
    fn test_cell_contents() {
        let html = render_html(&[entry(1, "DevLens", true)]);
        assert!(html.contains(r#"<img src="./DevLens.svg" alt="DevLens logo" width="48" height="48" loading="lazy" decoding="async">"#));
        assert!(html.contains("<h2>DevLens</h2>"));
        assert!(html.contains(r#"<p class="extension-description">DevLens description</p>"#));
        assert!(html.contains(r#"class="remove-btn""#));
        assert!(html.contains(r#"<input type="checkbox" data-id="1" checked"#));

        let inactive = render_html(&[entry(2, "SpeedBoost", false)]);
        assert!(!inactive.contains(" checked"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render_html(&[entry(1, "<script>alert(1)</script>", true)]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        let entries: Vec<ExtensionEntry> = Vec::new();
        assert_eq!(render_html(&entries), "");
    }

    #[test]
    fn test_placeholders() {
        let html = placeholders_html(9);
        assert_eq!(html.matches("extension-placeholder").count(), 9);
        assert_eq!(placeholders_html(0), "");
    }

    #[test]
    fn test_filter_bar_marks_selection() {
        let html = filter_bar_html(Filter::Inactive);
        assert!(html.contains(r#"id="filter-inactive" class="filter-btn active" type="button" aria-pressed="true""#));
        assert!(html.contains(r#"id="filter-all" class="filter-btn" type="button" aria-pressed="false""#));
        assert_eq!(html.matches(" active\"").count(), 1);
    }

    #[test]
    fn test_document_html_carries_theme() {
        let document = Document {
            grid: empty_html(),
            theme: Theme::Dark,
            active_filter: Filter::All,
        };
        let html = document_html(&document);
        assert!(html.starts_with(r#"<body data-theme="dark">"#));
        assert!(html.contains(EMPTY_MESSAGE));
    }
}
