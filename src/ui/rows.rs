use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::styles;
use crate::app::{Cell, ListSource, Row};
use crate::git::{ChangeKind, LineType};

/// Everything a row renderer needs to know about where and how it is drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowContext {
    /// Columns available
    pub width: usize,
    /// Row under the cursor
    pub selected: bool,
    /// Row carrying the range mark
    pub marked: bool,
    /// Last search match in a scrolling list
    pub hit: bool,
}

fn cell_style(cell: Cell) -> Style {
    match cell {
        Cell::Marker => Style::default().fg(styles::ORANGE).add_modifier(Modifier::BOLD),
        Cell::Hash => Style::default().fg(styles::YELLOW),
        Cell::Age => Style::default().fg(styles::MUTED),
        Cell::Author => Style::default().fg(styles::BLUE),
        Cell::Branch => Style::default().fg(styles::GREEN).add_modifier(Modifier::BOLD),
        Cell::Tag => Style::default().fg(styles::PURPLE).add_modifier(Modifier::BOLD),
        Cell::Ref => Style::default().fg(styles::RED),
        Cell::Subject => Style::default().fg(styles::TEXT),
        Cell::Kind(ChangeKind::Added) => styles::status_added(),
        Cell::Kind(ChangeKind::Deleted) => styles::status_deleted(),
        Cell::Kind(ChangeKind::Modified) => styles::status_modified(),
        Cell::Kind(ChangeKind::Renamed) => styles::status_renamed(),
        Cell::Path => Style::default().fg(styles::BRIGHT),
        Cell::Counts => styles::dim_style(),
        Cell::Diff(LineType::Add) => styles::add_style(),
        Cell::Diff(LineType::Delete) => styles::del_style(),
        Cell::Diff(LineType::Hunk) => styles::hunk_header_style(),
        Cell::Diff(LineType::Context) => Style::default().fg(styles::TEXT),
    }
}

/// Longest prefix of `text` that fits in `room` terminal columns, with its width
fn clip(text: String, room: usize) -> (String, usize) {
    let width = text.width();
    if width <= room {
        return (text, width);
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > room {
            break;
        }
        used += w;
        out.push(ch);
    }
    (out, used)
}

/// Style the pieces of one row and clip them to `ctx.width` terminal columns.
/// A selected row is padded so its highlight spans the full width.
pub fn render_row(row: Row, ctx: &RowContext) -> Line<'static> {
    let mut spans = Vec::with_capacity(row.len() + 1);
    let mut used = 0usize;

    for (cell, text) in row {
        if used >= ctx.width {
            break;
        }
        let (text, width) = clip(text, ctx.width - used);
        used += width;

        let mut style = cell_style(cell);
        if ctx.marked && cell == Cell::Hash {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if ctx.selected {
            style = style.bg(styles::SELECTED_BG);
        }
        if ctx.hit {
            style = style.patch(styles::search_hit_style());
        }
        spans.push(Span::styled(text, style));
    }

    if ctx.selected && used < ctx.width {
        spans.push(Span::styled(" ".repeat(ctx.width - used), styles::selected_style()));
    }
    Line::from(spans)
}

/// Draw the visible window of `list`, or its placeholder when empty
pub fn render_list(f: &mut Frame, area: Rect, list: &dyn ListSource) {
    let viewport = list.viewport();
    if viewport.count() == 0 {
        let empty = Paragraph::new(Line::from(Span::styled(
            format!("  {}", list.empty_text()),
            styles::dim_style(),
        )))
        .style(styles::default_style());
        f.render_widget(empty, area);
        return;
    }

    let lines: Vec<Line> = viewport
        .visible()
        .map(|i| {
            let ctx = RowContext {
                width: viewport.width(),
                selected: viewport.cursor() == Some(i),
                marked: viewport.marked() == Some(i),
                hit: viewport.hit() == Some(i),
            };
            render_row(list.row(i), &ctx)
        })
        .collect();

    f.render_widget(Paragraph::new(lines).style(styles::default_style()), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn change_row() -> Row {
        vec![
            (Cell::Kind(ChangeKind::Added), "A ".to_string()),
            (Cell::Path, "src/main.rs".to_string()),
            (Cell::Counts, "  +3 -0".to_string()),
        ]
    }

    #[test]
    fn row_fits_width_unchanged() {
        let ctx = RowContext {
            width: 80,
            ..Default::default()
        };
        let line = render_row(change_row(), &ctx);
        assert_eq!(plain(&line), "A src/main.rs  +3 -0");
        assert_eq!(line.spans.len(), 3);
    }

    #[test]
    fn row_is_clipped_to_width() {
        let ctx = RowContext {
            width: 7,
            ..Default::default()
        };
        let line = render_row(change_row(), &ctx);
        assert_eq!(plain(&line), "A src/m");
        assert_eq!(line.spans.len(), 2);
    }

    #[test]
    fn wide_chars_clip_by_column() {
        let ctx = RowContext {
            width: 5,
            selected: true,
            ..Default::default()
        };
        let line = render_row(vec![(Cell::Path, "日本語.rs".to_string())], &ctx);
        assert_eq!(plain(&line), "日本 ");
        assert_eq!(plain(&line).width(), 5);
    }

    #[test]
    fn clipping_counts_columns_not_bytes() {
        let ctx = RowContext {
            width: 4,
            ..Default::default()
        };
        let row = vec![(Cell::Marker, "▶ ".to_string()), (Cell::Hash, "abcdef".to_string())];
        assert_eq!(plain(&render_row(row, &ctx)), "▶ ab");
    }

    #[test]
    fn selected_row_is_padded_and_highlighted() {
        let ctx = RowContext {
            width: 30,
            selected: true,
            ..Default::default()
        };
        let line = render_row(change_row(), &ctx);
        assert_eq!(plain(&line).chars().count(), 30);
        assert!(line.spans.iter().all(|s| s.style.bg == Some(styles::SELECTED_BG)));
    }

    #[test]
    fn kind_letter_colored_by_kind() {
        let ctx = RowContext {
            width: 80,
            ..Default::default()
        };
        let line = render_row(change_row(), &ctx);
        assert_eq!(line.spans[0].style.fg, Some(styles::GREEN));
    }

    #[test]
    fn diff_lines_use_diff_palette() {
        let ctx = RowContext {
            width: 80,
            ..Default::default()
        };
        let add = render_row(vec![(Cell::Diff(LineType::Add), "+x".into())], &ctx);
        let del = render_row(vec![(Cell::Diff(LineType::Delete), "-x".into())], &ctx);
        assert_eq!(add.spans[0].style.bg, Some(styles::ADD_BG));
        assert_eq!(del.spans[0].style.bg, Some(styles::DEL_BG));
    }

    #[test]
    fn search_hit_overrides_background() {
        let ctx = RowContext {
            width: 80,
            hit: true,
            ..Default::default()
        };
        let line = render_row(vec![(Cell::Diff(LineType::Add), "+x".into())], &ctx);
        assert_eq!(line.spans[0].style.bg, Some(styles::HIT_BG));
    }

    #[test]
    fn zero_width_renders_nothing() {
        let ctx = RowContext {
            width: 0,
            selected: true,
            ..Default::default()
        };
        assert!(render_row(change_row(), &ctx).spans.is_empty());
    }
}
