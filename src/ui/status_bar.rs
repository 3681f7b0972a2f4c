use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Instant;

use super::styles;
use crate::app::{App, InputMode};

/// Watcher, chord and whitespace indicators, e.g. `# g W`
pub fn indicators(watching: bool, ready: bool, chord: Option<char>, ignore_ws: bool) -> String {
    let watcher = match (watching, ready) {
        (false, _) => ' ',
        (true, false) => '-',
        (true, true) => '#',
    };
    format!(
        "{} {} {}",
        watcher,
        chord.unwrap_or(' '),
        if ignore_ws { 'W' } else { ' ' }
    )
}

/// Bottom line: range/path (or the search prompt), indicators, position
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &App, now: Instant) {
    let right = indicators(
        app.watching,
        app.watcher_ready,
        app.active_chord(now),
        app.diff.options.ignore_whitespace,
    );
    let position = app.status_position();

    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(right.chars().count() as u16 + 2),
            Constraint::Length(position.len() as u16 + 2),
        ])
        .split(area);

    let left = match app.input_mode {
        InputMode::Search => Line::from(vec![
            Span::styled(" /", Style::default().fg(styles::YELLOW).add_modifier(Modifier::BOLD)),
            Span::styled(app.search_input.clone(), Style::default().fg(styles::TEXT)),
            Span::styled("█", Style::default().fg(styles::YELLOW)),
        ]),
        InputMode::Normal => Line::from(vec![
            Span::styled(
                format!(" {} ", app.current_view().label()),
                Style::default()
                    .fg(styles::BG)
                    .bg(styles::BLUE)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {}", app.status_left()), Style::default().fg(styles::BRIGHT)),
        ]),
    };
    f.render_widget(Paragraph::new(left).style(styles::panel_style()), parts[0]);

    let right = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", right),
        Style::default().fg(styles::GREEN).add_modifier(Modifier::BOLD),
    )))
    .style(styles::panel_style());
    f.render_widget(right, parts[1]);

    let position = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", position),
        Style::default().fg(styles::MUTED),
    )))
    .style(styles::panel_style());
    f.render_widget(position, parts[2]);
}

/// Full-width error line drawn just above the status bar
pub fn render_error_banner(f: &mut Frame, area: Rect, message: &str) {
    if area.height < 2 {
        return;
    }
    let banner_area = Rect {
        x: area.x,
        y: area.y + area.height - 2,
        width: area.width,
        height: 1,
    };
    let first_line = message.lines().next().unwrap_or_default();
    let banner = Paragraph::new(Line::from(vec![
        Span::styled(" ✗ ", styles::error_style()),
        Span::styled(first_line.to_string(), styles::error_style()),
    ]))
    .style(styles::error_style());
    f.render_widget(banner, banner_area);
}

/// Transient message in the top-right corner
pub fn render_notification(f: &mut Frame, area: Rect, message: &str) {
    let notif_width = message.chars().count() as u16 + 4;
    let notif_x = area.x + area.width.saturating_sub(notif_width + 2);
    let notif_y = area.y + 1.min(area.height.saturating_sub(1));

    let notif_area = Rect {
        x: notif_x,
        y: notif_y,
        width: notif_width.min(area.width),
        height: 1,
    };

    let notif = Paragraph::new(Line::from(vec![
        Span::styled(" ● ", Style::default().fg(styles::GREEN)),
        Span::styled(message.to_string(), Style::default().fg(styles::TEXT)),
        Span::raw(" "),
    ]))
    .style(styles::panel_style());

    f.render_widget(notif, notif_area);
}
