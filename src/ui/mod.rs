mod rows;
mod status_bar;
mod styles;

use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;
use std::time::Instant;

/// Render the entire UI
pub fn draw(f: &mut Frame, app: &App, now: Instant) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // active list
            Constraint::Length(1), // status line
        ])
        .split(f.area());

    rows::render_list(f, outer[0], app.current_list());
    status_bar::render_status_bar(f, outer[1], app, now);

    if let Some(ref err) = app.error {
        status_bar::render_error_banner(f, f.area(), err);
    }

    if let Some(ref msg) = app.notification {
        status_bar::render_notification(f, f.area(), msg);
    }
}
