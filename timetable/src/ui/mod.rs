//! Terminal UI rendering.

pub mod auth_view;
pub mod board_view;
pub mod confirm;
pub mod status_bar;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
};

use crate::app::App;
use crate::auth::AuthProvider;
use crate::export::DocumentRenderer;
use crate::session::View;
use crate::store::DocumentStore;

/// Main draw function for the entire UI.
pub fn draw<A, S, R>(frame: &mut Frame, app: &App<A, S, R>)
where
    A: AuthProvider,
    S: DocumentStore,
    R: DocumentRenderer,
{
    // Content above, status bar at bottom
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let content_area = main_chunks[0];
    let status_area = main_chunks[1];

    if app.session().loading_visible() {
        let loading = Paragraph::new("Loading...")
            .style(theme::dimmed())
            .alignment(Alignment::Center);
        frame.render_widget(loading, centered(content_area, 30, 1));
    } else {
        match app.session().view() {
            View::Login | View::Signup => auth_view::render(frame, content_area, app),
            View::Board => {
                board_view::render(frame, content_area, app);
                if let Some(request) = app.board().modal().request() {
                    confirm::render(frame, content_area, request);
                }
            }
        }
    }

    status_bar::render(frame, status_area, app);
}

/// A `width` x `height` rectangle centered in `area`, clipped to it.
#[must_use]
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
