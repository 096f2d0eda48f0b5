//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, BoardFocus};
use crate::auth::AuthProvider;
use crate::export::DocumentRenderer;
use crate::session::View;
use crate::store::DocumentStore;

/// Render the status bar at the bottom of the screen.
pub fn render<A, S, R>(frame: &mut Frame, area: Rect, app: &App<A, S, R>)
where
    A: AuthProvider,
    S: DocumentStore,
    R: DocumentRenderer,
{
    let help_text = match app.session().view() {
        View::Login => "Enter: sign in | Tab: next field | Ctrl+N: create account | Esc: quit",
        View::Signup => "Enter: create account | Tab: next field | Ctrl+N: sign in | Esc: quit",
        View::Board if app.board().modal().is_open() => "y/Enter: confirm | n: cancel | Esc: close",
        View::Board => match app.board_focus {
            BoardFocus::Days => "←→/1-7: day | Tab: next | Ctrl+P: export | Ctrl+L: logout",
            BoardFocus::Form(_) => {
                "Enter: save | Ctrl+G: make slot | Tab: next | Esc: cancel edit | Ctrl+L: logout"
            }
            BoardFocus::List => "↑↓: select | Space: done | e: edit | d: delete | Tab: next",
        },
    };

    let mut spans = vec![
        Span::styled("Timetable v0.1.0", theme::bold()),
        Span::raw(" | "),
    ];
    if let Some(identity) = app.session().identity() {
        spans.push(Span::styled("●", theme::normal().fg(theme::SUCCESS)));
        spans.push(Span::raw(format!(" {} | ", identity.email)));
    }
    match app.notice() {
        Some(notice) => {
            let style = if notice.is_error {
                theme::error()
            } else {
                theme::normal().fg(theme::SUCCESS)
            };
            spans.push(Span::styled(notice.text.clone(), style));
        }
        None => spans.push(Span::styled(help_text, theme::dimmed())),
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
