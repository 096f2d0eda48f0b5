//! Login and signup form rendering.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{centered, theme};
use crate::app::{App, AuthField};
use crate::auth::AuthProvider;
use crate::export::DocumentRenderer;
use crate::session::View;
use crate::store::DocumentStore;

/// Render the login or signup form, whichever view is current.
pub fn render<A, S, R>(frame: &mut Frame, area: Rect, app: &App<A, S, R>)
where
    A: AuthProvider,
    S: DocumentStore,
    R: DocumentRenderer,
{
    let signup = app.session().view() == View::Signup;
    let (title, link) = if signup {
        ("Create Account", "Already have an account? Ctrl+N to sign in")
    } else {
        ("Sign In", "No account yet? Ctrl+N to create one")
    };
    let form = &app.auth_form;
    let masked = "•".repeat(form.password.chars().count());

    let field = |label: &'static str, value: &str, focused: bool| {
        let style = if focused {
            theme::highlighted()
        } else {
            theme::normal()
        };
        let cursor = if focused { "▏" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:>9}: "), theme::dimmed()),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    };

    let control = app.session().submit_control();
    let button_style = if control.disabled {
        theme::dimmed()
    } else {
        theme::selected()
    };

    let lines = vec![
        Line::from(""),
        field("Email", &form.email, form.focus == AuthField::Email),
        Line::from(""),
        field("Password", &masked, form.focus == AuthField::Password),
        Line::from(""),
        Line::from(Span::styled(format!(" {} ", control.label), button_style)),
        Line::from(""),
        Line::from(Span::styled(link, theme::dimmed())),
    ];

    let block = Block::default()
        .title(Span::styled(
            format!(" Weekly Study Timetable | {title} "),
            theme::panel_title(theme::ACCENT),
        ))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, centered(area, 60, 11));
}
