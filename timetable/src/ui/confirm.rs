//! Confirmation popup rendering.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::{centered, theme};
use crate::modal::ConfirmRequest;

/// Popup size in cells.
const POPUP_WIDTH: u16 = 56;
const POPUP_HEIGHT: u16 = 8;

/// Where the popup is drawn within `area`. Clicks outside it count as
/// outside clicks.
#[must_use]
pub fn popup_area(area: Rect) -> Rect {
    centered(area, POPUP_WIDTH, POPUP_HEIGHT)
}

/// Render the confirmation popup over `area`.
pub fn render(frame: &mut Frame, area: Rect, request: &ConfirmRequest) {
    let popup = popup_area(area);
    let accent = theme::confirm_accent(request.kind);

    let block = Block::default()
        .title(Span::styled(
            format!(" {} {} ", request.kind.icon(), request.title),
            theme::panel_title(accent),
        ))
        .borders(Borders::ALL)
        .border_style(theme::normal().fg(accent));

    let buttons = Line::from(vec![
        Span::styled(format!("[y/Enter] {}", request.confirm_label), theme::bold().fg(accent)),
        Span::raw("   "),
        Span::styled(format!("[n/Esc] {}", request.cancel_label), theme::dimmed()),
    ]);

    let text = vec![
        Line::from(request.message.as_str()),
        Line::from(""),
        buttons,
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}
