//! Theme and styling constants for the TUI.

use ratatui::style::{Color, Modifier, Style};

use crate::modal::ConfirmKind;

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Accent used for headings and the focused border.
pub const ACCENT: Color = Color::Rgb(160, 116, 196);

/// Darker accent for day headings.
pub const ACCENT_DARK: Color = Color::Rgb(123, 76, 160);

/// Success indicator color.
pub const SUCCESS: Color = Color::Green;

/// Warning indicator color.
pub const WARNING: Color = Color::Yellow;

/// Error indicator color.
pub const ERROR: Color = Color::Red;

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (hints, placeholders).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted text style (focused borders and fields).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

/// Selected item style (in lists and tabs).
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

/// Completed task text (struck through, dim).
#[must_use]
pub fn completed() -> Style {
    Style::default()
        .fg(FG_SECONDARY)
        .add_modifier(Modifier::CROSSED_OUT)
}

/// Error text.
#[must_use]
pub fn error() -> Style {
    Style::default().fg(ERROR)
}

/// Border and title accent for a confirmation kind.
#[must_use]
pub const fn confirm_accent(kind: ConfirmKind) -> Color {
    match kind {
        ConfirmKind::Delete => ERROR,
        ConfirmKind::Edit => ACCENT,
        ConfirmKind::Logout => WARNING,
    }
}

/// Style for the status bar background (dark background with white foreground).
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Style for panel titles with a given color (bold).
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
