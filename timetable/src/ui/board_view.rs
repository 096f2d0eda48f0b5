//! Board rendering: day tabs, task form and task list.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs},
};

use timetable_proto::Weekday;

use super::theme;
use crate::app::{App, BoardFocus};
use crate::auth::AuthProvider;
use crate::board::{BoardView, FormField};
use crate::export::DocumentRenderer;
use crate::store::DocumentStore;

/// Render the whole board into `area`.
pub fn render<A, S, R>(frame: &mut Frame, area: Rect, app: &App<A, S, R>)
where
    A: AuthProvider,
    S: DocumentStore,
    R: DocumentRenderer,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Day tabs
            Constraint::Length(8), // Form
            Constraint::Min(3),    // Task list
        ])
        .split(area);

    render_days(frame, chunks[0], app);
    render_form(frame, chunks[1], app);
    render_list(frame, chunks[2], app);
}

fn border_for(focused: bool) -> Style {
    if focused {
        theme::highlighted()
    } else {
        theme::normal()
    }
}

fn render_days<A, S, R>(frame: &mut Frame, area: Rect, app: &App<A, S, R>)
where
    A: AuthProvider,
    S: DocumentStore,
    R: DocumentRenderer,
{
    let titles: Vec<&str> = Weekday::ALL.iter().map(|d| d.short_name()).collect();
    let tabs = Tabs::new(titles)
        .select(app.board().state().selected_day.index())
        .highlight_style(theme::selected())
        .style(theme::normal())
        .block(
            Block::default()
                .title(Span::styled(
                    " Weekly Study Timetable ",
                    theme::panel_title(theme::ACCENT_DARK),
                ))
                .borders(Borders::ALL)
                .border_style(border_for(app.board_focus == BoardFocus::Days)),
        );
    frame.render_widget(tabs, area);
}

fn render_form<A, S, R>(frame: &mut Frame, area: Rect, app: &App<A, S, R>)
where
    A: AuthProvider,
    S: DocumentStore,
    R: DocumentRenderer,
{
    let state = app.board().state();
    let mut lines: Vec<Line> = FormField::ALL
        .iter()
        .map(|&field| {
            let focused = app.board_focus == BoardFocus::Form(field);
            let cursor = if focused { "▏" } else { "" };
            Line::from(vec![
                Span::styled(format!("{:>8}: ", field.label()), theme::dimmed()),
                Span::styled(
                    format!("{}{cursor}", state.form.field(field)),
                    border_for(focused),
                ),
            ])
        })
        .collect();
    lines.push(Line::from(Span::styled(
        format!(" {} ", state.submit_label),
        theme::selected(),
    )));

    let focused = matches!(app.board_focus, BoardFocus::Form(_));
    let title = if state.is_editing() { " Edit Task " } else { " New Task " };
    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::ACCENT)))
        .borders(Borders::ALL)
        .border_style(border_for(focused));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_list<A, S, R>(frame: &mut Frame, area: Rect, app: &App<A, S, R>)
where
    A: AuthProvider,
    S: DocumentStore,
    R: DocumentRenderer,
{
    let focused = app.board_focus == BoardFocus::List;
    let day = app.board().state().selected_day;
    let block = Block::default()
        .title(Span::styled(
            format!(" {day} "),
            theme::panel_title(theme::ACCENT_DARK),
        ))
        .borders(Borders::ALL)
        .border_style(border_for(focused));

    let view = app.board().view();
    if let Some(message) = view.message() {
        let style = if matches!(view, BoardView::LoadError) {
            theme::error()
        } else {
            theme::dimmed()
        };
        let paragraph = Paragraph::new(message)
            .style(style)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = view
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let checkbox = if row.completed { "[✓]" } else { "[ ]" };
            let text_style = if row.completed {
                theme::completed()
            } else {
                theme::normal()
            };
            let line = Line::from(vec![
                Span::styled(checkbox, text_style),
                Span::raw(" "),
                Span::styled(row.subject.as_str(), text_style.add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", row.time), theme::dimmed()),
                Span::styled(format!("  {}", row.goal), text_style),
                Span::styled("  ✎ ❌", theme::dimmed()),
            ]);
            let style = if focused && idx == app.selected_row {
                theme::selected()
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
