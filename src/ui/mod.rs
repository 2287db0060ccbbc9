//! Terminal rendering. Views only read [`App`]; every change goes through the
//! key handlers.

pub mod components;
pub mod detail;
pub mod library;
pub mod theme;

use crate::app::{App, InputMode, View};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout},
    style::{Style, Stylize},
    text::Span,
    widgets::{Block, BorderType},
};
use theme::Palette;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let block = Block::bordered()
        .title(Span::styled(" 󱃖 snippy ", Style::default().fg(Palette::IRIS).bold()))
        .title_alignment(Alignment::Center)
        .border_type(BorderType::Rounded)
        .border_style(theme::border());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).split(inner);
    match app.view {
        View::Detail(id) => detail::render(frame, chunks[0], app, id),
        _ => library::render(frame, chunks[0], app),
    }
    components::render_bottom_bar(frame, chunks[1], app);

    if app.confirmation.is_some() {
        components::render_confirmation(frame, area, app);
    } else if app.input_mode == InputMode::HelpMenu {
        components::render_help(frame, area);
    } else if app.input_mode != InputMode::Normal {
        components::render_input(frame, area, app);
    }
}
