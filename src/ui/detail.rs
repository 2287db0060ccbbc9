use crate::app::App;
use crate::models::Snippet;
use crate::ui::library::code_lines;
use crate::ui::theme::{self, Palette};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use uuid::Uuid;

pub fn render(frame: &mut Frame, area: Rect, app: &App, id: Uuid) {
    let Some(snippet) = app.session.store.find_snippet(&id) else {
        return;
    };

    let header = header_lines(app, snippet);
    let chunks = Layout::vertical([
        Constraint::Length(header.len() as u16 + 2),
        Constraint::Fill(1),
    ])
    .split(area);

    let info = Paragraph::new(header).block(
        Block::bordered()
            .title(Span::styled(
                format!(" {} ", snippet.title),
                Style::default().fg(Palette::IRIS).bold(),
            ))
            .border_type(BorderType::Rounded)
            .border_style(theme::border()),
    );
    frame.render_widget(info, chunks[0]);

    let total = snippet.get_line_count();
    let scroll = app.content_scroll.min(total.saturating_sub(1));
    let code = Paragraph::new(code_lines(snippet, scroll)).block(
        Block::bordered()
            .title(Span::styled(
                format!(" {} ", snippet.file_name()),
                Style::default().fg(Palette::FOAM),
            ))
            .border_type(BorderType::Rounded)
            .border_style(theme::border()),
    );
    frame.render_widget(code, chunks[1]);

    if total > chunks[1].height as usize {
        let mut state = ScrollbarState::new(total).position(scroll);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            chunks[1],
            &mut state,
        );
    }
}

fn label(name: &str) -> Span<'static> {
    Span::styled(format!("{:<12}", name), Style::default().fg(Palette::SUBTLE))
}

fn header_lines(app: &App, snippet: &Snippet) -> Vec<Line<'static>> {
    let store = &app.session.store;
    let owner = if snippet.user_id == store.current_user() {
        "you".to_string()
    } else {
        snippet.user_id.clone()
    };
    let collection = snippet
        .collection_id
        .and_then(|id| store.find_collection(&id))
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "Home".to_string());

    let mut flags = vec![if snippet.is_public { "public" } else { "private" }];
    if snippet.is_favorite {
        flags.push("favorite");
    }

    let mut lines = vec![
        Line::from(vec![
            label("Language"),
            Span::styled(
                snippet.language.display_name().to_string(),
                Style::default().fg(Palette::FOAM),
            ),
            Span::raw("   "),
            label("Owner"),
            Span::raw(owner),
        ]),
        Line::from(vec![
            label("Collection"),
            Span::raw(collection),
            Span::raw("   "),
            label("Visibility"),
            Span::styled(flags.join(", "), Style::default().fg(Palette::GOLD)),
        ]),
    ];

    let tags = store.tag_names(snippet);
    if !tags.is_empty() {
        let tags: Vec<String> = tags.iter().map(|t| format!("#{}", t)).collect();
        lines.push(Line::from(vec![
            label("Tags"),
            Span::styled(tags.join(" "), Style::default().fg(Palette::IRIS)),
        ]));
    }

    let mut lineage = Vec::new();
    if let Some(original_id) = snippet.forked_from {
        let origin = store
            .find_snippet(&original_id)
            .map(|s| format!("{} ({})", s.title, s.user_id))
            .unwrap_or_else(|| "a deleted snippet".to_string());
        lineage.push(Span::styled(
            format!("forked from {}   ", origin),
            Style::default().fg(Palette::PINE),
        ));
    }
    lineage.push(Span::styled(
        format!("⑂ {} forks", snippet.fork_count),
        Style::default().fg(Palette::PINE),
    ));
    lines.push(Line::from(
        std::iter::once(label("Forks")).chain(lineage).collect::<Vec<_>>(),
    ));

    lines.push(Line::from(vec![
        label("Updated"),
        Span::styled(
            snippet.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            Style::default().fg(Palette::MUTED),
        ),
    ]));
    lines
}
