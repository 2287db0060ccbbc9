use crate::app::{App, View};
use crate::models::{Collection, Snippet};
use crate::store::SnippetScope;
use crate::ui::theme::{self, Palette};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, List, ListItem, ListState, Paragraph, Wrap},
};

/// List on the left, preview of the selection on the right
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::horizontal([Constraint::Percentage(40), Constraint::Fill(1)]).split(area);

    match app.view {
        View::Library => {
            render_collections(frame, chunks[0], app);
            render_collection_preview(frame, chunks[1], app);
        }
        View::Snippets(scope) => {
            render_snippets(frame, chunks[0], app, &scope);
            render_snippet_preview(frame, chunks[1], app, app.selected_snippet());
        }
        View::Explore => {
            render_explore(frame, chunks[0], app);
            render_snippet_preview(frame, chunks[1], app, app.selected_snippet());
        }
        View::Search => {
            render_search(frame, chunks[0], app);
            render_snippet_preview(frame, chunks[1], app, app.selected_snippet());
        }
        View::Detail(_) => {}
    }
}

fn list_block(title: String, badge: Option<Span<'static>>) -> Block<'static> {
    let mut spans = vec![Span::styled(title, Style::default().fg(Palette::IRIS).bold())];
    spans.extend(badge);
    Block::bordered()
        .title(Line::from(spans))
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
}

fn render_list(frame: &mut Frame, area: Rect, block: Block, items: Vec<ListItem>, selected: usize) {
    if items.is_empty() {
        let empty = Paragraph::new("Nothing here yet")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Palette::MUTED))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::selected_row())
        .highlight_symbol("▌ ");
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn collection_line(app: &App, collection: &Collection) -> Line<'static> {
    let count = app
        .session
        .store
        .collection_snippet_count(&collection.reference(), None);
    let (icon, color) = match collection {
        Collection::Favorites(_) => ("★ ", Palette::LOVE),
        Collection::Named(c) => ("● ", theme::hex_color(&c.color)),
    };
    Line::from(vec![
        Span::styled(icon, Style::default().fg(color)),
        Span::styled(collection.name().to_string(), Style::default().fg(Palette::TEXT)),
        Span::styled(format!("  {}", count), Style::default().fg(Palette::MUTED)),
    ])
}

fn render_collections(frame: &mut Frame, area: Rect, app: &App) {
    let list = &app.collections;
    let mut items: Vec<ListItem> = list
        .items()
        .iter()
        .map(|c| ListItem::new(collection_line(app, c)))
        .collect();

    let unfiled = app.session.store.unfiled_snippets(None).len();
    items.push(ListItem::new(Line::from(vec![
        Span::styled("⌂ ", Style::default().fg(Palette::FOAM)),
        Span::styled("Home", Style::default().fg(Palette::TEXT)),
        Span::styled(format!("  {}", unfiled), Style::default().fg(Palette::MUTED)),
    ])));

    let block = list_block(
        " Collections ".to_string(),
        theme::order_badge(list.state(), list.last_error()),
    );
    render_list(frame, area, block, items, app.selected);
}

fn snippet_line(snippet: &Snippet, owner: Option<&str>) -> Line<'static> {
    let mut spans = vec![
        Span::styled(snippet.title.clone(), Style::default().fg(Palette::TEXT)),
        Span::styled(
            format!("  {}", snippet.language.short_name()),
            Style::default().fg(Palette::FOAM),
        ),
    ];
    if snippet.is_favorite {
        spans.push(Span::styled(" ★", Style::default().fg(Palette::LOVE)));
    }
    if snippet.is_public {
        spans.push(Span::styled(" ◆", Style::default().fg(Palette::GOLD)));
    }
    if snippet.is_fork() {
        spans.push(Span::styled(" ⑂", Style::default().fg(Palette::IRIS)));
    }
    if let Some(owner) = owner {
        spans.push(Span::styled(
            format!("  {} · ⑂ {}", owner, snippet.fork_count),
            Style::default().fg(Palette::MUTED),
        ));
    }
    Line::from(spans)
}

fn render_snippets(frame: &mut Frame, area: Rect, app: &App, scope: &SnippetScope) {
    let list = &app.snippets;
    let items: Vec<ListItem> = list
        .items()
        .iter()
        .map(|s| ListItem::new(snippet_line(s, None)))
        .collect();

    let block = list_block(
        format!(" {} ", app.scope_title(scope)),
        theme::order_badge(list.state(), list.last_error()),
    );
    render_list(frame, area, block, items, app.selected);
}

fn render_explore(frame: &mut Frame, area: Rect, app: &App) {
    let store = &app.session.store;
    let me = store.current_user();
    let items: Vec<ListItem> = app
        .explore_ids
        .iter()
        .filter_map(|id| store.find_snippet(id))
        .map(|s| {
            let owner = if s.user_id == me { "you" } else { s.user_id.as_str() };
            ListItem::new(snippet_line(s, Some(owner)))
        })
        .collect();

    let filter = &app.explore_filter;
    let mut title = " Explore ".to_string();
    if !filter.query.is_empty() || filter.language.is_some() {
        let language = filter
            .language
            .as_ref()
            .map(|l| format!(" [{}]", l.display_name()))
            .unwrap_or_default();
        title = format!(" Explore: {}{} ", filter.query, language);
    }
    render_list(frame, area, list_block(title, None), items, app.selected);
}

fn render_search(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .search_hits
        .iter()
        .map(|hit| {
            ListItem::new(vec![
                Line::from(Span::styled(hit.title.clone(), Style::default().fg(Palette::TEXT))),
                Line::from(Span::styled(
                    format!("  {}", hit.kind.context()),
                    Style::default().fg(Palette::MUTED),
                )),
            ])
        })
        .collect();

    let title = format!(" {} results for '{}' ", app.search_hits.len(), app.search_query);
    render_list(frame, area, list_block(title, None), items, app.selected);
}

fn preview_block(title: String) -> Block<'static> {
    Block::bordered()
        .title(Span::styled(title, Style::default().fg(Palette::FOAM)))
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
}

fn render_collection_preview(frame: &mut Frame, area: Rect, app: &App) {
    let store = &app.session.store;
    let (title, snippets) = match app.selected_collection() {
        Some(collection) => (
            collection.name().to_string(),
            store.get_snippets_for_collection(&collection.reference(), None),
        ),
        None => ("Home".to_string(), store.unfiled_snippets(None)),
    };

    let lines: Vec<Line> = if snippets.is_empty() {
        vec![Line::from(Span::styled(
            "No snippets. Press n to create one.",
            Style::default().fg(Palette::MUTED),
        ))]
    } else {
        snippets.iter().map(|s| snippet_line(s, None)).collect()
    };

    let preview = Paragraph::new(lines).block(preview_block(format!(" {} ", title)));
    frame.render_widget(preview, area);
}

/// Numbered content lines starting at `scroll`
pub fn code_lines(snippet: &Snippet, scroll: usize) -> Vec<Line<'static>> {
    let width = snippet.get_line_count().max(1).to_string().len();
    snippet
        .content
        .lines()
        .enumerate()
        .skip(scroll)
        .map(|(i, line)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>width$} │ ", i + 1, width = width),
                    Style::default().fg(Palette::MUTED),
                ),
                Span::styled(line.to_string(), Style::default().fg(Palette::TEXT)),
            ])
        })
        .collect()
}

fn render_snippet_preview(frame: &mut Frame, area: Rect, app: &App, snippet: Option<&Snippet>) {
    let Some(snippet) = snippet else {
        frame.render_widget(preview_block(" Preview ".to_string()), area);
        return;
    };

    let mut lines = code_lines(snippet, app.content_scroll);
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Empty snippet. Press e to edit.",
            Style::default().fg(Palette::MUTED),
        )));
    }
    let preview = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(preview_block(format!(" {} ", snippet.file_name())));
    frame.render_widget(preview, area);
}
