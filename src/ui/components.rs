//! Status line, dialogs and overlays shared by every view.

use crate::app::{App, Confirmation, InputMode, View};
use crate::models::CollectionRef;
use crate::store::SnippetScope;
use crate::ui::theme::{self, Palette};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Paragraph, Wrap},
};

/// Breadcrumbs (or the current notification) on the left, shortcuts on the right
pub fn render_bottom_bar(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).split(area);

    let left = match &app.notification {
        Some(notification) => {
            let color = if notification.is_error {
                Palette::LOVE
            } else {
                Palette::FOAM
            };
            Line::from(vec![
                Span::styled(format!(" {} ", notification.message), Style::default().fg(color)),
                Span::styled("[Esc]", Style::default().fg(Palette::MUTED)),
            ])
        }
        None => breadcrumbs(app),
    };

    frame.render_widget(
        Paragraph::new(left).block(bar_block()),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(shortcuts(app))
            .alignment(Alignment::Right)
            .style(Style::default().fg(Palette::MUTED))
            .block(bar_block()),
        chunks[1],
    );
}

fn bar_block() -> Block<'static> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
}

fn crumb(text: String, current: bool) -> Span<'static> {
    if current {
        Span::styled(text, Style::default().fg(Palette::BASE).bg(Palette::IRIS))
    } else {
        Span::styled(text, Style::default().fg(Palette::SUBTLE))
    }
}

fn breadcrumbs(app: &App) -> Line<'static> {
    let mut spans = vec![crumb(" 󰋜 Library ".to_string(), app.view == View::Library)];
    let separator = || Span::styled(" ❯ ", Style::default().fg(Palette::MUTED));

    match app.view {
        View::Library => {}
        View::Snippets(scope) => {
            spans.push(separator());
            spans.push(crumb(format!(" {} ", app.scope_title(&scope)), true));
        }
        View::Explore => {
            spans.push(separator());
            spans.push(crumb(" Explore ".to_string(), true));
        }
        View::Search => {
            spans.push(separator());
            spans.push(crumb(" Search ".to_string(), true));
        }
        View::Detail(id) => {
            spans.push(separator());
            let title = app
                .session
                .store
                .find_snippet(&id)
                .map(|s| s.title.clone())
                .unwrap_or_default();
            spans.push(crumb(format!(" {} ", title), true));
        }
    }

    if app.is_busy() {
        spans.push(Span::styled("  ◌ syncing", Style::default().fg(Palette::FOAM)));
    }
    if app.is_guest() {
        spans.push(Span::styled("  guest", Style::default().fg(Palette::MUTED)));
    }
    Line::from(spans)
}

fn shortcuts(app: &App) -> String {
    match (&app.input_mode, app.view) {
        (InputMode::HelpMenu, _) => " [Esc] Close ".to_string(),
        (InputMode::Normal, View::Library) => {
            " [⏎] Open │ [J/K] Move │ [s] Save │ [r] Reset │ [c] Collection │ [n] Snippet │ [?] Help "
                .to_string()
        }
        (InputMode::Normal, View::Snippets(SnippetScope::Collection(CollectionRef::Favorites))) => {
            " [⏎] Open │ [f] Unfavorite │ [e] Edit │ [n] New │ [?] Help ".to_string()
        }
        (InputMode::Normal, View::Snippets(_)) => {
            " [⏎] Open │ [J/K] Move │ [x] To end │ [s] Save │ [r] Reset │ [n] New │ [?] Help "
                .to_string()
        }
        (InputMode::Normal, View::Explore) => {
            " [⏎] Open │ [F] Fork │ [L] Filter │ [g] Refresh │ [?] Help ".to_string()
        }
        (InputMode::Normal, View::Search) => " [⏎] Open │ [/] New search │ [?] Help ".to_string(),
        (InputMode::Normal, View::Detail(_)) => {
            " [e] Edit │ [f] Fav │ [p] Public │ [t] Tags │ [F] Fork │ [d] Delete ".to_string()
        }
        _ => " [⏎] Confirm │ [Esc] Cancel ".to_string(),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn dialog(title: String, color: ratatui::style::Color) -> Block<'static> {
    Block::bordered()
        .title(title)
        .title_alignment(Alignment::Center)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

pub fn render_confirmation(frame: &mut Frame, area: Rect, app: &App) {
    let Some(confirmation) = &app.confirmation else {
        return;
    };
    let store = &app.session.store;
    let question = match confirmation {
        Confirmation::DeleteSnippet(id) => format!(
            "Delete '{}'?",
            store.find_snippet(id).map(|s| s.title.as_str()).unwrap_or("snippet")
        ),
        Confirmation::DeleteCollection(id) => format!(
            "Delete collection '{}'? Its snippets move to Home.",
            store.find_collection(id).map(|c| c.name.as_str()).unwrap_or("")
        ),
        Confirmation::DiscardOrder(_) => "Discard the unsaved order of this list?".to_string(),
        Confirmation::Quit => "Quit with unsaved order changes?".to_string(),
    };

    let popup = centered(area, 56, 7);
    frame.render_widget(Clear, popup);
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(question, Style::default().fg(Palette::TEXT))),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y] ", Style::default().fg(Palette::LOVE).bold()),
            Span::raw("Yes    "),
            Span::styled("[n] ", Style::default().fg(Palette::FOAM).bold()),
            Span::raw("No"),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(dialog(" Confirm ".to_string(), Palette::LOVE)),
        popup,
    );
}

pub fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let (title, hint) = match &app.input_mode {
        InputMode::NewSnippet => (" New Snippet ", "Title, optionally with an extension: sort.rs"),
        InputMode::NewCollection => (" New Collection ", "Collection name"),
        InputMode::RenameCollection(_) => (" Rename Collection ", "New name"),
        InputMode::EditTags(_) => (" Tags ", "Space separated tag names"),
        InputMode::Search => (" Search ", "Title, #tag, language or code"),
        InputMode::ExploreFilter => (" Filter Explore ", "Words, plus lang:NAME"),
        InputMode::Normal | InputMode::HelpMenu => return,
    };

    let popup = centered(area, 60, 6);
    frame.render_widget(Clear, popup);
    let text = vec![
        Line::from(Span::styled(hint, Style::default().fg(Palette::MUTED))),
        Line::from(""),
        Line::from(vec![
            Span::styled("❯ ", Style::default().fg(Palette::GOLD)),
            Span::styled(app.input_buffer.clone(), Style::default().fg(Palette::TEXT)),
            Span::styled("█", Style::default().fg(Palette::IRIS)),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(text).block(dialog(title.to_string(), Palette::IRIS)),
        popup,
    );
}

const HELP: [(&str, &[(&str, &str)]); 4] = [
    (
        "Navigation",
        &[
            ("j/k ↑↓", "Move selection"),
            ("⏎ l", "Open"),
            ("h Esc", "Back"),
            ("H", "Library"),
            ("E", "Explore public snippets"),
            ("/", "Search"),
            ("g", "Refresh from backend"),
        ],
    ),
    (
        "Ordering",
        &[
            ("J / K", "Move item down / up"),
            ("x", "Send item to the end"),
            ("s", "Save order"),
            ("r", "Reset to saved order"),
        ],
    ),
    (
        "Snippets",
        &[
            ("n", "New snippet"),
            ("e", "Edit in $EDITOR"),
            ("f", "Toggle favorite"),
            ("p", "Toggle public"),
            ("t", "Edit tags"),
            ("F", "Fork"),
            ("d", "Delete"),
        ],
    ),
    (
        "Collections",
        &[("c", "New collection"), ("R", "Rename"), ("d", "Delete")],
    ),
];

pub fn render_help(frame: &mut Frame, area: Rect) {
    let mut lines = Vec::new();
    for (section, keys) in HELP {
        lines.push(Line::from(Span::styled(
            section,
            Style::default().fg(Palette::LOVE).bold(),
        )));
        for (key, action) in keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<8}", key), Style::default().fg(Palette::GOLD)),
                Span::raw(*action),
            ]));
        }
        lines.push(Line::from(""));
    }

    let popup = centered(area, 48, lines.len() as u16 + 2);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(dialog(" 󰘳 Keyboard Shortcuts ".to_string(), Palette::IRIS)),
        popup,
    );
}
