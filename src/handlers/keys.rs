//! Keyboard input handling.
//!
//! Overlays take keys first (confirmation, text input, help), then global
//! keys, then the keys of the current view.

use crate::app::{App, InputMode, View};
use crate::editor;
use anyhow::{Context, Result};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Main keyboard event handler. Returns true when the app should exit.
pub fn handle_key_events(key: KeyEvent, app: &mut App) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if app.confirmation.is_some() {
        handle_confirmation_keys(key, app);
        return app.should_quit;
    }

    if app.input_mode != InputMode::Normal {
        handle_input_mode_keys(key, app);
        return false;
    }

    app.needs_redraw = true;
    match key.code {
        KeyCode::Char('q') => app.request_quit(),
        KeyCode::Char('?') => app.input_mode = InputMode::HelpMenu,
        KeyCode::Esc => {
            if app.notification.is_some() {
                app.dismiss_notification();
            } else {
                app.go_back();
            }
        }
        KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => app.go_back(),
        KeyCode::Char('H') => app.go_home(),
        KeyCode::Char('E') => app.open_explore(),
        KeyCode::Char('/') => {
            app.input_buffer = app.search_query.clone();
            app.input_mode = InputMode::Search;
        }
        KeyCode::Char('g') => app.request_refresh(),
        _ => match app.view {
            View::Detail(id) => handle_detail_keys(key, app, id),
            _ => handle_list_keys(key, app),
        },
    }
    app.should_quit
}

fn handle_confirmation_keys(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_confirmation(),
        _ => {}
    }
}

fn handle_input_mode_keys(key: KeyEvent, app: &mut App) {
    app.needs_redraw = true;
    if app.input_mode == InputMode::HelpMenu {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.input_mode = InputMode::Normal;
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.input_buffer.clear();
        }
        KeyCode::Enter => {
            let input = std::mem::take(&mut app.input_buffer);
            let mode = std::mem::replace(&mut app.input_mode, InputMode::Normal);
            submit_input(app, mode, &input);
        }
        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Char(c) => app.input_buffer.push(c),
        _ => {}
    }
}

fn submit_input(app: &mut App, mode: InputMode, input: &str) {
    match mode {
        InputMode::NewSnippet => match app.create_snippet(input) {
            Ok(id) => {
                app.navigate_to(View::Detail(id));
                edit_snippet(app, id);
            }
            Err(e) => app.notify_error(e),
        },
        InputMode::NewCollection => match app.create_collection(input) {
            Ok(_) => app.notify("Collection created"),
            Err(e) => app.notify_error(e),
        },
        InputMode::RenameCollection(id) => match app.rename_collection(id, input) {
            Ok(()) => app.notify("Collection renamed"),
            Err(e) => app.notify_error(e),
        },
        InputMode::EditTags(id) => {
            app.set_tags(id, input);
            app.notify("Tags updated");
        }
        InputMode::Search => {
            if input.trim().is_empty() {
                return;
            }
            app.run_search(input);
        }
        InputMode::ExploreFilter => app.set_explore_filter(input),
        InputMode::Normal | InputMode::HelpMenu => {}
    }
}

fn handle_list_keys(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => app.open_selected(),
        KeyCode::PageDown => app.scroll_content(true),
        KeyCode::PageUp => app.scroll_content(false),

        // Staged reordering
        KeyCode::Char('K') => app.move_selected(true),
        KeyCode::Char('J') => app.move_selected(false),
        KeyCode::Char('x') => app.drop_selected(),
        KeyCode::Char('r') => app.reset_order(),
        KeyCode::Char('s') => app.save_order(),

        KeyCode::Char('n') => {
            if matches!(app.view, View::Library | View::Snippets(_)) {
                app.input_buffer.clear();
                app.input_mode = InputMode::NewSnippet;
            }
        }
        KeyCode::Char('c') => {
            if app.view == View::Library {
                app.input_buffer.clear();
                app.input_mode = InputMode::NewCollection;
            }
        }
        KeyCode::Char('R') => {
            if let Some((id, name)) = app.renamable_collection() {
                app.input_buffer = name;
                app.input_mode = InputMode::RenameCollection(id);
            }
        }
        KeyCode::Char('L') if app.view == View::Explore => {
            app.input_buffer = filter_input(app);
            app.input_mode = InputMode::ExploreFilter;
        }
        _ => handle_snippet_keys(key, app),
    }
}

fn filter_input(app: &App) -> String {
    let filter = &app.explore_filter;
    match &filter.language {
        Some(language) => format!("{} lang:{}", filter.query, language.id())
            .trim()
            .to_string(),
        None => filter.query.clone(),
    }
}

fn handle_detail_keys(key: KeyEvent, app: &mut App, id: Uuid) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') | KeyCode::PageDown => app.scroll_content(true),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::PageUp => app.scroll_content(false),
        KeyCode::Enter => edit_snippet(app, id),
        _ => handle_snippet_keys(key, app),
    }
}

/// Keys acting on the selected snippet, shared by lists and the detail page
fn handle_snippet_keys(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('e') => {
            if let Some(id) = app.selected_snippet_id() {
                edit_snippet(app, id);
            }
        }
        KeyCode::Char('f') => app.toggle_favorite(),
        KeyCode::Char('p') => app.toggle_public(),
        KeyCode::Char('F') => app.fork_selected(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('t') => {
            if let Some(snippet) = app.editable_snippet() {
                app.input_buffer = app.tag_input_for(&snippet);
                app.input_mode = InputMode::EditTags(snippet.id);
            }
        }
        _ => {}
    }
}

/// Hands the snippet to `$EDITOR` and stores what comes back
fn edit_snippet(app: &mut App, id: Uuid) {
    let owned = app
        .session
        .store
        .find_snippet(&id)
        .filter(|s| s.user_id == app.session.store.current_user())
        .cloned();
    let Some(snippet) = owned else {
        app.notify_error("Only your own snippets can be edited; fork it first");
        return;
    };

    let drafts = app.session.drafts_dir();
    let result = editor::draft_path(&drafts, &snippet.file_name()).and_then(|path| {
        fs::write(&path, &snippet.content).context("Failed to prepare file for editing")?;
        let edited = suspend_tui_for_editor(&path)
            .and_then(|_| fs::read_to_string(&path).context("Failed to read edited file"));
        let _ = fs::remove_file(&path);
        edited
    });

    app.needs_redraw = true;
    match result {
        Ok(content) => app.save_content(id, content),
        Err(e) => app.notify_error(format!("{:#}", e)),
    }
}

/// Leaves the alternate screen while the editor owns the terminal
fn suspend_tui_for_editor(file_path: &Path) -> Result<()> {
    use ratatui::crossterm::{
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use std::io::{Write, stdout};

    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    print!("\x1B[2J\x1B[H\x1B[?25h");
    stdout().flush()?;

    let edited = editor::open_in_editor(file_path);

    print!("\x1B[2J\x1B[H");
    stdout().flush()?;
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    edited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::MemoryStorage;
    use crate::session::Session;
    use crate::store::SnippetScope;
    use std::path::PathBuf;

    fn app() -> App {
        let session =
            Session::open_with(Config::default(), MemoryStorage::new(), PathBuf::from("/tmp"))
                .unwrap();
        App::new(session)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_events(KeyEvent::new(code, KeyModifiers::NONE), app)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn creating_a_collection_from_the_library() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.input_mode, InputMode::NewCollection);
        type_text(&mut app, "Shell");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.session.store.find_collection_by_name("shell", None).is_some());
        assert_eq!(app.collections.items().last().unwrap().name(), "Shell");
    }

    #[test]
    fn reorder_keys_stage_then_reset() {
        let mut app = app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('K'));
        assert!(app.collections.is_dirty());
        assert_eq!(app.selected, 1);

        press(&mut app, KeyCode::Char('r'));
        assert!(!app.collections.is_dirty());
    }

    #[test]
    fn quitting_with_staged_order_asks() {
        let mut app = app();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('J'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(app.confirmation.is_some());
        assert!(press(&mut app, KeyCode::Char('y')));
    }

    #[test]
    fn search_input_opens_results() {
        let mut app = app();
        app.navigate_to(View::Snippets(SnippetScope::Unfiled));
        app.create_snippet("needle.rs").unwrap();

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "needle");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.view, View::Search);
        assert_eq!(app.search_hits.len(), 1);
        assert_eq!(app.recent_searches.entries()[0].query, "needle");
    }
}
