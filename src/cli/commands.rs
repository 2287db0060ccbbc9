use super::tree::{self, bar, painted_name, rule};
use crate::api::{CreateCollectionRequest, CreateSnippetRequest, UpdateSnippetRequest};
use crate::editor;
use crate::models::{
    parse_hex_color, Collection, CollectionPatch, CollectionRef, NewCollection, NewSnippet,
    Snippet, SnippetLanguage, SnippetPatch,
};
use crate::reorder::{PositionSink, ReorderList};
use crate::search::{self, ExploreFilter};
use crate::session::Session;
use crate::store::{RecordStore, SnippetScope};
use crate::sync::{PositionTarget, RemotePositions, SyncRequest};
use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Read, Write};
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Flags and positional arguments of one command
#[derive(Debug, Default)]
pub struct Args {
    positional: Vec<String>,
    options: Vec<(String, String)>,
    flags: Vec<String>,
}

const VALUE_OPTIONS: [&str; 4] = ["--lang", "--in", "--file", "--color"];

impl Args {
    pub fn parse(raw: &[String]) -> Self {
        let mut args = Args::default();
        let mut iter = raw.iter();
        while let Some(arg) = iter.next() {
            if VALUE_OPTIONS.contains(&arg.as_str()) {
                if let Some(value) = iter.next() {
                    args.options.push((arg.clone(), value.clone()));
                }
            } else if arg.starts_with("--") || arg == "-y" {
                args.flags.push(arg.clone());
            } else {
                args.positional.push(arg.clone());
            }
        }
        args
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    /// Positional arguments from `from` on, joined with spaces
    pub fn rest(&self, from: usize) -> String {
        self.positional.iter().skip(from).cloned().collect::<Vec<_>>().join(" ")
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name)
    }

    fn confirmed(&self) -> bool {
        self.flag("--yes") || self.flag("-y")
    }
}

fn usage(text: &str) {
    println!("{}  Usage: snippy {}", bar(), text);
}

fn error(text: impl std::fmt::Display) {
    println!("{}  {} {}", bar(), "Error:".bright_red(), text);
}

fn success(text: impl std::fmt::Display) {
    println!("{}  {} {}", bar(), "✓".bright_green(), text);
}

/// Mirrors to the backend; a failure is reported but the local change stays
/// Returns the backend id when the request created a snippet
fn mirror(session: &mut Session, request: SyncRequest) -> Option<Uuid> {
    match session.mirror(request) {
        Ok(created) => created,
        Err(e) => {
            println!("{}  {} {:#}", bar(), "Sync failed:".bright_yellow(), e);
            None
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}  {} [y/N] ", bar(), prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

// Lookups

/// The current user's snippet by id, exact title, then partial title
pub(crate) fn resolve_snippet(store: &RecordStore, needle: &str) -> Option<Uuid> {
    let mine = store.get_user_snippets(None);
    find_in(&mine, needle)
}

/// A public snippet of another user, for forking
pub(crate) fn resolve_public_snippet(store: &RecordStore, needle: &str) -> Option<Uuid> {
    let me = store.current_user();
    let theirs: Vec<&Snippet> = store
        .get_public_snippets()
        .into_iter()
        .filter(|s| s.user_id != me)
        .collect();
    find_in(&theirs, needle)
}

fn find_in(snippets: &[&Snippet], needle: &str) -> Option<Uuid> {
    if let Ok(id) = Uuid::parse_str(needle) {
        return snippets.iter().find(|s| s.id == id).map(|s| s.id);
    }
    let name = needle.to_lowercase();
    snippets
        .iter()
        .find(|s| s.title.to_lowercase() == name)
        .or_else(|| snippets.iter().find(|s| s.title.to_lowercase().contains(&name)))
        .map(|s| s.id)
}

pub(crate) fn resolve_collection(store: &RecordStore, needle: &str) -> Option<CollectionRef> {
    if let Ok(reference) = needle.parse::<CollectionRef>() {
        let known = match reference {
            CollectionRef::Favorites => true,
            CollectionRef::Named(id) => store
                .find_collection(&id)
                .is_some_and(|c| c.user_id == store.current_user()),
        };
        return known.then_some(reference);
    }
    if needle.eq_ignore_ascii_case("favorites") {
        return Some(CollectionRef::Favorites);
    }
    store
        .find_collection_by_name(needle, None)
        .map(|c| CollectionRef::Named(c.id))
}

fn require_snippet(session: &Session, needle: Option<&str>, usage_text: &str) -> Option<Snippet> {
    let Some(needle) = needle else {
        error("Missing snippet name or ID");
        usage(usage_text);
        return None;
    };
    match resolve_snippet(&session.store, needle) {
        Some(id) => session.store.find_snippet(&id).cloned(),
        None => {
            error(format!("No snippet found with name: {}", needle));
            None
        }
    }
}

fn collection_label(store: &RecordStore, snippet: &Snippet) -> String {
    snippet
        .collection_id
        .and_then(|id| store.find_collection(&id))
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "Unfiled".to_string())
}

// Read commands

pub fn list(session: &Session, args: &Args) {
    let store = &session.store;
    match args.positional(0) {
        None => tree::display_library(store),
        Some("unfiled") | Some("home") => {
            println!("{}  {}", bar(), "Unfiled".bold());
            for snippet in store.unfiled_snippets(None) {
                println!("{}  {} {}", bar(), "├──".bright_black(), snippet.title.bright_white());
            }
        }
        Some(needle) => match resolve_collection(store, needle) {
            Some(reference) => tree::display_collection(store, &reference),
            None => {
                println!("{}  No collection found with name: {}", bar(), needle);
                tree::list_all_collections(store);
            }
        },
    }
}

pub fn collections(session: &Session) {
    tree::list_all_collections(&session.store);
}

pub fn favorites(session: &Session) {
    let store = &session.store;
    let favorites = store.get_favorite_snippets(None);

    if favorites.is_empty() {
        println!("{}  No favorite snippets found.", bar());
        return;
    }

    println!("{}  {} favorite snippets:", bar(), favorites.len());
    for (idx, snippet) in favorites.iter().enumerate() {
        println!(
            "{}  {}. {} {}",
            bar(),
            (idx + 1).to_string().bright_yellow(),
            "★".yellow(),
            snippet.title.bright_white().bold()
        );
        println!(
            "{}     {}: {}",
            bar(),
            "Collection".bright_blue(),
            collection_label(store, snippet)
        );
        println!(
            "{}     {}: {}",
            bar(),
            "Language".bright_green(),
            snippet.language.display_name()
        );
        println!("{}     {}: {}", bar(), "ID".bright_black(), snippet.id);
    }
}

pub fn explore(session: &mut Session, args: &Args) {
    if !session.is_guest() {
        mirror(session, SyncRequest::FetchPublic);
    }

    let filter = ExploreFilter {
        query: args.rest(0),
        language: args.option("--lang").map(SnippetLanguage::from_name),
    };
    let results = search::explore(&session.store, &filter);

    println!("{}  {}", bar(), "EXPLORE PUBLIC SNIPPETS".bold());
    rule();
    if results.is_empty() {
        println!("{}  No public snippets found.", bar());
        return;
    }

    let me = session.store.current_user();
    for (idx, snippet) in results.iter().enumerate() {
        let owner = if snippet.user_id == me {
            "you".bright_green()
        } else {
            snippet.user_id.normal()
        };
        println!(
            "{}  {}. {} {} {}",
            bar(),
            (idx + 1).to_string().bright_yellow(),
            snippet.title.bright_white().bold(),
            format!("[{}]", snippet.language.short_name()).bright_black(),
            format!("⑂ {}", snippet.fork_count).bright_cyan()
        );
        println!("{}     {}: {}", bar(), "Author".bright_blue(), owner);
        println!("{}     {}: {}", bar(), "ID".bright_black(), snippet.id);
    }
}

pub fn show(session: &Session, args: &Args) {
    let Some(needle) = args.positional(0) else {
        error("Missing snippet name or ID");
        usage("show <SNIPPET_NAME_OR_ID>");
        return;
    };

    let store = &session.store;
    let found = resolve_snippet(store, needle).or_else(|| resolve_public_snippet(store, needle));
    let Some(snippet) = found.and_then(|id| store.find_snippet(&id)) else {
        println!("{}  No snippet found with name: {}", bar(), needle);
        return;
    };

    println!(
        "{}  {} {}",
        bar(),
        "SNIPPET".bright_green().bold(),
        snippet.title.bold()
    );
    rule();
    println!(
        "{}  {}: {}",
        bar(),
        "Collection".bright_blue(),
        collection_label(store, snippet)
    );
    println!(
        "{}  {}: {}",
        bar(),
        "Language".bright_yellow(),
        snippet.language.display_name()
    );
    println!(
        "{}  {}: {}{}",
        bar(),
        "Visibility".bright_cyan(),
        if snippet.is_public { "public" } else { "private" },
        if snippet.is_favorite { ", favorite" } else { "" }
    );

    let tags = store.tag_names(snippet);
    if !tags.is_empty() {
        let tags: Vec<String> = tags.iter().map(|t| format!("#{}", t)).collect();
        println!("{}  {}: {}", bar(), "Tags".bright_magenta(), tags.join(" "));
    }

    if let Some(original_id) = snippet.forked_from {
        let origin = store
            .find_snippet(&original_id)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| original_id.to_string());
        println!("{}  {}: {}", bar(), "Forked from".bright_cyan(), origin);
    }
    println!(
        "{}  {}: {}",
        bar(),
        "Forks".bright_cyan(),
        snippet.fork_count
    );
    for fork in store.forks_of(&snippet.id) {
        println!("{}     {} {} ({})", bar(), "⑂".bright_black(), fork.title, fork.user_id);
    }

    println!("{}  {}: {}", bar(), "ID".bright_black(), snippet.id);
    println!(
        "{}  {}: {}",
        bar(),
        "Updated".bright_black(),
        snippet.updated_at.format("%Y-%m-%d %H:%M")
    );
    rule();
    for line in snippet.content.lines() {
        println!("{}  {}", bar(), line);
    }
}

pub fn search(session: &Session, args: &Args) {
    let query = args.rest(0);
    if query.trim().is_empty() {
        error("Missing search query");
        usage("search <QUERY>");
        return;
    }

    let results = search::search_snippets(&session.store, None, &query);
    println!(
        "{}  {} '{}'",
        bar(),
        "SEARCH RESULTS FOR".bold(),
        query.bright_white()
    );
    if results.is_empty() {
        println!("{}  No snippets found matching query: {}", bar(), query);
        return;
    }

    println!("{}  Found {} snippets matching '{}':", bar(), results.len(), query);
    rule();
    for (idx, hit) in results.iter().enumerate() {
        println!(
            "{}  {}. {}",
            bar(),
            (idx + 1).to_string().bright_yellow(),
            hit.title.bright_white().bold()
        );
        println!("{}     {}", bar(), hit.kind.context().bright_green());
        println!("{}     {}: {}", bar(), "ID".bright_black(), hit.snippet_id);
    }
}

pub fn tags(session: &mut Session, args: &Args) -> Result<()> {
    match args.positional(0) {
        Some("rm") => {
            let Some(name) = args.positional(1) else {
                usage("tags rm <TAG>");
                return Ok(());
            };
            let user = session.store.current_user().to_string();
            let Some(tag_id) = session.store.tags().find_by_name(&user, name).map(|t| t.id) else {
                error(format!("No tag named {}", name));
                return Ok(());
            };
            session.store.delete_tag(&tag_id);
            session.save()?;
            mirror(session, SyncRequest::DeleteTag(tag_id));
            session.save()?;
            success(format!("Deleted tag #{}", name));
        }
        Some("rename") => {
            let (Some(old), Some(new)) = (args.positional(1), args.positional(2)) else {
                usage("tags rename <OLD> <NEW>");
                return Ok(());
            };
            let user = session.store.current_user().to_string();
            let Some(tag_id) = session.store.tags().find_by_name(&user, old).map(|t| t.id) else {
                error(format!("No tag named {}", old));
                return Ok(());
            };
            if !session.store.rename_tag(&tag_id, new) {
                error(format!("Tag name '{}' is empty or already taken", new));
                return Ok(());
            }
            session.save()?;
            mirror(
                session,
                SyncRequest::RenameTag {
                    id: tag_id,
                    name: new.to_string(),
                },
            );
            session.save()?;
            success(format!("Renamed #{} to #{}", old, new));
        }
        _ => {
            let usage_list = session.store.tags_with_usage(None);
            if usage_list.is_empty() {
                println!("{}  No tags yet.", bar());
                return Ok(());
            }
            println!("{}  {}", bar(), "TAGS".bold());
            for (tag, uses) in usage_list {
                println!(
                    "{}  {} {}",
                    bar(),
                    tag.display_name().bright_magenta(),
                    format!("({})", uses).bright_black()
                );
            }
        }
    }
    Ok(())
}

// Mutations

fn read_content(session: &Session, args: &Args, language: &SnippetLanguage) -> Result<String> {
    if let Some(path) = args.option("--file") {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path));
    }
    if !io::stdin().is_terminal() {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read snippet from stdin")?;
        return Ok(content);
    }
    let draft = format!("new_snippet.{}", language.file_extension());
    editor::edit_text(&session.drafts_dir(), &draft, "")
}

pub fn new_snippet(session: &mut Session, args: &Args) -> Result<()> {
    let title = args.rest(0);
    if title.trim().is_empty() {
        error("Title must not be empty");
        usage("new <TITLE> [--lang LANG] [--in COLLECTION] [--public] [--fav] [--file PATH]");
        return Ok(());
    }

    let language = match (args.option("--lang"), args.option("--file")) {
        (Some(lang), _) => SnippetLanguage::from_name(lang),
        (None, Some(path)) => std::path::Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(SnippetLanguage::from_name)
            .unwrap_or_default(),
        (None, None) => SnippetLanguage::default(),
    };

    let collection_id = match args.option("--in") {
        Some(needle) => match resolve_collection(&session.store, needle) {
            Some(CollectionRef::Named(id)) => Some(id),
            Some(CollectionRef::Favorites) => {
                error("Favorites follows the favorite flag; use --fav instead");
                return Ok(());
            }
            None => {
                error(format!("No collection found with name: {}", needle));
                return Ok(());
            }
        },
        None => None,
    };

    let content = read_content(session, args, &language)?;

    let mut data = NewSnippet::new(title.trim(), content, language)
        .public(args.flag("--public"))
        .favorite(args.flag("--fav"));
    data.collection_id = collection_id;
    let mut id = session.store.add_snippet(data);
    session.save()?;

    if let Some(snippet) = session.store.find_snippet(&id) {
        let request = SyncRequest::CreateSnippet {
            local_id: id,
            body: CreateSnippetRequest::from(snippet),
        };
        if let Some(remote_id) = mirror(session, request) {
            id = remote_id;
        }
        session.save()?;
    }

    success(format!("Created snippet '{}' ({})", title.trim(), id));
    Ok(())
}

/// Applies a patch locally, persists it, then mirrors it
fn patch_snippet(session: &mut Session, id: Uuid, patch: SnippetPatch) -> Result<()> {
    let body = UpdateSnippetRequest::from(&patch);
    session.store.update_snippet(&id, patch);
    session.save()?;
    mirror(session, SyncRequest::UpdateSnippet { id, body });
    session.save()
}

pub fn edit(session: &mut Session, args: &Args) -> Result<()> {
    let Some(snippet) = require_snippet(session, args.positional(0), "edit <SNIPPET>") else {
        return Ok(());
    };

    let edited = editor::edit_text(&session.drafts_dir(), &snippet.file_name(), &snippet.content)?;
    if edited == snippet.content {
        println!("{}  No changes.", bar());
        return Ok(());
    }

    patch_snippet(session, snippet.id, SnippetPatch::content(edited))?;
    success(format!("Saved '{}'", snippet.title));
    Ok(())
}

pub fn remove(session: &mut Session, args: &Args) -> Result<()> {
    let Some(snippet) = require_snippet(session, args.positional(0), "rm <SNIPPET> [--yes]") else {
        return Ok(());
    };

    if !args.confirmed() && !confirm(&format!("Delete '{}'?", snippet.title))? {
        println!("{}  Cancelled.", bar());
        return Ok(());
    }

    session.store.delete_snippet(&snippet.id);
    session.save()?;
    mirror(session, SyncRequest::DeleteSnippet(snippet.id));
    session.save()?;
    success(format!("Deleted '{}'", snippet.title));
    Ok(())
}

pub fn toggle_favorite(session: &mut Session, args: &Args) -> Result<()> {
    let Some(snippet) = require_snippet(session, args.positional(0), "fav <SNIPPET>") else {
        return Ok(());
    };
    let now = !snippet.is_favorite;
    patch_snippet(session, snippet.id, SnippetPatch::favorite(now))?;
    success(if now {
        format!("Added '{}' to Favorites", snippet.title)
    } else {
        format!("Removed '{}' from Favorites", snippet.title)
    });
    Ok(())
}

pub fn toggle_public(session: &mut Session, args: &Args) -> Result<()> {
    let Some(snippet) = require_snippet(session, args.positional(0), "public <SNIPPET>") else {
        return Ok(());
    };
    let now = !snippet.is_public;
    patch_snippet(session, snippet.id, SnippetPatch::public(now))?;
    success(format!(
        "'{}' is now {}",
        snippet.title,
        if now { "public" } else { "private" }
    ));
    Ok(())
}

pub fn fork(session: &mut Session, args: &Args) -> Result<()> {
    let Some(needle) = args.positional(0) else {
        error("Missing snippet name or ID");
        usage("fork <PUBLIC_SNIPPET>");
        return Ok(());
    };

    if !session.is_guest() {
        mirror(session, SyncRequest::FetchPublic);
    }

    let store = &session.store;
    let Some(original) = resolve_public_snippet(store, needle)
        .or_else(|| resolve_snippet(store, needle))
        .and_then(|id| store.find_snippet(&id))
        .cloned()
    else {
        println!("{}  No public snippet found with name: {}", bar(), needle);
        return Ok(());
    };

    if original.user_id == store.current_user() {
        error("You cannot fork your own snippet");
        return Ok(());
    }
    if store.has_forked_snippet(&original.id, &original.user_id) {
        error(format!("You already forked '{}'", original.title));
        return Ok(());
    }

    let Some(local_id) = session.store.fork_snippet(&original) else {
        return Ok(());
    };
    session.save()?;
    let request = SyncRequest::ForkSnippet {
        original: original.id,
        local_id,
    };
    let fork_id = mirror(session, request).unwrap_or(local_id);
    session.save()?;
    success(format!("Forked '{}' ({})", original.title, fork_id));
    Ok(())
}

pub fn move_snippet(session: &mut Session, args: &Args) -> Result<()> {
    let Some(snippet) = require_snippet(session, args.positional(0), "mv <SNIPPET> <COLLECTION|none>")
    else {
        return Ok(());
    };
    let Some(target) = args.positional(1) else {
        usage("mv <SNIPPET> <COLLECTION|none>");
        return Ok(());
    };

    let collection_id = match target {
        "none" | "unfiled" | "home" => None,
        needle => match resolve_collection(&session.store, needle) {
            Some(CollectionRef::Named(id)) => Some(id),
            Some(CollectionRef::Favorites) => {
                error("Favorites follows the favorite flag; use `snippy fav` instead");
                return Ok(());
            }
            None => {
                error(format!("No collection found with name: {}", needle));
                return Ok(());
            }
        },
    };

    patch_snippet(session, snippet.id, SnippetPatch::file_into(collection_id))?;
    success(format!("Moved '{}'", snippet.title));
    Ok(())
}

pub fn make_collection(session: &mut Session, args: &Args) -> Result<()> {
    let name = args.rest(0);
    let name = name.trim();
    if name.is_empty() {
        error("Collection name must not be empty");
        usage("mkcol <NAME> [--color #RRGGBB]");
        return Ok(());
    }
    if session.store.find_collection_by_name(name, None).is_some() {
        error(format!("A collection named '{}' already exists", name));
        return Ok(());
    }
    if let Some(color) = args.option("--color") {
        if parse_hex_color(color).is_none() {
            error(format!("'{}' is not a #RRGGBB color", color));
            return Ok(());
        }
    }

    let position = session.store.get_sorted_collections(None).len() as i64 - 1;
    let id = session.store.add_collection(NewCollection {
        name: name.to_string(),
        color: args.option("--color").map(str::to_string),
        position,
    });
    session.save()?;

    if let Some(collection) = session.store.find_collection(&id) {
        let request = SyncRequest::CreateCollection(CreateCollectionRequest::from(collection));
        mirror(session, request);
        session.save()?;
    }
    success(format!("Created collection '{}'", name));
    Ok(())
}

fn require_named_collection(session: &Session, needle: Option<&str>, usage_text: &str) -> Option<Uuid> {
    let Some(needle) = needle else {
        usage(usage_text);
        return None;
    };
    match resolve_collection(&session.store, needle) {
        Some(CollectionRef::Named(id)) => Some(id),
        Some(CollectionRef::Favorites) => {
            error("The Favorites collection cannot be changed");
            None
        }
        None => {
            error(format!("No collection found with name: {}", needle));
            None
        }
    }
}

pub fn remove_collection(session: &mut Session, args: &Args) -> Result<()> {
    let Some(id) = require_named_collection(session, args.positional(0), "rmcol <COLLECTION> [--yes]")
    else {
        return Ok(());
    };
    let name = session
        .store
        .find_collection(&id)
        .map(|c| c.name.clone())
        .unwrap_or_default();

    if !args.confirmed()
        && !confirm(&format!("Delete collection '{}'? Its snippets become unfiled.", name))?
    {
        println!("{}  Cancelled.", bar());
        return Ok(());
    }

    session.store.delete_collection(&CollectionRef::Named(id));
    session.save()?;
    mirror(session, SyncRequest::DeleteCollection(id));
    session.save()?;
    success(format!("Deleted collection '{}'", name));
    Ok(())
}

pub fn rename_collection(session: &mut Session, args: &Args) -> Result<()> {
    let Some(id) = require_named_collection(session, args.positional(0), "rename <COLLECTION> <NEW_NAME>")
    else {
        return Ok(());
    };
    let new_name = args.rest(1);
    let new_name = new_name.trim();
    if new_name.is_empty() {
        error("Collection name must not be empty");
        return Ok(());
    }

    let patch = CollectionPatch::rename(new_name);
    session
        .store
        .update_collection(&CollectionRef::Named(id), patch.clone());
    session.save()?;
    mirror(session, SyncRequest::UpdateCollection { id, patch });
    session.save()?;
    success(format!("Renamed collection to '{}'", new_name));
    Ok(())
}

pub fn tag(session: &mut Session, args: &Args) -> Result<()> {
    let Some(snippet) = require_snippet(session, args.positional(0), "tag <SNIPPET> [TAG...]") else {
        return Ok(());
    };
    let names: Vec<&str> = args.positional.iter().skip(1).map(String::as_str).collect();
    let user = session.store.current_user().to_string();

    for name in &names {
        if session.store.tags().find_by_name(&user, name).is_none()
            && session.store.create_tag(name).is_some()
        {
            session.save()?;
            mirror(session, SyncRequest::CreateTag(name.trim_start_matches('#').to_string()));
        }
    }

    let tag_ids: Vec<Uuid> = names
        .iter()
        .filter_map(|name| session.store.tags().find_by_name(&user, name).map(|t| t.id))
        .collect();

    session.store.assign_tags(&snippet.id, &tag_ids);
    session.save()?;
    let body = UpdateSnippetRequest {
        tag_ids: Some(tag_ids),
        ..UpdateSnippetRequest::default()
    };
    mirror(session, SyncRequest::UpdateSnippet { id: snippet.id, body });
    session.save()?;

    let applied = session
        .store
        .find_snippet(&snippet.id)
        .map(|s| session.store.tag_names(s))
        .unwrap_or_default();
    if applied.is_empty() {
        success(format!("Cleared tags of '{}'", snippet.title));
    } else {
        success(format!("Tagged '{}': #{}", snippet.title, applied.join(" #")));
    }
    Ok(())
}

// Reordering

enum ReorderScope {
    Collections,
    Snippets(SnippetScope),
}

fn print_order(labels: &[String]) {
    for (idx, label) in labels.iter().enumerate() {
        println!("{}  {}. {}", bar(), (idx + 1).to_string().bright_yellow(), label);
    }
}

/// Moves one item of a list to a 1-based position and commits the order
pub fn reorder(session: &mut Session, args: &Args) -> Result<()> {
    let reorder_usage = "reorder <collections|home|COLLECTION> [ITEM POSITION]";
    let Some(scope_arg) = args.positional(0) else {
        usage(reorder_usage);
        return Ok(());
    };

    let scope = match scope_arg {
        "collections" => ReorderScope::Collections,
        "home" | "unfiled" => ReorderScope::Snippets(SnippetScope::Unfiled),
        needle => match resolve_collection(&session.store, needle) {
            Some(CollectionRef::Favorites) => {
                error("Favorites is ordered by the favorite flag and has no order of its own");
                return Ok(());
            }
            Some(reference) => ReorderScope::Snippets(SnippetScope::Collection(reference)),
            None => {
                error(format!("No collection found with name: {}", needle));
                return Ok(());
            }
        },
    };

    let item = args.positional(1);
    let position = args.positional(2).and_then(|p| p.parse::<usize>().ok());

    match scope {
        ReorderScope::Collections => {
            let mut list = ReorderList::new(session.store.get_sorted_collections(None));
            let (Some(item), Some(position)) = (item, position) else {
                print_order(&list.items().iter().map(|c| painted_name(c).to_string()).collect::<Vec<_>>());
                return Ok(());
            };
            let Some(reference) = resolve_collection(&session.store, item) else {
                error(format!("No collection found with name: {}", item));
                return Ok(());
            };
            if reference.is_favorites() {
                error("Favorites always stays first");
                return Ok(());
            }
            list.move_key(&reference, position.max(1) - 1);
            commit_collections(session, &mut list)?;
            let labels: Vec<String> = list.items().iter().map(|c: &Collection| c.name().to_string()).collect();
            print_order(&labels);
        }
        ReorderScope::Snippets(scope) => {
            let snippets: Vec<Snippet> = session
                .store
                .snippets_in_scope(&scope, None)
                .into_iter()
                .cloned()
                .collect();
            let mut list = ReorderList::new(snippets);
            let (Some(item), Some(position)) = (item, position) else {
                print_order(&list.items().iter().map(|s| s.title.clone()).collect::<Vec<_>>());
                return Ok(());
            };
            let candidates: Vec<&Snippet> = list.items().iter().collect();
            let Some(id) = find_in(&candidates, item) else {
                error(format!("No snippet named {} in this list", item));
                return Ok(());
            };
            list.move_key(&id, position.max(1) - 1);
            commit_snippets(session, scope, &mut list)?;
            print_order(&list.items().iter().map(|s| s.title.clone()).collect::<Vec<_>>());
        }
    }
    Ok(())
}

fn commit_collections(session: &mut Session, list: &mut ReorderList<Collection>) -> Result<()> {
    if !list.is_dirty() {
        println!("{}  Order unchanged.", bar());
        return Ok(());
    }

    if let Some(client) = session.client.clone() {
        let runtime = Runtime::new().context("Failed to start async runtime")?;
        let mut remote = RemotePositions {
            runtime: &runtime,
            client: &client,
            target: PositionTarget::Collections,
        };
        commit_with(list, &mut remote)?;
        session.store.apply_collection_positions(&list.positions());
        refetch_saved_order(session)?;
    } else {
        commit_with(list, &mut session.store.collection_positions())?;
    }
    success("Collection order saved");
    Ok(())
}

fn commit_snippets(
    session: &mut Session,
    scope: SnippetScope,
    list: &mut ReorderList<Snippet>,
) -> Result<()> {
    if !list.is_dirty() {
        println!("{}  Order unchanged.", bar());
        return Ok(());
    }

    let remote_target = match (&scope, session.client.clone()) {
        (SnippetScope::Collection(CollectionRef::Named(id)), Some(client)) => Some((*id, client)),
        _ => None,
    };

    match remote_target {
        Some((collection_id, client)) => {
            let runtime = Runtime::new().context("Failed to start async runtime")?;
            let mut remote = RemotePositions {
                runtime: &runtime,
                client: &client,
                target: PositionTarget::CollectionSnippets(collection_id),
            };
            commit_with(list, &mut remote)?;
            session.store.apply_snippet_positions(&scope, &list.positions());
            refetch_saved_order(session)?;
        }
        None => commit_with(list, &mut session.store.snippet_positions(scope))?,
    }
    success("Snippet order saved");
    Ok(())
}

/// The backend owns the canonical order once a save went through
fn refetch_saved_order(session: &mut Session) -> Result<()> {
    mirror(session, SyncRequest::FetchLibrary);
    session.save()
}

fn commit_with<T: crate::reorder::Reorderable>(
    list: &mut ReorderList<T>,
    sink: &mut dyn PositionSink,
) -> Result<()> {
    list.commit(sink).map(|_| ())
}

pub fn backup(session: &Session) -> Result<()> {
    let path = session.backup()?;
    success(format!("Backup written to {}", path.display()));
    Ok(())
}
