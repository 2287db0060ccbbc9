//! Command-line interface for snippy.
//! Every command works on the same store as the TUI and mirrors its changes
//! to the backend when one is configured.

pub mod commands;
pub mod tree;

use crate::session::Session;
use anyhow::Result;
use colored::Colorize;
use commands::Args;
use tree::bar;
use tracing::debug;

/// Executes one CLI command against `session`
pub fn execute_cli(session: &mut Session, args: &[String]) -> Result<()> {
    let Some(command) = args.first() else {
        print_help();
        return Ok(());
    };
    let rest = Args::parse(&args[1..]);
    debug!(command = %command, "cli command");

    match command.as_str() {
        "list" | "ls" => commands::list(session, &rest),
        "collections" | "cols" => commands::collections(session),
        "favorites" | "favs" => commands::favorites(session),
        "explore" => commands::explore(session, &rest),
        "show" | "view" | "cat" => commands::show(session, &rest),
        "search" | "find" => commands::search(session, &rest),
        "new" | "add" => commands::new_snippet(session, &rest)?,
        "edit" => commands::edit(session, &rest)?,
        "rm" | "delete" => commands::remove(session, &rest)?,
        "fav" => commands::toggle_favorite(session, &rest)?,
        "public" => commands::toggle_public(session, &rest)?,
        "fork" => commands::fork(session, &rest)?,
        "mv" | "move" => commands::move_snippet(session, &rest)?,
        "mkcol" => commands::make_collection(session, &rest)?,
        "rmcol" => commands::remove_collection(session, &rest)?,
        "rename" => commands::rename_collection(session, &rest)?,
        "reorder" => commands::reorder(session, &rest)?,
        "tag" => commands::tag(session, &rest)?,
        "tags" => commands::tags(session, &rest)?,
        "sync" => {
            if session.is_guest() {
                println!("{}  No backend configured, running as guest.", bar());
            } else {
                session.refresh()?;
                session.save()?;
                println!("{}  {} Library refreshed", bar(), "✓".bright_green());
            }
        }
        "backup" => commands::backup(session)?,
        "help" | "--help" | "-h" => print_help(),
        _ => {
            println!("{}  Unknown command: {}", bar(), command);
            print_help();
        }
    }

    Ok(())
}

const HELP: [(&str, &str); 22] = [
    ("list, ls", "List collections and snippets in tree format"),
    ("list <COLLECTION|unfiled>", "List the snippets of one collection"),
    ("collections", "List all collections with their IDs"),
    ("favorites, favs", "List all favorite snippets"),
    ("explore [QUERY] [--lang L]", "Browse public snippets from everyone"),
    ("show, view <NAME>", "Display a snippet (partial name works)"),
    ("search, find <QUERY>", "Search titles, tags, languages and code"),
    ("new <TITLE> [OPTIONS]", "Create a snippet from --file, stdin or $EDITOR"),
    ("edit <NAME>", "Edit a snippet in $EDITOR"),
    ("rm <NAME> [-y]", "Delete a snippet"),
    ("fav <NAME>", "Toggle the favorite flag"),
    ("public <NAME>", "Toggle public visibility"),
    ("fork <NAME>", "Fork another user's public snippet"),
    ("mv <NAME> <COLLECTION|none>", "File a snippet into a collection"),
    ("mkcol <NAME> [--color HEX]", "Create a collection"),
    ("rmcol <NAME> [-y]", "Delete a collection, unfiling its snippets"),
    ("rename <NAME> <NEW_NAME>", "Rename a collection"),
    ("reorder <SCOPE> [ITEM POS]", "Move an item in collections, home or a collection"),
    ("tag <NAME> [TAG...]", "Replace a snippet's tags"),
    ("tags [rm|rename ...]", "List, delete or rename tags"),
    ("sync", "Refresh the library from the backend"),
    ("backup", "Write a timestamped backup of the store"),
];

/// Prints the help message with available commands
fn print_help() {
    println!("{}  {}", bar(), "SNIPPY - SNIPPET MANAGER".bold());
    println!("{}  {}", bar(), "USAGE:".bright_yellow());
    println!("{}  snippy [COMMAND] [ARGS]", bar());
    println!("{}  {}", bar(), "COMMANDS:".bright_yellow());
    for (command, description) in HELP {
        println!("{}  {:<30} {}", bar(), command.bright_white(), description);
    }
    println!("{}  {:<30} {}", bar(), "help".bright_white(), "Display this help message");

    println!("{}  {}", bar(), "NEW OPTIONS:".bright_yellow());
    println!(
        "{}  --lang LANG  --in COLLECTION  --public  --fav  --file PATH",
        bar()
    );
    println!("{}  {}", bar(), "TIP:".bright_green());
    println!(
        "{}  Run with no arguments to launch the full TUI (Terminal User Interface) mode",
        bar()
    );
}
