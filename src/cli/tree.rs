use crate::models::{parse_hex_color, Collection, CollectionRef, Snippet};
use crate::store::RecordStore;
use colored::{ColoredString, Colorize};

pub(crate) fn bar() -> ColoredString {
    "┃".bright_magenta()
}

pub(crate) fn rule() {
    println!("{}", "─".repeat(60).bright_magenta());
}

/// Collection name painted in its own color
pub(crate) fn painted_name(collection: &Collection) -> ColoredString {
    match parse_hex_color(collection.color()) {
        Some((r, g, b)) => collection.name().truecolor(r, g, b).bold(),
        None => collection.name().bold(),
    }
}

fn snippet_marks(snippet: &Snippet) -> String {
    let mut marks = String::new();
    if snippet.is_favorite {
        marks.push_str(" ★");
    }
    if snippet.is_public {
        marks.push_str(" ◆");
    }
    if snippet.is_fork() {
        marks.push_str(" ⑂");
    }
    marks
}

fn print_snippet_line(snippet: &Snippet, last: bool) {
    let connector = if last { "└──" } else { "├──" };
    println!(
        "{}  {} {} {}{}",
        bar(),
        connector.bright_black(),
        snippet.title.bright_white(),
        format!("[{}]", snippet.language.short_name()).bright_black(),
        snippet_marks(snippet).yellow()
    );
}

fn print_snippets(snippets: &[&Snippet]) {
    if snippets.is_empty() {
        println!("{}  {}", bar(), "└── (empty)".bright_black());
        return;
    }
    for (idx, snippet) in snippets.iter().enumerate() {
        print_snippet_line(snippet, idx == snippets.len() - 1);
    }
}

/// Every collection with its snippets, then the unfiled snippets
pub fn display_library(store: &RecordStore) {
    for collection in store.get_sorted_collections(None) {
        let snippets = store.get_snippets_for_collection(&collection.reference(), None);
        println!(
            "{}  {} {}",
            bar(),
            painted_name(&collection),
            format!("({})", snippets.len()).bright_black()
        );
        print_snippets(&snippets);
    }

    let unfiled = store.unfiled_snippets(None);
    println!(
        "{}  {} {}",
        bar(),
        "Unfiled".bold(),
        format!("({})", unfiled.len()).bright_black()
    );
    print_snippets(&unfiled);
}

pub fn display_collection(store: &RecordStore, collection: &CollectionRef) {
    let Some(found) = store
        .get_sorted_collections(None)
        .into_iter()
        .find(|c| c.reference() == *collection)
    else {
        println!("{}  Collection {} not found", bar(), collection);
        return;
    };

    println!("{}  {}", bar(), painted_name(&found));
    print_snippets(&store.get_snippets_for_collection(collection, None));
}

/// Collections with their ids, colors and sizes
pub fn list_all_collections(store: &RecordStore) {
    println!("{}  {}", bar(), "COLLECTIONS".bold());
    rule();
    for (idx, collection) in store.get_sorted_collections(None).iter().enumerate() {
        let count = store.collection_snippet_count(&collection.reference(), None);
        println!(
            "{}  {}. {} {} {}",
            bar(),
            (idx + 1).to_string().bright_yellow(),
            painted_name(collection),
            format!("({} snippets)", count).bright_black(),
            collection.color().bright_black()
        );
        println!(
            "{}     {}: {}",
            bar(),
            "ID".bright_black(),
            collection.reference()
        );
    }
}
