use crate::models::{Snippet, SnippetLanguage};
use crate::store::RecordStore;
use uuid::Uuid;

const MAX_RECENT_SEARCHES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    Title,
    Tag(String),
    Language,
    Content { line: usize, text: String },
}

impl MatchKind {
    /// One-line description shown next to a result
    pub fn context(&self) -> String {
        match self {
            MatchKind::Title => "Title match".to_string(),
            MatchKind::Tag(name) => format!("Tag: #{}", name),
            MatchKind::Language => "Language match".to_string(),
            MatchKind::Content { line, text } => format!("Line {}: {}", line, text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub snippet_id: Uuid,
    pub title: String,
    pub collection_id: Option<Uuid>,
    pub kind: MatchKind,
}

/// Searches the user's snippets, case-insensitively. Each snippet is reported
/// once, by the first of title, tag, language or content that matches.
pub fn search_snippets(store: &RecordStore, user_id: Option<&str>, query: &str) -> Vec<SearchHit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    store
        .get_user_snippets(user_id)
        .into_iter()
        .filter_map(|snippet| {
            let kind = match_snippet(store, snippet, &query)?;
            Some(SearchHit {
                snippet_id: snippet.id,
                title: snippet.title.clone(),
                collection_id: snippet.collection_id,
                kind,
            })
        })
        .collect()
}

fn match_snippet(store: &RecordStore, snippet: &Snippet, query: &str) -> Option<MatchKind> {
    if snippet.title.to_lowercase().contains(query) {
        return Some(MatchKind::Title);
    }

    let query_tag = query.trim_start_matches('#');
    if let Some(tag) = store
        .tag_names(snippet)
        .into_iter()
        .find(|name| !query_tag.is_empty() && name.to_lowercase().contains(query_tag))
    {
        return Some(MatchKind::Tag(tag));
    }

    if snippet.language.id().contains(query)
        || snippet.language.display_name().to_lowercase().contains(query)
    {
        return Some(MatchKind::Language);
    }

    snippet
        .content
        .lines()
        .enumerate()
        .find(|(_, line)| line.to_lowercase().contains(query))
        .map(|(i, line)| MatchKind::Content {
            line: i + 1,
            text: line.trim().to_string(),
        })
}

/// Narrows the community listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExploreFilter {
    pub query: String,
    pub language: Option<SnippetLanguage>,
}

/// Public snippets matching `filter`, in community order
pub fn explore<'a>(store: &'a RecordStore, filter: &ExploreFilter) -> Vec<&'a Snippet> {
    let query = filter.query.trim().to_lowercase();

    store
        .get_public_snippets()
        .into_iter()
        .filter(|s| filter.language.as_ref().is_none_or(|l| s.language == *l))
        .filter(|s| {
            query.is_empty()
                || s.title.to_lowercase().contains(&query)
                || s.content.to_lowercase().contains(&query)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSearch {
    pub query: String,
    pub result_count: usize,
}

/// Most recent first, without duplicates
#[derive(Debug, Clone, Default)]
pub struct RecentSearches {
    entries: Vec<RecentSearch>,
}

impl RecentSearches {
    pub fn record(&mut self, query: &str, result_count: usize) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        self.entries.retain(|entry| entry.query != query);
        self.entries.insert(
            0,
            RecentSearch {
                query: query.to_string(),
                result_count,
            },
        );
        self.entries.truncate(MAX_RECENT_SEARCHES);
    }

    pub fn entries(&self) -> &[RecentSearch] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewSnippet;

    fn store() -> RecordStore {
        let mut store = RecordStore::in_memory();
        store.set_current_user(Some("ana".into()));
        store
    }

    #[test]
    fn title_match_wins_over_content() {
        let mut store = store();
        store.add_snippet(NewSnippet::new(
            "Debounce",
            "function debounce(fn) {}",
            SnippetLanguage::JavaScript,
        ));

        let hits = search_snippets(&store, None, "DEBOUNCE");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, MatchKind::Title);
    }

    #[test]
    fn content_match_reports_first_line() {
        let mut store = store();
        store.add_snippet(NewSnippet::new(
            "Retry",
            "let a = 1;\n   let attempts = 3;  \nattempts += 1;",
            SnippetLanguage::Rust,
        ));

        let hits = search_snippets(&store, None, "attempts");
        assert_eq!(
            hits[0].kind,
            MatchKind::Content {
                line: 2,
                text: "let attempts = 3;".into()
            }
        );
        assert_eq!(hits[0].kind.context(), "Line 2: let attempts = 3;");
    }

    #[test]
    fn tag_and_language_matches() {
        let mut store = store();
        let id = store.add_snippet(NewSnippet::new("Grid", "", SnippetLanguage::CSS));
        let tag = store.create_tag("layout").unwrap();
        store.assign_tags(&id, &[tag]);

        assert_eq!(
            search_snippets(&store, None, "#lay")[0].kind,
            MatchKind::Tag("layout".into())
        );
        assert_eq!(search_snippets(&store, None, "css")[0].kind, MatchKind::Language);
    }

    #[test]
    fn search_is_scoped_to_user() {
        let mut store = store();
        store.add_snippet(NewSnippet::new("shared name", "", SnippetLanguage::Text));
        store.set_current_user(Some("bo".into()));

        assert!(search_snippets(&store, None, "shared").is_empty());
        assert!(search_snippets(&store, None, "   ").is_empty());
        assert_eq!(search_snippets(&store, Some("ana"), "shared").len(), 1);
    }

    #[test]
    fn explore_filters_by_language_and_text() {
        let mut store = store();
        store.add_snippet(NewSnippet::new("py one", "print()", SnippetLanguage::Python).public(true));
        store.add_snippet(NewSnippet::new("js one", "console.log()", SnippetLanguage::JavaScript).public(true));
        store.add_snippet(NewSnippet::new("hidden", "print()", SnippetLanguage::Python));

        let python = explore(
            &store,
            &ExploreFilter {
                language: Some(SnippetLanguage::Python),
                ..ExploreFilter::default()
            },
        );
        assert_eq!(python.len(), 1);

        let logs = explore(
            &store,
            &ExploreFilter {
                query: "console".into(),
                language: None,
            },
        );
        assert_eq!(logs[0].title, "js one");
        assert_eq!(explore(&store, &ExploreFilter::default()).len(), 2);
    }

    #[test]
    fn recent_searches_dedupe_and_cap() {
        let mut recent = RecentSearches::default();
        for i in 0..25 {
            recent.record(&format!("q{}", i), i);
        }
        recent.record("q24", 1);
        recent.record("", 0);

        assert_eq!(recent.entries().len(), MAX_RECENT_SEARCHES);
        assert_eq!(recent.entries()[0].query, "q24");
        assert_eq!(recent.entries()[0].result_count, 1);
    }
}
