use super::RecordStore;
use crate::models::{NewSnippet, Snippet};
use tracing::{debug, info};
use uuid::Uuid;

impl RecordStore {
    /// Whether the current user may not fork `snippet_id` (again).
    ///
    /// True when the current user owns the original, or already holds a
    /// snippet forked from it. The check is keyed on the fork's back-reference
    /// and owner only, so filing a fork into a collection does not re-enable
    /// forking.
    pub fn has_forked_snippet(&self, snippet_id: &Uuid, original_owner: &str) -> bool {
        let user = self.current_user();
        if user == original_owner {
            return true;
        }

        self.snippets
            .iter()
            .any(|s| s.user_id == user && s.forked_from == Some(*snippet_id))
    }

    /// Creates a private, unfiled copy of `original` for the current user and
    /// bumps the original's fork count. Returns `None` when the user already
    /// forked it or owns it.
    pub fn fork_snippet(&mut self, original: &Snippet) -> Option<Uuid> {
        if self.has_forked_snippet(&original.id, &original.user_id) {
            debug!(snippet = %original.id, "fork skipped, already forked or own snippet");
            return None;
        }

        let fork_id = self.add_snippet(NewSnippet {
            title: format!("{} (Fork)", original.title),
            content: original.content.clone(),
            language: original.language.clone(),
            collection_id: None,
            is_public: false,
            is_favorite: false,
            position: 0,
            forked_from: Some(original.id),
            tag_ids: Vec::new(),
        });

        if let Some(stored) = self
            .snippets
            .iter_mut()
            .find(|s| s.id == original.id && s.user_id == original.user_id)
        {
            stored.fork_count += 1;
        }

        info!(original = %original.id, fork = %fork_id, "snippet forked");
        Some(fork_id)
    }

    /// Every snippet that back-references `snippet_id`
    pub fn forks_of(&self, snippet_id: &Uuid) -> Vec<&Snippet> {
        self.snippets
            .iter()
            .filter(|s| s.forked_from == Some(*snippet_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{CollectionRef, NewCollection, NewSnippet, SnippetLanguage, SnippetPatch};
    use crate::store::RecordStore;

    fn store_with_public_original() -> (RecordStore, uuid::Uuid) {
        let mut store = RecordStore::in_memory();
        store.set_current_user(Some("author".into()));
        let original = store.add_snippet(
            NewSnippet::new("Debounce", "fn debounce() {}", SnippetLanguage::Rust).public(true),
        );
        store.set_current_user(Some("reader".into()));
        (store, original)
    }

    #[test]
    fn fork_copies_content_and_counts_once() {
        let (mut store, original_id) = store_with_public_original();
        let original = store.find_snippet(&original_id).unwrap().clone();

        let fork_id = store.fork_snippet(&original).unwrap();

        let fork = store.find_snippet(&fork_id).unwrap();
        assert_eq!(fork.title, "Debounce (Fork)");
        assert_eq!(fork.content, original.content);
        assert_eq!(fork.language, SnippetLanguage::Rust);
        assert_eq!(fork.user_id, "reader");
        assert_eq!(fork.forked_from, Some(original_id));
        assert!(fork.collection_id.is_none());
        assert!(!fork.is_public);
        assert!(!fork.is_favorite);
        assert_eq!(fork.position, 0);
        assert_eq!(store.find_snippet(&original_id).unwrap().fork_count, 1);

        assert!(store.fork_snippet(&original).is_none());
        assert_eq!(store.find_snippet(&original_id).unwrap().fork_count, 1);
        assert_eq!(store.forks_of(&original_id).len(), 1);
    }

    #[test]
    fn owner_cannot_fork_own_snippet() {
        let (mut store, original_id) = store_with_public_original();
        store.set_current_user(Some("author".into()));
        let original = store.find_snippet(&original_id).unwrap().clone();

        assert!(store.has_forked_snippet(&original_id, "author"));
        assert!(store.fork_snippet(&original).is_none());
        assert_eq!(store.find_snippet(&original_id).unwrap().fork_count, 0);
    }

    #[test]
    fn filing_a_fork_does_not_allow_a_second_fork() {
        let (mut store, original_id) = store_with_public_original();
        let original = store.find_snippet(&original_id).unwrap().clone();
        let fork_id = store.fork_snippet(&original).unwrap();

        let collection = store.add_collection(NewCollection::named("Saved"));
        store.update_snippet(&fork_id, SnippetPatch::file_into(Some(collection)));

        assert!(store.has_forked_snippet(&original_id, "author"));
        assert!(store.fork_snippet(&original).is_none());
        assert_eq!(
            store
                .get_snippets_for_collection(&CollectionRef::Named(collection), None)
                .len(),
            1
        );
    }

    #[test]
    fn deleting_fork_decrements_original_but_not_below_zero() {
        let (mut store, original_id) = store_with_public_original();
        let original = store.find_snippet(&original_id).unwrap().clone();
        let fork_id = store.fork_snippet(&original).unwrap();

        store.delete_snippet(&fork_id);
        assert_eq!(store.find_snippet(&original_id).unwrap().fork_count, 0);

        // A fork created outside this store still never drives the count negative.
        let orphan = store.add_snippet(NewSnippet {
            forked_from: Some(original_id),
            ..NewSnippet::new("orphan", "", SnippetLanguage::Text)
        });
        store.delete_snippet(&orphan);
        assert_eq!(store.find_snippet(&original_id).unwrap().fork_count, 0);
    }

    #[test]
    fn another_user_can_fork_after_first_reader() {
        let (mut store, original_id) = store_with_public_original();
        let original = store.find_snippet(&original_id).unwrap().clone();
        store.fork_snippet(&original).unwrap();

        store.set_current_user(Some("second-reader".into()));
        assert!(!store.has_forked_snippet(&original_id, "author"));
        store.fork_snippet(&original).unwrap();
        assert_eq!(store.find_snippet(&original_id).unwrap().fork_count, 2);
    }
}
