use snippy::models::{
    CollectionPatch, CollectionRef, JsonFileStorage, MemoryStorage, NewCollection, NewSnippet,
    Persistence, SnippetLanguage, SnippetPatch,
};
use snippy::{RecordStore, ReorderList, ReorderState, SnippetScope};
use uuid::Uuid;

fn store_for(user: &str) -> RecordStore {
    let mut store = RecordStore::in_memory();
    store.set_current_user(Some(user.to_string()));
    store
}

#[test]
fn guest_snippet_has_documented_defaults() {
    let mut store = RecordStore::in_memory();
    let id = store.add_snippet(
        NewSnippet::new("x", "y", SnippetLanguage::from_name("js")).public(false),
    );

    let snippet = store.find_snippet(&id).unwrap();
    assert_eq!(snippet.fork_count, 0);
    assert_eq!(snippet.collection_id, None);
    assert_eq!(snippet.position, 0);
    assert_eq!(snippet.language, SnippetLanguage::JavaScript);
    assert!(store.get_user_snippets(Some("guest")).iter().any(|s| s.id == id));
}

#[test]
fn favorite_flag_drives_favorites_collection() {
    let mut store = store_for("ana");
    let id = store.add_snippet(NewSnippet::new("a", "", SnippetLanguage::Text));
    let favorites = |store: &RecordStore| -> Vec<Uuid> {
        store
            .get_snippets_for_collection(&CollectionRef::Favorites, None)
            .iter()
            .map(|s| s.id)
            .collect()
    };

    store.update_snippet(&id, SnippetPatch::favorite(true));
    assert_eq!(favorites(&store), vec![id]);
    store.update_snippet(&id, SnippetPatch::favorite(false));
    assert!(favorites(&store).is_empty());
}

#[test]
fn fork_lifecycle() {
    let mut store = store_for("bo");
    let original_id =
        store.add_snippet(NewSnippet::new("retry", "loop {}", SnippetLanguage::Rust).public(true));
    store.set_current_user(Some("ana".into()));

    let original = store.find_snippet(&original_id).unwrap().clone();
    let fork_id = store.fork_snippet(&original).unwrap();
    let fork = store.find_snippet(&fork_id).unwrap();
    assert_eq!(fork.forked_from, Some(original_id));
    assert_eq!(fork.collection_id, None);
    assert!(!fork.is_public);
    assert_eq!(store.find_snippet(&original_id).unwrap().fork_count, 1);

    // Filing the fork does not re-enable forking
    let shelf = store.add_collection(NewCollection::named("Shelf"));
    store.update_snippet(&fork_id, SnippetPatch::file_into(Some(shelf)));
    assert!(store.fork_snippet(&original).is_none());
    assert_eq!(store.find_snippet(&original_id).unwrap().fork_count, 1);
    assert_eq!(store.forks_of(&original_id).len(), 1);

    store.delete_snippet(&fork_id);
    assert_eq!(store.find_snippet(&original_id).unwrap().fork_count, 0);
}

#[test]
fn deleting_collection_unfiles_its_snippets() {
    let mut store = store_for("ana");
    let collection = store.add_collection(NewCollection::named("Rust"));
    let a = store.add_snippet(NewSnippet::new("a", "", SnippetLanguage::Rust).in_collection(collection));

    store.delete_collection(&CollectionRef::Named(collection));

    assert_eq!(store.find_snippet(&a).unwrap().collection_id, None);
    assert!(
        store
            .get_sorted_collections(None)
            .iter()
            .all(|c| c.reference() != CollectionRef::Named(collection))
    );
}

#[test]
fn favorites_is_protected_and_first() {
    let mut store = store_for("ana");
    store.add_collection(NewCollection {
        name: "first by position".into(),
        color: None,
        position: -1,
    });

    assert!(!store.update_collection(&CollectionRef::Favorites, CollectionPatch::rename("x")));
    assert!(store.delete_collection(&CollectionRef::Favorites).is_none());
    assert!(store.get_sorted_collections(None)[0].is_favorites());
}

#[test]
fn reorder_save_and_reset_round_trip() {
    let storage = MemoryStorage::new();
    let mut store = RecordStore::open(storage.clone()).unwrap();
    store.set_current_user(Some("ana".into()));
    let collection = store.add_collection(NewCollection::named("Ordered"));
    let scope = SnippetScope::Collection(CollectionRef::Named(collection));

    let ids: Vec<Uuid> = ["A", "B", "C", "D"]
        .iter()
        .map(|t| store.add_snippet(NewSnippet::new(*t, "", SnippetLanguage::Text).in_collection(collection)))
        .collect();
    store.reorder_snippets(&scope, &ids);

    let load = |store: &RecordStore| -> Vec<snippy::models::Snippet> {
        store.snippets_in_scope(&scope, None).into_iter().cloned().collect()
    };

    // Reset restores the exact order
    let mut list = ReorderList::new(load(&store));
    list.move_item(3, 0);
    assert_eq!(list.state(), ReorderState::Dirty);
    assert!(list.reset());
    let titles: Vec<&str> = list.items().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C", "D"]);

    // Save persists D:0 A:1 B:2 C:3
    list.move_item(3, 0);
    assert!(list.commit(&mut store.snippet_positions(scope)).unwrap());
    assert_eq!(list.state(), ReorderState::Clean);

    let saved = storage.snapshot();
    let position_of = |id: Uuid| saved.snippets.iter().find(|s| s.id == id).unwrap().position;
    assert_eq!(position_of(ids[3]), 0);
    assert_eq!(position_of(ids[0]), 1);
    assert_eq!(position_of(ids[1]), 2);
    assert_eq!(position_of(ids[2]), 3);
}

#[test]
fn json_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path()).unwrap();
    let store_file = storage.store_file().to_path_buf();

    let mut store = RecordStore::open(storage).unwrap();
    store.set_current_user(Some("ana".into()));
    let id = store.add_snippet(NewSnippet::new("kept", "fn main() {}", SnippetLanguage::Rust));
    let tag = store.create_tag("cli").unwrap();
    store.assign_tags(&id, &[tag]);
    store.flush().unwrap();
    assert!(store_file.exists());

    let reopened = JsonFileStorage::new(dir.path()).unwrap().load().unwrap();
    assert_eq!(reopened.snippets.len(), 1);
    assert_eq!(reopened.snippets[0].tag_ids, vec![tag]);
    assert_eq!(reopened.tags[0].name, "cli");
}

#[test]
fn json_backup_is_timestamped_copy() {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path()).unwrap();
    storage.save(&Default::default()).unwrap();

    let backup = storage.backup().unwrap();
    assert!(backup.exists());
    assert!(backup.starts_with(storage.data_directory().join("backups")));
}
