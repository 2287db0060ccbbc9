//! Record store for snippets, collections and tags.
//!
//! The store owns every record it knows about across all users, scoped by a
//! current user context. Mutations are synchronous and cannot fail: an
//! unknown id is a silent no-op. Persisting is a separate, explicit step
//! (`flush`) through the injected [`Persistence`].

mod fork;
mod positions;

pub use positions::{LocalCollectionPositions, LocalSnippetPositions};

use crate::models::{
    Collection, CollectionPatch, CollectionRef, FavoritesCollection, MemoryStorage,
    NewCollection, NewSnippet, Persistence, PositionUpdate, Snippet, SnippetPatch,
    StoreSnapshot, Tag, TagManager, UserCollection, GUEST_USER,
};
use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Which list of snippets a view or an ordering refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnippetScope {
    /// Snippets without a collection, shown on the home view
    Unfiled,
    Collection(CollectionRef),
}

const GUEST_COLLECTIONS: [(&str, &str); 3] = [
    ("JavaScript", "#F7DF1E"),
    ("CSS", "#1572B6"),
    ("Python", "#3776AB"),
];

#[derive(Debug)]
pub struct RecordStore {
    snippets: Vec<Snippet>,
    collections: Vec<UserCollection>,
    tags: TagManager,
    current_user: Option<String>,
    persistence: Box<dyn Persistence>,
}

impl RecordStore {
    /// Loads the last saved snapshot from `persistence`
    pub fn open(persistence: impl Persistence + 'static) -> Result<Self> {
        let snapshot = persistence.load()?;
        Ok(Self::from_snapshot(snapshot, Box::new(persistence)))
    }

    /// An empty store that keeps nothing beyond the process lifetime
    pub fn in_memory() -> Self {
        Self::from_snapshot(StoreSnapshot::default(), Box::new(MemoryStorage::new()))
    }

    fn from_snapshot(snapshot: StoreSnapshot, persistence: Box<dyn Persistence>) -> Self {
        Self {
            snippets: snapshot.snippets,
            collections: snapshot.collections,
            tags: TagManager::from_tags(snapshot.tags),
            current_user: None,
            persistence,
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let mut tags: Vec<Tag> = self.tags.all().cloned().collect();
        tags.sort_by_key(|t| t.created_at);
        StoreSnapshot {
            snippets: self.snippets.clone(),
            collections: self.collections.clone(),
            tags,
        }
    }

    /// Writes the current records through the injected persistence
    pub fn flush(&self) -> Result<()> {
        self.persistence.save(&self.snapshot())
    }

    // User context

    /// Establishes (or clears) the user whose records reads default to.
    /// The user's Favorites collection is virtual and becomes visible as soon
    /// as the context exists.
    pub fn set_current_user(&mut self, user_id: Option<String>) {
        let user_id = user_id.filter(|id| !id.trim().is_empty());
        debug!(user = ?user_id, "user context changed");
        self.current_user = user_id;
    }

    /// The signed-in user, or the guest sentinel
    pub fn current_user(&self) -> &str {
        self.current_user.as_deref().unwrap_or(GUEST_USER)
    }

    pub fn is_guest(&self) -> bool {
        self.current_user() == GUEST_USER
    }

    fn target_user<'a>(&'a self, user_id: Option<&'a str>) -> &'a str {
        user_id.unwrap_or_else(|| self.current_user())
    }

    // Snippets

    /// Creates a snippet owned by the current user and puts it at the front
    /// of the snippet set.
    pub fn add_snippet(&mut self, data: NewSnippet) -> Uuid {
        let snippet = Snippet::create(self.current_user(), data);
        let id = snippet.id;
        self.snippets.insert(0, snippet);
        id
    }

    /// Merges `patch` into the snippet. Returns false when the id is unknown.
    pub fn update_snippet(&mut self, id: &Uuid, patch: SnippetPatch) -> bool {
        match self.snippets.iter_mut().find(|s| s.id == *id) {
            Some(snippet) => {
                snippet.apply(patch);
                true
            }
            None => {
                warn!(snippet = %id, "update ignored, snippet not found");
                false
            }
        }
    }

    /// Removes a snippet. Deleting a fork decrements the original's fork
    /// count, never below zero.
    pub fn delete_snippet(&mut self, id: &Uuid) -> Option<Snippet> {
        let index = self.snippets.iter().position(|s| s.id == *id)?;
        let removed = self.snippets.remove(index);

        if let Some(original_id) = removed.forked_from {
            if let Some(original) = self.snippets.iter_mut().find(|s| s.id == original_id) {
                original.fork_count = original.fork_count.saturating_sub(1);
            }
        }

        Some(removed)
    }

    /// Moves a snippet to the id the backend assigned it. Returns false when
    /// `old` is unknown or the ids are equal.
    pub fn rekey_snippet(&mut self, old: &Uuid, new: Uuid) -> bool {
        if *old == new {
            return false;
        }
        if self.snippets.iter().any(|s| s.id == new) {
            self.snippets.retain(|s| s.id != *old);
            return true;
        }
        let Some(snippet) = self.snippets.iter_mut().find(|s| s.id == *old) else {
            warn!(snippet = %old, "rekey ignored, snippet not found");
            return false;
        };
        snippet.id = new;
        for fork in self.snippets.iter_mut().filter(|s| s.forked_from == Some(*old)) {
            fork.forked_from = Some(new);
        }
        debug!(%old, %new, "snippet rekeyed to backend id");
        true
    }

    pub fn find_snippet(&self, id: &Uuid) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == *id)
    }

    pub fn all_snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn get_user_snippets(&self, user_id: Option<&str>) -> Vec<&Snippet> {
        let user = self.target_user(user_id);
        self.snippets.iter().filter(|s| s.user_id == user).collect()
    }

    pub fn get_favorite_snippets(&self, user_id: Option<&str>) -> Vec<&Snippet> {
        let user = self.target_user(user_id);
        self.snippets
            .iter()
            .filter(|s| s.user_id == user && s.is_favorite)
            .collect()
    }

    /// Snippets of a collection in display order. For Favorites this is every
    /// favorite-flagged snippet of the user, whatever its collection.
    pub fn get_snippets_for_collection(
        &self,
        collection: &CollectionRef,
        user_id: Option<&str>,
    ) -> Vec<&Snippet> {
        let user = self.target_user(user_id);
        let mut snippets: Vec<&Snippet> = match collection {
            CollectionRef::Favorites => return self.get_favorite_snippets(Some(user)),
            CollectionRef::Named(id) => self
                .snippets
                .iter()
                .filter(|s| s.user_id == user && s.collection_id == Some(*id))
                .collect(),
        };
        snippets.sort_by_key(|s| s.position);
        snippets
    }

    /// The user's unfiled snippets (home view) in display order
    pub fn unfiled_snippets(&self, user_id: Option<&str>) -> Vec<&Snippet> {
        let user = self.target_user(user_id);
        let mut snippets: Vec<&Snippet> = self
            .snippets
            .iter()
            .filter(|s| s.user_id == user && s.is_unfiled())
            .collect();
        snippets.sort_by_key(|s| s.position);
        snippets
    }

    pub fn snippets_in_scope(&self, scope: &SnippetScope, user_id: Option<&str>) -> Vec<&Snippet> {
        match scope {
            SnippetScope::Unfiled => self.unfiled_snippets(user_id),
            SnippetScope::Collection(collection) => {
                self.get_snippets_for_collection(collection, user_id)
            }
        }
    }

    /// Every public snippet from every user, most forked first, then newest.
    pub fn get_public_snippets(&self) -> Vec<&Snippet> {
        let mut snippets: Vec<&Snippet> = self.snippets.iter().filter(|s| s.is_public).collect();
        snippets.sort_by(|a, b| {
            b.fork_count
                .cmp(&a.fork_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        snippets
    }

    /// Stores dense positions for the snippets of `scope`. Ids outside the
    /// scope are ignored; Favorites has no ordering of its own.
    pub fn apply_snippet_positions(&mut self, scope: &SnippetScope, positions: &[PositionUpdate]) -> usize {
        let collection_id = match scope {
            SnippetScope::Unfiled => None,
            SnippetScope::Collection(CollectionRef::Named(id)) => Some(*id),
            SnippetScope::Collection(CollectionRef::Favorites) => {
                debug!("favorites ordering is derived, positions ignored");
                return 0;
            }
        };
        let user = self.current_user().to_string();
        let wanted: HashMap<Uuid, i64> = positions.iter().map(|p| (p.id, p.position)).collect();

        let mut applied = 0;
        let mut rest: Vec<&mut Snippet> = Vec::new();
        for snippet in self
            .snippets
            .iter_mut()
            .filter(|s| s.user_id == user && s.collection_id == collection_id)
        {
            match wanted.get(&snippet.id) {
                Some(position) => {
                    snippet.position = *position;
                    applied += 1;
                }
                None => rest.push(snippet),
            }
        }

        // Members missing from the payload keep their relative order after it
        rest.sort_by_key(|s| s.position);
        for (offset, snippet) in rest.into_iter().enumerate() {
            snippet.position = (positions.len() + offset) as i64;
        }
        applied
    }

    /// Assigns position = index in `ordered_ids` to the snippets of `scope`.
    pub fn reorder_snippets(&mut self, scope: &SnippetScope, ordered_ids: &[Uuid]) -> usize {
        let positions: Vec<PositionUpdate> = ordered_ids
            .iter()
            .enumerate()
            .map(|(index, id)| PositionUpdate {
                id: *id,
                position: index as i64,
            })
            .collect();
        self.apply_snippet_positions(scope, &positions)
    }

    // Collections

    pub fn add_collection(&mut self, data: NewCollection) -> Uuid {
        let collection = UserCollection::new(self.current_user(), data);
        let id = collection.id;
        self.collections.push(collection);
        id
    }

    /// Updates a named collection. Favorites is never editable.
    pub fn update_collection(&mut self, collection: &CollectionRef, patch: CollectionPatch) -> bool {
        let CollectionRef::Named(id) = collection else {
            debug!("favorites collection cannot be edited");
            return false;
        };
        match self.collections.iter_mut().find(|c| c.id == *id) {
            Some(collection) => {
                collection.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Deletes a named collection and detaches its snippets. Favorites is
    /// never deletable.
    pub fn delete_collection(&mut self, collection: &CollectionRef) -> Option<UserCollection> {
        let CollectionRef::Named(id) = collection else {
            debug!("favorites collection cannot be deleted");
            return None;
        };
        let index = self.collections.iter().position(|c| c.id == *id)?;
        let removed = self.collections.remove(index);

        for snippet in self
            .snippets
            .iter_mut()
            .filter(|s| s.collection_id == Some(removed.id))
        {
            snippet.collection_id = None;
        }

        Some(removed)
    }

    pub fn find_collection(&self, id: &Uuid) -> Option<&UserCollection> {
        self.collections.iter().find(|c| c.id == *id)
    }

    /// Case-insensitive name lookup among the user's collections
    pub fn find_collection_by_name(&self, name: &str, user_id: Option<&str>) -> Option<&UserCollection> {
        let user = self.target_user(user_id);
        let name = name.to_lowercase();
        self.collections
            .iter()
            .find(|c| c.user_id == user && c.name.to_lowercase() == name)
    }

    /// The user's collections: Favorites first, then by position, then oldest first.
    pub fn get_sorted_collections(&self, user_id: Option<&str>) -> Vec<Collection> {
        let user = self.target_user(user_id);

        let mut named: Vec<&UserCollection> =
            self.collections.iter().filter(|c| c.user_id == user).collect();
        named.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let favorites = Collection::Favorites(FavoritesCollection {
            user_id: user.to_string(),
            snippet_count: self.get_favorite_snippets(Some(user)).len(),
        });

        std::iter::once(favorites)
            .chain(named.into_iter().cloned().map(Collection::Named))
            .collect()
    }

    pub fn collection_snippet_count(&self, collection: &CollectionRef, user_id: Option<&str>) -> usize {
        self.get_snippets_for_collection(collection, user_id).len()
    }

    /// Stores dense positions for the current user's collections.
    pub fn apply_collection_positions(&mut self, positions: &[PositionUpdate]) -> usize {
        let user = self.current_user().to_string();
        let wanted: HashMap<Uuid, i64> = positions.iter().map(|p| (p.id, p.position)).collect();

        let mut applied = 0;
        let mut rest: Vec<&mut UserCollection> = Vec::new();
        for collection in self.collections.iter_mut().filter(|c| c.user_id == user) {
            match wanted.get(&collection.id) {
                Some(position) => {
                    collection.position = *position;
                    applied += 1;
                }
                None => rest.push(collection),
            }
        }

        rest.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        for (offset, collection) in rest.into_iter().enumerate() {
            collection.position = (positions.len() + offset) as i64;
        }
        applied
    }

    // Tags

    pub fn tags(&self) -> &TagManager {
        &self.tags
    }

    pub fn create_tag(&mut self, name: &str) -> Option<Uuid> {
        let user = self.current_user().to_string();
        self.tags.create_tag(&user, name)
    }

    pub fn rename_tag(&mut self, tag_id: &Uuid, name: &str) -> bool {
        self.tags.rename_tag(tag_id, name)
    }

    /// Deletes a tag and strips it from every snippet carrying it
    pub fn delete_tag(&mut self, tag_id: &Uuid) -> Option<Tag> {
        let removed = self.tags.remove_tag(tag_id)?;
        for snippet in self.snippets.iter_mut() {
            snippet.tag_ids.retain(|id| id != tag_id);
        }
        Some(removed)
    }

    /// Replaces a snippet's tags. Tags not owned by the snippet's owner are
    /// dropped.
    pub fn assign_tags(&mut self, snippet_id: &Uuid, tag_ids: &[Uuid]) -> bool {
        let Some(owner) = self.find_snippet(snippet_id).map(|s| s.user_id.clone()) else {
            return false;
        };

        let mut accepted: Vec<Uuid> = Vec::new();
        for id in tag_ids {
            if self.tags.is_owned_by(id, &owner) && !accepted.contains(id) {
                accepted.push(*id);
            }
        }

        self.update_snippet(
            snippet_id,
            SnippetPatch {
                tag_ids: Some(accepted),
                ..SnippetPatch::default()
            },
        )
    }

    /// The user's tags with how many of their snippets carry each one
    pub fn tags_with_usage(&self, user_id: Option<&str>) -> Vec<(&Tag, usize)> {
        let user = self.target_user(user_id);
        self.tags
            .tags_for_user(user)
            .into_iter()
            .map(|tag| {
                let uses = self
                    .snippets
                    .iter()
                    .filter(|s| s.user_id == user && s.tag_ids.contains(&tag.id))
                    .count();
                (tag, uses)
            })
            .collect()
    }

    pub fn tag_names(&self, snippet: &Snippet) -> Vec<String> {
        snippet
            .tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id))
            .map(|t| t.name.clone())
            .collect()
    }

    // Sync

    /// Swaps every record owned by `user_id` for the canonical copies fetched
    /// from the backend. Other users' records are untouched.
    pub fn replace_user_records(
        &mut self,
        user_id: &str,
        snippets: Vec<Snippet>,
        collections: Vec<UserCollection>,
    ) {
        self.snippets.retain(|s| s.user_id != user_id);
        let mut incoming = snippets;
        incoming.retain(|s| s.user_id == user_id);
        incoming.append(&mut self.snippets);
        self.snippets = incoming;

        self.collections.retain(|c| c.user_id != user_id);
        self.collections
            .extend(collections.into_iter().filter(|c| c.user_id == user_id));
    }

    /// Replaces the public snippets of other users with a fresh community listing.
    pub fn replace_public_snippets(&mut self, public: Vec<Snippet>) {
        let me = self.current_user().to_string();
        self.snippets.retain(|s| s.user_id == me || !s.is_public);
        for snippet in public {
            if snippet.user_id == me || self.find_snippet(&snippet.id).is_some() {
                continue;
            }
            self.snippets.push(snippet);
        }
    }

    pub fn replace_user_tags(&mut self, user_id: &str, tags: Vec<Tag>) {
        self.tags.replace_user_tags(user_id, tags);
    }

    /// Gives an empty guest library the starter collections.
    pub fn seed_guest_library(&mut self) -> bool {
        if !self.is_guest() || !self.collections.is_empty() || !self.snippets.is_empty() {
            return false;
        }

        for (position, (name, color)) in GUEST_COLLECTIONS.iter().enumerate() {
            self.add_collection(NewCollection {
                name: name.to_string(),
                color: Some(color.to_string()),
                position: position as i64,
            });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SnippetLanguage, FAVORITES_ID};

    fn store_for(user: &str) -> RecordStore {
        let mut store = RecordStore::in_memory();
        store.set_current_user(Some(user.to_string()));
        store
    }

    #[test]
    fn add_snippet_defaults_for_guest() {
        let mut store = RecordStore::in_memory();
        let id = store.add_snippet(NewSnippet::new("x", "y", SnippetLanguage::from_name("js")));

        let snippet = store.find_snippet(&id).unwrap();
        assert_eq!(snippet.user_id, "guest");
        assert_eq!(snippet.fork_count, 0);
        assert_eq!(snippet.position, 0);
        assert!(snippet.collection_id.is_none());
        assert!(!snippet.is_public);
        assert_eq!(store.get_user_snippets(Some("guest")).len(), 1);
    }

    #[test]
    fn add_snippet_prepends() {
        let mut store = store_for("ana");
        let first = store.add_snippet(NewSnippet::new("a", "", SnippetLanguage::Text));
        let second = store.add_snippet(NewSnippet::new("b", "", SnippetLanguage::Text));

        let ids: Vec<Uuid> = store.get_user_snippets(None).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn update_unknown_snippet_is_noop() {
        let mut store = store_for("ana");
        store.add_snippet(NewSnippet::new("a", "", SnippetLanguage::Text));
        let before = store.snapshot();

        assert!(!store.update_snippet(&Uuid::new_v4(), SnippetPatch::favorite(true)));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn favorite_flag_controls_favorites_membership() {
        let mut store = store_for("ana");
        let id = store.add_snippet(NewSnippet::new("a", "", SnippetLanguage::Text));

        store.update_snippet(&id, SnippetPatch::favorite(true));
        let favorites = store.get_snippets_for_collection(&CollectionRef::Favorites, None);
        assert!(favorites.iter().any(|s| s.id == id));

        store.update_snippet(&id, SnippetPatch::favorite(false));
        let favorites = store.get_snippets_for_collection(&CollectionRef::Favorites, None);
        assert!(favorites.iter().all(|s| s.id != id));
    }

    #[test]
    fn favorites_includes_filed_snippets() {
        let mut store = store_for("ana");
        let collection = store.add_collection(NewCollection::named("Rust"));
        let id = store.add_snippet(
            NewSnippet::new("a", "", SnippetLanguage::Rust)
                .in_collection(collection)
                .favorite(true),
        );

        let favorites = store.get_snippets_for_collection(&CollectionRef::Favorites, None);
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, id);
    }

    #[test]
    fn deleting_collection_detaches_snippets() {
        let mut store = store_for("ana");
        let collection = store.add_collection(NewCollection::named("Rust"));
        let a = store.add_snippet(NewSnippet::new("a", "", SnippetLanguage::Rust).in_collection(collection));
        let b = store.add_snippet(NewSnippet::new("b", "", SnippetLanguage::Rust).in_collection(collection));

        assert!(store.delete_collection(&CollectionRef::Named(collection)).is_some());

        assert!(store.find_snippet(&a).unwrap().collection_id.is_none());
        assert!(store.find_snippet(&b).unwrap().collection_id.is_none());
        assert!(
            store
                .get_sorted_collections(None)
                .iter()
                .all(|c| c.reference() != CollectionRef::Named(collection))
        );
        assert_eq!(store.unfiled_snippets(None).len(), 2);
    }

    #[test]
    fn favorites_cannot_be_edited_or_deleted() {
        let mut store = store_for("ana");
        assert!(!store.update_collection(&CollectionRef::Favorites, CollectionPatch::rename("Mine")));
        assert!(store.delete_collection(&CollectionRef::Favorites).is_none());

        let collections = store.get_sorted_collections(None);
        assert_eq!(collections[0].name(), "Favorites");
        assert_eq!(collections[0].reference().to_string(), FAVORITES_ID);
    }

    #[test]
    fn sorted_collections_put_favorites_first_then_positions() {
        let mut store = store_for("ana");
        let late = store.add_collection(NewCollection {
            name: "late".into(),
            color: None,
            position: 2,
        });
        let early = store.add_collection(NewCollection {
            name: "early".into(),
            color: None,
            position: 1,
        });

        let refs: Vec<CollectionRef> = store
            .get_sorted_collections(None)
            .iter()
            .map(|c| c.reference())
            .collect();
        assert_eq!(
            refs,
            vec![
                CollectionRef::Favorites,
                CollectionRef::Named(early),
                CollectionRef::Named(late)
            ]
        );
    }

    #[test]
    fn reads_are_scoped_to_user() {
        let mut store = store_for("ana");
        store.add_snippet(NewSnippet::new("mine", "", SnippetLanguage::Text));
        store.add_collection(NewCollection::named("ana's"));
        store.set_current_user(Some("bo".into()));
        store.add_snippet(NewSnippet::new("theirs", "", SnippetLanguage::Text).public(true));

        assert_eq!(store.get_user_snippets(None).len(), 1);
        assert_eq!(store.get_user_snippets(Some("ana")).len(), 1);
        assert_eq!(store.get_sorted_collections(None).len(), 1);
        assert_eq!(store.get_sorted_collections(Some("ana")).len(), 2);
        assert_eq!(store.get_public_snippets().len(), 1);
    }

    #[test]
    fn signing_out_falls_back_to_guest() {
        let mut store = store_for("ana");
        store.set_current_user(None);
        assert_eq!(store.current_user(), "guest");
        assert!(store.is_guest());
    }

    #[test]
    fn public_listing_orders_by_fork_count() {
        let mut store = store_for("ana");
        let quiet = store.add_snippet(NewSnippet::new("quiet", "", SnippetLanguage::Text).public(true));
        let popular = store.add_snippet(NewSnippet::new("popular", "", SnippetLanguage::Text).public(true));
        store.add_snippet(NewSnippet::new("private", "", SnippetLanguage::Text));
        store.snippets.iter_mut().find(|s| s.id == popular).unwrap().fork_count = 3;

        let ids: Vec<Uuid> = store.get_public_snippets().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![popular, quiet]);
    }

    #[test]
    fn reorder_snippets_writes_dense_positions() {
        let mut store = store_for("ana");
        let collection = store.add_collection(NewCollection::named("c"));
        let scope = SnippetScope::Collection(CollectionRef::Named(collection));
        let a = store.add_snippet(NewSnippet::new("a", "", SnippetLanguage::Text).in_collection(collection));
        let b = store.add_snippet(NewSnippet::new("b", "", SnippetLanguage::Text).in_collection(collection));
        let c = store.add_snippet(NewSnippet::new("c", "", SnippetLanguage::Text).in_collection(collection));

        assert_eq!(store.reorder_snippets(&scope, &[c, a, b]), 3);

        let ids: Vec<Uuid> = store.snippets_in_scope(&scope, None).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![c, a, b]);
        assert_eq!(store.reorder_snippets(&SnippetScope::Collection(CollectionRef::Favorites), &[a]), 0);
    }

    #[test]
    fn deleting_tag_strips_snippets() {
        let mut store = store_for("ana");
        let id = store.add_snippet(NewSnippet::new("a", "", SnippetLanguage::Text));
        let tag = store.create_tag("#web").unwrap();
        assert!(store.assign_tags(&id, &[tag, tag]));
        assert_eq!(store.find_snippet(&id).unwrap().tag_ids, vec![tag]);
        assert_eq!(store.tags_with_usage(None)[0].1, 1);

        store.delete_tag(&tag);
        assert!(store.find_snippet(&id).unwrap().tag_ids.is_empty());
    }

    #[test]
    fn foreign_tags_are_not_assigned() {
        let mut store = store_for("bo");
        let theirs = store.create_tag("secret").unwrap();
        store.set_current_user(Some("ana".into()));
        let id = store.add_snippet(NewSnippet::new("a", "", SnippetLanguage::Text));

        store.assign_tags(&id, &[theirs]);
        assert!(store.find_snippet(&id).unwrap().tag_ids.is_empty());
    }

    #[test]
    fn replace_user_records_keeps_other_users() {
        let mut store = store_for("bo");
        store.add_snippet(NewSnippet::new("bo's", "", SnippetLanguage::Text));
        store.set_current_user(Some("ana".into()));
        store.add_snippet(NewSnippet::new("stale", "", SnippetLanguage::Text));

        let fresh = Snippet::create("ana", NewSnippet::new("fresh", "", SnippetLanguage::Text));
        store.replace_user_records("ana", vec![fresh.clone()], Vec::new());

        let mine = store.get_user_snippets(None);
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "fresh");
        assert_eq!(store.get_user_snippets(Some("bo")).len(), 1);
    }

    #[test]
    fn guest_library_is_seeded_once() {
        let mut store = RecordStore::in_memory();
        assert!(store.seed_guest_library());
        assert!(!store.seed_guest_library());

        let names: Vec<String> = store
            .get_sorted_collections(None)
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["Favorites", "JavaScript", "CSS", "Python"]);
    }

    #[test]
    fn flush_writes_through_persistence() {
        let storage = MemoryStorage::new();
        let mut store = RecordStore::open(storage.clone()).unwrap();
        store.add_snippet(NewSnippet::new("kept", "", SnippetLanguage::Text));
        store.flush().unwrap();

        let reopened = RecordStore::open(storage).unwrap();
        assert_eq!(reopened.all_snippets()[0].title, "kept");
    }
}
