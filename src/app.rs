use crate::api::{CreateCollectionRequest, CreateSnippetRequest, UpdateSnippetRequest};
use crate::models::{
    Collection, CollectionPatch, CollectionRef, NewCollection, NewSnippet, PositionUpdate,
    Snippet, SnippetLanguage, SnippetPatch,
};
use crate::reorder::ReorderList;
use crate::search::{self, ExploreFilter, RecentSearches, SearchHit};
use crate::session::Session;
use crate::store::SnippetScope;
use crate::sync::{self, PositionTarget, SyncEvent, SyncRequest, SyncWorker};
use crate::ui;
use ratatui::Frame;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Which page the user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Collections, Favorites pinned first, then the unfiled home list
    Library,
    Snippets(SnippetScope),
    Explore,
    Search,
    Detail(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    NewSnippet,
    NewCollection,
    RenameCollection(Uuid),
    EditTags(Uuid),
    Search,
    ExploreFilter,
    HelpMenu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    DeleteSnippet(Uuid),
    DeleteCollection(Uuid),
    /// Leaving a list with unsaved order for another one
    DiscardOrder(View),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub is_error: bool,
}

/// An ordering handed to the sync worker, applied locally once confirmed
#[derive(Debug, Clone)]
struct PendingSave {
    target: PositionTarget,
    positions: Vec<PositionUpdate>,
}

pub struct App {
    pub session: Session,
    worker: Option<SyncWorker>,
    pub view: View,
    history: Vec<(View, usize)>,
    pub selected: usize,
    pub content_scroll: usize,

    pub collections: ReorderList<Collection>,
    pub scope: SnippetScope,
    pub snippets: ReorderList<Snippet>,
    pub explore_filter: ExploreFilter,
    pub explore_ids: Vec<Uuid>,
    pub search_query: String,
    pub search_hits: Vec<SearchHit>,
    pub recent_searches: RecentSearches,

    pub input_mode: InputMode,
    pub input_buffer: String,
    pub confirmation: Option<Confirmation>,
    pub notification: Option<Notification>,
    pending_saves: Vec<PendingSave>,
    pub needs_redraw: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        let mut app = Self {
            session,
            worker: None,
            view: View::Library,
            history: Vec::new(),
            selected: 0,
            content_scroll: 0,
            collections: ReorderList::default(),
            scope: SnippetScope::Unfiled,
            snippets: ReorderList::default(),
            explore_filter: ExploreFilter::default(),
            explore_ids: Vec::new(),
            search_query: String::new(),
            search_hits: Vec::new(),
            recent_searches: RecentSearches::default(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            confirmation: None,
            notification: None,
            pending_saves: Vec::new(),
            needs_redraw: true,
            should_quit: false,
        };

        if let Some(client) = app.session.client.clone() {
            match SyncWorker::spawn(client) {
                Ok(worker) => {
                    worker.submit(SyncRequest::FetchLibrary);
                    worker.submit(SyncRequest::FetchPublic);
                    app.worker = Some(worker);
                }
                Err(e) => app.notify_error(format!("Working offline: {:#}", e)),
            }
        }

        app.refresh_lists();
        app
    }

    pub fn render(&self, frame: &mut Frame) {
        ui::render(frame, self);
    }

    // Notifications

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification {
            message: message.into(),
            is_error: false,
        });
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "error shown to user");
        self.notification = Some(Notification {
            message,
            is_error: true,
        });
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    pub fn is_guest(&self) -> bool {
        self.session.is_guest()
    }

    /// True while the worker still has requests or an order is being saved
    pub fn is_busy(&self) -> bool {
        !self.pending_saves.is_empty() || self.worker.as_ref().is_some_and(SyncWorker::has_pending)
    }

    fn mirror(&mut self, request: SyncRequest) {
        let Some(worker) = &self.worker else {
            return;
        };
        if !worker.submit(request) {
            self.notify_error("Sync stopped; changes are kept locally");
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.session.save() {
            self.notify_error(format!("Failed to save: {:#}", e));
        }
    }

    // Sync

    /// Applies whatever the sync worker reported since the last tick
    pub fn tick(&mut self) {
        let events = match &self.worker {
            Some(worker) => worker.drain(),
            None => return,
        };
        if events.is_empty() {
            return;
        }
        for event in events {
            self.handle_sync_event(event);
        }
        self.needs_redraw = true;
    }

    fn handle_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Library(library) => {
                sync::apply_library(&mut self.session.store, library);
                self.persist();
                self.refresh_lists();
            }
            SyncEvent::Public(public) => {
                sync::apply_public(&mut self.session.store, public);
                self.refresh_lists();
            }
            SyncEvent::Mirrored { action } => debug!(action, "mirrored"),
            SyncEvent::Created { local_id, remote_id } => self.adopt_remote_id(local_id, remote_id),
            SyncEvent::PositionsSaved { target, result } => self.finish_remote_save(target, result),
            SyncEvent::Failed { action, error } => {
                let hint = if error.is_unauthorized() {
                    " (check [api] token)"
                } else if error.is_not_found() {
                    " (press g to refresh)"
                } else {
                    ""
                };
                self.notify_error(format!("Failed to {}: {}{}", action, error, hint));
            }
        }
    }

    /// Follows a snippet to the id the backend gave it
    fn adopt_remote_id(&mut self, local_id: Uuid, remote_id: Uuid) {
        if !self.session.store.rekey_snippet(&local_id, remote_id) {
            return;
        }
        let rekey = |view: &mut View| {
            if *view == View::Detail(local_id) {
                *view = View::Detail(remote_id);
            }
        };
        rekey(&mut self.view);
        self.history.iter_mut().for_each(|(view, _)| rekey(view));
        for update in self.pending_saves.iter_mut().flat_map(|p| p.positions.iter_mut()) {
            if update.id == local_id {
                update.id = remote_id;
            }
        }
        self.persist();
    }

    fn finish_remote_save(&mut self, target: PositionTarget, result: Result<(), String>) {
        let Some(index) = self.pending_saves.iter().position(|p| p.target == target) else {
            warn!(?target, "position save answered without a pending request");
            return;
        };
        let pending = self.pending_saves.remove(index);

        if result.is_ok() {
            match &pending.target {
                PositionTarget::Collections => {
                    self.session
                        .store
                        .apply_collection_positions(&pending.positions);
                }
                PositionTarget::CollectionSnippets(id) => {
                    let scope = SnippetScope::Collection(CollectionRef::Named(*id));
                    self.session
                        .store
                        .apply_snippet_positions(&scope, &pending.positions);
                }
            }
            self.persist();
        }

        let list_matches = match &target {
            PositionTarget::Collections => true,
            PositionTarget::CollectionSnippets(id) => {
                self.scope == SnippetScope::Collection(CollectionRef::Named(*id))
            }
        };
        if list_matches {
            match target {
                PositionTarget::Collections => self.collections.finish_save(result.clone()),
                PositionTarget::CollectionSnippets(_) => self.snippets.finish_save(result.clone()),
            }
        }

        match result {
            Ok(()) => self.notify("Order saved"),
            Err(e) => self.notify_error(format!("Failed to save order: {}", e)),
        }
    }

    /// Reloads clean lists from the store; staged lists keep their order but
    /// lose records that no longer exist.
    pub fn refresh_lists(&mut self) {
        let store = &self.session.store;

        let collections = store.get_sorted_collections(None);
        if self.collections.is_dirty() || self.collections.is_saving() {
            let gone: Vec<CollectionRef> = self
                .collections
                .items()
                .iter()
                .map(|c| c.reference())
                .filter(|r| !collections.iter().any(|c| c.reference() == *r))
                .collect();
            for reference in gone {
                self.collections.remove(&reference);
            }
        } else {
            self.collections.replace(collections);
        }

        let snippets: Vec<Snippet> = store
            .snippets_in_scope(&self.scope, None)
            .into_iter()
            .cloned()
            .collect();
        if self.snippets.is_dirty() || self.snippets.is_saving() {
            let gone: Vec<Uuid> = self
                .snippets
                .items()
                .iter()
                .map(|s| s.id)
                .filter(|id| !snippets.iter().any(|s| s.id == *id))
                .collect();
            for id in gone {
                self.snippets.remove(&id);
            }
        } else {
            self.snippets.replace(snippets);
        }

        self.explore_ids = search::explore(store, &self.explore_filter)
            .iter()
            .map(|s| s.id)
            .collect();
        self.search_hits
            .retain(|hit| store.find_snippet(&hit.snippet_id).is_some());

        if let View::Detail(id) = self.view {
            if self.session.store.find_snippet(&id).is_none() {
                self.go_back();
            }
        }
        if let View::Snippets(SnippetScope::Collection(CollectionRef::Named(id))) = self.view {
            if self.session.store.find_collection(&id).is_none() {
                self.go_back();
            }
        }
        self.clamp_selection();
        self.needs_redraw = true;
    }

    // Navigation

    /// Rows of the current page
    pub fn row_count(&self) -> usize {
        match self.view {
            View::Library => self.collections.len() + 1,
            View::Snippets(_) => self.snippets.len(),
            View::Explore => self.explore_ids.len(),
            View::Search => self.search_hits.len(),
            View::Detail(_) => 0,
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.row_count().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        let rows = self.row_count();
        if rows > 0 {
            self.selected = (self.selected + 1) % rows;
            self.content_scroll = 0;
        }
    }

    pub fn select_previous(&mut self) {
        let rows = self.row_count();
        if rows > 0 {
            self.selected = (self.selected + rows - 1) % rows;
            self.content_scroll = 0;
        }
    }

    pub fn scroll_content(&mut self, down: bool) {
        self.content_scroll = if down {
            self.content_scroll.saturating_add(5)
        } else {
            self.content_scroll.saturating_sub(5)
        };
    }

    fn enter(&mut self, view: View, selected: usize) {
        if let View::Snippets(scope) = view {
            let staged = self.snippets.is_dirty() || self.snippets.is_saving();
            if scope != self.scope || !staged {
                self.scope = scope;
                self.snippets = ReorderList::new(
                    self.session
                        .store
                        .snippets_in_scope(&scope, None)
                        .into_iter()
                        .cloned()
                        .collect(),
                );
            }
        }
        self.view = view;
        self.selected = selected;
        self.content_scroll = 0;
        self.clamp_selection();
        self.needs_redraw = true;
    }

    pub fn navigate_to(&mut self, view: View) {
        if view == self.view {
            return;
        }
        let switches_list = matches!(view, View::Snippets(scope) if scope != self.scope);
        if switches_list && self.snippets.is_dirty() && !self.snippets.is_saving() {
            self.confirmation = Some(Confirmation::DiscardOrder(view));
            return;
        }
        self.history.push((self.view, self.selected));
        self.enter(view, 0);
    }

    pub fn go_back(&mut self) {
        let (view, selected) = self.history.pop().unwrap_or((View::Library, 0));
        self.enter(view, selected);
    }

    pub fn go_home(&mut self) {
        self.history.clear();
        self.enter(View::Library, 0);
    }

    /// Enter on the selected row
    pub fn open_selected(&mut self) {
        match self.view {
            View::Library => {
                let scope = match self.collections.get(self.selected) {
                    Some(collection) => SnippetScope::Collection(collection.reference()),
                    None => SnippetScope::Unfiled,
                };
                self.navigate_to(View::Snippets(scope));
            }
            View::Snippets(_) | View::Explore | View::Search => {
                if let Some(id) = self.selected_snippet_id() {
                    self.navigate_to(View::Detail(id));
                }
            }
            View::Detail(_) => {}
        }
    }

    pub fn selected_collection(&self) -> Option<&Collection> {
        match self.view {
            View::Library => self.collections.get(self.selected),
            _ => None,
        }
    }

    pub fn selected_snippet_id(&self) -> Option<Uuid> {
        match self.view {
            View::Snippets(_) => self.snippets.get(self.selected).map(|s| s.id),
            View::Explore => self.explore_ids.get(self.selected).copied(),
            View::Search => self.search_hits.get(self.selected).map(|h| h.snippet_id),
            View::Detail(id) => Some(id),
            View::Library => None,
        }
    }

    pub fn selected_snippet(&self) -> Option<&Snippet> {
        self.selected_snippet_id()
            .and_then(|id| self.session.store.find_snippet(&id))
    }

    fn owns(&self, snippet: &Snippet) -> bool {
        snippet.user_id == self.session.store.current_user()
    }

    // Reordering

    fn reorder_blocked(&mut self) -> bool {
        match self.view {
            View::Library => false,
            View::Snippets(SnippetScope::Collection(CollectionRef::Favorites)) => {
                self.notify_error("Favorites follows the favorite flag and cannot be reordered");
                true
            }
            View::Snippets(_) => false,
            _ => true,
        }
    }

    /// Moves the selected row one step; `up` toward the top
    pub fn move_selected(&mut self, up: bool) {
        if self.reorder_blocked() {
            return;
        }
        let index = self.selected;
        let moved = match (self.view, up) {
            (View::Library, true) => self.collections.move_up(index),
            (View::Library, false) => self.collections.move_down(index),
            (_, true) => self.snippets.move_up(index),
            (_, false) => self.snippets.move_down(index),
        };
        if let Some(to) = moved {
            self.selected = to;
            self.needs_redraw = true;
        }
    }

    /// Sends the selected row to the end of the staged order
    pub fn drop_selected(&mut self) {
        if self.reorder_blocked() {
            return;
        }
        let (moved, last) = match self.view {
            View::Library => match self.collections.get(self.selected).map(|c| c.reference()) {
                Some(reference) => (
                    self.collections.send_to_back(&reference),
                    self.collections.len(),
                ),
                None => return,
            },
            _ => match self.snippets.get(self.selected).map(|s| s.id) {
                Some(id) => (self.snippets.send_to_back(&id), self.snippets.len()),
                None => return,
            },
        };
        if moved {
            self.selected = last.saturating_sub(1);
        } else if self.view == View::Library && self.selected == 0 {
            self.notify_error("Favorites stays pinned first");
        }
        self.clamp_selection();
    }

    pub fn reset_order(&mut self) {
        let reset = match self.view {
            View::Library => self.collections.reset(),
            View::Snippets(_) => self.snippets.reset(),
            _ => false,
        };
        if reset {
            self.clamp_selection();
            self.notify("Order reset");
        }
    }

    pub fn save_order(&mut self) {
        if self.reorder_blocked() {
            return;
        }
        match self.view {
            View::Library => self.save_collection_order(),
            View::Snippets(scope) => self.save_snippet_order(scope),
            _ => {}
        }
    }

    fn save_collection_order(&mut self) {
        if self.worker.is_none() {
            let result = self
                .collections
                .commit(&mut self.session.store.collection_positions());
            self.report_local_commit(result);
            return;
        }
        if let Some(positions) = self.collections.begin_save() {
            self.submit_positions(PositionTarget::Collections, positions);
        }
    }

    fn save_snippet_order(&mut self, scope: SnippetScope) {
        let remote = match scope {
            SnippetScope::Collection(CollectionRef::Named(id)) if self.worker.is_some() => Some(id),
            _ => None,
        };
        match remote {
            Some(collection_id) => {
                if let Some(positions) = self.snippets.begin_save() {
                    self.submit_positions(PositionTarget::CollectionSnippets(collection_id), positions);
                }
            }
            None => {
                let result = self
                    .snippets
                    .commit(&mut self.session.store.snippet_positions(scope));
                self.report_local_commit(result);
            }
        }
    }

    fn report_local_commit(&mut self, result: anyhow::Result<bool>) {
        match result {
            Ok(true) => self.notify("Order saved"),
            Ok(false) => {}
            Err(e) => self.notify_error(format!("Failed to save order: {:#}", e)),
        }
    }

    fn submit_positions(&mut self, target: PositionTarget, positions: Vec<PositionUpdate>) {
        info!(?target, count = positions.len(), "saving order");
        self.pending_saves.push(PendingSave {
            target: target.clone(),
            positions: positions.clone(),
        });
        self.mirror(SyncRequest::SavePositions { target, positions });
    }

    pub fn has_unsaved_order(&self) -> bool {
        self.collections.is_dirty() || self.snippets.is_dirty()
    }

    pub fn request_quit(&mut self) {
        if self.has_unsaved_order() {
            self.confirmation = Some(Confirmation::Quit);
        } else {
            self.should_quit = true;
        }
    }

    // Snippets

    /// Creates a snippet in the list being viewed. A trailing `.ext` on the
    /// title picks the language.
    pub fn create_snippet(&mut self, input: &str) -> Result<Uuid, String> {
        let input = input.trim();
        let (title, language) = match input.rsplit_once('.') {
            Some((title, ext)) if !title.trim().is_empty() && !ext.is_empty() => {
                (title.trim(), SnippetLanguage::from_name(ext))
            }
            _ => (input, SnippetLanguage::Text),
        };
        if title.is_empty() {
            return Err("Snippet title cannot be empty".to_string());
        }

        let mut data = NewSnippet::new(title, "", language);
        match self.current_scope() {
            Some(SnippetScope::Collection(CollectionRef::Named(id))) => data.collection_id = Some(id),
            Some(SnippetScope::Collection(CollectionRef::Favorites)) => data.is_favorite = true,
            _ => {}
        }

        let id = self.session.store.add_snippet(data);
        self.persist();
        if let Some(snippet) = self.session.store.find_snippet(&id) {
            let request = SyncRequest::CreateSnippet {
                local_id: id,
                body: CreateSnippetRequest::from(snippet),
            };
            self.mirror(request);
        }
        self.refresh_lists();
        Ok(id)
    }

    fn current_scope(&self) -> Option<SnippetScope> {
        match self.view {
            View::Snippets(scope) => Some(scope),
            View::Library => self
                .selected_collection()
                .map(|c| SnippetScope::Collection(c.reference())),
            _ => None,
        }
    }

    fn patch_snippet(&mut self, id: Uuid, patch: SnippetPatch) {
        let body = UpdateSnippetRequest::from(&patch);
        if self.session.store.update_snippet(&id, patch) {
            self.persist();
            self.mirror(SyncRequest::UpdateSnippet { id, body });
            self.refresh_lists();
        }
    }

    /// Stores content returned from the editor
    pub fn save_content(&mut self, id: Uuid, content: String) {
        let unchanged = self
            .session
            .store
            .find_snippet(&id)
            .is_some_and(|s| s.content == content);
        if unchanged {
            self.notify("No changes");
            return;
        }
        self.patch_snippet(id, SnippetPatch::content(content));
        self.notify("Snippet saved");
    }

    /// The snippet behind the selection, if the user may change it
    pub fn editable_snippet(&mut self) -> Option<Snippet> {
        let snippet = self.selected_snippet()?.clone();
        if self.owns(&snippet) {
            Some(snippet)
        } else {
            self.notify_error("Only your own snippets can be changed; fork it first");
            None
        }
    }

    pub fn toggle_favorite(&mut self) {
        if let Some(snippet) = self.editable_snippet() {
            let now = !snippet.is_favorite;
            self.patch_snippet(snippet.id, SnippetPatch::favorite(now));
            self.notify(if now {
                "Added to Favorites"
            } else {
                "Removed from Favorites"
            });
        }
    }

    pub fn toggle_public(&mut self) {
        if let Some(snippet) = self.editable_snippet() {
            let now = !snippet.is_public;
            self.patch_snippet(snippet.id, SnippetPatch::public(now));
            self.notify(if now {
                "Snippet is now public"
            } else {
                "Snippet is now private"
            });
        }
    }

    pub fn fork_selected(&mut self) {
        let Some(original) = self.selected_snippet().cloned() else {
            return;
        };
        if self.owns(&original) {
            self.notify_error("You cannot fork your own snippet");
            return;
        }
        if !original.is_public {
            self.notify_error("Only public snippets can be forked");
            return;
        }

        match self.session.store.fork_snippet(&original) {
            Some(fork_id) => {
                self.persist();
                self.mirror(SyncRequest::ForkSnippet {
                    original: original.id,
                    local_id: fork_id,
                });
                self.refresh_lists();
                self.notify(format!("Forked '{}'", original.title));
                debug!(fork = %fork_id, "fork created");
            }
            None => self.notify_error("You already forked this snippet"),
        }
    }

    pub fn request_delete(&mut self) {
        if self.view == View::Library {
            match self.selected_collection() {
                Some(Collection::Named(collection)) => {
                    self.confirmation = Some(Confirmation::DeleteCollection(collection.id));
                }
                Some(Collection::Favorites(_)) => {
                    self.notify_error("The Favorites collection cannot be deleted");
                }
                None => {}
            }
            return;
        }
        if let Some(snippet) = self.editable_snippet() {
            self.confirmation = Some(Confirmation::DeleteSnippet(snippet.id));
        }
    }

    pub fn confirm(&mut self) {
        let Some(confirmation) = self.confirmation.take() else {
            return;
        };
        match confirmation {
            Confirmation::DeleteSnippet(id) => {
                if let Some(removed) = self.session.store.delete_snippet(&id) {
                    self.persist();
                    self.mirror(SyncRequest::DeleteSnippet(id));
                    self.notify(format!("Deleted '{}'", removed.title));
                }
                self.refresh_lists();
            }
            Confirmation::DeleteCollection(id) => {
                if let Some(removed) = self
                    .session
                    .store
                    .delete_collection(&CollectionRef::Named(id))
                {
                    self.persist();
                    self.mirror(SyncRequest::DeleteCollection(id));
                    self.notify(format!("Deleted collection '{}'", removed.name));
                }
                self.refresh_lists();
            }
            Confirmation::DiscardOrder(view) => {
                self.snippets.reset();
                self.history.push((self.view, self.selected));
                self.enter(view, 0);
            }
            Confirmation::Quit => self.should_quit = true,
        }
        self.needs_redraw = true;
    }

    pub fn cancel_confirmation(&mut self) {
        self.confirmation = None;
        self.needs_redraw = true;
    }

    // Collections

    pub fn create_collection(&mut self, name: &str) -> Result<Uuid, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Collection name cannot be empty".to_string());
        }
        if self.session.store.find_collection_by_name(name, None).is_some() {
            return Err(format!("A collection named '{}' already exists", name));
        }

        let position = self.session.store.get_sorted_collections(None).len() as i64 - 1;
        let id = self.session.store.add_collection(NewCollection {
            name: name.to_string(),
            color: None,
            position,
        });
        self.persist();
        if let Some(collection) = self.session.store.find_collection(&id) {
            let request = SyncRequest::CreateCollection(CreateCollectionRequest::from(collection));
            self.mirror(request);
        }
        self.refresh_lists();
        Ok(id)
    }

    /// Id of the selected named collection, for rename
    pub fn renamable_collection(&mut self) -> Option<(Uuid, String)> {
        match self.selected_collection() {
            Some(Collection::Named(c)) => Some((c.id, c.name.clone())),
            Some(Collection::Favorites(_)) => {
                self.notify_error("The Favorites collection cannot be renamed");
                None
            }
            None => None,
        }
    }

    pub fn rename_collection(&mut self, id: Uuid, name: &str) -> Result<(), String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Collection name cannot be empty".to_string());
        }
        let patch = CollectionPatch::rename(name);
        if self
            .session
            .store
            .update_collection(&CollectionRef::Named(id), patch.clone())
        {
            self.persist();
            self.mirror(SyncRequest::UpdateCollection { id, patch });
            self.refresh_lists();
        }
        Ok(())
    }

    // Tags

    /// Replaces a snippet's tags with the space separated names in `input`
    pub fn set_tags(&mut self, id: Uuid, input: &str) {
        let user = self.session.store.current_user().to_string();
        let names: Vec<&str> = input.split_whitespace().collect();

        for name in &names {
            let known = self.session.store.tags().find_by_name(&user, name).is_some();
            if !known && self.session.store.create_tag(name).is_some() {
                self.mirror(SyncRequest::CreateTag(name.trim_start_matches('#').to_string()));
            }
        }

        let tag_ids: Vec<Uuid> = names
            .iter()
            .filter_map(|name| self.session.store.tags().find_by_name(&user, name).map(|t| t.id))
            .collect();
        if self.session.store.assign_tags(&id, &tag_ids) {
            self.persist();
            let body = UpdateSnippetRequest {
                tag_ids: Some(tag_ids),
                ..UpdateSnippetRequest::default()
            };
            self.mirror(SyncRequest::UpdateSnippet { id, body });
        }
        self.refresh_lists();
    }

    pub fn tag_input_for(&self, snippet: &Snippet) -> String {
        self.session.store.tag_names(snippet).join(" ")
    }

    // Search and explore

    pub fn run_search(&mut self, query: &str) {
        self.search_query = query.trim().to_string();
        self.search_hits = search::search_snippets(&self.session.store, None, &self.search_query);
        self.recent_searches
            .record(&self.search_query, self.search_hits.len());
        if self.view == View::Search {
            self.enter(View::Search, 0);
        } else {
            self.navigate_to(View::Search);
        }
    }

    /// `query` may carry a `lang:NAME` word to filter by language
    pub fn set_explore_filter(&mut self, input: &str) {
        let mut language = None;
        let mut words = Vec::new();
        for word in input.split_whitespace() {
            match word.strip_prefix("lang:") {
                Some(name) if !name.is_empty() => language = Some(SnippetLanguage::from_name(name)),
                _ => words.push(word),
            }
        }
        self.explore_filter = ExploreFilter {
            query: words.join(" "),
            language,
        };
        self.refresh_lists();
        self.selected = 0;
    }

    pub fn open_explore(&mut self) {
        self.mirror(SyncRequest::FetchPublic);
        self.navigate_to(View::Explore);
    }

    pub fn request_refresh(&mut self) {
        if self.worker.is_some() {
            self.mirror(SyncRequest::FetchLibrary);
            self.mirror(SyncRequest::FetchPublic);
            self.notify("Refreshing…");
        } else {
            self.refresh_lists();
            self.notify("Guest mode: library is local");
        }
    }

    /// Title of the list being shown, for headers and breadcrumbs
    pub fn scope_title(&self, scope: &SnippetScope) -> String {
        match scope {
            SnippetScope::Unfiled => "Home".to_string(),
            SnippetScope::Collection(reference) => self
                .collections
                .items()
                .iter()
                .find(|c| c.reference() == *reference)
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "Collection".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::MemoryStorage;
    use crate::reorder::ReorderState;
    use std::path::PathBuf;

    fn guest_app() -> App {
        let session =
            Session::open_with(Config::default(), MemoryStorage::new(), PathBuf::from("/tmp"))
                .unwrap();
        App::new(session)
    }

    #[test]
    fn library_lists_favorites_first_and_home_last() {
        let app = guest_app();
        assert_eq!(app.collections.items()[0].name(), "Favorites");
        assert_eq!(app.row_count(), app.collections.len() + 1);
    }

    #[test]
    fn collection_order_saves_locally_for_guests() {
        let mut app = guest_app();
        app.selected = 3;
        app.move_selected(true);
        assert_eq!(app.selected, 2);
        assert_eq!(app.collections.state(), ReorderState::Dirty);

        app.save_order();
        assert_eq!(app.collections.state(), ReorderState::Clean);
        let names: Vec<String> = app
            .session
            .store
            .get_sorted_collections(None)
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["Favorites", "JavaScript", "Python", "CSS"]);
    }

    #[test]
    fn favorites_cannot_move_or_be_deleted() {
        let mut app = guest_app();
        app.selected = 0;
        app.move_selected(false);
        assert_eq!(app.collections.state(), ReorderState::Clean);

        app.request_delete();
        assert!(app.confirmation.is_none());
        assert!(app.notification.as_ref().is_some_and(|n| n.is_error));
    }

    #[test]
    fn created_snippet_lands_in_open_collection() {
        let mut app = guest_app();
        app.selected = 1;
        app.open_selected();
        let id = app.create_snippet("debounce.js").unwrap();

        let snippet = app.session.store.find_snippet(&id).unwrap();
        assert_eq!(snippet.title, "debounce");
        assert_eq!(snippet.language, SnippetLanguage::JavaScript);
        assert!(snippet.collection_id.is_some());
        assert_eq!(app.snippets.len(), 1);
        assert!(app.create_snippet("  ").is_err());
    }

    #[test]
    fn leaving_a_staged_list_asks_first() {
        let mut app = guest_app();
        app.navigate_to(View::Snippets(SnippetScope::Unfiled));
        app.create_snippet("a").unwrap();
        app.create_snippet("b").unwrap();
        app.selected = 1;
        app.move_selected(true);
        assert!(app.snippets.is_dirty());

        app.navigate_to(View::Snippets(SnippetScope::Collection(CollectionRef::Favorites)));
        assert!(matches!(app.confirmation, Some(Confirmation::DiscardOrder(_))));
        app.confirm();
        assert!(matches!(app.view, View::Snippets(SnippetScope::Collection(_))));
    }

    #[test]
    fn delete_goes_through_confirmation() {
        let mut app = guest_app();
        app.navigate_to(View::Snippets(SnippetScope::Unfiled));
        let id = app.create_snippet("gone").unwrap();
        app.selected = 0;

        app.request_delete();
        assert_eq!(app.confirmation, Some(Confirmation::DeleteSnippet(id)));
        app.confirm();
        assert!(app.session.store.find_snippet(&id).is_none());
        assert!(app.snippets.is_empty());
    }

    #[test]
    fn open_snippet_follows_backend_id() {
        let mut app = guest_app();
        app.navigate_to(View::Snippets(SnippetScope::Unfiled));
        let local_id = app.create_snippet("retry.py").unwrap();
        app.navigate_to(View::Detail(local_id));
        let remote_id = Uuid::new_v4();

        app.handle_sync_event(SyncEvent::Created { local_id, remote_id });

        assert_eq!(app.view, View::Detail(remote_id));
        assert!(app.history.iter().all(|(view, _)| *view != View::Detail(local_id)));
        let snippet = app.session.store.find_snippet(&remote_id).unwrap();
        assert_eq!(snippet.language, SnippetLanguage::Python);
    }

    #[test]
    fn explore_filter_reads_language_prefix() {
        let mut app = guest_app();
        app.set_explore_filter("sort lang:py");
        assert_eq!(app.explore_filter.query, "sort");
        assert_eq!(app.explore_filter.language, Some(SnippetLanguage::Python));
    }
}
