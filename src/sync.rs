//! Mirrors store mutations to the backend off the UI thread.
//!
//! The UI pushes [`SyncRequest`]s and drains [`SyncEvent`]s every tick. The
//! worker thread owns a Tokio runtime and handles requests one at a time, in
//! the order they were sent. A successful mutation is followed by a library
//! refetch so the store can swap in the canonical records.

use crate::api::{
    ApiClient, ApiError, CreateCollectionRequest, CreateSnippetRequest, RemoteCollection,
    RemoteSnippet, UpdateSnippetRequest,
};
use crate::models::{CollectionPatch, PositionUpdate, Snippet, Tag, UserCollection};
use crate::reorder::PositionSink;
use crate::store::RecordStore;
use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use std::collections::HashMap;
use std::thread;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum PositionTarget {
    Collections,
    CollectionSnippets(Uuid),
}

#[derive(Debug, Clone)]
pub enum SyncRequest {
    FetchLibrary,
    FetchPublic,
    /// `local_id` is the id the store gave the snippet before the backend
    /// assigned its own
    CreateSnippet {
        local_id: Uuid,
        body: CreateSnippetRequest,
    },
    UpdateSnippet { id: Uuid, body: UpdateSnippetRequest },
    DeleteSnippet(Uuid),
    ForkSnippet { original: Uuid, local_id: Uuid },
    CreateCollection(CreateCollectionRequest),
    UpdateCollection { id: Uuid, patch: CollectionPatch },
    DeleteCollection(Uuid),
    SavePositions {
        target: PositionTarget,
        positions: Vec<PositionUpdate>,
    },
    CreateTag(String),
    RenameTag { id: Uuid, name: String },
    DeleteTag(Uuid),
}

impl SyncRequest {
    /// Short label used in logs and notifications
    pub fn action(&self) -> &'static str {
        match self {
            Self::FetchLibrary => "refresh library",
            Self::FetchPublic => "load public snippets",
            Self::CreateSnippet { .. } => "create snippet",
            Self::UpdateSnippet { .. } => "update snippet",
            Self::DeleteSnippet(_) => "delete snippet",
            Self::ForkSnippet { .. } => "fork snippet",
            Self::CreateCollection(_) => "create collection",
            Self::UpdateCollection { .. } => "update collection",
            Self::DeleteCollection(_) => "delete collection",
            Self::SavePositions { .. } => "save order",
            Self::CreateTag(_) => "create tag",
            Self::RenameTag { .. } => "rename tag",
            Self::DeleteTag(_) => "delete tag",
        }
    }

    /// Points snippet ids at the ids the backend assigned on create or fork.
    /// Requests queued before the backend answered still carry local ids.
    pub fn remap_snippet_ids(&mut self, aliases: &HashMap<Uuid, Uuid>) {
        let remap = |id: &mut Uuid| {
            if let Some(remote) = aliases.get(id) {
                *id = *remote;
            }
        };
        match self {
            Self::UpdateSnippet { id, .. } | Self::DeleteSnippet(id) => remap(id),
            Self::ForkSnippet { original, .. } => remap(original),
            Self::SavePositions {
                target: PositionTarget::CollectionSnippets(_),
                positions,
            } => positions.iter_mut().for_each(|p| remap(&mut p.id)),
            _ => {}
        }
    }
}

/// The user's records as the backend holds them
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub snippets: Vec<RemoteSnippet>,
    pub collections: Vec<RemoteCollection>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone)]
pub enum SyncEvent {
    Library(Library),
    Public(Vec<RemoteSnippet>),
    Mirrored {
        action: &'static str,
    },
    /// The backend stored a new snippet under its own id
    Created {
        local_id: Uuid,
        remote_id: Uuid,
    },
    PositionsSaved {
        target: PositionTarget,
        result: Result<(), String>,
    },
    Failed {
        action: &'static str,
        error: ApiError,
    },
}

/// Runs one request against the backend and reports what happened.
pub async fn execute(client: &ApiClient, request: SyncRequest) -> Vec<SyncEvent> {
    let action = request.action();

    let outcome = match request {
        SyncRequest::FetchLibrary => {
            return vec![match fetch_library(client).await {
                Ok(library) => SyncEvent::Library(library),
                Err(error) => SyncEvent::Failed { action, error },
            }];
        }
        SyncRequest::FetchPublic => {
            return vec![match client.public_snippets().await {
                Ok(snippets) => SyncEvent::Public(snippets),
                Err(error) => SyncEvent::Failed { action, error },
            }];
        }
        SyncRequest::SavePositions { target, positions } => {
            let result = save_positions(client, &target, &positions).await;
            let saved = result.is_ok();
            let mut events = vec![SyncEvent::PositionsSaved {
                target,
                result: result.map_err(|e| e.to_string()),
            }];
            if saved {
                events.push(refresh(client).await);
            }
            return events;
        }
        SyncRequest::CreateSnippet { local_id, body } => {
            return created(client, action, local_id, client.create_snippet(&body).await).await;
        }
        SyncRequest::UpdateSnippet { id, body } => {
            if body.is_empty() {
                Ok(())
            } else {
                client.update_snippet(&id, &body).await
            }
        }
        SyncRequest::DeleteSnippet(id) => client.delete_snippet(&id).await,
        SyncRequest::ForkSnippet { original, local_id } => {
            return created(client, action, local_id, client.fork_snippet(&original).await).await;
        }
        SyncRequest::CreateCollection(body) => client.create_collection(&body).await.map(|_| ()),
        SyncRequest::UpdateCollection { id, patch } => client.update_collection(&id, &patch).await,
        SyncRequest::DeleteCollection(id) => client.delete_collection(&id).await,
        SyncRequest::CreateTag(name) => client.create_tag(&name).await.map(|_| ()),
        SyncRequest::RenameTag { id, name } => client.rename_tag(&id, &name).await,
        SyncRequest::DeleteTag(id) => client.delete_tag(&id).await,
    };

    match outcome {
        Ok(()) => {
            info!(action, "mirrored to backend");
            vec![SyncEvent::Mirrored { action }, refresh(client).await]
        }
        Err(error) => vec![SyncEvent::Failed { action, error }],
    }
}

async fn created(
    client: &ApiClient,
    action: &'static str,
    local_id: Uuid,
    outcome: Result<RemoteSnippet, ApiError>,
) -> Vec<SyncEvent> {
    match outcome {
        Ok(remote) => {
            info!(action, %local_id, remote_id = %remote.id, "mirrored to backend");
            vec![
                SyncEvent::Created {
                    local_id,
                    remote_id: remote.id,
                },
                SyncEvent::Mirrored { action },
                refresh(client).await,
            ]
        }
        Err(error) => vec![SyncEvent::Failed { action, error }],
    }
}

async fn refresh(client: &ApiClient) -> SyncEvent {
    match fetch_library(client).await {
        Ok(library) => SyncEvent::Library(library),
        Err(error) => SyncEvent::Failed {
            action: SyncRequest::FetchLibrary.action(),
            error,
        },
    }
}

async fn fetch_library(client: &ApiClient) -> Result<Library, ApiError> {
    let (snippets, collections, tags) = tokio::try_join!(
        client.list_snippets(),
        client.list_collections(),
        client.list_tags()
    )?;
    Ok(Library {
        snippets,
        collections,
        tags,
    })
}

async fn save_positions(
    client: &ApiClient,
    target: &PositionTarget,
    positions: &[PositionUpdate],
) -> Result<(), ApiError> {
    match target {
        PositionTarget::Collections => client.update_collection_positions(positions).await,
        PositionTarget::CollectionSnippets(id) => {
            client.update_snippet_positions(id, positions).await
        }
    }
}

/// Swaps the current user's records for the fetched ones. Values the backend
/// does not keep are carried over from the matching local record.
pub fn apply_library(store: &mut RecordStore, library: Library) {
    let user = store.current_user().to_string();

    let snippets: Vec<Snippet> = library
        .snippets
        .into_iter()
        .map(|remote| {
            let local = store.find_snippet(&remote.id);
            remote.into_snippet(local)
        })
        .collect();
    let collections: Vec<UserCollection> = library
        .collections
        .into_iter()
        .map(UserCollection::from)
        .collect();

    info!(
        snippets = snippets.len(),
        collections = collections.len(),
        "library refreshed from backend"
    );
    store.replace_user_records(&user, snippets, collections);
    store.replace_user_tags(&user, library.tags);
}

pub fn apply_public(store: &mut RecordStore, public: Vec<RemoteSnippet>) {
    let snippets = public
        .into_iter()
        .map(|remote| {
            let local = store.find_snippet(&remote.id);
            remote.into_snippet(local)
        })
        .collect();
    store.replace_public_snippets(snippets);
}

/// Background thread that executes [`SyncRequest`]s
pub struct SyncWorker {
    requests: Sender<SyncRequest>,
    events: Receiver<SyncEvent>,
}

impl SyncWorker {
    pub fn spawn(client: ApiClient) -> Result<Self> {
        let (request_tx, request_rx) = flume::unbounded::<SyncRequest>();
        let (event_tx, event_rx) = flume::unbounded::<SyncEvent>();

        thread::Builder::new()
            .name("snippy-sync".into())
            .spawn(move || {
                let rt = match Runtime::new() {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = event_tx.send(SyncEvent::Failed {
                            action: "start sync",
                            error: ApiError::Transport(format!("Runtime error: {}", e)),
                        });
                        return;
                    }
                };

                let mut aliases = HashMap::new();
                while let Ok(mut request) = request_rx.recv() {
                    request.remap_snippet_ids(&aliases);
                    for event in rt.block_on(execute(&client, request)) {
                        if let SyncEvent::Created { local_id, remote_id } = &event {
                            aliases.insert(*local_id, *remote_id);
                        }
                        if event_tx.send(event).is_err() {
                            return;
                        }
                    }
                }
            })
            .context("Failed to start sync thread")?;

        Ok(Self {
            requests: request_tx,
            events: event_rx,
        })
    }

    /// Queues a request. Returns false when the worker has stopped.
    pub fn submit(&self, request: SyncRequest) -> bool {
        let action = request.action();
        match self.requests.send(request) {
            Ok(()) => true,
            Err(_) => {
                warn!(action, "sync worker is gone, request dropped");
                false
            }
        }
    }

    /// Every event that arrived since the last call, without blocking
    pub fn drain(&self) -> Vec<SyncEvent> {
        self.events.try_iter().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.requests.is_empty()
    }
}

/// Runs a request on a private runtime and waits for the result. Used by
/// one-shot commands.
pub fn run_blocking(runtime: &Runtime, client: &ApiClient, request: SyncRequest) -> Vec<SyncEvent> {
    runtime.block_on(execute(client, request))
}

/// Sends a committed ordering to the backend and waits for the answer.
pub struct RemotePositions<'a> {
    pub runtime: &'a Runtime,
    pub client: &'a ApiClient,
    pub target: PositionTarget,
}

impl PositionSink for RemotePositions<'_> {
    fn persist_positions(&mut self, positions: &[PositionUpdate]) -> Result<()> {
        self.runtime
            .block_on(save_positions(self.client, &self.target, positions))
            .context("Failed to save order")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewSnippet, SnippetLanguage};
    use serde_json::json;

    fn remote(id: Uuid, user: &str, title: &str) -> RemoteSnippet {
        serde_json::from_value(json!({
            "id": id,
            "user_id": user,
            "collection_ids": [],
            "title": title,
            "content": "",
            "is_public": false,
            "is_favorite": false,
            "fork_count": 0,
            "forked_from": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn library_replaces_user_records_and_keeps_language() {
        let mut store = RecordStore::in_memory();
        store.set_current_user(Some("ana".into()));
        let kept = store.add_snippet(NewSnippet::new("old title", "", SnippetLanguage::Python));
        store.add_snippet(NewSnippet::new("deleted remotely", "", SnippetLanguage::Text));

        apply_library(
            &mut store,
            Library {
                snippets: vec![remote(kept, "ana", "new title")],
                ..Library::default()
            },
        );

        let mine = store.get_user_snippets(None);
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "new title");
        assert_eq!(mine[0].language, SnippetLanguage::Python);
    }

    #[test]
    fn created_snippet_keeps_language_under_backend_id() {
        let mut store = RecordStore::in_memory();
        store.set_current_user(Some("ana".into()));
        let local_id = store.add_snippet(NewSnippet::new("retry", "", SnippetLanguage::Python));
        let remote_id = Uuid::new_v4();

        assert!(store.rekey_snippet(&local_id, remote_id));
        apply_library(
            &mut store,
            Library {
                snippets: vec![remote(remote_id, "ana", "retry")],
                ..Library::default()
            },
        );

        assert!(store.find_snippet(&local_id).is_none());
        let snippet = store.find_snippet(&remote_id).unwrap();
        assert_eq!(snippet.language, SnippetLanguage::Python);
        assert_eq!(store.get_user_snippets(None).len(), 1);
    }

    #[test]
    fn queued_requests_follow_backend_ids() {
        let local_id = Uuid::new_v4();
        let remote_id = Uuid::new_v4();
        let aliases = HashMap::from([(local_id, remote_id)]);

        let mut delete = SyncRequest::DeleteSnippet(local_id);
        delete.remap_snippet_ids(&aliases);
        assert!(matches!(delete, SyncRequest::DeleteSnippet(id) if id == remote_id));

        let mut save = SyncRequest::SavePositions {
            target: PositionTarget::CollectionSnippets(Uuid::new_v4()),
            positions: vec![PositionUpdate {
                id: local_id,
                position: 0,
            }],
        };
        save.remap_snippet_ids(&aliases);
        let SyncRequest::SavePositions { positions, .. } = save else {
            unreachable!();
        };
        assert_eq!(positions[0].id, remote_id);
    }

    #[test]
    fn public_listing_skips_own_snippets() {
        let mut store = RecordStore::in_memory();
        store.set_current_user(Some("ana".into()));

        let mut theirs = remote(Uuid::new_v4(), "bo", "shared");
        theirs.is_public = true;
        let mut mine = remote(Uuid::new_v4(), "ana", "mine");
        mine.is_public = true;

        apply_public(&mut store, vec![theirs, mine]);
        let public = store.get_public_snippets();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].title, "shared");
    }

    #[test]
    fn request_labels_are_human_readable() {
        assert_eq!(SyncRequest::DeleteSnippet(Uuid::nil()).action(), "delete snippet");
        assert_eq!(
            SyncRequest::SavePositions {
                target: PositionTarget::Collections,
                positions: Vec::new()
            }
            .action(),
            "save order"
        );
    }

    #[test]
    fn unreachable_backend_fails_the_save() {
        let runtime = Runtime::new().unwrap();
        let client = ApiClient::new("http://127.0.0.1:9/api", None).unwrap();
        let events = run_blocking(
            &runtime,
            &client,
            SyncRequest::SavePositions {
                target: PositionTarget::Collections,
                positions: vec![PositionUpdate {
                    id: Uuid::new_v4(),
                    position: 0,
                }],
            },
        );

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SyncEvent::PositionsSaved { result: Err(_), .. }
        ));
    }
}
