//! Wires configuration, local storage and the optional backend together.

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::{JsonFileStorage, Persistence};
use crate::store::RecordStore;
use crate::sync::{self, SyncEvent, SyncRequest};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::info;
use uuid::Uuid;

#[derive(Debug)]
pub struct Session {
    pub store: RecordStore,
    pub config: Config,
    /// `None` in guest mode
    pub client: Option<ApiClient>,
    data_dir: PathBuf,
}

impl Session {
    /// Opens the on-disk store for `config` and establishes the user context
    pub fn open(config: Config) -> Result<Self> {
        let root = config.data_dir()?;
        let storage = JsonFileStorage::new(&root)?;
        let data_dir = storage.data_directory().to_path_buf();
        Self::open_with(config, storage, data_dir)
    }

    pub fn open_with(
        config: Config,
        persistence: impl Persistence + 'static,
        data_dir: PathBuf,
    ) -> Result<Self> {
        let mut store = RecordStore::open(persistence)?;

        let client = match &config.api {
            Some(api) => Some(
                ApiClient::new(&api.base_url, api.token.clone())
                    .context("Invalid [api] configuration")?,
            ),
            None => None,
        };

        if client.is_some() {
            store.set_current_user(config.user_id().map(str::to_string));
        } else {
            store.set_current_user(None);
            if store.seed_guest_library() {
                info!("seeded guest library");
                store.flush()?;
            }
        }

        Ok(Self {
            store,
            config,
            client,
            data_dir,
        })
    }

    pub fn is_guest(&self) -> bool {
        self.client.is_none()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.data_dir.join("drafts")
    }

    pub fn backup(&self) -> Result<PathBuf> {
        let parent = self.data_dir.parent().unwrap_or(&self.data_dir);
        JsonFileStorage::new(parent)?.backup()
    }

    /// Sends `request` to the backend and waits, applying whatever comes
    /// back to the store. Returns the backend id of a snippet the request
    /// created. A no-op in guest mode.
    pub fn mirror(&mut self, request: SyncRequest) -> Result<Option<Uuid>> {
        let events = {
            let Some(client) = self.client.as_ref() else {
                return Ok(None);
            };
            let runtime = Runtime::new().context("Failed to start async runtime")?;
            sync::run_blocking(&runtime, client, request)
        };

        let mut created = None;
        for event in events {
            if let SyncEvent::Created { remote_id, .. } = &event {
                created = Some(*remote_id);
            }
            self.apply_event(event)?;
        }
        Ok(created)
    }

    fn apply_event(&mut self, event: SyncEvent) -> Result<()> {
        match event {
            SyncEvent::Library(library) => sync::apply_library(&mut self.store, library),
            SyncEvent::Public(public) => sync::apply_public(&mut self.store, public),
            SyncEvent::Mirrored { .. } => {}
            SyncEvent::Created { local_id, remote_id } => {
                self.store.rekey_snippet(&local_id, remote_id);
            }
            SyncEvent::PositionsSaved { result, .. } => {
                if let Err(e) = result {
                    bail!("Failed to save order: {}", e);
                }
            }
            SyncEvent::Failed { action, error } => bail!("Failed to {}: {}", action, error),
        }
        Ok(())
    }

    /// Pulls the canonical library when a backend is configured
    pub fn refresh(&mut self) -> Result<()> {
        self.mirror(SyncRequest::FetchLibrary).map(|_| ())
    }

    pub fn save(&self) -> Result<()> {
        self.store.flush()
    }
}
