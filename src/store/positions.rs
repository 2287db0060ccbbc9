use super::{RecordStore, SnippetScope};
use crate::models::PositionUpdate;
use crate::reorder::PositionSink;
use anyhow::Result;
use tracing::info;

/// Commits a snippet ordering into the local store and flushes it.
pub struct LocalSnippetPositions<'a> {
    store: &'a mut RecordStore,
    scope: SnippetScope,
}

/// Commits a collection ordering into the local store and flushes it.
pub struct LocalCollectionPositions<'a> {
    store: &'a mut RecordStore,
}

impl RecordStore {
    pub fn snippet_positions(&mut self, scope: SnippetScope) -> LocalSnippetPositions<'_> {
        LocalSnippetPositions { store: self, scope }
    }

    pub fn collection_positions(&mut self) -> LocalCollectionPositions<'_> {
        LocalCollectionPositions { store: self }
    }
}

impl PositionSink for LocalSnippetPositions<'_> {
    fn persist_positions(&mut self, positions: &[PositionUpdate]) -> Result<()> {
        let applied = self.store.apply_snippet_positions(&self.scope, positions);
        info!(scope = ?self.scope, applied, "snippet positions saved locally");
        self.store.flush()
    }
}

impl PositionSink for LocalCollectionPositions<'_> {
    fn persist_positions(&mut self, positions: &[PositionUpdate]) -> Result<()> {
        let applied = self.store.apply_collection_positions(positions);
        info!(applied, "collection positions saved locally");
        self.store.flush()
    }
}
