//! Staged reordering of a list with explicit save and reset.
//!
//! A [`ReorderList`] holds the order the user sees, the last order known to be
//! persisted, and where the list is in the save cycle:
//!
//! * `Clean`: the visible order matches the persisted one.
//! * `Dirty`: the visible order differs; Reset and Save are available.
//! * `Saving`: a position update is in flight. Reordering is still allowed,
//!   but whatever changes after the request left needs another Save.
//!
//! Entries without a persisted id (the Favorites collection) are pinned to the
//! front: they never move, nothing moves above them, and they are left out of
//! the position payload.

use crate::models::{Collection, CollectionRef, PositionUpdate, Snippet};
use anyhow::Result;
use std::fmt::Debug;
use tracing::{debug, warn};
use uuid::Uuid;

pub trait Reorderable: Clone {
    type Key: Clone + PartialEq + Debug;

    fn key(&self) -> Self::Key;

    /// Id sent to the backend. `None` marks a virtual, pinned entry.
    fn persisted_id(&self) -> Option<Uuid>;

    fn is_pinned(&self) -> bool {
        self.persisted_id().is_none()
    }
}

impl Reorderable for Snippet {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }

    fn persisted_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

impl Reorderable for Collection {
    type Key = CollectionRef;

    fn key(&self) -> CollectionRef {
        self.reference()
    }

    fn persisted_id(&self) -> Option<Uuid> {
        self.reference().named_id()
    }
}

/// Receives a committed ordering.
pub trait PositionSink {
    fn persist_positions(&mut self, positions: &[PositionUpdate]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderState {
    Clean,
    Dirty,
    Saving,
}

#[derive(Debug, Clone)]
pub struct ReorderList<T: Reorderable> {
    items: Vec<T>,
    snapshot: Vec<T>,
    state: ReorderState,
    in_flight: Option<Vec<T>>,
    last_error: Option<String>,
}

impl<T: Reorderable> Default for ReorderList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Reorderable> ReorderList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            snapshot: items.clone(),
            items,
            state: ReorderState::Clean,
            in_flight: None,
            last_error: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state(&self) -> ReorderState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == ReorderState::Dirty
    }

    pub fn is_saving(&self) -> bool {
        self.state == ReorderState::Saving
    }

    /// Error of the last failed save, cleared by a later success or reset
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn index_of(&self, key: &T::Key) -> Option<usize> {
        self.items.iter().position(|item| item.key() == *key)
    }

    fn first_movable(&self) -> usize {
        self.items.iter().take_while(|item| item.is_pinned()).count()
    }

    /// Moves the item at `from` to `to`, shifting the items in between.
    /// Returns false when nothing moved.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || self.items[from].is_pinned() {
            return false;
        }
        let to = to.min(self.items.len() - 1).max(self.first_movable());
        if from == to {
            return false;
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.refresh_state();
        true
    }

    /// Moves the item with `key` to index `to`
    pub fn move_key(&mut self, key: &T::Key, to: usize) -> bool {
        match self.index_of(key) {
            Some(from) => self.move_item(from, to),
            None => false,
        }
    }

    /// Returns the item's new index when it moved
    pub fn move_up(&mut self, index: usize) -> Option<usize> {
        let to = index.checked_sub(1)?;
        self.move_item(index, to).then_some(to)
    }

    pub fn move_down(&mut self, index: usize) -> Option<usize> {
        let to = index + 1;
        if to >= self.items.len() {
            return None;
        }
        self.move_item(index, to).then_some(to)
    }

    /// Sends an item to the end of the staged order so it keeps a dense
    /// position. Returns false for pinned or unknown items.
    pub fn send_to_back(&mut self, key: &T::Key) -> bool {
        match self.index_of(key) {
            Some(from) => self.move_item(from, self.items.len() - 1),
            None => false,
        }
    }

    /// Forgets an item whose record no longer exists. Pinned items stay.
    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let index = self.index_of(key)?;
        if self.items[index].is_pinned() {
            return None;
        }
        let removed = self.items.remove(index);
        self.refresh_state();
        Some(removed)
    }

    /// Restores the last clean order without contacting the backend.
    /// Only available while Dirty.
    pub fn reset(&mut self) -> bool {
        if self.state != ReorderState::Dirty {
            return false;
        }
        self.items = self.snapshot.clone();
        self.state = ReorderState::Clean;
        self.last_error = None;
        debug!("reorder reset to last clean order");
        true
    }

    /// Dense zero-based positions of the persisted items in the staged order
    pub fn positions(&self) -> Vec<PositionUpdate> {
        self.items
            .iter()
            .filter_map(|item| item.persisted_id())
            .enumerate()
            .map(|(index, id)| PositionUpdate {
                id,
                position: index as i64,
            })
            .collect()
    }

    /// Enters Saving and returns the payload to persist. `None` unless Dirty.
    pub fn begin_save(&mut self) -> Option<Vec<PositionUpdate>> {
        if self.state != ReorderState::Dirty {
            return None;
        }
        self.in_flight = Some(self.items.clone());
        self.state = ReorderState::Saving;
        debug!(items = self.items.len(), "reorder save started");
        Some(self.positions())
    }

    /// Resolves the in-flight save.
    ///
    /// On success the saved order becomes the clean snapshot; the list stays
    /// Dirty if it was reordered while saving. On failure the list returns to
    /// Dirty and keeps the error.
    pub fn finish_save(&mut self, result: Result<(), String>) {
        if self.state != ReorderState::Saving {
            warn!("save result arrived with no save in flight");
            return;
        }
        let saved = self.in_flight.take();

        match result {
            Ok(()) => {
                if let Some(saved) = saved {
                    self.snapshot = saved;
                }
                self.last_error = None;
                self.state = if self.matches_snapshot() {
                    ReorderState::Clean
                } else {
                    ReorderState::Dirty
                };
                debug!(state = ?self.state, "reorder save finished");
            }
            Err(error) => {
                warn!(%error, "reorder save failed");
                self.last_error = Some(error);
                self.state = ReorderState::Dirty;
            }
        }
    }

    /// Saves synchronously through `sink`. Returns false when there was
    /// nothing to save.
    pub fn commit(&mut self, sink: &mut dyn PositionSink) -> Result<bool> {
        let Some(positions) = self.begin_save() else {
            return Ok(false);
        };
        match sink.persist_positions(&positions) {
            Ok(()) => {
                self.finish_save(Ok(()));
                Ok(true)
            }
            Err(e) => {
                self.finish_save(Err(e.to_string()));
                Err(e)
            }
        }
    }

    /// Adopts a freshly fetched canonical order, discarding staged changes
    pub fn replace(&mut self, items: Vec<T>) {
        *self = Self::new(items);
    }

    fn matches_snapshot(&self) -> bool {
        self.items.len() == self.snapshot.len()
            && self
                .items
                .iter()
                .zip(&self.snapshot)
                .all(|(a, b)| a.key() == b.key())
    }

    fn refresh_state(&mut self) {
        if self.state == ReorderState::Saving {
            return;
        }
        if self.matches_snapshot() {
            self.state = ReorderState::Clean;
            self.last_error = None;
        } else {
            self.state = ReorderState::Dirty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: &'static str,
        id: Option<Uuid>,
    }

    impl Item {
        fn real(name: &'static str) -> Self {
            Self {
                name,
                id: Some(Uuid::new_v4()),
            }
        }

        fn pinned(name: &'static str) -> Self {
            Self { name, id: None }
        }
    }

    impl Reorderable for Item {
        type Key = &'static str;

        fn key(&self) -> &'static str {
            self.name
        }

        fn persisted_id(&self) -> Option<Uuid> {
            self.id
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        saved: Vec<Vec<PositionUpdate>>,
        fail: bool,
    }

    impl PositionSink for RecordingSink {
        fn persist_positions(&mut self, positions: &[PositionUpdate]) -> Result<()> {
            if self.fail {
                return Err(anyhow!("backend unavailable"));
            }
            self.saved.push(positions.to_vec());
            Ok(())
        }
    }

    fn abcd() -> ReorderList<Item> {
        ReorderList::new(vec![
            Item::real("A"),
            Item::real("B"),
            Item::real("C"),
            Item::real("D"),
        ])
    }

    fn names(list: &ReorderList<Item>) -> Vec<&'static str> {
        list.items().iter().map(|i| i.name).collect()
    }

    #[test]
    fn moving_last_to_front_persists_dense_positions() {
        let mut list = abcd();
        let ids: Vec<Uuid> = list.items().iter().filter_map(|i| i.id).collect();

        assert!(list.move_item(3, 0));
        assert!(list.is_dirty());

        let mut sink = RecordingSink::default();
        assert!(list.commit(&mut sink).unwrap());

        let expected = vec![
            PositionUpdate { id: ids[3], position: 0 },
            PositionUpdate { id: ids[0], position: 1 },
            PositionUpdate { id: ids[1], position: 2 },
            PositionUpdate { id: ids[2], position: 3 },
        ];
        assert_eq!(sink.saved, vec![expected]);
        assert_eq!(list.state(), ReorderState::Clean);
    }

    #[test]
    fn reset_restores_original_order() {
        let mut list = abcd();
        list.move_item(3, 0);
        assert_eq!(names(&list), vec!["D", "A", "B", "C"]);

        assert!(list.reset());
        assert_eq!(names(&list), vec!["A", "B", "C", "D"]);
        assert_eq!(list.state(), ReorderState::Clean);
        assert!(!list.reset());
    }

    #[test]
    fn moving_back_to_original_order_is_clean() {
        let mut list = abcd();
        list.move_item(0, 2);
        list.move_item(2, 0);
        assert_eq!(list.state(), ReorderState::Clean);
        assert!(list.begin_save().is_none());
    }

    #[test]
    fn failed_save_stays_dirty_with_error() {
        let mut list = abcd();
        list.move_item(1, 0);

        let mut sink = RecordingSink {
            fail: true,
            ..RecordingSink::default()
        };
        assert!(list.commit(&mut sink).is_err());
        assert!(list.is_dirty());
        assert_eq!(list.last_error(), Some("backend unavailable"));
        assert_eq!(names(&list), vec!["B", "A", "C", "D"]);

        sink.fail = false;
        assert!(list.commit(&mut sink).unwrap());
        assert!(list.last_error().is_none());
        assert_eq!(list.state(), ReorderState::Clean);
    }

    #[test]
    fn reordering_while_saving_needs_another_save() {
        let mut list = abcd();
        list.move_item(3, 0);
        let payload = list.begin_save().unwrap();
        assert_eq!(payload.len(), 4);
        assert!(list.is_saving());

        assert!(list.move_item(1, 3));
        assert!(list.is_saving());
        assert!(!list.reset());

        list.finish_save(Ok(()));
        assert!(list.is_dirty());

        list.reset();
        assert_eq!(names(&list), vec!["D", "A", "B", "C"]);
    }

    #[test]
    fn pinned_entry_never_moves_or_leaves() {
        let mut list = ReorderList::new(vec![
            Item::pinned("Favorites"),
            Item::real("A"),
            Item::real("B"),
        ]);

        assert!(!list.move_item(0, 2));
        assert!(list.remove(&"Favorites").is_none());
        assert!(list.move_item(2, 0));
        assert_eq!(names(&list), vec!["Favorites", "B", "A"]);

        let positions = list.positions();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].position, 0);
        assert_eq!(positions[1].position, 1);
    }

    #[test]
    fn removing_an_item_marks_dirty_and_shrinks_payload() {
        let mut list = abcd();
        assert!(list.remove(&"B").is_some());
        assert!(list.is_dirty());
        assert_eq!(list.begin_save().unwrap().len(), 3);
    }

    #[test]
    fn sent_to_back_item_keeps_a_dense_position() {
        let mut list = abcd();
        assert!(list.send_to_back(&"B"));
        assert_eq!(names(&list), vec!["A", "C", "D", "B"]);

        let positions: Vec<i64> = list.begin_save().unwrap().iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert!(!list.send_to_back(&"B"));
    }

    #[test]
    fn move_helpers_report_new_index() {
        let mut list = abcd();
        assert_eq!(list.move_down(0), Some(1));
        assert_eq!(list.move_up(0), None);
        assert_eq!(list.move_down(3), None);
        assert!(list.move_key(&"D", 0));
        assert_eq!(names(&list), vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn replace_discards_staged_changes() {
        let mut list = abcd();
        list.move_item(0, 3);
        list.replace(vec![Item::real("X")]);
        assert_eq!(list.state(), ReorderState::Clean);
        assert_eq!(names(&list), vec!["X"]);
    }

    #[test]
    fn stray_save_result_is_ignored() {
        let mut list = abcd();
        list.finish_save(Err("late".into()));
        assert_eq!(list.state(), ReorderState::Clean);
        assert!(list.last_error().is_none());
    }
}
