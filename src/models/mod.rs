pub mod collection;
pub mod snippet;
pub mod storage;
pub mod tags;

pub use collection::{
    parse_hex_color, Collection, CollectionPatch, CollectionRef, FavoritesCollection,
    NewCollection, UserCollection, DEFAULT_COLLECTION_COLOR, FAVORITES_ID,
};
pub use snippet::{NewSnippet, Snippet, SnippetLanguage, SnippetPatch};
pub use storage::{JsonFileStorage, MemoryStorage, Persistence, StoreSnapshot};
pub use tags::{Tag, TagManager};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity used when no user is signed in.
pub const GUEST_USER: &str = "guest";

/// One entry of a committed ordering: `position` is the dense zero-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: Uuid,
    pub position: i64,
}
