use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Reserved identifier of the per-user Favorites collection.
pub const FAVORITES_ID: &str = "favorites";
pub const FAVORITES_NAME: &str = "Favorites";
pub const FAVORITES_COLOR: &str = "#EF4444";
pub const DEFAULT_COLLECTION_COLOR: &str = "#3b82f6";

/// Identifies a collection: either the virtual Favorites collection or a
/// user-defined one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionRef {
    Favorites,
    Named(Uuid),
}

impl CollectionRef {
    pub fn is_favorites(&self) -> bool {
        matches!(self, CollectionRef::Favorites)
    }

    pub fn named_id(&self) -> Option<Uuid> {
        match self {
            CollectionRef::Favorites => None,
            CollectionRef::Named(id) => Some(*id),
        }
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionRef::Favorites => f.write_str(FAVORITES_ID),
            CollectionRef::Named(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for CollectionRef {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(FAVORITES_ID) {
            return Ok(CollectionRef::Favorites);
        }
        Uuid::parse_str(s).map(CollectionRef::Named)
    }
}

impl Serialize for CollectionRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CollectionRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A user-defined, stored collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCollection {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserCollection {
    pub fn new(user_id: &str, data: NewCollection) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: data.name,
            color: data.color.unwrap_or_else(|| DEFAULT_COLLECTION_COLOR.to_string()),
            position: data.position,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: CollectionPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        self.updated_at = Utc::now();
    }
}

/// The Favorites collection, synthesized from a user's favorite-flagged snippets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesCollection {
    pub user_id: String,
    pub snippet_count: usize,
}

/// Read-side view of a collection as listed in a user's library.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Favorites(FavoritesCollection),
    Named(UserCollection),
}

impl Collection {
    pub fn reference(&self) -> CollectionRef {
        match self {
            Collection::Favorites(_) => CollectionRef::Favorites,
            Collection::Named(c) => CollectionRef::Named(c.id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Collection::Favorites(_) => FAVORITES_NAME,
            Collection::Named(c) => &c.name,
        }
    }

    pub fn color(&self) -> &str {
        match self {
            Collection::Favorites(_) => FAVORITES_COLOR,
            Collection::Named(c) => &c.color,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Collection::Favorites(f) => &f.user_id,
            Collection::Named(c) => &c.user_id,
        }
    }

    pub fn is_favorites(&self) -> bool {
        matches!(self, Collection::Favorites(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCollection {
    pub name: String,
    pub color: Option<String>,
    pub position: i64,
}

impl NewCollection {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CollectionPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            color: None,
        }
    }
}

/// Parses a hex color such as `#3b82f6` into its RGB components.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
