use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Represents a tag that a user can apply to their snippets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,

    /// Owner of the tag; tags are never shared between users
    pub user_id: String,

    /// Name of the tag (without the # prefix)
    pub name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(user_id: &str, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: clean_tag_name(name),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the tag with a # prefix for display
    pub fn display_name(&self) -> String {
        format!("#{}", self.name)
    }
}

/// Strips a leading `#` and surrounding whitespace
pub fn clean_tag_name(name: &str) -> String {
    let trimmed = name.trim();
    trimmed.strip_prefix('#').unwrap_or(trimmed).trim().to_string()
}

/// Owns every user's tag definitions. Which snippets carry a tag is recorded
/// on the snippets themselves (`Snippet::tag_ids`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagManager {
    tags: HashMap<Uuid, Tag>,
}

impl TagManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tags(tags: Vec<Tag>) -> Self {
        Self {
            tags: tags.into_iter().map(|t| (t.id, t)).collect(),
        }
    }

    /// Creates a new tag or returns the existing one with the same name.
    /// Returns `None` for blank names.
    pub fn create_tag(&mut self, user_id: &str, name: &str) -> Option<Uuid> {
        let clean_name = clean_tag_name(name);
        if clean_name.is_empty() {
            return None;
        }

        if let Some(existing) = self.find_by_name(user_id, &clean_name) {
            return Some(existing.id);
        }

        let tag = Tag::new(user_id, &clean_name);
        let tag_id = tag.id;
        self.tags.insert(tag_id, tag);
        Some(tag_id)
    }

    /// Renames a tag. Refused when the name is blank or already used by
    /// another tag of the same user.
    pub fn rename_tag(&mut self, tag_id: &Uuid, name: &str) -> bool {
        let clean_name = clean_tag_name(name);
        if clean_name.is_empty() {
            return false;
        }

        let Some(user_id) = self.tags.get(tag_id).map(|t| t.user_id.clone()) else {
            return false;
        };
        if let Some(existing) = self.find_by_name(&user_id, &clean_name) {
            if existing.id != *tag_id {
                return false;
            }
        }

        if let Some(tag) = self.tags.get_mut(tag_id) {
            tag.name = clean_name;
            tag.updated_at = Utc::now();
        }
        true
    }

    pub fn remove_tag(&mut self, tag_id: &Uuid) -> Option<Tag> {
        self.tags.remove(tag_id)
    }

    pub fn get(&self, tag_id: &Uuid) -> Option<&Tag> {
        self.tags.get(tag_id)
    }

    pub fn is_owned_by(&self, tag_id: &Uuid, user_id: &str) -> bool {
        self.tags
            .get(tag_id)
            .is_some_and(|t| t.user_id == user_id)
    }

    pub fn find_by_name(&self, user_id: &str, name: &str) -> Option<&Tag> {
        let wanted = clean_tag_name(name).to_lowercase();
        self.tags
            .values()
            .find(|t| t.user_id == user_id && t.name.to_lowercase() == wanted)
    }

    /// A user's tags sorted by name
    pub fn tags_for_user(&self, user_id: &str) -> Vec<&Tag> {
        let mut tags: Vec<_> = self.tags.values().filter(|t| t.user_id == user_id).collect();
        tags.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        tags
    }

    /// Find tags of a user whose name contains the query
    pub fn find_tags_by_name(&self, user_id: &str, query: &str) -> Vec<&Tag> {
        let query = clean_tag_name(query).to_lowercase();
        self.tags_for_user(user_id)
            .into_iter()
            .filter(|tag| tag.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    /// Drops every tag owned by `user_id` and installs `tags` in their place.
    pub fn replace_user_tags(&mut self, user_id: &str, tags: Vec<Tag>) {
        self.tags.retain(|_, t| t.user_id != user_id);
        for tag in tags {
            self.tags.insert(tag.id, tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_tag_dedupes_case_insensitively() {
        let mut tags = TagManager::new();
        let first = tags.create_tag("ana", "#Async").unwrap();
        let second = tags.create_tag("ana", "async").unwrap();
        assert_eq!(first, second);
        assert_eq!(tags.get(&first).unwrap().name, "Async");
    }

    #[test]
    fn tags_are_scoped_per_user() {
        let mut tags = TagManager::new();
        let mine = tags.create_tag("ana", "web").unwrap();
        let theirs = tags.create_tag("bo", "web").unwrap();
        assert_ne!(mine, theirs);
        assert_eq!(tags.tags_for_user("ana").len(), 1);
        assert!(!tags.is_owned_by(&theirs, "ana"));
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut tags = TagManager::new();
        assert!(tags.create_tag("ana", "  # ").is_none());
    }

    #[test]
    fn rename_refuses_clashes() {
        let mut tags = TagManager::new();
        let a = tags.create_tag("ana", "alpha").unwrap();
        tags.create_tag("ana", "beta").unwrap();

        assert!(!tags.rename_tag(&a, "BETA"));
        assert!(tags.rename_tag(&a, "gamma"));
        assert_eq!(tags.get(&a).unwrap().display_name(), "#gamma");
    }
}
