//! Wire types of the snippet backend.

use super::ApiError;
use crate::models::{
    CollectionPatch, PositionUpdate, Snippet, SnippetLanguage, SnippetPatch, UserCollection,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every backend response is wrapped in this envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.success {
            return Ok(self.data);
        }
        let message = self
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or(self.message);
        Err(ApiError::Backend(message))
    }
}

/// Snippet as the backend stores it. Filing is an array there; only the
/// first entry is meaningful to the client.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSnippet {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub collection_ids: Option<Vec<Uuid>>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub fork_count: u32,
    #[serde(default)]
    pub forked_from: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RemoteSnippet {
    /// Converts to a store record. Fields the backend does not keep are
    /// taken from `local`, the existing record with the same id, if any.
    pub fn into_snippet(self, local: Option<&Snippet>) -> Snippet {
        let language = match self.language.filter(|l| !l.is_empty()) {
            Some(name) => SnippetLanguage::from_name(&name),
            None => local.map(|s| s.language.clone()).unwrap_or_default(),
        };
        let position = self
            .position
            .or_else(|| local.map(|s| s.position))
            .unwrap_or(0);

        Snippet {
            id: self.id,
            user_id: self.user_id,
            collection_id: self
                .collection_ids
                .and_then(|ids| ids.into_iter().next()),
            title: self.title,
            content: self.content,
            language,
            is_public: self.is_public,
            is_favorite: self.is_favorite,
            position,
            fork_count: self.fork_count,
            forked_from: self.forked_from,
            tag_ids: self.tag_ids.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCollection {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub snippet_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RemoteCollection> for UserCollection {
    fn from(remote: RemoteCollection) -> Self {
        Self {
            id: remote.id,
            user_id: remote.user_id,
            name: remote.name,
            color: remote.color,
            position: remote.position.unwrap_or(0),
            created_at: remote.created_at,
            updated_at: remote.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSnippetRequest {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub language: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collection_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<Uuid>,
    pub is_public: bool,
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forked_from: Option<Uuid>,
}

impl From<&Snippet> for CreateSnippetRequest {
    fn from(snippet: &Snippet) -> Self {
        Self {
            id: snippet.id,
            title: snippet.title.clone(),
            content: snippet.content.clone(),
            language: snippet.language.id().to_string(),
            collection_ids: snippet.collection_id.into_iter().collect(),
            tag_ids: snippet.tag_ids.clone(),
            is_public: snippet.is_public,
            is_favorite: snippet.is_favorite,
            forked_from: snippet.forked_from,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateSnippetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    /// An empty array unfiles the snippet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_ids: Option<Vec<Uuid>>,
}

impl From<&SnippetPatch> for UpdateSnippetRequest {
    fn from(patch: &SnippetPatch) -> Self {
        Self {
            title: patch.title.clone(),
            content: patch.content.clone(),
            language: patch.language.as_ref().map(|l| l.id().to_string()),
            tag_ids: patch.tag_ids.clone(),
            is_public: patch.is_public,
            is_favorite: patch.is_favorite,
            collection_ids: patch
                .collection_id
                .map(|filing| filing.into_iter().collect()),
        }
    }
}

impl UpdateSnippetRequest {
    /// True when the patch only touched fields the backend does not store
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub color: String,
}

impl From<&UserCollection> for CreateCollectionRequest {
    fn from(collection: &UserCollection) -> Self {
        Self {
            name: collection.name.clone(),
            color: collection.color.clone(),
        }
    }
}

pub type UpdateCollectionRequest = CollectionPatch;

#[derive(Debug, Clone, Serialize)]
pub struct ForkRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionsPayload<'a> {
    pub positions: &'a [PositionUpdate],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewSnippet;
    use serde_json::json;

    fn remote_json() -> serde_json::Value {
        json!({
            "id": "7f1c6a8e-4d0a-4a4b-9a55-2f0f1f6c7a10",
            "user_id": "user_1",
            "collection_ids": ["0b6f9d5e-93f4-4c5d-8b7e-1a2b3c4d5e6f", "1b6f9d5e-93f4-4c5d-8b7e-1a2b3c4d5e6f"],
            "title": "Fetch wrapper",
            "content": "await fetch(url)",
            "tag_ids": null,
            "tag_names": [],
            "is_public": true,
            "is_favorite": false,
            "fork_count": 4,
            "forked_from": null,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-02T10:00:00Z"
        })
    }

    #[test]
    fn remote_snippet_takes_first_collection() {
        let remote: RemoteSnippet = serde_json::from_value(remote_json()).unwrap();
        let snippet = remote.into_snippet(None);

        assert_eq!(
            snippet.collection_id.map(|id| id.to_string()).as_deref(),
            Some("0b6f9d5e-93f4-4c5d-8b7e-1a2b3c4d5e6f")
        );
        assert_eq!(snippet.fork_count, 4);
        assert!(snippet.tag_ids.is_empty());
        assert_eq!(snippet.language, SnippetLanguage::Text);
    }

    #[test]
    fn remote_snippet_keeps_local_only_fields() {
        let remote: RemoteSnippet = serde_json::from_value(remote_json()).unwrap();
        let mut local = Snippet::create(
            "user_1",
            NewSnippet::new("Fetch wrapper", "", SnippetLanguage::JavaScript),
        );
        local.position = 7;

        let snippet = remote.into_snippet(Some(&local));
        assert_eq!(snippet.language, SnippetLanguage::JavaScript);
        assert_eq!(snippet.position, 7);
    }

    #[test]
    fn failed_envelope_prefers_error_text() {
        let envelope: Envelope<RemoteSnippet> = serde_json::from_value(json!({
            "success": false,
            "message": "Error",
            "error": "Snippet not found"
        }))
        .unwrap();

        assert_eq!(
            envelope.into_result().unwrap_err(),
            ApiError::Backend("Snippet not found".into())
        );
    }

    #[test]
    fn patch_maps_filing_to_collection_ids() {
        let unfile = UpdateSnippetRequest::from(&SnippetPatch::file_into(None));
        assert_eq!(
            serde_json::to_value(&unfile).unwrap(),
            json!({ "collection_ids": [] })
        );

        let favorite = UpdateSnippetRequest::from(&SnippetPatch::favorite(true));
        assert_eq!(
            serde_json::to_value(&favorite).unwrap(),
            json!({ "is_favorite": true })
        );

        let position_only = SnippetPatch {
            position: Some(3),
            ..SnippetPatch::default()
        };
        assert!(UpdateSnippetRequest::from(&position_only).is_empty());
    }

    #[test]
    fn positions_payload_shape() {
        let id = Uuid::nil();
        let positions = [PositionUpdate { id, position: 0 }];
        let body = serde_json::to_value(PositionsPayload {
            positions: &positions,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "positions": [{ "id": id.to_string(), "position": 0 }] })
        );
    }
}
