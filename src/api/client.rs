use super::error::map_reqwest_error;
use super::types::{
    CreateCollectionRequest, CreateSnippetRequest, Envelope, ForkRequest, PositionsPayload,
    RemoteCollection, RemoteSnippet, TagRequest, UpdateCollectionRequest, UpdateSnippetRequest,
};
use super::ApiError;
use crate::models::{PositionUpdate, Tag};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Client for the snippet backend's REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let http = Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .user_agent(concat!("snippy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.endpoint(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Option<T>, ApiError> {
        let res = builder.send().await.map_err(map_reqwest_error)?;
        let status = res.status().as_u16();
        let url = res.url().path().to_string();
        let body = res.text().await.map_err(map_reqwest_error)?;

        let result = parse_response(status, &body);
        match &result {
            Ok(_) => debug!(status, %url, "api request succeeded"),
            Err(e) => warn!(status, %url, error = %e, "api request failed"),
        }
        result
    }

    async fn send_required<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        self.send(builder)
            .await?
            .ok_or_else(|| ApiError::Decode("response carried no data".to_string()))
    }

    async fn send_list<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Vec<T>, ApiError> {
        Ok(self.send(builder).await?.unwrap_or_default())
    }

    async fn send_unit(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(builder).await.map(|_| ())
    }

    // Snippets

    pub async fn list_snippets(&self) -> Result<Vec<RemoteSnippet>, ApiError> {
        self.send_list(self.request(Method::GET, "snippets")).await
    }

    pub async fn get_snippet(&self, id: &Uuid) -> Result<RemoteSnippet, ApiError> {
        self.send_required(self.request(Method::GET, &format!("snippets/{id}")))
            .await
    }

    pub async fn create_snippet(&self, body: &CreateSnippetRequest) -> Result<RemoteSnippet, ApiError> {
        self.send_required(self.request(Method::POST, "snippets/create").json(body))
            .await
    }

    pub async fn update_snippet(&self, id: &Uuid, body: &UpdateSnippetRequest) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::PUT, &format!("snippets/{id}")).json(body))
            .await
    }

    pub async fn delete_snippet(&self, id: &Uuid) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, &format!("snippets/{id}")))
            .await
    }

    pub async fn fork_snippet(&self, id: &Uuid) -> Result<RemoteSnippet, ApiError> {
        let body = ForkRequest { id: *id };
        self.send_required(self.request(Method::POST, "snippets/fork").json(&body))
            .await
    }

    /// Community listing; needs no token
    pub async fn public_snippets(&self) -> Result<Vec<RemoteSnippet>, ApiError> {
        self.send_list(self.http.get(self.endpoint("snippets/public")))
            .await
    }

    // Collections

    pub async fn list_collections(&self) -> Result<Vec<RemoteCollection>, ApiError> {
        self.send_list(self.request(Method::GET, "collections")).await
    }

    pub async fn create_collection(
        &self,
        body: &CreateCollectionRequest,
    ) -> Result<RemoteCollection, ApiError> {
        self.send_required(self.request(Method::POST, "collections/create").json(body))
            .await
    }

    pub async fn update_collection(
        &self,
        id: &Uuid,
        body: &UpdateCollectionRequest,
    ) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::PUT, &format!("collections/{id}")).json(body))
            .await
    }

    pub async fn delete_collection(&self, id: &Uuid) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, &format!("collections/{id}")))
            .await
    }

    pub async fn collection_snippets(&self, id: &Uuid) -> Result<Vec<RemoteSnippet>, ApiError> {
        self.send_list(self.request(Method::GET, &format!("collections/{id}/snippets")))
            .await
    }

    pub async fn update_collection_positions(
        &self,
        positions: &[PositionUpdate],
    ) -> Result<(), ApiError> {
        let body = PositionsPayload { positions };
        self.send_unit(self.request(Method::PUT, "collections/positions").json(&body))
            .await
    }

    pub async fn update_snippet_positions(
        &self,
        collection_id: &Uuid,
        positions: &[PositionUpdate],
    ) -> Result<(), ApiError> {
        let body = PositionsPayload { positions };
        let path = format!("collections/{collection_id}/snippets/positions");
        self.send_unit(self.request(Method::PUT, &path).json(&body))
            .await
    }

    // Tags

    pub async fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        self.send_list(self.request(Method::GET, "tags")).await
    }

    pub async fn create_tag(&self, name: &str) -> Result<Tag, ApiError> {
        self.send_required(self.request(Method::POST, "tags/create").json(&TagRequest { name }))
            .await
    }

    pub async fn rename_tag(&self, id: &Uuid, name: &str) -> Result<(), ApiError> {
        self.send_unit(
            self.request(Method::PUT, &format!("tags/{id}"))
                .json(&TagRequest { name }),
        )
        .await
    }

    pub async fn delete_tag(&self, id: &Uuid) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, &format!("tags/{id}")))
            .await
    }
}

/// Turns a status code and body into the envelope's data.
///
/// Non-2xx answers become `Http`, using the envelope's error text when the
/// body has one.
pub(crate) fn parse_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<Option<T>, ApiError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|env| env.error.filter(|e| !e.is_empty()).or(Some(env.message)))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.trim().to_string());
        return Err(ApiError::Http { status, message });
    }

    if body.trim().is_empty() {
        return Ok(None);
    }

    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    envelope.into_result()
}
