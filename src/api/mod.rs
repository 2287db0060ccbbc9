//! REST client for the snippet backend.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use error::ApiError;
pub use types::{
    CreateCollectionRequest, CreateSnippetRequest, RemoteCollection, RemoteSnippet,
    UpdateSnippetRequest,
};
