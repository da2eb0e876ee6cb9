use crate::models::Post;
use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Document};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to connect to document store: {0}")]
    Connection(anyhow::Error),

    #[error("Document store unavailable: {0}")]
    Unavailable(anyhow::Error),

    #[error("Query failed: {0}")]
    Query(anyhow::Error),

    #[error("Failed to decode stored document: {0}")]
    Decode(anyhow::Error),

    #[error("Write failed: {0}")]
    Write(anyhow::Error),
}

/// Persistence seam for posts. Handlers only ever see this trait.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_all(&self) -> Result<Vec<Post>, StoreError>;

    /// Stores `post`, assigning a fresh identifier first if it has none.
    async fn insert_one(&self, post: &mut Post) -> Result<ObjectId, StoreError>;

    /// Releases the underlying session. Called once at process shutdown.
    async fn shutdown(&self) {}
}

/// Decodes raw documents, failing on the first one that does not fit `T`.
pub(crate) fn decode_documents<T: DeserializeOwned>(
    documents: Vec<Document>,
) -> Result<Vec<T>, StoreError> {
    documents
        .into_iter()
        .map(|doc| {
            let id = doc.get("_id").cloned();
            bson::from_document(doc).map_err(|e| {
                tracing::error!(id = ?id, "Failed to decode stored document: {}", e);
                StoreError::Decode(anyhow::Error::new(e))
            })
        })
        .collect()
}
