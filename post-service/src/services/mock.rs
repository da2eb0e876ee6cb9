use crate::models::Post;
use crate::services::store::{decode_documents, PostStore, StoreError};
use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Document};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-process stand-in for MongoDB.
///
/// Documents are kept in their BSON form so decoding behaves as it does
/// against a real collection. Availability and write failures can be toggled
/// to exercise the error paths.
pub struct MockPostStore {
    documents: Mutex<Vec<Document>>,
    available: AtomicBool,
    fail_writes: AtomicBool,
}

impl Default for MockPostStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPostStore {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// When unavailable, every operation fails as if the server were unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stores a document verbatim, bypassing the `Post` shape.
    pub fn insert_raw(&self, document: Document) -> Result<(), StoreError> {
        self.documents
            .lock()
            .map_err(|e| StoreError::Write(anyhow::anyhow!("Mock store mutex poisoned: {}", e)))?
            .push(document);
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self.documents.lock() {
            Ok(docs) => docs.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostStore for MockPostStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable(anyhow::anyhow!(
                "mock store is unavailable"
            )))
        }
    }

    async fn find_all(&self) -> Result<Vec<Post>, StoreError> {
        if !self.is_available() {
            return Err(StoreError::Query(anyhow::anyhow!(
                "mock store is unavailable"
            )));
        }

        let documents = self
            .documents
            .lock()
            .map_err(|e| StoreError::Query(anyhow::anyhow!("Mock store mutex poisoned: {}", e)))?
            .clone();

        decode_documents(documents)
    }

    async fn insert_one(&self, post: &mut Post) -> Result<ObjectId, StoreError> {
        if !self.is_available() || self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write(anyhow::anyhow!("mock store rejected write")));
        }

        let id = *post.id.get_or_insert_with(ObjectId::new);
        let document =
            bson::to_document(&*post).map_err(|e| StoreError::Write(anyhow::Error::new(e)))?;
        self.insert_raw(document)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use mongodb::bson::doc;

    fn post(contents: &str) -> Post {
        Post::new(
            contents.to_string(),
            User {
                name: "a".to_string(),
                platform: "web".to_string(),
                is_admin: false,
            },
        )
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let store = MockPostStore::new();
        let mut first = post("one");
        let mut second = post("two");

        let a = store.insert_one(&mut first).await.unwrap();
        let b = store.insert_one(&mut second).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(first.id, Some(a));
        assert_eq!(store.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn insert_keeps_existing_id() {
        let store = MockPostStore::new();
        let id = ObjectId::new();
        let mut p = post("one");
        p.id = Some(id);

        assert_eq!(store.insert_one(&mut p).await.unwrap(), id);
    }

    #[tokio::test]
    async fn malformed_document_is_a_decode_error() {
        let store = MockPostStore::new();
        store.insert_one(&mut post("fine")).await.unwrap();
        store
            .insert_raw(doc! { "_id": ObjectId::new(), "contents": 42 })
            .unwrap();

        let err = store.find_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_operation() {
        let store = MockPostStore::new();
        store.set_available(false);

        assert!(matches!(
            store.ping().await.unwrap_err(),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            store.find_all().await.unwrap_err(),
            StoreError::Query(_)
        ));
        assert!(matches!(
            store.insert_one(&mut post("x")).await.unwrap_err(),
            StoreError::Write(_)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn len_counts_documents_after_poisoning() {
        let store = std::sync::Arc::new(MockPostStore::new());
        store.insert_one(&mut post("kept")).await.unwrap();

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.documents.lock().unwrap();
            panic!("poison the document list");
        })
        .join();

        assert!(store.documents.is_poisoned());
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}
