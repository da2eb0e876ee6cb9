use crate::config::{MongoConfig, DEFAULT_DATABASE};
use crate::models::Post;
use crate::services::store::{decode_documents, PostStore, StoreError};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    options::ClientOptions,
    Client as MongoClient, Database,
};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;

pub const POSTS_COLLECTION: &str = "posts";

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
    operation_timeout: Duration,
}

impl MongoDb {
    /// Opens a session and verifies it with a ping.
    ///
    /// The driver connects lazily, so without the ping an unreachable server
    /// would only surface on the first request.
    pub async fn connect(config: &MongoConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.uri.expose_secret())
            .await
            .map_err(|e| StoreError::Connection(anyhow::Error::new(e)))?;
        let database = database_name(&options);
        tracing::info!(database = %database, "Connecting to MongoDB");

        options.app_name = Some("post-service".to_string());
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);

        let client = MongoClient::with_options(options)
            .map_err(|e| StoreError::Connection(anyhow::Error::new(e)))?;
        let db = client.database(&database);

        let store = Self {
            client,
            db,
            operation_timeout: config.operation_timeout,
        };

        bounded(config.connect_timeout, store.run_ping())
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach MongoDB: {}", e);
                StoreError::Connection(e)
            })?;

        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(store)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn run_ping(&self) -> mongodb::error::Result<Document> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
    }

    /// Every document in `collection`, in store order.
    ///
    /// Documents are fetched raw and decoded afterwards so a malformed record
    /// is reported as [`StoreError::Decode`] rather than a transport failure.
    pub async fn find_all_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<T>, StoreError> {
        let coll = self.db.collection::<Document>(collection);

        let documents: Vec<Document> = bounded(self.operation_timeout, async {
            let cursor = coll.find(None, None).await?;
            cursor.try_collect::<Vec<Document>>().await
        })
        .await
        .map_err(|e| {
            tracing::error!(collection = %collection, "Failed to query documents: {}", e);
            StoreError::Query(e)
        })?;

        decode_documents(documents)
    }

    /// Inserts one document and returns the `_id` the store recorded.
    pub async fn insert_document<T>(
        &self,
        collection: &str,
        document: &T,
    ) -> Result<Bson, StoreError>
    where
        T: Serialize + Send + Sync,
    {
        let coll = self.db.collection::<T>(collection);

        let result = bounded(self.operation_timeout, coll.insert_one(document, None))
            .await
            .map_err(|e| {
                tracing::error!(collection = %collection, "Failed to insert document: {}", e);
                StoreError::Write(e)
            })?;

        Ok(result.inserted_id)
    }
}

#[async_trait]
impl PostStore for MongoDb {
    async fn ping(&self) -> Result<(), StoreError> {
        bounded(self.operation_timeout, self.run_ping())
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::warn!("MongoDB health check failed: {}", e);
                StoreError::Unavailable(e)
            })
    }

    async fn find_all(&self) -> Result<Vec<Post>, StoreError> {
        self.find_all_documents(POSTS_COLLECTION).await
    }

    async fn insert_one(&self, post: &mut Post) -> Result<ObjectId, StoreError> {
        post.id.get_or_insert_with(ObjectId::new);

        let inserted = self.insert_document(POSTS_COLLECTION, &*post).await?;
        inserted.as_object_id().ok_or_else(|| {
            StoreError::Write(anyhow::anyhow!("unexpected inserted id: {}", inserted))
        })
    }

    async fn shutdown(&self) {
        tracing::info!("Closing MongoDB session");
        self.client.clone().shutdown().await;
    }
}

/// The database named by the connection string, or [`DEFAULT_DATABASE`].
fn database_name(options: &ClientOptions) -> String {
    options
        .default_database
        .clone()
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
}

/// Runs a driver future under `limit`, folding the timeout into the error.
async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, anyhow::Error>
where
    F: Future<Output = mongodb::error::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(anyhow::Error::new),
        Err(_) => Err(anyhow::anyhow!("operation timed out after {:?}", limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    async fn options(uri: &str) -> ClientOptions {
        ClientOptions::parse(uri).await.unwrap()
    }

    /// A client pointed at a closed port. Server selection waits far longer
    /// than `operation_timeout`, so every call ends on the timeout.
    async fn unreachable_store(operation_timeout: Duration) -> MongoDb {
        let mut options = options("mongodb://127.0.0.1:1/post_test").await;
        options.server_selection_timeout = Some(Duration::from_secs(30));
        let client = MongoClient::with_options(options).unwrap();
        let db = client.database("post_test");
        MongoDb {
            client,
            db,
            operation_timeout,
        }
    }

    fn timed_out(err: &anyhow::Error) -> bool {
        err.to_string().contains("timed out")
    }

    #[tokio::test]
    async fn database_name_comes_from_uri_path() {
        assert_eq!(
            database_name(&options("mongodb://mongodb:27017/linkgate").await),
            "linkgate"
        );
        assert_eq!(
            database_name(&options("mongodb://a:27017,b:27017/feed?replicaSet=rs0").await),
            "feed"
        );
        assert_eq!(
            database_name(&options("mongodb://host/link%2Dgate").await),
            "link-gate"
        );
    }

    #[tokio::test]
    async fn database_name_defaults_when_uri_has_none() {
        assert_eq!(
            database_name(&options("mongodb://mongodb:27017").await),
            DEFAULT_DATABASE
        );
        assert_eq!(
            database_name(&options("mongodb://mongodb:27017/?w=majority").await),
            DEFAULT_DATABASE
        );
        assert_eq!(
            database_name(&options(crate::config::DEFAULT_MONGODB_URI).await),
            DEFAULT_DATABASE
        );
    }

    #[tokio::test]
    async fn bounded_reports_elapsed_timeout() {
        let err = bounded(
            Duration::from_millis(10),
            std::future::pending::<mongodb::error::Result<()>>(),
        )
        .await
        .unwrap_err();
        assert!(timed_out(&err));
    }

    #[tokio::test]
    async fn bounded_passes_through_result() {
        let value = bounded(Duration::from_secs(1), async {
            Ok::<_, mongodb::error::Error>(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn ping_timeout_is_unavailable() {
        let store = unreachable_store(Duration::from_millis(50)).await;
        match store.ping().await {
            Err(StoreError::Unavailable(e)) => assert!(timed_out(&e)),
            other => panic!("expected Unavailable, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn find_timeout_is_a_query_error() {
        let store = unreachable_store(Duration::from_millis(50)).await;
        match store.find_all().await {
            Err(StoreError::Query(e)) => assert!(timed_out(&e)),
            other => panic!("expected Query, got {:?}", other.map(|p| p.len())),
        }
    }

    #[tokio::test]
    async fn insert_timeout_is_a_write_error() {
        let store = unreachable_store(Duration::from_millis(50)).await;
        let mut post = Post::new(
            "hello".to_string(),
            User {
                name: "a".to_string(),
                platform: "web".to_string(),
                is_admin: false,
            },
        );
        match store.insert_one(&mut post).await {
            Err(StoreError::Write(e)) => assert!(timed_out(&e)),
            other => panic!("expected Write, got {:?}", other),
        }
    }
}
