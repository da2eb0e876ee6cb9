#![allow(dead_code)]

use post_service::config::{MongoConfig, PostServiceConfig};
use post_service::services::MockPostStore;
use post_service::startup::Application;
use secrecy::Secret;
use std::sync::Arc;
use std::time::Duration;

pub fn test_config(uri: &str) -> PostServiceConfig {
    PostServiceConfig {
        common: service_core::config::Config {
            port: 0, // Random port
            ..Default::default()
        },
        mongodb: MongoConfig {
            uri: Secret::new(uri.to_string()),
            connect_timeout: Duration::from_secs(2),
            operation_timeout: Duration::from_secs(5),
        },
    }
}

pub fn new_post_body(contents: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": contents,
        "user": { "name": "a", "platform": "web", "isAdmin": false }
    })
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<MockPostStore>,
}

impl TestApp {
    /// Serve the full application over HTTP, backed by the in-memory store.
    pub async fn spawn() -> Self {
        let store = Arc::new(MockPostStore::new());
        let config = test_config("mongodb://unused:27017/unused");

        let app = Application::build_with_store(config, store.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_with_shutdown(std::future::pending()).await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store,
        }
    }
}
