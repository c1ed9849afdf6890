//! Common test utilities for E2E tests

#![allow(dead_code)]

use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use xvo::auth::CALLER_ID_HEADER;
use xvo::data::{Account, NewAccount};
use xvo::{AppState, config};

pub const SUPER_ADMIN: &str = "alz";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// Configuration used by every test server
pub fn test_config(temp_dir: &TempDir) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        database: config::DatabaseConfig {
            path: temp_dir.path().join("test.db"),
        },
        cache: config::CacheConfig {
            account_capacity: 1000,
            account_ttl_seconds: 3600,
        },
        moderation: config::ModerationConfig {
            super_admin_username: SUPER_ADMIN.to_string(),
            verification_follower_threshold: 50_000,
            follower_grant_batch_limit: 5000,
        },
        admin: config::AdminConfig {
            password: None,
            display_name: "Admin".to_string(),
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        adjust(&mut config);

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = xvo::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Insert an account directly, skipping password hashing
    pub async fn create_test_account(&self, username: &str) -> Account {
        self.insert_account(username, false).await
    }

    /// Insert the reserved super-admin account
    pub async fn create_super_admin(&self) -> Account {
        self.insert_account(SUPER_ADMIN, true).await
    }

    /// Insert an ordinary account carrying the admin flag
    pub async fn create_admin(&self, username: &str) -> Account {
        self.insert_account(username, true).await
    }

    async fn insert_account(&self, username: &str, is_admin: bool) -> Account {
        self.state
            .db
            .insert_account(&NewAccount {
                name: username.to_string(),
                username: username.to_string(),
                password_hash: "test-hash".to_string(),
                display_name: username.to_string(),
                avatar: "https://example.com/avatar.png".to_string(),
                is_admin,
            })
            .await
            .unwrap()
    }

    /// Suspend an account through the identity store so the cache stays in sync
    pub async fn suspend(&self, account_id: i64) {
        let account = self
            .state
            .identity()
            .toggle_suspension(account_id)
            .await
            .unwrap();
        assert!(account.is_suspended);
    }

    pub async fn get_as(&self, path: &str, caller_id: i64) -> reqwest::Response {
        self.client
            .get(&self.url(path))
            .header(CALLER_ID_HEADER, caller_id.to_string())
            .send()
            .await
            .unwrap()
    }

    pub async fn post_as(&self, path: &str, caller_id: i64, body: Value) -> reqwest::Response {
        self.client
            .post(&self.url(path))
            .header(CALLER_ID_HEADER, caller_id.to_string())
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn put_as(&self, path: &str, caller_id: i64, body: Value) -> reqwest::Response {
        self.client
            .put(&self.url(path))
            .header(CALLER_ID_HEADER, caller_id.to_string())
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete_as(&self, path: &str, caller_id: i64) -> reqwest::Response {
        self.client
            .delete(&self.url(path))
            .header(CALLER_ID_HEADER, caller_id.to_string())
            .send()
            .await
            .unwrap()
    }

    /// Send a message as `sender_id`, asserting success
    pub async fn send_message(&self, sender_id: i64, receiver_id: i64, text: &str) -> Value {
        let response = self
            .post_as(
                "/api/messages",
                sender_id,
                serde_json::json!({
                    "senderId": sender_id,
                    "receiverId": receiver_id,
                    "text": text,
                }),
            )
            .await;
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    /// Apply an account command to `target_id` as `caller_id`
    pub async fn command(&self, caller_id: i64, target_id: i64, command: Value) -> reqwest::Response {
        self.put_as(&format!("/api/accounts/{}", target_id), caller_id, command)
            .await
    }
}
