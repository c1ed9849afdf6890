//! Xvo - a small social network service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Accounts, posts, messages, notifications, stories        │
//! │  - Caller identity from the x-user-id header                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Authorization guard, moderation gate                     │
//! │  - Conversation aggregation, account commands               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Moka account cache                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database and cache layer
//! - `auth`: Caller identity, authorization guard, password hashing
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
///
/// This struct is cloned for each request; services are built from
/// its shared handles per request.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Read-through account cache (volatile)
    pub account_cache: Arc<data::AccountCache>,

    /// Moderation rules
    pub gate: Arc<service::ModerationGate>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Initialize the account cache
    /// 3. Ensure the super-admin account exists
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        // 2. Initialize caches
        let account_cache = data::AccountCache::new(
            config.cache.account_capacity,
            Duration::from_secs(config.cache.account_ttl_seconds),
        );
        tracing::info!(
            capacity = config.cache.account_capacity,
            "Account cache initialized"
        );

        let state = Self {
            gate: Arc::new(service::ModerationGate::new(&config.moderation)),
            config: Arc::new(config),
            db: Arc::new(db),
            account_cache: Arc::new(account_cache),
        };

        // 3. Initialize super-admin account
        state
            .identity()
            .ensure_super_admin(
                state.config.admin.password.as_deref(),
                &state.config.admin.display_name,
            )
            .await?;

        tracing::info!("Application state initialized successfully");
        Ok(state)
    }

    pub fn identity(&self) -> service::IdentityStore {
        service::IdentityStore::new(
            self.db.clone(),
            self.account_cache.clone(),
            self.gate.clone(),
        )
    }

    pub fn notification_service(&self) -> service::NotificationService {
        service::NotificationService::new(self.db.clone())
    }

    pub fn account_service(&self) -> service::AccountService {
        service::AccountService::new(
            self.identity(),
            self.gate.clone(),
            self.notification_service(),
        )
    }

    pub fn messaging_service(&self) -> service::MessagingService {
        service::MessagingService::new(self.db.clone(), self.identity(), self.gate.clone())
    }

    pub fn post_service(&self) -> service::PostService {
        service::PostService::new(
            self.db.clone(),
            self.identity(),
            self.gate.clone(),
            self.notification_service(),
        )
    }

    pub fn story_service(&self) -> service::StoryService {
        service::StoryService::new(self.db.clone(), self.identity(), self.gate.clone())
    }

    pub fn confession_service(&self) -> service::ConfessionService {
        service::ConfessionService::new(self.db.clone(), self.identity(), self.gate.clone())
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route("/metrics", axum::routing::get(metrics_export))
        .nest("/api", api::api_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// GET /metrics
async fn metrics_export() -> Result<impl axum::response::IntoResponse, error::AppError> {
    let body = metrics::encode()?;
    Ok(([(axum::http::header::CONTENT_TYPE, metrics::TEXT_FORMAT)], body))
}
