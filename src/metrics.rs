//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

/// Content type of `encode()` output
pub use prometheus::TEXT_FORMAT;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Messaging Metrics
    pub static ref MESSAGES_SENT_TOTAL: IntCounter = IntCounter::new(
        "xvo_messages_sent_total",
        "Total number of direct messages sent"
    ).expect("metric can be created");

    // Moderation Metrics
    pub static ref MODERATION_ACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("xvo_moderation_actions_total", "Total number of moderation actions applied"),
        &["action"]
    ).expect("metric can be created");

    // Cache Metrics
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("xvo_cache_hits_total", "Total number of cache hits"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("xvo_cache_misses_total", "Total number of cache misses"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_SIZE: IntGaugeVec = IntGaugeVec::new(
        Opts::new("xvo_cache_size", "Current number of items in cache"),
        &["cache_name"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("xvo_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(MESSAGES_SENT_TOTAL.clone()))
        .expect("MESSAGES_SENT_TOTAL can be registered");
    REGISTRY
        .register(Box::new(MODERATION_ACTIONS_TOTAL.clone()))
        .expect("MODERATION_ACTIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_HITS_TOTAL.clone()))
        .expect("CACHE_HITS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_MISSES_TOTAL.clone()))
        .expect("CACHE_MISSES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_SIZE.clone()))
        .expect("CACHE_SIZE can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Render every registered instrument in the Prometheus text format
pub fn encode() -> Result<String, crate::error::AppError> {
    TextEncoder::new()
        .encode_to_string(&REGISTRY.gather())
        .map_err(|e| {
            crate::error::AppError::Internal(anyhow::anyhow!("Failed to encode metrics: {}", e))
        })
}
