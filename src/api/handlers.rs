//! API Handlers
//!
//! HTTP request handlers for the chat, image and cache admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::invoker::{InvokeOptions, RetryPolicy, RetryableInvoker};
use crate::llm::{ChatProvider, ImageProvider};
use crate::models::{
    CacheStatsResponse, ChatRequest, ChatResponse, ClearResponse, HealthResponse,
    ImageInvokeResponse, ImageRequest, InvokeResponse, NamedCacheStats,
};

/// Name of the chat response cache.
pub const RESPONSES_CACHE: &str = "responses";
/// Name of the generated image cache.
pub const IMAGES_CACHE: &str = "images";

/// Application state shared across all handlers.
///
/// Holds one cache per purpose, built once at startup and shared by handle.
#[derive(Clone)]
pub struct AppState {
    /// Cache-first, retrying invoker over the chat response cache
    pub chat: RetryableInvoker<ChatResponse>,
    /// Cache-first, retrying invoker over generated image URLs
    pub images: RetryableInvoker<String>,
    /// Chat backend
    pub provider: Arc<dyn ChatProvider>,
    /// Image generation backend
    pub image_provider: Arc<dyn ImageProvider>,
}

impl AppState {
    /// Creates a new AppState from already-built parts.
    pub fn new(
        responses: Arc<TtlCache<ChatResponse>>,
        images: Arc<TtlCache<String>>,
        provider: Arc<dyn ChatProvider>,
        image_provider: Arc<dyn ImageProvider>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            chat: RetryableInvoker::new(responses, policy),
            images: RetryableInvoker::new(images, policy),
            provider,
            image_provider,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Must run inside a tokio runtime so the sweep tasks can start.
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn ChatProvider>,
        image_provider: Arc<dyn ImageProvider>,
    ) -> Self {
        let responses = Arc::new(TtlCache::new(
            RESPONSES_CACHE,
            config.response_cache_ttl(),
            config.sweep_interval(),
        ));
        let images = Arc::new(TtlCache::new(
            IMAGES_CACHE,
            config.image_cache_ttl(),
            config.sweep_interval(),
        ));
        Self::new(
            responses,
            images,
            provider,
            image_provider,
            config.retry_policy(),
        )
    }

    /// Snapshots every registered cache.
    pub async fn cache_stats(&self) -> Vec<NamedCacheStats> {
        vec![
            NamedCacheStats::new(RESPONSES_CACHE, self.chat.cache_stats().await),
            NamedCacheStats::new(IMAGES_CACHE, self.images.cache_stats().await),
        ]
    }

    /// Clears one key, or the whole cache, in the cache named `name`.
    pub async fn clear_cache(&self, name: &str, key: Option<&str>) -> Result<usize> {
        let removed = match name {
            RESPONSES_CACHE => self.chat.clear_cache(key).await,
            IMAGES_CACHE => self.images.clear_cache(key).await,
            other => return Err(ApiError::UnknownCache(other.to_string())),
        };
        info!(cache = name, key = ?key, removed, "Cache cleared via API");
        Ok(removed)
    }

    /// Stops every sweep task and empties every cache.
    pub async fn destroy(&self) {
        self.chat.cache().destroy().await;
        self.images.cache().destroy().await;
    }
}

/// Builds per-call invoke options from the request flags.
fn invoke_options(no_cache: bool, cache_key: Option<&String>) -> InvokeOptions {
    let mut options = InvokeOptions::new();
    if no_cache {
        options = options.without_cache();
    }
    if let Some(key) = cache_key {
        options = options.with_cache_key(key.clone());
    }
    options
}

/// Handler for POST /chat
///
/// Runs the conversation through the response cache and the LLM.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<InvokeResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let options = invoke_options(req.no_cache, req.cache_key.as_ref());
    let provider = state.provider.clone();
    let result = state
        .chat
        .invoke(&req, || provider.complete(&req), options)
        .await?;

    Ok(Json(result))
}

/// Handler for POST /images
///
/// Generates an image through the image cache, returning its URL.
pub async fn image_handler(
    State(state): State<AppState>,
    Json(req): Json<ImageRequest>,
) -> Result<Json<ImageInvokeResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let options = invoke_options(req.no_cache, req.cache_key.as_ref());
    let provider = state.image_provider.clone();
    let result = state
        .images
        .invoke(&req, || provider.generate_image(&req), options)
        .await?;

    Ok(Json(result))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse::new(state.cache_stats().await))
}

/// Handler for DELETE /cache/:name
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ClearResponse>> {
    let removed = state.clear_cache(&name, None).await?;
    Ok(Json(ClearResponse::new(name, None, removed)))
}

/// Handler for DELETE /cache/:name/:key
pub async fn clear_key_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<ClearResponse>> {
    let removed = state.clear_cache(&name, Some(&key)).await?;
    Ok(Json(ClearResponse::new(name, Some(key), removed)))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
