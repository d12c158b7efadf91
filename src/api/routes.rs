//! API Routes
//!
//! Configures the Axum router with the chat, image and cache admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, chat_handler, clear_cache_handler, clear_key_handler, health_handler,
    image_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /chat` - Answer a conversation, cache-first
/// - `POST /images` - Generate an image, cache-first
/// - `GET /cache/stats` - Snapshot of every cache
/// - `DELETE /cache/:name` - Clear one cache
/// - `DELETE /cache/:name/:key` - Remove one key from a cache
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (the admin dashboard is served separately)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/images", post(image_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/:name", delete(clear_cache_handler))
        .route("/cache/:name/:key", delete(clear_key_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
