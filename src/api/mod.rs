//! API Module
//!
//! HTTP handlers and routing for the chat service.
//!
//! # Endpoints
//! - `POST /chat` - Answer a conversation through the response cache
//! - `POST /images` - Generate an image through the image cache
//! - `GET /cache/stats` - Get statistics for every cache
//! - `DELETE /cache/:name` - Clear a cache
//! - `DELETE /cache/:name/:key` - Remove one cached entry
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
