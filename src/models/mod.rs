//! Request and Response models for the chat API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ChatRequest, ImageRequest, Message, MessageContent};
pub use responses::{
    CacheStatsResponse, ChatResponse, ClearResponse, ErrorResponse, HealthResponse,
    ImageInvokeResponse, InvokeResponse, NamedCacheStats,
};
