//! Request DTOs for the chat API
//!
//! Defines the structure of incoming HTTP request bodies and the cacheable
//! chat request passed to the LLM.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::key::key_part;
use crate::cache::CacheKeyParts;
use crate::error::KeyError;

/// Roles accepted in a conversation.
pub const MESSAGE_ROLES: &[&str] = &["system", "user", "assistant", "tool"];

/// Content of a single message: plain text, or structured parts
/// (text and image references) passed through to the LLM untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<Value>),
}

impl MessageContent {
    fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.trim().is_empty(),
            MessageContent::Parts(parts) => parts.is_empty(),
        }
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// Request body for POST /chat
///
/// # Fields
/// - `messages`: Conversation so far, oldest first
/// - `response_format`: Optional response-format descriptor forwarded to the LLM
/// - `output_schema`: Optional JSON schema the answer must follow
/// - `cache_key`: Optional explicit cache key
/// - `no_cache`: Bypass the response cache for this call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    #[serde(default)]
    pub no_cache: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.messages.is_empty() {
            return Some("At least one message is required".to_string());
        }
        for (i, message) in self.messages.iter().enumerate() {
            if !MESSAGE_ROLES.contains(&message.role.as_str()) {
                return Some(format!("Message {} has unknown role '{}'", i, message.role));
            }
            if message.content.is_empty() {
                return Some(format!("Message {} has empty content", i));
            }
        }
        if matches!(&self.cache_key, Some(key) if key.is_empty()) {
            return Some("Cache key cannot be empty".to_string());
        }
        None
    }
}

impl CacheKeyParts for ChatRequest {
    /// Only the fields that shape the LLM answer; `cache_key` and `no_cache`
    /// are call options.
    fn key_parts(&self) -> Result<Vec<Value>, KeyError> {
        Ok(vec![
            key_part(&self.messages)?,
            key_part(&self.response_format)?,
            key_part(&self.output_schema)?,
        ])
    }
}

/// Image sizes accepted by the image generation endpoint.
pub const IMAGE_SIZES: &[&str] = &["256x256", "512x512", "1024x1024", "1792x1024", "1024x1792"];

/// Request body for POST /images
///
/// # Fields
/// - `prompt`: Description of the image to generate
/// - `size`: Optional size, one of [`IMAGE_SIZES`]
/// - `cache_key`: Optional explicit cache key
/// - `no_cache`: Bypass the image cache for this call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    #[serde(default)]
    pub no_cache: bool,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.prompt.trim().is_empty() {
            return Some("Prompt cannot be empty".to_string());
        }
        if let Some(size) = &self.size {
            if !IMAGE_SIZES.contains(&size.as_str()) {
                return Some(format!("Unsupported image size '{}'", size));
            }
        }
        if matches!(&self.cache_key, Some(key) if key.is_empty()) {
            return Some("Cache key cannot be empty".to_string());
        }
        None
    }
}

impl CacheKeyParts for ImageRequest {
    fn key_parts(&self) -> Result<Vec<Value>, KeyError> {
        Ok(vec![key_part(&self.prompt)?, key_part(&self.size)?])
    }
}
