//! OpenAI-compatible chat completions and image generation client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{ChatProvider, ImageProvider, LlmError};
use crate::config::Config;
use crate::models::{ChatRequest, ChatResponse, ImageRequest};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const IMAGES_PATH: &str = "/v1/images/generations";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Client for any API speaking the `/v1/chat/completions` and
/// `/v1/images/generations` protocols.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    image_model: String,
}

impl OpenAiCompatClient {
    /// Creates a client with a per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Ok(Self::new(
            config.llm_api_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
            config.llm_timeout(),
        )?
        .with_image_model(config.llm_image_model.clone()))
    }

    /// Sets the model used for image generation.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POSTs `body` to `path` and returns the decoded JSON answer.
    ///
    /// Non-2xx answers become [`LlmError::Status`] carrying the body text.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, LlmError> {
        let mut builder = self
            .client
            .post(self.endpoint(path))
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Builds the request body.
    ///
    /// An explicit `response_format` wins; otherwise `output_schema` becomes a
    /// `json_schema` response format.
    fn build_body(&self, request: &ChatRequest) -> Value {
        let mut body = Map::new();
        body.insert("model".to_string(), json!(self.model));
        body.insert("messages".to_string(), json!(request.messages));

        let response_format = match (&request.response_format, &request.output_schema) {
            (Some(format), _) => Some(format.clone()),
            (None, Some(schema)) => Some(json!({
                "type": "json_schema",
                "json_schema": schema,
            })),
            (None, None) => None,
        };
        if let Some(format) = response_format {
            body.insert("response_format".to_string(), format);
        }

        Value::Object(body)
    }

    /// Pulls the first choice's text out of a completions response.
    fn extract_response(json: &Value) -> Result<ChatResponse, LlmError> {
        let content = &json["choices"][0]["message"]["content"];
        let text = match content {
            Value::String(text) => text.clone(),
            // Some backends return content as an array of text parts
            Value::Array(parts) => parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join(""),
            _ => {
                return Err(LlmError::Decode(
                    "response has no choices[0].message.content".to_string(),
                ))
            }
        };

        Ok(ChatResponse {
            text,
            model: json["model"].as_str().map(String::from),
        })
    }

    fn build_image_body(&self, request: &ImageRequest) -> Value {
        let mut body = Map::new();
        body.insert("model".to_string(), json!(self.image_model));
        body.insert("prompt".to_string(), json!(request.prompt));
        body.insert("n".to_string(), json!(1));
        if let Some(size) = &request.size {
            body.insert("size".to_string(), json!(size));
        }
        Value::Object(body)
    }

    /// Pulls the first image out of a generations response.
    ///
    /// Inline base64 images are returned as a `data:` URL.
    fn extract_image_url(json: &Value) -> Result<String, LlmError> {
        let image = &json["data"][0];
        if let Some(url) = image["url"].as_str() {
            return Ok(url.to_string());
        }
        if let Some(b64) = image["b64_json"].as_str() {
            return Ok(format!("data:image/png;base64,{}", b64));
        }
        Err(LlmError::Decode(
            "response has no data[0].url or data[0].b64_json".to_string(),
        ))
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = self.build_body(request);

        debug!(model = %self.model, messages = request.messages.len(), "LLM request");

        let json = self.post_json(COMPLETIONS_PATH, &body).await?;
        Self::extract_response(&json)
    }
}

#[async_trait]
impl ImageProvider for OpenAiCompatClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, LlmError> {
        let body = self.build_image_body(request);

        debug!(model = %self.image_model, size = ?request.size, "Image request");

        let json = self.post_json(IMAGES_PATH, &body).await?;
        Self::extract_image_url(&json)
    }
}
