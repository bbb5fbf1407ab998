//! Streaming chat-completion client for OpenAI-compatible endpoints.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::time::Duration;

use super::stream::SseStream;
use super::types::{ChatRequest, StreamEvent};

/// Stream of completion events.
pub type ChatStream = Box<dyn Iterator<Item = Result<StreamEvent>> + Send>;

/// Anything that can stream a chat completion.
pub trait ChatClient: Send + Sync {
    fn stream_chat(&self, request: &ChatRequest) -> Result<ChatStream>;
}

/// HTTP client speaking the `/chat/completions` SSE protocol.
#[derive(Clone)]
pub struct OpenAiClient {
    client: ureq::Agent,
}

impl OpenAiClient {
    pub fn new() -> Self {
        let client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .build();
        Self { client }
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatClient for OpenAiClient {
    fn stream_chat(&self, request: &ChatRequest) -> Result<ChatStream> {
        let url = chat_url(&request.credentials.api_base);
        let body = request_body(request);
        tracing::debug!("POST {} (model {})", url, request.model);

        let response = self
            .client
            .post(&url)
            .set("Authorization", &format!("Bearer {}", request.credentials.api_key))
            .set("Content-Type", "application/json")
            .set("Accept", "text/event-stream")
            .timeout(request.timeout)
            .send_json(body);

        match response {
            Ok(response) => Ok(Box::new(SseStream::new(response.into_reader()))),
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                anyhow::bail!("API error (status {}): {}", code, body.trim())
            }
            Err(e) => Err(e).context("Failed to reach chat completion endpoint"),
        }
    }
}

/// `{api_base}/chat/completions`, tolerating a trailing slash on the base.
pub fn chat_url(api_base: &str) -> String {
    format!("{}/chat/completions", api_base.trim_end_matches('/'))
}

/// Standard request fields with `extra` merged on top.
pub fn request_body(request: &ChatRequest) -> Value {
    let mut body = json!({
        "model": request.model,
        "messages": request.messages,
        "stream": true,
    });

    if let Value::Object(map) = &mut body {
        if let Some(temperature) = request.sampling.temperature {
            map.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(seed) = request.sampling.seed {
            map.insert("seed".to_string(), json!(seed));
        }
        if let Some(max_tokens) = request.sampling.max_tokens {
            map.insert("max_tokens".to_string(), json!(max_tokens));
        }
        for (key, value) in &request.extra {
            map.insert(key.clone(), value.clone());
        }
    }

    body
}
