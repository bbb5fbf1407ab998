//! LLM access used by the session engine.
//!
//! The engine only needs one capability: stream a chat completion. That is the
//! [`ChatClient`] trait; [`OpenAiClient`] implements it over HTTP for any
//! OpenAI-compatible endpoint.

mod client;
mod stream;
mod types;

pub use client::{ChatClient, ChatStream, OpenAiClient, chat_url, request_body};
pub use stream::SseStream;
pub use types::{ChatMessage, ChatRequest, Credentials, SamplingParams, StreamEvent};
