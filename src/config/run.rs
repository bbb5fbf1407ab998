//! Effective settings for one LLM call.

use serde_json::{Map, Value, json};
use std::time::Duration;

use super::{ConfigError, ConfigFile};
use crate::llm::{ChatMessage, ChatRequest, Credentials, SamplingParams};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 3000;

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub temperature: Option<f64>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Name sent to the API
    pub model_name: String,
    pub api_key: String,
    pub api_base: String,
    pub temperature: Option<f64>,
    pub timeout: Duration,
    pub seed: Option<i64>,
    pub max_tokens: Option<u32>,
    pub reasoning_effort: Option<String>,
    pub reasoning_max_tokens: Option<u32>,
    pub reasoning_exclude: bool,
    pub extra_body: Map<String, Value>,
}

impl RunConfig {
    /// Resolve against the process environment.
    pub fn resolve(cfg: &ConfigFile, overrides: &RunOverrides) -> Result<Self, ConfigError> {
        Self::resolve_with_env(cfg, overrides, |key| {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        })
    }

    /// Resolve with an explicit environment lookup.
    ///
    /// Precedence: command line, then environment, then config file, then
    /// built-in defaults.
    pub fn resolve_with_env(
        cfg: &ConfigFile,
        overrides: &RunOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let key = overrides
            .model
            .clone()
            .or_else(|| (!cfg.default.is_empty()).then(|| cfg.default.clone()))
            .or_else(|| env("OPENAI_API_MODEL"))
            .or_else(|| env("GROQ_API_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let model = cfg.resolve_model(&key)?;

        let api_key = overrides
            .api_key
            .clone()
            .or_else(|| env("OPENAI_API_KEY"))
            .or(model.api_key)
            .unwrap_or_default();

        let api_base = overrides
            .api_base
            .clone()
            .or_else(|| env("OPENAI_API_BASE"))
            .or(model.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = overrides
            .timeout_secs
            .or(model.timeout)
            .or(cfg.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            model_name: model.model.unwrap_or(key),
            api_key,
            api_base,
            temperature: overrides.temperature.or(model.temperature),
            timeout: Duration::from_secs(timeout_secs),
            seed: model.seed,
            max_tokens: model.max_tokens,
            reasoning_effort: model.reasoning_effort,
            reasoning_max_tokens: model.reasoning_max_tokens,
            reasoning_exclude: model.reasoning_exclude.unwrap_or(false),
            extra_body: model.extra_body,
        })
    }

    /// `reasoning` request object, if any reasoning setting is active.
    pub fn reasoning(&self) -> Option<Value> {
        let mut reasoning = match (&self.reasoning_effort, self.reasoning_max_tokens) {
            (Some(effort), _) if !effort.is_empty() && effort != "none" => {
                json!({ "effort": effort })
            }
            (_, Some(max)) if max > 0 => json!({ "max_tokens": max }),
            _ => return None,
        };
        if self.reasoning_exclude {
            reasoning["exclude"] = json!(true);
        }
        Some(reasoning)
    }

    /// Extra body fields for the request: `extra_body` plus reasoning.
    pub fn extra_params(&self) -> Map<String, Value> {
        let mut extra = self.extra_body.clone();
        if let Some(reasoning) = self.reasoning() {
            extra.insert("reasoning".to_string(), reasoning);
        }
        extra
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
        }
    }

    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            seed: self.seed,
            max_tokens: self.max_tokens,
        }
    }

    /// Build a streamed chat request for `messages`.
    pub fn chat_request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.model_name.clone(),
            messages,
            sampling: self.sampling(),
            credentials: self.credentials(),
            extra: self.extra_params(),
            timeout: self.timeout,
        }
    }
}
