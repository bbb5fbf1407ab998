//! Per-model configuration and `extend` inheritance.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::{ConfigError, ConfigFile};

/// Settings for one named model entry.
///
/// Every field is optional so an entry can `extend` another and override
/// only what differs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name sent to the API (defaults to the entry key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_exclude: Option<bool>,

    /// Extra request body fields, deep-merged along the `extend` chain
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra_body: Map<String, Value>,

    /// Name of the entry this one inherits from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend: Option<String>,

    /// Alternative names for this entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ModelConfig {
    /// Entry that only points at `parent`.
    pub fn extending(parent: impl Into<String>) -> Self {
        Self {
            extend: Some(parent.into()),
            ..Default::default()
        }
    }

    /// Layer `self` over `parent`: fields set here win.
    fn over(self, parent: ModelConfig) -> ModelConfig {
        ModelConfig {
            model: self.model.or(parent.model),
            api_base: self.api_base.or(parent.api_base),
            api_key: self.api_key.or(parent.api_key),
            temperature: self.temperature.or(parent.temperature),
            timeout: self.timeout.or(parent.timeout),
            seed: self.seed.or(parent.seed),
            max_tokens: self.max_tokens.or(parent.max_tokens),
            reasoning_effort: self.reasoning_effort.or(parent.reasoning_effort),
            reasoning_max_tokens: self.reasoning_max_tokens.or(parent.reasoning_max_tokens),
            reasoning_exclude: self.reasoning_exclude.or(parent.reasoning_exclude),
            extra_body: merge_maps(parent.extra_body, self.extra_body),
            extend: self.extend,
            aliases: self.aliases,
        }
    }
}

/// Recursive merge: nested objects merge, everything else in `overrides` wins.
pub fn merge_maps(base: Map<String, Value>, overrides: Map<String, Value>) -> Map<String, Value> {
    let mut result = base;
    for (key, value) in overrides {
        match (result.remove(&key), value) {
            (Some(Value::Object(base_obj)), Value::Object(override_obj)) => {
                result.insert(key, Value::Object(merge_maps(base_obj, override_obj)));
            }
            (_, value) => {
                result.insert(key, value);
            }
        }
    }
    result
}

impl ConfigFile {
    /// Resolve a model entry by following its `extend` chain.
    ///
    /// Unknown names resolve to an empty config so models that are not in the
    /// file can still be used directly.
    pub fn resolve_model(&self, name: &str) -> Result<ModelConfig, ConfigError> {
        if name.is_empty() || self.models.is_empty() {
            return Ok(ModelConfig::default());
        }
        self.resolve_model_rec(name, &mut HashSet::new())
    }

    fn resolve_model_rec(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
    ) -> Result<ModelConfig, ConfigError> {
        if !visited.insert(name.to_string()) {
            return Err(ConfigError::CircularExtend(name.to_string()));
        }

        let Some(entry) = self.models.get(name) else {
            return Ok(ModelConfig::default());
        };

        match entry.extend.as_deref() {
            Some(parent) if !parent.is_empty() => {
                let parent = self.resolve_model_rec(parent, visited)?;
                Ok(entry.clone().over(parent))
            }
            _ => Ok(entry.clone()),
        }
    }

    /// Turn every `aliases` entry into a model that extends its owner.
    ///
    /// Aliases that clash with a model name or with an earlier alias are
    /// ignored with a warning.
    pub fn expand_aliases(&mut self) {
        let mut names: Vec<&String> = self.models.keys().collect();
        names.sort();

        let mut expanded: Vec<(String, ModelConfig)> = Vec::new();
        for name in names {
            for alias in &self.models[name].aliases {
                if self.models.contains_key(alias) {
                    tracing::warn!(
                        "Alias '{}' defined in model '{}' clashes with an existing model, ignoring",
                        alias,
                        name
                    );
                    continue;
                }
                if expanded.iter().any(|(a, _)| a == alias) {
                    tracing::warn!("Duplicate alias '{}' in model '{}', ignoring", alias, name);
                    continue;
                }
                expanded.push((alias.clone(), ModelConfig::extending(name.clone())));
            }
        }

        self.models.extend(expanded);
    }
}
