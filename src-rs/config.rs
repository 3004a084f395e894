use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AnalyzerError;
use crate::llm::utils::serde_util::{
    deserialize_bool_lax, deserialize_f64_lax, deserialize_u32_lax, deserialize_u64_lax,
};

/// Per-provider request tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderTuning {
    #[serde(default = "default_temperature", deserialize_with = "deserialize_f64_lax")]
    pub temperature: f64,

    #[serde(
        default = "default_max_tokens",
        alias = "max_tokens",
        deserialize_with = "deserialize_u32_lax"
    )]
    pub max_tokens: u32,

    /// Upper bound for a single transport attempt
    #[serde(
        default = "default_timeout_ms",
        alias = "timeout",
        alias = "timeout_ms",
        deserialize_with = "deserialize_u64_lax"
    )]
    pub timeout_ms: u64,

    /// Extra attempts after the first one fails with a retryable error
    #[serde(
        default = "default_retry_attempts",
        alias = "retry_attempts",
        deserialize_with = "deserialize_u32_lax"
    )]
    pub retry_attempts: u32,
}

fn default_temperature() -> f64 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_attempts() -> u32 {
    3
}

impl Default for ProviderTuning {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl ProviderTuning {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Provider record as maintained by the settings UI
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Raw provider type ("openai", "claude", "custom"); resolved at dispatch
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,

    #[serde(default, alias = "api_key")]
    pub api_key: String,

    #[serde(default, alias = "base_url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub model: String,

    #[serde(default = "default_enabled", deserialize_with = "deserialize_bool_lax")]
    pub enabled: bool,

    #[serde(default, alias = "config")]
    pub tuning: ProviderTuning,
}

fn default_enabled() -> bool {
    true
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("enabled", &self.enabled)
            .field("tuning", &self.tuning)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: kind.into(),
            api_key: api_key.into(),
            base_url: None,
            model: model.into(),
            enabled: true,
            tuning: ProviderTuning::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_tuning(mut self, tuning: ProviderTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Base URL with blank values treated as absent
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Backoff settings shared by every provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_backoff_base_ms", deserialize_with = "deserialize_u64_lax")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_backoff_max_ms", deserialize_with = "deserialize_u64_lax")]
    pub backoff_max_ms: u64,
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    8_000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl DispatchConfig {
    /// No waiting between attempts
    pub fn immediate() -> Self {
        Self {
            backoff_base_ms: 0,
            backoff_max_ms: 0,
        }
    }
}

/// User or project override layer (restricted fields)
#[derive(Deserialize)]
pub struct UserOverrideConfig {
    pub providers: Option<Vec<ProviderConfig>>,
    #[serde(alias = "activeProvider", alias = "activeAIProvider")]
    pub active_provider: Option<String>,
}

/// Provider registry snapshot plus dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Id of the provider used by `analyze_active`
    #[serde(default)]
    pub active_provider: Option<String>,
}

impl AppConfig {
    /// Load configuration with layered strategy:
    /// 1. Defaults (Embedded Config.toml)
    /// 2. User Config (~/.semwrite/providers.json) - Only providers/active provider
    /// 3. Project Config (./.semwrite/providers.json) - Only providers/active provider
    pub fn load() -> Result<Self> {
        let mut layers: Vec<PathBuf> = Vec::new();
        if let Some(home) = dirs::home_dir() {
            layers.push(home.join(".semwrite").join("providers.json"));
        }
        layers.push(Path::new(".semwrite").join("providers.json"));
        Self::load_from(&layers)
    }

    /// Embedded defaults followed by the given JSON override layers, in order.
    pub fn load_from<P: AsRef<Path>>(layers: &[P]) -> Result<Self> {
        let default_str = include_str!("../Config.toml");
        let mut config = Self::from_toml_str(default_str)
            .context("Failed to parse embedded Config.toml")?;

        for layer in layers {
            Self::apply_patch(&mut config, layer);
        }

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Invalid configuration TOML")?;
        Ok(config)
    }

    pub(crate) fn apply_patch<P: AsRef<Path>>(config: &mut AppConfig, path: P) {
        let path = path.as_ref();
        if !path.exists() {
            return;
        }
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to read config patch at {}: {}", path.display(), e);
                return;
            }
        };

        match serde_json::from_str::<UserOverrideConfig>(&content) {
            Ok(patch) => {
                if let Some(providers) = patch.providers {
                    config.providers = merge_providers(std::mem::take(&mut config.providers), providers);
                }
                if let Some(active) = patch.active_provider {
                    let active = active.trim().to_string();
                    config.active_provider = if active.is_empty() { None } else { Some(active) };
                }
                log::debug!("Applied config patch from {}", path.display());
            }
            Err(e) => {
                log::warn!("Failed to parse config patch at {}: {}", path.display(), e);
            }
        }
    }

    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// The provider selected in the registry, if it exists and is enabled.
    pub fn active_provider(&self) -> Result<&ProviderConfig, AnalyzerError> {
        let id = self
            .active_provider
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AnalyzerError::Configuration("no active AI provider selected".to_string()))?;

        let provider = self.provider(id).ok_or_else(|| {
            AnalyzerError::Configuration(format!("active AI provider '{}' is not configured", id))
        })?;

        if !provider.enabled {
            return Err(AnalyzerError::Configuration(format!(
                "active AI provider '{}' is disabled",
                id
            )));
        }

        Ok(provider)
    }
}

/// Later records replace earlier ones with the same id; first-seen order is kept.
pub(crate) fn merge_providers(
    base: Vec<ProviderConfig>,
    overrides: Vec<ProviderConfig>,
) -> Vec<ProviderConfig> {
    let mut ordered_keys: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, ProviderConfig> = HashMap::new();

    for p in base.into_iter().chain(overrides) {
        if p.id.trim().is_empty() {
            continue;
        }
        if !by_key.contains_key(&p.id) {
            ordered_keys.push(p.id.clone());
        }
        by_key.insert(p.id.clone(), p);
    }

    ordered_keys
        .into_iter()
        .filter_map(|k| by_key.remove(&k))
        .collect()
}
