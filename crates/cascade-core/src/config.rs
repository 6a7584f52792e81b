//! Configuration — TOML file plus environment, resolved once at startup
//!
//! The file describes the fallback chain in priority order. Credentials and
//! model overrides are usually named by environment variable rather than
//! written inline; [`CascadeConfig::resolve`] turns the file into immutable
//! [`ProviderSpec`]s using an injected lookup, so nothing past startup reads
//! process state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::providers::{ProviderKind, ProviderSpec};

/// Message shown to end users when every provider failed; set
/// `gateway.failure_message` to localize it
pub const DEFAULT_FAILURE_MESSAGE: &str =
    "Sorry, none of the AI providers could answer right now. Please try again later.";

/// Top-level configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Fallback chain in priority order. Omitting the key uses the built-in presets.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

/// HTTP boundary settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
}

/// One `[[providers]]` entry
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    /// May contain `{model}`
    pub endpoint: String,
    pub model: String,
    /// Environment variable that overrides `model` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_env: Option<String>,
    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Inline API key; wins over `api_key_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_failure_message() -> String {
    DEFAULT_FAILURE_MESSAGE.to_string()
}
fn default_timeout_secs() -> u64 {
    12
}
fn default_temperature() -> f64 {
    0.3
}
fn default_enabled() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            failure_message: default_failure_message(),
        }
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            providers: default_providers(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("model_env", &self.model_env)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

// ── Built-in presets ────────────────────────────────────────────

struct Preset {
    name: &'static str,
    kind: ProviderKind,
    endpoint: &'static str,
    model: &'static str,
    model_env: &'static str,
    api_key_env: &'static str,
    timeout_secs: u64,
    max_tokens: Option<u32>,
    system_prompt: Option<&'static str>,
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "OpenRouter",
        kind: ProviderKind::ChatCompletion,
        endpoint: "https://openrouter.ai/api/v1/chat/completions",
        model: "mistral/mixtral-8x7b-instruct",
        model_env: "OPENROUTER_MODEL",
        api_key_env: "OPENROUTER_API_KEY",
        timeout_secs: 12,
        max_tokens: Some(512),
        system_prompt: Some("You are a helpful assistant."),
    },
    Preset {
        name: "DeepInfra",
        kind: ProviderKind::TextGeneration,
        endpoint: "https://api.deepinfra.com/v1/inference/{model}",
        model: "mixtral-8x7b-instruct",
        model_env: "DEEPINFRA_MODEL",
        api_key_env: "DEEPINFRA_API_KEY",
        timeout_secs: 12,
        max_tokens: Some(512),
        system_prompt: None,
    },
    Preset {
        name: "HuggingFace",
        kind: ProviderKind::TextGeneration,
        endpoint: "https://api-inference.huggingface.co/models/{model}",
        model: "mistralai/Mistral-7B-Instruct-v0.2",
        model_env: "HF_MODEL",
        api_key_env: "HF_API_KEY",
        timeout_secs: 20,
        max_tokens: Some(256),
        system_prompt: None,
    },
    Preset {
        name: "Groq",
        kind: ProviderKind::ChatCompletion,
        endpoint: "https://api.groq.com/openai/v1/chat/completions",
        model: "llama3-70b-8192",
        model_env: "GROQ_MODEL",
        api_key_env: "GROQ_API_KEY",
        timeout_secs: 12,
        max_tokens: None,
        system_prompt: None,
    },
    Preset {
        name: "Gemini",
        kind: ProviderKind::Gemini,
        endpoint: "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent",
        model: "gemini-2.5-flash",
        model_env: "GEMINI_MODEL",
        api_key_env: "GOOGLE_API_KEY",
        timeout_secs: 20,
        max_tokens: Some(512),
        system_prompt: None,
    },
];

fn default_providers() -> Vec<ProviderConfig> {
    PRESETS
        .iter()
        .map(|p| ProviderConfig {
            name: p.name.to_string(),
            kind: p.kind,
            endpoint: p.endpoint.to_string(),
            model: p.model.to_string(),
            model_env: Some(p.model_env.to_string()),
            api_key_env: Some(p.api_key_env.to_string()),
            api_key: None,
            timeout_secs: p.timeout_secs,
            temperature: default_temperature(),
            max_tokens: p.max_tokens,
            system_prompt: p.system_prompt.map(str::to_string),
            enabled: true,
        })
        .collect()
}

// ── Loading ─────────────────────────────────────────────────────

impl CascadeConfig {
    /// `~/.cascade/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".cascade").join("config.toml"))
    }

    /// Load and validate a config file. A missing file yields the presets.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using built-in providers", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML, with a short header
    pub fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self).context("Failed to serialize config")?;
        Ok(format!(
            "# cascade configuration\n\
             # Providers are tried top to bottom. A provider whose API key is not set\n\
             # is skipped without any network call.\n\n{body}"
        ))
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                bail!("Provider names must not be empty");
            }
            if !seen.insert(provider.name.as_str()) {
                bail!("Duplicate provider name '{}'", provider.name);
            }
            if provider.timeout_secs == 0 {
                bail!("Provider '{}' must have a positive timeout_secs", provider.name);
            }
            if !provider.temperature.is_finite() {
                bail!("Provider '{}' has an invalid temperature", provider.name);
            }

            let endpoint = provider.endpoint.replace("{model}", &provider.model);
            let url = url::Url::parse(&endpoint).with_context(|| {
                format!("Provider '{}' has an invalid endpoint", provider.name)
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!(
                    "Provider '{}' endpoint must use http or https, got '{}'",
                    provider.name,
                    url.scheme()
                );
            }
        }
        if self.gateway.failure_message.trim().is_empty() {
            bail!("gateway.failure_message must not be empty");
        }
        Ok(())
    }

    /// Resolve enabled providers into specs, reading variables through `lookup`.
    ///
    /// Blank values count as unset. Disabled providers are dropped; providers
    /// without a credential stay in the chain and will be skipped.
    pub fn resolve<F>(&self, lookup: F) -> Vec<ProviderSpec>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup_non_blank =
            |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        self.providers
            .iter()
            .filter(|p| p.enabled)
            .map(|p| {
                let credential = p
                    .api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty())
                    .or_else(|| p.api_key_env.as_deref().and_then(&lookup_non_blank));
                let model = p
                    .model_env
                    .as_deref()
                    .and_then(&lookup_non_blank)
                    .unwrap_or_else(|| p.model.clone());

                ProviderSpec {
                    name: p.name.clone(),
                    kind: p.kind,
                    endpoint: p.endpoint.clone(),
                    model,
                    credential,
                    timeout: Duration::from_secs(p.timeout_secs),
                    temperature: p.temperature,
                    max_tokens: p.max_tokens,
                    system_prompt: p.system_prompt.clone(),
                }
            })
            .collect()
    }

    /// [`Self::resolve`] against the process environment
    pub fn resolve_from_env(&self) -> Vec<ProviderSpec> {
        self.resolve(|name| std::env::var(name).ok())
    }
}
