//! Runtime configuration for codemod sessions.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (applied by the binary)
//! 2. Environment variables (`CODEMOD_AI_MODEL`, ...)
//! 3. Optional TOML file
//! 4. Built-in defaults
//!
//! The resolved value is passed into the correction loop explicitly.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use codemod_oracles::ToolchainConfig;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_TEMPERATURE: f64 = 0.1;
const DEFAULT_SEED: u64 = 42;
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_TOKENS: u64 = 4_096;
const DEFAULT_MAX_CORRECTION_ATTEMPTS: u32 = 2;

const ENV_BASE_URL: &str = "CODEMOD_AI_BASE_URL";
const ENV_API_KEY: &str = "CODEMOD_AI_API_KEY";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_MODEL: &str = "CODEMOD_AI_MODEL";
const ENV_MODEL_TIMEOUT: &str = "CODEMOD_AI_TIMEOUT_SECS";
const ENV_TSC_BIN: &str = "CODEMOD_TSC_BIN";
const ENV_JSCODESHIFT_BIN: &str = "CODEMOD_JSCODESHIFT_BIN";
const ENV_SCRATCH_DIR: &str = "CODEMOD_SCRATCH_DIR";

/// Supported transform-engine families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Jscodeshift,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jscodeshift => write!(f, "jscodeshift"),
        }
    }
}

/// OpenAI-compatible completion endpoint and sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    /// Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    /// Fixed low temperature for reproducible drafts.
    pub temperature: f64,
    /// Fixed seed sent with every request.
    pub seed: u64,
    /// Upper bound for one completion request.
    pub timeout_secs: u64,
    pub max_tokens: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            seed: DEFAULT_SEED,
            timeout_secs: DEFAULT_MODEL_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration for one or more sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodemodConfig {
    /// Correction rounds allowed after the draft.
    pub max_correction_attempts: u32,
    pub engine: EngineKind,
    pub model: ModelConfig,
    pub toolchain: ToolchainConfig,
}

impl Default for CodemodConfig {
    fn default() -> Self {
        Self {
            max_correction_attempts: DEFAULT_MAX_CORRECTION_ATTEMPTS,
            engine: EngineKind::default(),
            model: ModelConfig::default(),
            toolchain: ToolchainConfig::default(),
        }
    }
}

impl CodemodConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// TOML file overlaid with environment variables.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = env::var(ENV_BASE_URL) {
            self.model.base_url = url;
        }
        if let Some(key) = env::var(ENV_API_KEY)
            .ok()
            .or_else(|| env::var(ENV_OPENAI_API_KEY).ok())
        {
            self.model.api_key = key;
        }
        if let Ok(model) = env::var(ENV_MODEL) {
            self.model.model = model;
        }
        if let Some(secs) = env::var(ENV_MODEL_TIMEOUT)
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            self.model.timeout_secs = secs;
        }
        if let Ok(bin) = env::var(ENV_TSC_BIN) {
            self.toolchain.tsc_bin = bin;
        }
        if let Ok(bin) = env::var(ENV_JSCODESHIFT_BIN) {
            self.toolchain.jscodeshift_bin = bin;
        }
        if let Ok(dir) = env::var(ENV_SCRATCH_DIR) {
            self.toolchain.scratch_dir = Some(PathBuf::from(dir));
        }
    }

    /// Validate; return an error string if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.model.trim().is_empty() {
            return Err("model name must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(format!(
                "temperature must be in [0, 2], got {}",
                self.model.temperature
            ));
        }
        if self.model.timeout_secs == 0 {
            return Err("model timeout must be > 0".to_string());
        }
        if self.toolchain.tool_timeout_secs == 0 {
            return Err("tool timeout must be > 0".to_string());
        }
        Ok(())
    }
}

/// Check if a completion endpoint is reachable (GET /models).
pub async fn check_endpoint(base_url: &str) -> bool {
    let models_url = format!("{}/models", base_url.trim_end_matches('/'));
    match reqwest::Client::new()
        .get(&models_url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        Ok(resp) => resp.status().is_success() || resp.status().as_u16() == 401,
        Err(_) => false,
    }
}
