//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `RESPONDER_LOG_LEVEL` and `RESPONDER_PROMPTS_DIR` env
//! overrides. The Gemini API key is sourced from the `GEMINI_API_KEY` env
//! var only — never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Gemini provider configuration. Populated from `[llm.gemini]` in the TOML.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL up to (not including) `/models/...`.
    pub api_base_url: String,
    /// Model name inserted into the `generateContent` path.
    pub model: String,
    /// Sampling temperature sent with every request.
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"gemini"` or `"dummy"`).
    /// Maps to `default` in `[llm]` TOML — named `default` there to signal
    /// that other provider sections can coexist without being loaded.
    pub provider: String,
    /// Config for the Gemini provider (`[llm.gemini]`).
    pub gemini: GeminiConfig,
}

/// Fully-resolved responder configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Directory holding prompt template files (already expanded, no `~`).
    pub prompts_dir: PathBuf,
    pub llm: LlmConfig,
    /// API key from `GEMINI_API_KEY` env var — `None` for the dummy provider.
    pub api_key: Option<String>,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    responder: RawResponder,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawResponder {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_prompts_dir")]
    prompts_dir: String,
}

impl Default for RawResponder {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prompts_dir: default_prompts_dir(),
        }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    gemini: RawGeminiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            gemini: RawGeminiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawGeminiConfig {
    #[serde(default = "default_gemini_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_gemini_model")]
    model: String,
    #[serde(default = "default_gemini_temperature")]
    temperature: f32,
    #[serde(default = "default_gemini_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawGeminiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_gemini_api_base_url(),
            model: default_gemini_model(),
            temperature: default_gemini_temperature(),
            timeout_seconds: default_gemini_timeout_seconds(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_prompts_dir() -> String { "config/prompts".to_string() }
fn default_llm_provider() -> String { "gemini".to_string() }
fn default_gemini_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_gemini_model() -> String { "gemini-flash-latest".to_string() }
fn default_gemini_temperature() -> f32 { 0.7 }
fn default_gemini_timeout_seconds() -> u64 { 60 }

/// Load config from `path`, then apply env-var overrides.
///
/// A missing file is not an error — all sections have defaults, so the
/// responder runs with a bare `GEMINI_API_KEY`. A file that exists but does
/// not parse is an error.
pub fn load(path: &Path) -> Result<Config, AppError> {
    let log_level_override = env::var("RESPONDER_LOG_LEVEL").ok();
    let prompts_dir_override = env::var("RESPONDER_PROMPTS_DIR").ok();
    load_from(
        path,
        log_level_override.as_deref(),
        prompts_dir_override.as_deref(),
    )
}

/// Internal loader — accepts explicit overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    log_level_override: Option<&str>,
    prompts_dir_override: Option<&str>,
) -> Result<Config, AppError> {
    let parsed: RawConfig = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => RawConfig::default(),
        Err(e) => {
            return Err(AppError::Config(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    let log_level = log_level_override
        .unwrap_or(&parsed.responder.log_level)
        .to_string();
    let prompts_dir = expand_home(prompts_dir_override.unwrap_or(&parsed.responder.prompts_dir));

    Ok(Config {
        log_level,
        prompts_dir,
        llm: LlmConfig {
            provider: parsed.llm.provider,
            gemini: GeminiConfig {
                api_base_url: parsed.llm.gemini.api_base_url,
                model: parsed.llm.gemini.model,
                temperature: parsed.llm.gemini.temperature,
                timeout_seconds: parsed.llm.gemini.timeout_seconds,
            },
        },
        api_key: env::var("GEMINI_API_KEY").ok(),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests — dummy LLM, no API key, no external calls.
#[cfg(test)]
impl Config {
    pub fn test_default() -> Self {
        Self {
            log_level: "info".into(),
            prompts_dir: PathBuf::from("config/prompts"),
            llm: LlmConfig {
                provider: "dummy".into(),
                gemini: GeminiConfig {
                    api_base_url: "http://localhost:0/v1beta".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            api_key: None,
        }
    }
}
