//! Model access settings, read from the environment.
//!
//! | variable                  | default                        |
//! |---------------------------|--------------------------------|
//! | `OPENROUTER_API_KEY`      | required unless offline        |
//! | `LARDER_AI_MODEL`         | `openai/gpt-4o-mini`           |
//! | `LARDER_AI_VISION_MODEL`  | `openai/gpt-4o`                |
//! | `LARDER_AI_BASE_URL`      | `https://openrouter.ai/api/v1` |
//! | `LARDER_AI_CACHE_DIR`     | `~/.larder/ai-cache`           |
//! | `LARDER_AI_OFFLINE`       | `false`                        |
//! | `LARDER_AI_RATE_LIMIT_MS` | `500`                          |

use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_VISION_MODEL: &str = "openai/gpt-4o";
pub const DEFAULT_RATE_LIMIT_MS: u64 = 500;

const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Empty in offline mode when no key is set.
    pub api_key: String,
    /// Used for text and page extraction.
    pub model: String,
    /// Used whenever a request carries images.
    pub vision_model: String,
    pub base_url: String,
    pub cache_dir: PathBuf,
    /// Serve answers from the cache only.
    pub offline: bool,
    /// Minimum spacing between API calls.
    pub rate_limit_ms: u64,
}

impl AiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_offline(false)
    }

    /// `force_offline` wins over `LARDER_AI_OFFLINE`.
    pub fn from_env_with_offline(force_offline: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(force_offline, |name| env::var(name).ok())
    }

    fn from_lookup(
        force_offline: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.into());

        let offline = force_offline || lookup("LARDER_AI_OFFLINE").is_some_and(|v| is_truthy(&v));

        let api_key = match lookup(API_KEY_VAR) {
            Some(key) => key,
            None if offline => String::new(),
            None => return Err(ConfigError::MissingEnvVar(API_KEY_VAR.to_string())),
        };

        Ok(Self {
            api_key,
            model: or_default("LARDER_AI_MODEL", DEFAULT_MODEL),
            vision_model: or_default("LARDER_AI_VISION_MODEL", DEFAULT_VISION_MODEL),
            base_url: or_default("LARDER_AI_BASE_URL", DEFAULT_BASE_URL),
            cache_dir: lookup("LARDER_AI_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(Self::default_cache_dir),
            offline,
            rate_limit_ms: lookup("LARDER_AI_RATE_LIMIT_MS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_MS),
        })
    }

    /// `~/.larder/ai-cache`, or `data/ai-cache` without a home directory.
    pub fn default_cache_dir() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(".larder").join("ai-cache"),
            None => PathBuf::from("data").join("ai-cache"),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "True" | "yes")
}
