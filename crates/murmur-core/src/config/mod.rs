mod defaults;
mod persona;
mod prompts;

#[cfg(test)]
mod tests;

pub use persona::*;
pub use prompts::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::MurmurError;
use defaults::*;

/// Environment variable overriding `platform.bearer_token`.
pub const ENV_PLATFORM_TOKEN: &str = "MURMUR_PLATFORM_TOKEN";
/// Environment variable overriding `provider.api_key`.
pub const ENV_PROVIDER_API_KEY: &str = "MURMUR_PROVIDER_API_KEY";
/// Upper bound for `interactions.recency_window_hours` (one year).
pub const MAX_RECENCY_WINDOW_HOURS: i64 = 8760;

/// Top-level murmur configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub murmur: MurmurConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub interactions: InteractionsConfig,
    #[serde(default)]
    pub persona: Persona,
}

/// General agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MurmurConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for MurmurConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Social platform connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_platform_base_url")]
    pub base_url: String,
    /// User-context bearer token. Overridden by `MURMUR_PLATFORM_TOKEN`.
    #[serde(default)]
    pub bearer_token: String,
    /// Log replies instead of posting them. Each post is dry-run answered
    /// once; the audit log marks it done.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_platform_base_url(),
            bearer_token: String::new(),
            dry_run: false,
        }
    }
}

/// Generation provider (any OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Overridden by `MURMUR_PROVIDER_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    /// Model used for should-respond classification.
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used for reply generation.
    #[serde(default = "default_model_large")]
    pub model_large: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            api_key: String::new(),
            model: default_model(),
            model_large: default_model_large(),
        }
    }
}

/// Memory config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// How many past exchanges with an author are shown to the model.
    #[serde(default = "default_recent_interactions")]
    pub recent_interactions: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            recent_interactions: default_recent_interactions(),
        }
    }
}

/// How discovered candidates are ordered before processing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateOrder {
    /// Plain string order of the id. Matches numeric order only for ids of
    /// equal length.
    #[default]
    Lexicographic,
    /// Numeric order of the id.
    Numeric,
}

/// Interaction loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Wait between the end of one cycle and the start of the next.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Accounts whose posts are watched even without a mention.
    #[serde(default)]
    pub priority_authors: Vec<String>,
    #[serde(default = "default_mention_limit")]
    pub mention_limit: usize,
    #[serde(default = "default_author_limit")]
    pub author_limit: usize,
    #[serde(default = "default_recency_window_hours")]
    pub recency_window_hours: i64,
    /// Max parent posts fetched when rebuilding a thread.
    #[serde(default = "default_thread_depth")]
    pub thread_depth: usize,
    #[serde(default = "default_max_post_length")]
    pub max_post_length: usize,
    #[serde(default = "default_reply_delay_min_ms")]
    pub reply_delay_min_ms: u64,
    #[serde(default = "default_reply_delay_max_ms")]
    pub reply_delay_max_ms: u64,
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
    #[serde(default)]
    pub candidate_order: CandidateOrder,
}

impl Default for InteractionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval(),
            priority_authors: Vec::new(),
            mention_limit: default_mention_limit(),
            author_limit: default_author_limit(),
            recency_window_hours: default_recency_window_hours(),
            thread_depth: default_thread_depth(),
            max_post_length: default_max_post_length(),
            reply_delay_min_ms: default_reply_delay_min_ms(),
            reply_delay_max_ms: default_reply_delay_max_ms(),
            generation_timeout_secs: default_generation_timeout_secs(),
            candidate_order: CandidateOrder::default(),
        }
    }
}

impl InteractionsConfig {
    /// Priority handles without a leading `@`, empty entries dropped.
    pub fn priority_handles(&self) -> Vec<String> {
        self.priority_authors
            .iter()
            .map(|h| h.trim().trim_start_matches('@').to_string())
            .filter(|h| !h.is_empty())
            .collect()
    }
}

impl Config {
    /// Reject settings the interaction loop cannot run with.
    pub fn validate(&self) -> Result<(), MurmurError> {
        let i = &self.interactions;
        if i.poll_interval_secs == 0 {
            return Err(MurmurError::Config(
                "interactions.poll_interval_secs must be greater than 0".into(),
            ));
        }
        if i.max_post_length == 0 {
            return Err(MurmurError::Config(
                "interactions.max_post_length must be greater than 0".into(),
            ));
        }
        if i.reply_delay_min_ms > i.reply_delay_max_ms {
            return Err(MurmurError::Config(format!(
                "interactions.reply_delay_min_ms ({}) exceeds reply_delay_max_ms ({})",
                i.reply_delay_min_ms, i.reply_delay_max_ms
            )));
        }
        if i.recency_window_hours <= 0 || i.recency_window_hours > MAX_RECENCY_WINDOW_HOURS {
            return Err(MurmurError::Config(format!(
                "interactions.recency_window_hours must be between 1 and {MAX_RECENCY_WINDOW_HOURS}"
            )));
        }
        Ok(())
    }

    /// Apply secret overrides from the environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(token) = get(ENV_PLATFORM_TOKEN).filter(|v| !v.is_empty()) {
            self.platform.bearer_token = token;
        }
        if let Some(key) = get(ENV_PROVIDER_API_KEY).filter(|v| !v.is_empty()) {
            self.provider.api_key = key;
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file, then apply env overrides and validate.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, MurmurError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MurmurError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str::<Config>(&content)
            .map_err(|e| MurmurError::Config(format!("failed to parse config: {}", e)))?
    } else {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    config.apply_env();
    config.validate()?;
    Ok(config)
}
