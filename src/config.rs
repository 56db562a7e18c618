use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the raw model reply is turned into a reaction emoji.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Look for a custom emoji reference, then a known emoji code point,
    /// then a non-ASCII first character.
    #[default]
    Strict,
    /// Take the first character of the reply and let the platform reject it.
    Permissive,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMode::Strict => write!(f, "strict"),
            ExtractionMode::Permissive => write!(f, "permissive"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required config: {0}")]
    MissingKey(&'static str),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub bot_token: String,
    pub openai_api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub tone_model: Option<String>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub whitelisted_channels: Vec<u64>,
    #[serde(default = "default_true")]
    pub ignore_bots: bool,
    #[serde(default = "default_true")]
    pub ignore_links_only: bool,
    #[serde(default = "default_true")]
    pub mention_only_filter: bool,
    #[serde(default = "default_true")]
    pub check_tone_appropriateness: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub client_id: Option<u64>,

    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub extraction_mode: ExtractionMode,
    /// Messages whose text minus URLs is shorter than this count as links-only.
    #[serde(default = "default_link_residue_min")]
    pub link_residue_min: usize,
    /// Substrings of a lowercased model id that mark it as image-capable.
    #[serde(default = "default_vision_model_indicators")]
    pub vision_model_indicators: Vec<String>,
    /// Forces image handling on or off regardless of the model id.
    #[serde(default)]
    pub vision: Option<bool>,
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_tone_model() -> &'static str {
    "gpt-4o-mini"
}

fn default_system_prompt() -> String {
    "You react to chat messages with a single emoji. \
     Reply with exactly one emoji that fits the message and nothing else."
        .to_string()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_link_residue_min() -> usize {
    3
}

fn default_vision_model_indicators() -> Vec<String> {
    ["gpt-4", "gpt-4o", "gpt-4.1", "vision", "claude", "gemini"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_images() -> usize {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::MissingKey("bot_token"));
        }
        if self.openai_api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("openai_api_key"));
        }
        Ok(())
    }

    /// Model used for the tone gate; falls back to a cheap default.
    pub fn tone_model(&self) -> &str {
        self.tone_model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default_tone_model())
    }

    pub fn is_whitelisted(&self, channel_id: u64) -> bool {
        self.whitelisted_channels.contains(&channel_id)
    }

    pub fn supports_vision(&self) -> bool {
        self.vision.unwrap_or_else(|| {
            crate::pipeline::content::is_vision_model(&self.model, &self.vision_model_indicators)
        })
    }

    /// Maps the configured level name onto a `tracing` filter directive.
    pub fn log_filter(&self) -> &'static str {
        match self.log_level.trim().to_ascii_uppercase().as_str() {
            "TRACE" => "trace",
            "DEBUG" => "debug",
            "WARN" | "WARNING" => "warn",
            "ERROR" | "CRITICAL" | "FATAL" => "error",
            _ => "info",
        }
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn invite_url(&self) -> Option<String> {
        self.client_id.map(|id| {
            format!(
                "https://discord.com/oauth2/authorize?client_id={}&permissions=2048&scope=bot",
                id
            )
        })
    }
}
