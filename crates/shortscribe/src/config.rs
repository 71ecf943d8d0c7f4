//! Configuration management for shortscribe.
//!
//! Non-secret settings come from an optional TOML file with sensible defaults.
//! Secrets only ever come from the environment and are read once at startup.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "shortscribe.toml";

const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
const DEFAULT_WEBHOOK_PATH: &str = "/webhook";
const HEALTH_PATH: &str = "/health";
const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_BITLY_BASE_URL: &str = "https://api-ssl.bitly.com";
const DEFAULT_BITLY_DOMAIN: &str = "bit.ly";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_AUDIO_MODEL: &str = "whisper-1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Inbound HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "0.0.0.0:8080".
    pub listen: String,
    /// Path Telegram posts updates to.
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .trim()
            .parse()
            .with_context(|| format!("Invalid listen address '{}'", self.listen))
    }

    /// Route path for the webhook, checked before it reaches the router.
    ///
    /// # Errors
    /// Fails if the path is blank, lacks a leading `/` or shadows `/health`.
    pub fn webhook_path(&self) -> Result<&str> {
        let path = self.webhook_path.trim();
        if path.is_empty() {
            bail!("server.webhook_path must not be empty");
        }
        if !path.starts_with('/') {
            bail!("Invalid webhook path '{path}': must start with '/'");
        }
        if path == HEALTH_PATH {
            bail!("Invalid webhook path '{path}': reserved for the health check");
        }
        Ok(path)
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub base_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TELEGRAM_BASE_URL.to_string(),
        }
    }
}

/// Bitly settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BitlyConfig {
    pub base_url: String,
    /// Branded short domain, "bit.ly" unless the account owns another one.
    pub domain: String,
}

impl Default for BitlyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BITLY_BASE_URL.to_string(),
            domain: DEFAULT_BITLY_DOMAIN.to_string(),
        }
    }
}

/// Transcription configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub base_url: String,
    /// Model to use for transcription
    pub model: String,
    /// Language hint (ISO 639-1 code like "en", "pt", etc.)
    pub language: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_AUDIO_MODEL.to_string(),
            language: None,
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (0 disables)
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub bitly: BitlyConfig,
    pub transcription: TranscriptionConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Applies base URL overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = read("TELEGRAM_API_BASE_URL") {
            self.telegram.base_url = url;
        }
        if let Some(url) = read("BITLY_BASE_URL") {
            self.bitly.base_url = url;
        }
        if let Some(url) = read("OPENAI_BASE_URL") {
            self.transcription.base_url = url;
        }
    }
}

/// API secrets for the three upstream services.
#[derive(Clone)]
pub struct Credentials {
    pub telegram_token: String,
    pub bitly_token: String,
    pub openai_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("telegram_token", &"<redacted>")
            .field("bitly_token", &"<redacted>")
            .field("openai_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
    pub const BITLY_TOKEN: &str = "BITLY_ACCESS_TOKEN";
    pub const OPENAI_KEY: &str = "OPENAI_KEY";

    /// Reads all secrets from the environment.
    ///
    /// # Errors
    /// Fails if any secret is unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let missing: Vec<&str> = [Self::TELEGRAM_TOKEN, Self::BITLY_TOKEN, Self::OPENAI_KEY]
            .into_iter()
            .filter(|key| secret(*key).is_none())
            .collect();
        if !missing.is_empty() {
            bail!("Missing required environment variables: {}", missing.join(", "));
        }

        Ok(Self {
            telegram_token: secret(Self::TELEGRAM_TOKEN).unwrap_or_default(),
            bitly_token: secret(Self::BITLY_TOKEN).unwrap_or_default(),
            openai_key: secret(Self::OPENAI_KEY).unwrap_or_default(),
        })
    }
}
