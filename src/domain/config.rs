//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defines the structs for the Matrix login, bot behaviour, sessions, pagination and API keys.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub apis: ApisConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Configuration for various connected services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub matrix: MatrixConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub username: String,
    pub password: String,
    pub homeserver: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Command-surface settings.
#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// User ids allowed to run owner-only commands.
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub links: LinksConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            owners: Vec::new(),
            links: LinksConfig::default(),
        }
    }
}

fn default_prefix() -> String {
    "_".to_string()
}

/// URLs shown by `info` and `invite`.
#[derive(Debug, Deserialize, Clone)]
pub struct LinksConfig {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_creator")]
    pub creator: String,
    #[serde(default = "default_invite")]
    pub invite: String,
    #[serde(default = "default_commands")]
    pub commands: String,
    #[serde(default = "default_support")]
    pub support: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            creator: default_creator(),
            invite: default_invite(),
            commands: default_commands(),
            support: default_support(),
        }
    }
}

fn default_source() -> String {
    "https://github.com/opensourze/1bot".to_string()
}
fn default_creator() -> String {
    "https://github.com/opensourze".to_string()
}
fn default_invite() -> String {
    "https://dsc.gg/1bot".to_string()
}
fn default_commands() -> String {
    "https://1bot.netlify.app/commands".to_string()
}
fn default_support() -> String {
    "https://discord.gg/4yA6XkfnwR".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// How long a wizard waits for each reply.
    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,
    /// Reply that aborts any running wizard.
    #[serde(default = "default_cancel_token")]
    pub cancel_token: String,
}

impl SessionConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: default_step_timeout(),
            cancel_token: default_cancel_token(),
        }
    }
}

fn default_step_timeout() -> u64 {
    60
}
fn default_cancel_token() -> String {
    "cancel".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// `None` keeps navigation live until the process stops.
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
}

impl PaginationConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            idle_timeout_secs: None,
        }
    }
}

fn default_chunk_size() -> usize {
    2000
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ApisConfig {
    #[serde(default)]
    pub weather: ApiKeyConfig,
    #[serde(default)]
    pub github: ApiKeyConfig,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ApiKeyConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>, // e.g. "OWM_KEY"
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ApiKeyConfig {
    /// The literal key wins over the environment variable.
    pub fn resolve_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }
}
