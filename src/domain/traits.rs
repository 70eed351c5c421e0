//! # Domain Traits
//!
//! Abstract interfaces for the chat platform and the third-party HTTP APIs.
//! Implementations live in the Infrastructure layer.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::types::{Embed, GuildSummary, LinkButton, Participant, Permission};

/// Abstract interface for a Chat Provider bound to one room/channel.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a plain message, returning its event id.
    async fn send_message(&self, content: &str) -> Result<String, String>;

    /// Send a rich embed with optional link buttons, returning its event id.
    async fn send_embed(&self, embed: &Embed, buttons: &[LinkButton]) -> Result<String, String>;

    /// Replace the content of a message previously sent by the bot.
    async fn edit_message(&self, message_id: &str, content: &str) -> Result<(), String>;

    /// Attach a reaction control to a message.
    async fn add_reaction(&self, message_id: &str, key: &str) -> Result<(), String>;

    /// Remove messages (bot prompts and user answers) from the room.
    async fn redact(&self, message_ids: &[String]) -> Result<(), String>;

    /// Resolve a mention token or raw identity to a member of this room.
    async fn resolve_member(&self, raw: &str) -> Result<Option<Participant>, String>;

    /// Role names held by a member of this room, highest first.
    async fn member_roles(&self, user_id: &str) -> Result<Vec<String>, String>;

    /// Whether `user_id` holds `permission` in this room.
    async fn has_permission(&self, user_id: &str, permission: Permission) -> Result<bool, String>;

    /// The bot's own identity.
    async fn own_identity(&self) -> Result<Participant, String>;

    /// Round-trip time of a lightweight call to the platform.
    async fn latency(&self) -> Result<Duration, String>;

    /// Details of the guild the room belongs to.
    async fn guild_summary(&self) -> Result<GuildSummary, String>;

    /// Number of guilds/rooms the bot has joined.
    fn joined_room_count(&self) -> usize;

    /// Get the current room ID
    fn room_id(&self) -> String;
}

/// Lookup result of an external API.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryHit {
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PypiPackage {
    pub name: String,
    pub package_url: String,
    pub summary: Option<String>,
    pub description: String,
    pub home_page: Option<String>,
    pub version: String,
    pub author: String,
    pub license: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpmPackage {
    pub name: String,
    pub description: String,
    pub homepage: Option<String>,
    pub author: Option<String>,
    pub repository: Option<String>,
    pub maintainers: Vec<String>,
    pub license: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub description: String,
    pub icon: String,
    pub temp_f: f64,
    pub humidity: i64,
    pub cloudiness: i64,
    pub wind_speed: f64,
    pub wind_deg: f64,
}

/// Abstract interface for the third-party HTTP APIs used by command handlers.
#[async_trait]
pub trait ApiProvider: Send + Sync {
    /// First repository matching `query`, if any.
    async fn search_repositories(&self, query: &str) -> Result<Lookup<RepositoryHit>, String>;

    async fn pypi_package(&self, name: &str) -> Result<Lookup<PypiPackage>, String>;

    async fn npm_package(&self, name: &str) -> Result<Lookup<NpmPackage>, String>;

    async fn current_weather(&self, query: &str) -> Result<Lookup<WeatherReport>, String>;
}
