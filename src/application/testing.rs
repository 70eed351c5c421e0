//! Test doubles shared by the unit tests: a recording chat room, canned API
//! responses and a ready-made command context.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::context::{AppContext, CommandContext};
use crate::application::dispatcher::{DispatchOutcome, dispatch};
use crate::application::errors::CommandResult;
use crate::application::normalizer::{Invocation, normalize_text};
use crate::application::registry::CommandHandler;
use crate::domain::config::AppConfig;
use crate::domain::traits::{
    ApiProvider, ChatProvider, Lookup, NpmPackage, PypiPackage, RepositoryHit, WeatherReport,
};
use crate::domain::types::{Embed, GuildSummary, LinkButton, Origin, Participant, Permission};
use crate::interface::commands::build_registry;

pub const ROOM_ID: &str = "!room:example.org";
pub const DM_ID: &str = "!dm:example.org";
pub const BOT_ID: &str = "@stuffbot:example.org";
pub const OWNER_ID: &str = "@owner:example.org";

pub fn alice() -> Participant {
    Participant {
        avatar_url: Some("https://example.org/alice.png".into()),
        ..Participant::new("@alice:example.org", "alice")
    }
}

pub fn bob() -> Participant {
    Participant::new("@bob:example.org", "bob")
}

pub fn owner() -> Participant {
    Participant::new(OWNER_ID, "owner")
}

pub fn bot() -> Participant {
    Participant {
        is_bot: true,
        ..Participant::new(BOT_ID, "Stuffbot")
    }
}

pub fn room() -> Origin {
    Origin {
        channel_id: ROOM_ID.into(),
        guild_id: Some(ROOM_ID.into()),
    }
}

pub fn dm() -> Origin {
    Origin {
        channel_id: DM_ID.into(),
        guild_id: None,
    }
}

/// Everything the bot did to the room, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { id: String, content: String },
    Embed { id: String, embed: Embed, buttons: Vec<LinkButton> },
    Reaction { message_id: String, key: String },
    Edit { message_id: String, content: String },
    Redaction { ids: Vec<String> },
}

/// Recording `ChatProvider` with a fixed member list.
pub struct MockChat {
    log: Mutex<Vec<Sent>>,
    next_id: AtomicUsize,
    members: Vec<Participant>,
    grants: Vec<(String, Permission)>,
    on_send: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            members: vec![alice(), bob(), owner(), bot()],
            grants: Vec::new(),
            on_send: None,
        }
    }

    pub fn grant(mut self, user_id: &str, permission: Permission) -> Self {
        self.grants.push((user_id.to_string(), permission));
        self
    }

    /// Runs `hook` with each text message as it is sent.
    pub fn on_send(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_send = Some(Box::new(hook));
        self
    }

    fn record(&self, sent: Sent) {
        self.log.lock().unwrap().push(sent);
    }

    fn fresh_id(&self) -> String {
        format!("$mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn embeds(&self) -> Vec<Embed> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Embed { embed, .. } => Some(embed),
                _ => None,
            })
            .collect()
    }

    /// `(message id, key)` pairs.
    pub fn reactions(&self) -> Vec<(String, String)> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Reaction { message_id, key } => Some((message_id, key)),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(String, String)> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Edit { message_id, content } => Some((message_id, content)),
                _ => None,
            })
            .collect()
    }

    pub fn redactions(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .flat_map(|sent| match sent {
                Sent::Redaction { ids } => ids,
                _ => Vec::new(),
            })
            .collect()
    }
}

#[async_trait]
impl ChatProvider for MockChat {
    async fn send_message(&self, content: &str) -> Result<String, String> {
        if let Some(hook) = &self.on_send {
            hook(content);
        }
        let id = self.fresh_id();
        self.record(Sent::Text {
            id: id.clone(),
            content: content.to_string(),
        });
        Ok(id)
    }

    async fn send_embed(&self, embed: &Embed, buttons: &[LinkButton]) -> Result<String, String> {
        let id = self.fresh_id();
        self.record(Sent::Embed {
            id: id.clone(),
            embed: embed.clone(),
            buttons: buttons.to_vec(),
        });
        Ok(id)
    }

    async fn edit_message(&self, message_id: &str, content: &str) -> Result<(), String> {
        self.record(Sent::Edit {
            message_id: message_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn add_reaction(&self, message_id: &str, key: &str) -> Result<(), String> {
        self.record(Sent::Reaction {
            message_id: message_id.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    async fn redact(&self, message_ids: &[String]) -> Result<(), String> {
        self.record(Sent::Redaction {
            ids: message_ids.to_vec(),
        });
        Ok(())
    }

    async fn resolve_member(&self, raw: &str) -> Result<Option<Participant>, String> {
        Ok(self
            .members
            .iter()
            .find(|member| member.id == raw || member.name == raw)
            .cloned())
    }

    async fn member_roles(&self, user_id: &str) -> Result<Vec<String>, String> {
        Ok(if user_id == OWNER_ID {
            vec!["Admin".to_string()]
        } else {
            Vec::new()
        })
    }

    async fn has_permission(&self, user_id: &str, permission: Permission) -> Result<bool, String> {
        Ok(self
            .grants
            .iter()
            .any(|(user, granted)| user == user_id && *granted == permission))
    }

    async fn own_identity(&self) -> Result<Participant, String> {
        Ok(bot())
    }

    async fn latency(&self) -> Result<Duration, String> {
        Ok(Duration::from_millis(42))
    }

    async fn guild_summary(&self) -> Result<GuildSummary, String> {
        Ok(GuildSummary {
            name: "Test Room".into(),
            member_count: self.members.len() as u64,
            topic: Some("Testing things".into()),
            icon_url: None,
        })
    }

    fn joined_room_count(&self) -> usize {
        2
    }

    fn room_id(&self) -> String {
        ROOM_ID.to_string()
    }
}

pub struct Noop;

#[async_trait]
impl CommandHandler for Noop {
    async fn handle(&self, _ctx: &CommandContext, _invocation: &Invocation) -> CommandResult {
        Ok(())
    }
}

/// Canned API answers. Anything named `missing` is not found; `broken` is an
/// upstream failure.
pub struct StubApis;

fn canned<T>(query: &str, found: impl FnOnce() -> T) -> Result<Lookup<T>, String> {
    match query {
        "missing" => Ok(Lookup::NotFound(format!(":x: Couldn't find `{query}`"))),
        "broken" => Err("HTTP 502".to_string()),
        _ => Ok(Lookup::Found(found())),
    }
}

#[async_trait]
impl ApiProvider for StubApis {
    async fn search_repositories(&self, query: &str) -> Result<Lookup<RepositoryHit>, String> {
        canned(query, || RepositoryHit {
            html_url: format!("https://github.com/example/{query}"),
        })
    }

    async fn pypi_package(&self, name: &str) -> Result<Lookup<PypiPackage>, String> {
        canned(name, || PypiPackage {
            name: name.to_string(),
            package_url: format!("https://pypi.org/project/{name}/"),
            summary: Some("A package".into()),
            description: "d".repeat(1500),
            home_page: None,
            version: "1.0.0".into(),
            author: "someone".into(),
            license: "MIT".into(),
        })
    }

    async fn npm_package(&self, name: &str) -> Result<Lookup<NpmPackage>, String> {
        canned(name, || NpmPackage {
            name: name.to_string(),
            description: "A package".into(),
            homepage: Some("https://example.org".into()),
            author: Some("someone".into()),
            repository: None,
            maintainers: vec!["someone".into(), "another".into()],
            license: Some("ISC".into()),
        })
    }

    async fn current_weather(&self, query: &str) -> Result<Lookup<WeatherReport>, String> {
        canned(query, || WeatherReport {
            city: query.to_string(),
            description: "light rain".into(),
            icon: "10d".into(),
            temp_f: 50.0,
            humidity: 80,
            cloudiness: 75,
            wind_speed: 9.2,
            wind_deg: 230.0,
        })
    }
}

pub fn test_config() -> AppConfig {
    let mut config: AppConfig = serde_yaml::from_str(
        "services:\n  matrix:\n    username: stuffbot\n    password: secret\n    homeserver: https://matrix.example.org\n",
    )
    .unwrap();
    config.bot.owners = vec![OWNER_ID.to_string()];
    config
}

pub fn test_app() -> Arc<AppContext> {
    let registry = build_registry().unwrap();
    Arc::new(AppContext::new(test_config(), registry, Arc::new(StubApis)))
}

pub fn test_context(chat: impl Into<Arc<MockChat>>) -> CommandContext {
    let chat: Arc<MockChat> = chat.into();
    CommandContext::new(chat, test_app())
}

/// Normalizes `content` as a text command and dispatches it.
pub async fn run_command(
    ctx: &CommandContext,
    invoker: Participant,
    origin: Origin,
    content: &str,
) -> DispatchOutcome {
    let invocation = normalize_text(
        &ctx.app.registry,
        ctx.chat.as_ref(),
        invoker,
        origin,
        Some("$trigger".to_string()),
        content,
    )
    .await
    .unwrap();
    dispatch(ctx, &invocation).await
}
