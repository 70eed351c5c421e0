//! # Domain Types
//!
//! Common data structures shared by the router, the dispatcher and the platform adapter:
//! who sent something, where it came from, and what the bot sends back.

/// A user on the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub is_bot: bool,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar_url: None,
            is_bot: false,
        }
    }
}

/// Where an event originated. `guild_id` is `None` for direct messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub channel_id: String,
    pub guild_id: Option<String>,
}

impl Origin {
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

/// Platform permissions a guard can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ManageMessages,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageMessages => "manage_messages",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

/// Rich reply: title, description, named fields and a few decorations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub author: Option<EmbedAuthor>,
    pub footer: Option<String>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn author(mut self, name: impl Into<String>, icon_url: Option<String>) -> Self {
        self.author = Some(EmbedAuthor {
            name: name.into(),
            icon_url,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }
}

/// An external link attached below a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub emoji: Option<String>,
    pub url: String,
}

impl LinkButton {
    pub fn new(label: impl Into<String>, emoji: Option<&str>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            emoji: emoji.map(str::to_string),
            url: url.into(),
        }
    }
}

/// Summary of the current guild, as far as the platform exposes one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildSummary {
    pub name: String,
    pub member_count: u64,
    pub topic: Option<String>,
    pub icon_url: Option<String>,
}

/// A plain chat message received from the platform.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub message_id: String,
    pub sender: Participant,
    pub origin: Origin,
    pub body: String,
}

/// A typed value carried by a slash-command option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    /// Raw user identity, resolved against the guild by the normalizer.
    User(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionOption {
    pub name: String,
    pub value: OptionValue,
}

/// A structured slash-command call.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub name: String,
    pub options: Vec<InteractionOption>,
    pub invoker: Participant,
    pub origin: Origin,
}

/// A reaction added to one of the bot's messages.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub message_id: String,
    pub key: String,
    pub sender: Participant,
    pub origin: Origin,
}
