//! # Command Registry
//!
//! Static mapping from command names and aliases to their descriptors and handlers.
//! Built once at startup; collisions are rejected eagerly at registration time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::application::context::CommandContext;
use crate::application::errors::CommandResult;
use crate::application::normalizer::Invocation;
use crate::domain::types::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// One word or one double-quoted string.
    Text,
    /// A mention or raw identity resolving to a member of the room.
    User,
    Integer,
    /// Everything left on the line.
    Remainder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// How cooldown timers are partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    User,
    Channel,
    Guild,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    OwnerOnly,
    RequiresPermission(Vec<Permission>),
    BotRequiresPermission(Vec<Permission>),
    GuildOnly,
    Cooldown { window: Duration, bucket: BucketKind },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: Vec<&'static str>,
    pub summary: &'static str,
    pub help: &'static str,
    pub guards: Vec<Guard>,
    pub params: Vec<ParamSpec>,
    pub hidden: bool,
}

impl CommandSpec {
    pub fn new(name: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            summary,
            help: summary,
            guards: Vec::new(),
            params: Vec::new(),
            hidden: false,
        }
    }

    pub fn aliases(mut self, aliases: &[&'static str]) -> Self {
        self.aliases.extend_from_slice(aliases);
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// `name <required> [optional]` line used by help.
    pub fn usage(&self, prefix: &str) -> String {
        let mut usage = format!("{prefix}{}", self.name);
        for param in &self.params {
            if param.required {
                usage.push_str(&format!(" <{}>", param.name));
            } else {
                usage.push_str(&format!(" [{}]", param.name));
            }
        }
        usage
    }
}

/// A command handler. One implementation per command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult;
}

pub struct RegisteredCommand {
    pub spec: CommandSpec,
    pub handler: Arc<dyn CommandHandler>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{name}` is already registered by `{existing}`")]
    DuplicateCommand { name: String, existing: String },
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<RegisteredCommand>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command. Fails if its name or any alias is already taken.
    pub fn register(
        &mut self,
        spec: CommandSpec,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RegistryError> {
        let mut keys: Vec<String> = Vec::with_capacity(spec.aliases.len() + 1);
        for key in std::iter::once(spec.name).chain(spec.aliases.iter().copied()) {
            let key = key.to_lowercase();
            if let Some(&existing) = self.index.get(&key) {
                return Err(RegistryError::DuplicateCommand {
                    name: key,
                    existing: self.commands[existing].spec.name.to_string(),
                });
            }
            if keys.contains(&key) {
                return Err(RegistryError::DuplicateCommand {
                    name: key,
                    existing: spec.name.to_string(),
                });
            }
            keys.push(key);
        }

        let position = self.commands.len();
        for key in keys {
            self.index.insert(key, position);
        }
        self.commands.push(RegisteredCommand { spec, handler });
        Ok(())
    }

    /// Case-insensitive exact match on name or alias.
    pub fn resolve(&self, name: &str) -> Option<&RegisteredCommand> {
        self.index
            .get(&name.to_lowercase())
            .map(|&position| &self.commands[position])
    }

    /// Registered commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
