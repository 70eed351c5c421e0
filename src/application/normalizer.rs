//! # Invocation Normalizer
//!
//! Turns either a prefix/mention text command or a slash interaction into one
//! canonical [`Invocation`], resolving aliases and parsing arguments against the
//! command's parameter schema.

use crate::application::errors::NormalizationFailure;
use crate::application::registry::{CommandRegistry, ParamKind, ParamSpec};
use crate::domain::traits::ChatProvider;
use crate::domain::types::{Interaction, OptionValue, Origin, Participant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationSource {
    TextCommand,
    SlashInteraction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
    User(Participant),
}

/// One schema slot and what was supplied for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: &'static str,
    pub value: Option<ArgValue>,
}

#[derive(Debug, Clone)]
pub struct Invocation {
    /// Canonical command name, never an alias.
    pub command: &'static str,
    pub invoker: Participant,
    pub origin: Origin,
    pub args: Vec<Argument>,
    pub source: InvocationSource,
    /// Id of the triggering message, for text commands.
    pub message_id: Option<String>,
}

impl Invocation {
    fn value(&self, name: &str) -> Option<&ArgValue> {
        self.args
            .iter()
            .find(|arg| arg.name == name)
            .and_then(|arg| arg.value.as_ref())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.value(name) {
            Some(ArgValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.value(name) {
            Some(ArgValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<&Participant> {
        match self.value(name) {
            Some(ArgValue::User(user)) => Some(user),
            _ => None,
        }
    }
}

/// What makes a plain message a command: the prefix or a mention of the bot.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub prefix: String,
    pub mentions: Vec<String>,
}

impl Trigger {
    pub fn new(prefix: impl Into<String>, mentions: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            mentions,
        }
    }

    /// Returns the text after the trigger, or `None` if the message is not a command.
    pub fn strip<'a>(&self, body: &'a str) -> Option<&'a str> {
        let body = body.trim_start();
        if !self.prefix.is_empty()
            && let Some(rest) = body.strip_prefix(self.prefix.as_str())
        {
            return Some(rest);
        }
        for mention in self.mentions.iter().filter(|m| !m.is_empty()) {
            if let Some(rest) = body.strip_prefix(mention.as_str()) {
                // Clients insert "Name: " when completing a mention.
                let rest = rest.strip_prefix(':').unwrap_or(rest);
                if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                    return Some(rest.trim_start());
                }
            }
        }
        None
    }
}

/// Splits `"name rest of line"` into the command token and the raw remainder.
pub fn split_command(content: &str) -> (&str, &str) {
    let content = content.trim_start();
    match content.find(char::is_whitespace) {
        Some(idx) => (&content[..idx], &content[idx..]),
        None => (content, ""),
    }
}

struct UnterminatedQuote;

/// Walks the raw argument text token by token.
struct ArgCursor<'a> {
    rest: &'a str,
}

impl<'a> ArgCursor<'a> {
    fn new(raw: &'a str) -> Self {
        Self { rest: raw }
    }

    fn next_token(&mut self) -> Result<Option<String>, UnterminatedQuote> {
        let s = self.rest.trim_start();
        if s.is_empty() {
            self.rest = s;
            return Ok(None);
        }
        if let Some(quoted) = s.strip_prefix('"') {
            let Some(end) = quoted.find('"') else {
                return Err(UnterminatedQuote);
            };
            self.rest = &quoted[end + 1..];
            return Ok(Some(quoted[..end].to_string()));
        }
        let end = s.find(char::is_whitespace).unwrap_or(s.len());
        self.rest = &s[end..];
        Ok(Some(s[..end].to_string()))
    }

    fn remainder(&mut self) -> Option<String> {
        let s = self.rest.trim();
        self.rest = "";
        (!s.is_empty()).then(|| s.to_string())
    }
}

async fn resolve_user(
    chat: &dyn ChatProvider,
    param: &ParamSpec,
    raw: &str,
) -> Result<ArgValue, NormalizationFailure> {
    let unresolved = || NormalizationFailure::UnresolvedArgument {
        name: param.name.to_string(),
        raw: raw.to_string(),
    };
    match chat.resolve_member(raw).await {
        Ok(Some(member)) => Ok(ArgValue::User(member)),
        Ok(None) => Err(unresolved()),
        Err(e) => {
            tracing::warn!("Member lookup for '{}' failed: {}", raw, e);
            Err(unresolved())
        }
    }
}

fn parse_integer(param: &ParamSpec, raw: &str) -> Result<ArgValue, NormalizationFailure> {
    raw.parse::<i64>()
        .map(ArgValue::Integer)
        .map_err(|_| NormalizationFailure::BadArgument {
            name: param.name.to_string(),
            raw: raw.to_string(),
        })
}

/// Normalizes a text command. `content` is the message with the trigger removed.
pub async fn normalize_text(
    registry: &CommandRegistry,
    chat: &dyn ChatProvider,
    invoker: Participant,
    origin: Origin,
    message_id: Option<String>,
    content: &str,
) -> Result<Invocation, NormalizationFailure> {
    let (token, raw_args) = split_command(content);
    let entry = registry
        .resolve(token)
        .ok_or_else(|| NormalizationFailure::UnknownCommand(token.to_string()))?;

    let mut cursor = ArgCursor::new(raw_args);
    let mut args = Vec::with_capacity(entry.spec.params.len());

    for param in &entry.spec.params {
        let raw = match param.kind {
            ParamKind::Remainder => cursor.remainder(),
            _ => cursor
                .next_token()
                .map_err(|_| NormalizationFailure::BadArgument {
                    name: param.name.to_string(),
                    raw: raw_args.trim().to_string(),
                })?,
        };

        let value = match raw {
            None if param.required => {
                return Err(NormalizationFailure::MissingArgument(param.name.to_string()));
            }
            None => None,
            Some(raw) => Some(match param.kind {
                ParamKind::Text | ParamKind::Remainder => ArgValue::Text(raw),
                ParamKind::Integer => parse_integer(param, &raw)?,
                ParamKind::User => resolve_user(chat, param, &raw).await?,
            }),
        };
        args.push(Argument {
            name: param.name,
            value,
        });
    }

    Ok(Invocation {
        command: entry.spec.name,
        invoker,
        origin,
        args,
        source: InvocationSource::TextCommand,
        message_id,
    })
}

/// Normalizes a slash interaction by mapping its named options onto the schema.
pub async fn normalize_interaction(
    registry: &CommandRegistry,
    chat: &dyn ChatProvider,
    interaction: Interaction,
) -> Result<Invocation, NormalizationFailure> {
    let entry = registry
        .resolve(&interaction.name)
        .ok_or_else(|| NormalizationFailure::UnknownCommand(interaction.name.clone()))?;

    let mut args = Vec::with_capacity(entry.spec.params.len());
    for param in &entry.spec.params {
        let option = interaction
            .options
            .iter()
            .find(|option| option.name.eq_ignore_ascii_case(param.name));

        let value = match option.map(|option| &option.value) {
            None if param.required => {
                return Err(NormalizationFailure::MissingArgument(param.name.to_string()));
            }
            None => None,
            Some(value) => Some(coerce_option(chat, param, value).await?),
        };
        args.push(Argument {
            name: param.name,
            value,
        });
    }

    Ok(Invocation {
        command: entry.spec.name,
        invoker: interaction.invoker,
        origin: interaction.origin,
        args,
        source: InvocationSource::SlashInteraction,
        message_id: None,
    })
}

async fn coerce_option(
    chat: &dyn ChatProvider,
    param: &ParamSpec,
    value: &OptionValue,
) -> Result<ArgValue, NormalizationFailure> {
    let bad = |raw: String| NormalizationFailure::BadArgument {
        name: param.name.to_string(),
        raw,
    };
    match (param.kind, value) {
        (ParamKind::Text | ParamKind::Remainder, OptionValue::String(s))
        | (ParamKind::Text | ParamKind::Remainder, OptionValue::User(s)) => {
            Ok(ArgValue::Text(s.clone()))
        }
        (ParamKind::Text | ParamKind::Remainder, OptionValue::Integer(n)) => {
            Ok(ArgValue::Text(n.to_string()))
        }
        (ParamKind::Integer, OptionValue::Integer(n)) => Ok(ArgValue::Integer(*n)),
        (ParamKind::Integer, OptionValue::String(s)) => parse_integer(param, s),
        (ParamKind::Integer, OptionValue::User(s)) => Err(bad(s.clone())),
        (ParamKind::User, OptionValue::User(s)) | (ParamKind::User, OptionValue::String(s)) => {
            resolve_user(chat, param, s).await
        }
        (ParamKind::User, OptionValue::Integer(n)) => Err(bad(n.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::CommandSpec;
    use crate::application::testing::{MockChat, Noop, alice, room};
    use crate::domain::types::InteractionOption;
    use std::sync::Arc;

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandSpec::new("poll", "")
                    .param(ParamSpec::required("question", ParamKind::Text))
                    .param(ParamSpec::required("options", ParamKind::Remainder)),
                Arc::new(Noop),
            )
            .unwrap();
        registry
            .register(
                CommandSpec::new("avatar", "")
                    .aliases(&["av"])
                    .param(ParamSpec::optional("user", ParamKind::User)),
                Arc::new(Noop),
            )
            .unwrap();
        registry
            .register(
                CommandSpec::new("roll", "").param(ParamSpec::required("sides", ParamKind::Integer)),
                Arc::new(Noop),
            )
            .unwrap();
        registry
    }

    async fn text(content: &str) -> Result<Invocation, NormalizationFailure> {
        let chat = MockChat::new();
        normalize_text(&registry(), &chat, alice(), room(), None, content).await
    }

    #[test]
    fn test_trigger_prefix_and_mentions() {
        let trigger = Trigger::new("_", vec!["@bot:example.org".into(), "Stuffbot".into()]);
        assert_eq!(trigger.strip("_ping"), Some("ping"));
        assert_eq!(trigger.strip("@bot:example.org ping"), Some("ping"));
        assert_eq!(trigger.strip("Stuffbot: ping"), Some("ping"));
        assert_eq!(trigger.strip("Stuffbotty ping"), None);
        assert_eq!(trigger.strip("ping"), None);
    }

    #[tokio::test]
    async fn test_remainder_preserves_internal_whitespace() {
        let inv = text("poll \"Best fruit?\"  apple /  pear   / fig ").await.unwrap();
        assert_eq!(inv.command, "poll");
        assert_eq!(inv.text("question"), Some("Best fruit?"));
        assert_eq!(inv.text("options"), Some("apple /  pear   / fig"));
        assert_eq!(inv.source, InvocationSource::TextCommand);
    }

    #[tokio::test]
    async fn test_alias_resolves_to_canonical_name() {
        let inv = text("AV").await.unwrap();
        assert_eq!(inv.command, "avatar");
        assert_eq!(inv.user("user"), None);
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let err = text("poll question-only").await.unwrap_err();
        assert_eq!(err, NormalizationFailure::MissingArgument("options".into()));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let err = text("nope arg").await.unwrap_err();
        assert_eq!(err, NormalizationFailure::UnknownCommand("nope".into()));
    }

    #[tokio::test]
    async fn test_user_argument_must_resolve() {
        let inv = text("avatar @bob:example.org").await.unwrap();
        assert_eq!(inv.user("user").map(|u| u.name.as_str()), Some("bob"));

        let err = text("avatar @ghost:example.org").await.unwrap_err();
        assert!(matches!(err, NormalizationFailure::UnresolvedArgument { .. }));
    }

    #[tokio::test]
    async fn test_integer_argument() {
        assert_eq!(text("roll 20").await.unwrap().integer("sides"), Some(20));
        assert!(matches!(
            text("roll twenty").await.unwrap_err(),
            NormalizationFailure::BadArgument { .. }
        ));
    }

    #[tokio::test]
    async fn test_unterminated_quote_is_bad_argument() {
        assert!(matches!(
            text("poll \"never closed").await.unwrap_err(),
            NormalizationFailure::BadArgument { .. }
        ));
    }

    #[tokio::test]
    async fn test_interaction_maps_options_by_name() {
        let chat = MockChat::new();
        let interaction = Interaction {
            name: "poll".into(),
            options: vec![
                InteractionOption {
                    name: "options".into(),
                    value: OptionValue::String("a/b".into()),
                },
                InteractionOption {
                    name: "question".into(),
                    value: OptionValue::String("Which?".into()),
                },
            ],
            invoker: alice(),
            origin: room(),
        };

        let inv = normalize_interaction(&registry(), &chat, interaction).await.unwrap();
        assert_eq!(inv.source, InvocationSource::SlashInteraction);
        assert_eq!(inv.args[0].name, "question");
        assert_eq!(inv.text("question"), Some("Which?"));
        assert_eq!(inv.text("options"), Some("a/b"));
    }

    #[tokio::test]
    async fn test_text_and_interaction_converge() {
        let chat = MockChat::new();
        let from_text = text("avatar @bob:example.org").await.unwrap();
        let from_slash = normalize_interaction(
            &registry(),
            &chat,
            Interaction {
                name: "av".into(),
                options: vec![InteractionOption {
                    name: "user".into(),
                    value: OptionValue::User("@bob:example.org".into()),
                }],
                invoker: alice(),
                origin: room(),
            },
        )
        .await
        .unwrap();

        assert_eq!(from_text.command, from_slash.command);
        assert_eq!(from_text.args, from_slash.args);
    }
}
