//! # Command Handlers
//!
//! One handler per command, and the static table that registers them.
//! The table is the only place command names, aliases, guards and parameter
//! schemas are declared.

pub mod admin;
pub mod embed;
pub mod help;
pub mod info;
pub mod utilities;

use std::sync::Arc;
use std::time::Duration;

use crate::application::registry::{
    BucketKind, CommandHandler, CommandRegistry, CommandSpec, Guard, ParamKind, ParamSpec,
    RegistryError,
};
use crate::domain::types::Permission;
use crate::strings::help as text;

pub const WEATHER_COOLDOWN: Duration = Duration::from_secs(5);

fn handler(handler: impl CommandHandler + 'static) -> Arc<dyn CommandHandler> {
    Arc::new(handler)
}

fn catalogue() -> Vec<(CommandSpec, Arc<dyn CommandHandler>)> {
    vec![
        (
            CommandSpec::new("ping", text::PING).help(text::PING_HELP),
            handler(info::Ping),
        ),
        (
            CommandSpec::new("info", text::INFO)
                .aliases(&["information", "botinfo"])
                .help(text::INFO_HELP),
            handler(info::Info),
        ),
        (
            CommandSpec::new("invite", text::INVITE).aliases(&["addbot"]),
            handler(info::Invite),
        ),
        (
            CommandSpec::new("help", text::HELP)
                .help(text::HELP_HELP)
                .param(ParamSpec::optional("command", ParamKind::Text)),
            handler(help::Help),
        ),
        (
            CommandSpec::new("avatar", text::AVATAR)
                .aliases(&["av", "pfp"])
                .help(text::AVATAR_HELP)
                .param(ParamSpec::optional("user", ParamKind::User)),
            handler(info::Avatar),
        ),
        (
            CommandSpec::new("serverinfo", text::SERVERINFO)
                .aliases(&["server"])
                .help(text::SERVERINFO_HELP)
                .guard(Guard::GuildOnly),
            handler(info::ServerInfo),
        ),
        (
            CommandSpec::new("userinfo", text::USERINFO)
                .aliases(&["whois", "user"])
                .guard(Guard::GuildOnly)
                .param(ParamSpec::optional("user", ParamKind::User)),
            handler(info::UserInfo),
        ),
        (
            CommandSpec::new("github", text::GITHUB)
                .aliases(&["searchrepo", "githubsearch", "search_github"])
                .param(ParamSpec::required("query", ParamKind::Remainder)),
            handler(utilities::Github),
        ),
        (
            CommandSpec::new("pypi", text::PYPI)
                .param(ParamSpec::required("package", ParamKind::Remainder)),
            handler(utilities::Pypi),
        ),
        (
            CommandSpec::new("npm", text::NPM)
                .param(ParamSpec::required("package", ParamKind::Remainder)),
            handler(utilities::Npm),
        ),
        (
            CommandSpec::new("base64", text::BASE64)
                .aliases(&["b64"])
                .help(text::BASE64_HELP)
                .param(ParamSpec::optional("mode", ParamKind::Text))
                .param(ParamSpec::optional("text", ParamKind::Remainder)),
            handler(utilities::Base64),
        ),
        (
            CommandSpec::new("weather", text::WEATHER)
                .help(text::WEATHER_HELP)
                .guard(Guard::Cooldown {
                    window: WEATHER_COOLDOWN,
                    bucket: BucketKind::User,
                })
                .param(ParamSpec::required("city", ParamKind::Remainder)),
            handler(utilities::Weather),
        ),
        (
            CommandSpec::new("embed", text::EMBED)
                .aliases(&["makeembed", "createembed"])
                .help(text::EMBED_HELP)
                .guard(Guard::RequiresPermission(vec![Permission::ManageMessages]))
                .guard(Guard::BotRequiresPermission(vec![Permission::ManageMessages])),
            handler(embed::EmbedWizard),
        ),
        (
            CommandSpec::new("poll", text::POLL)
                .help(text::POLL_HELP)
                .guard(Guard::GuildOnly)
                .param(ParamSpec::required("question", ParamKind::Text))
                .param(ParamSpec::required("options", ParamKind::Remainder)),
            handler(utilities::Poll),
        ),
        (
            CommandSpec::new("admin", text::ADMIN)
                .help(text::ADMIN_HELP)
                .hidden()
                .guard(Guard::OwnerOnly)
                .param(ParamSpec::required("operation", ParamKind::Text))
                .param(ParamSpec::optional("rest", ParamKind::Remainder)),
            handler(admin::Admin),
        ),
    ]
}

/// Builds the registry from the static table, failing on any name collision.
pub fn build_registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();
    for (spec, handler) in catalogue() {
        registry.register(spec, handler)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_alias_resolves_to_its_command() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.len(), 15);
        for entry in registry.iter() {
            let canonical = &registry.resolve(entry.spec.name).unwrap().spec;
            for alias in &entry.spec.aliases {
                assert_eq!(&registry.resolve(alias).unwrap().spec, canonical, "alias {alias}");
                assert_eq!(
                    &registry.resolve(&alias.to_uppercase()).unwrap().spec,
                    canonical
                );
            }
        }
    }

    #[test]
    fn test_admin_is_hidden_and_owner_only() {
        let registry = build_registry().unwrap();
        let admin = &registry.resolve("admin").unwrap().spec;
        assert!(admin.hidden);
        assert_eq!(admin.guards, vec![Guard::OwnerOnly]);
        assert!(registry.resolve("eval").is_none());
    }
}
