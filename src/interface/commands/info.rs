//! # Info Commands
//!
//! `ping`, `info`, `invite`, `avatar`, `serverinfo` and `userinfo`.

use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::errors::{CollaboratorFailure, CommandError, CommandResult};
use crate::application::normalizer::Invocation;
use crate::application::registry::CommandHandler;
use crate::domain::types::{Embed, LinkButton};
use crate::strings::messages;

pub const EMBED_COLOR: u32 = 0xFF6600;
const ROLE_FIELD_LIMIT: usize = 1024;

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn handle(&self, ctx: &CommandContext, _invocation: &Invocation) -> CommandResult {
        let latency = ctx.chat.latency().await.map_err(CommandError::platform)?;
        ctx.chat
            .send_message(&messages::pong(latency.as_millis()))
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

pub struct Info;

#[async_trait]
impl CommandHandler for Info {
    async fn handle(&self, ctx: &CommandContext, _invocation: &Invocation) -> CommandResult {
        let me = ctx.chat.own_identity().await.map_err(CommandError::platform)?;
        let links = &ctx.app.config.bot.links;
        let name = ctx
            .app
            .config
            .services
            .matrix
            .display_name
            .clone()
            .unwrap_or(me.name);

        let mut embed = Embed::new()
            .title(messages::info_title(&name))
            .color(EMBED_COLOR)
            .field("Source code", messages::source_code(&links.source), false)
            .field("Creator", messages::creator(&links.creator), false)
            .field("Rooms", messages::room_count(ctx.chat.joined_room_count()), true)
            .field("Bot version", env!("CARGO_PKG_VERSION"), false);
        if let Some(avatar) = me.avatar_url {
            embed = embed.thumbnail(avatar);
        }

        let buttons = [
            LinkButton::new("Add bot", Some("➕"), &links.invite),
            LinkButton::new("Command list", Some("ℹ️"), &links.commands),
            LinkButton::new("Join server", None, &links.support),
        ];
        ctx.chat
            .send_embed(&embed, &buttons)
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

pub struct Invite;

#[async_trait]
impl CommandHandler for Invite {
    async fn handle(&self, ctx: &CommandContext, _invocation: &Invocation) -> CommandResult {
        ctx.chat
            .send_message(&ctx.app.config.bot.links.invite)
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

pub struct Avatar;

#[async_trait]
impl CommandHandler for Avatar {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let user = invocation.user("user").unwrap_or(&invocation.invoker);
        let Some(avatar) = &user.avatar_url else {
            return Err(CollaboratorFailure::NotFound(messages::no_avatar(&user.name)).into());
        };

        let embed = Embed::new()
            .title(messages::avatar_title(&user.name))
            .color(EMBED_COLOR)
            .image(avatar);
        ctx.chat
            .send_embed(&embed, &[])
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

pub struct ServerInfo;

#[async_trait]
impl CommandHandler for ServerInfo {
    async fn handle(&self, ctx: &CommandContext, _invocation: &Invocation) -> CommandResult {
        let guild = ctx.chat.guild_summary().await.map_err(CommandError::platform)?;

        let mut embed = Embed::new()
            .title(messages::server_title(&guild.name))
            .color(EMBED_COLOR)
            .field("Member count", guild.member_count.to_string(), true)
            .field(
                "Topic",
                guild.topic.as_deref().unwrap_or(messages::NO_TOPIC),
                false,
            );
        if let Some(icon) = guild.icon_url {
            embed = embed.thumbnail(icon);
        }
        ctx.chat
            .send_embed(&embed, &[])
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}

/// Space-separated role list, cut to the first five (and the field limit) when it
/// would overflow a field.
fn roles_value(roles: &[String]) -> String {
    if roles.is_empty() {
        return messages::NO_ROLES.to_string();
    }
    let joined = roles.join(" ");
    if joined.chars().count() <= ROLE_FIELD_LIMIT {
        joined
    } else {
        let first: Vec<&str> = roles.iter().take(5).map(String::as_str).collect();
        format!("{}{}", messages::ROLES_TRUNCATED, first.join(" "))
            .chars()
            .take(ROLE_FIELD_LIMIT)
            .collect()
    }
}

pub struct UserInfo;

#[async_trait]
impl CommandHandler for UserInfo {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let member = invocation.user("user").unwrap_or(&invocation.invoker);
        let roles = ctx
            .chat
            .member_roles(&member.id)
            .await
            .map_err(CommandError::platform)?;

        let mut embed = Embed::new()
            .title(&member.name)
            .color(EMBED_COLOR)
            .field("User ID", &member.id, true)
            .field(messages::roles_heading(roles.len()), roles_value(&roles), false)
            .field("Is this user a bot?", messages::yes_no(member.is_bot), true);
        if let Some(avatar) = &member.avatar_url {
            embed = embed.thumbnail(avatar);
        }
        ctx.chat
            .send_embed(&embed, &[])
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}
