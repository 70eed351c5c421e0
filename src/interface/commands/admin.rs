//! # Admin Command
//!
//! Owner-only operator tools. Only the fixed operations below exist and each use
//! is written to the log.

use async_trait::async_trait;
use chrono::Local;

use crate::application::context::CommandContext;
use crate::application::errors::{CommandError, CommandResult};
use crate::application::normalizer::Invocation;
use crate::application::pagination::send_paginated;
use crate::application::registry::CommandHandler;
use crate::strings::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOperation {
    Status,
    Sessions,
    Commands,
    ResetCooldowns,
}

impl AdminOperation {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "status" => Some(Self::Status),
            "sessions" => Some(Self::Sessions),
            "commands" => Some(Self::Commands),
            "reset-cooldowns" => Some(Self::ResetCooldowns),
            _ => None,
        }
    }
}

fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{}h {:02}m {:02}s",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

async fn status(ctx: &CommandContext) -> String {
    let state = &ctx.app.state;
    let uptime = (Local::now() - state.started_at).num_seconds();
    let pages = state.pages.lock().await.len();
    let cooldowns = state.cooldowns.lock().await.len();
    messages::admin_status(
        &format_uptime(uptime),
        ctx.chat.joined_room_count(),
        ctx.app.registry.len(),
        state.sessions.active_keys().len(),
        pages,
        cooldowns,
    )
}

fn session_listing(ctx: &CommandContext) -> String {
    let keys = ctx.app.state.sessions.active_keys();
    if keys.is_empty() {
        return messages::NO_SESSIONS.to_string();
    }
    keys.iter()
        .map(|key| format!("{} in {}", key.participant_id, key.channel_id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn command_listing(ctx: &CommandContext) -> String {
    let prefix = &ctx.app.config.bot.prefix;
    ctx.app
        .registry
        .iter()
        .map(|entry| {
            let mut line = entry.spec.usage(prefix);
            if !entry.spec.aliases.is_empty() {
                line.push_str(&format!("  ({})", entry.spec.aliases.join(", ")));
            }
            if entry.spec.hidden {
                line.push_str("  [hidden]");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Admin;

#[async_trait]
impl CommandHandler for Admin {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let requested = invocation.text("operation").unwrap_or_default();
        let Some(operation) = AdminOperation::parse(requested) else {
            ctx.chat
                .send_message(&format!(
                    "{}\n{}",
                    messages::unknown_admin_operation(requested),
                    messages::admin_usage(&ctx.app.config.bot.prefix)
                ))
                .await
                .map_err(CommandError::platform)?;
            return Ok(());
        };
        tracing::warn!(
            "Admin operation {:?} by {} in {}",
            operation,
            invocation.invoker.id,
            invocation.origin.channel_id
        );

        let chunk_size = ctx.app.config.pagination.chunk_size;
        match operation {
            AdminOperation::Status => {
                let report = status(ctx).await;
                ctx.chat
                    .send_message(&report)
                    .await
                    .map_err(CommandError::platform)?;
            }
            AdminOperation::Sessions => {
                send_paginated(
                    ctx.chat.as_ref(),
                    &ctx.app.state.pages,
                    &invocation.invoker.id,
                    &session_listing(ctx),
                    chunk_size,
                )
                .await
                .map_err(CommandError::platform)?;
            }
            AdminOperation::Commands => {
                send_paginated(
                    ctx.chat.as_ref(),
                    &ctx.app.state.pages,
                    &invocation.invoker.id,
                    &command_listing(ctx),
                    chunk_size,
                )
                .await
                .map_err(CommandError::platform)?;
            }
            AdminOperation::ResetCooldowns => {
                let cleared = {
                    let mut cooldowns = ctx.app.state.cooldowns.lock().await;
                    let count = cooldowns.len();
                    cooldowns.clear();
                    count
                };
                ctx.chat
                    .send_message(&messages::cooldowns_reset(cleared))
                    .await
                    .map_err(CommandError::platform)?;
            }
        }
        Ok(())
    }
}
