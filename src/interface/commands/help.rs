//! # Help Command
//!
//! Lists the visible commands, or shows usage and aliases of one command.

use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::errors::{CommandError, CommandResult, NormalizationFailure};
use crate::application::normalizer::Invocation;
use crate::application::registry::CommandHandler;
use crate::domain::types::Embed;
use crate::interface::commands::info::EMBED_COLOR;
use crate::strings::{help, messages};

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let prefix = &ctx.app.config.bot.prefix;
        let embed = match invocation.text("command") {
            Some(name) => {
                // Hidden commands stay undocumented.
                let entry = ctx
                    .app
                    .registry
                    .resolve(name)
                    .filter(|entry| !entry.spec.hidden)
                    .ok_or_else(|| NormalizationFailure::UnknownCommand(name.to_string()))?;
                let mut embed = Embed::new()
                    .title(format!("`{}`", entry.spec.usage(prefix)))
                    .description(entry.spec.help)
                    .color(EMBED_COLOR);
                if !entry.spec.aliases.is_empty() {
                    embed = embed.footer(messages::aliases_line(&entry.spec.aliases));
                }
                embed
            }
            None => {
                let lines: Vec<String> = ctx
                    .app
                    .registry
                    .iter()
                    .filter(|entry| !entry.spec.hidden)
                    .map(|entry| format!("`{}` {}", entry.spec.name, entry.spec.summary))
                    .collect();
                Embed::new()
                    .title(help::HELP_TITLE)
                    .description(lines.join("\n"))
                    .color(EMBED_COLOR)
                    .footer(messages::help_footer(prefix))
            }
        };

        ctx.chat
            .send_embed(&embed, &[])
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}
