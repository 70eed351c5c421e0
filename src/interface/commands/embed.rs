//! # Embed Creator
//!
//! Four-step wizard collecting a title, content, footer and author choice, then
//! posting the assembled embed and clearing the conversation that built it.

use async_trait::async_trait;

use crate::application::context::CommandContext;
use crate::application::errors::{CommandError, CommandResult};
use crate::application::normalizer::Invocation;
use crate::application::registry::CommandHandler;
use crate::application::session::{SessionKey, Validation, WizardSpec, WizardStep, free_text};
use crate::domain::types::{Embed, Participant};
use crate::interface::commands::info::EMBED_COLOR;
use crate::strings::wizard;

const NO_FOOTER: &str = "empty";

/// The author step knows exactly three answers; anything else ends the wizard.
fn author_choice(answer: &str) -> Validation {
    match answer.to_lowercase().as_str() {
        "yes" | "no" | NO_FOOTER => Validation::Accept,
        _ => Validation::Abort {
            notice: wizard::EXITING.to_string(),
        },
    }
}

fn embed_wizard(ctx: &CommandContext) -> WizardSpec {
    WizardSpec {
        name: "embed",
        steps: vec![
            WizardStep {
                prompt: |_| wizard::TITLE_PROMPT.to_string(),
                validate: free_text,
            },
            WizardStep {
                prompt: |answers| wizard::description_prompt(&answers[0]),
                validate: free_text,
            },
            WizardStep {
                prompt: |_| wizard::FOOTER_PROMPT.to_string(),
                validate: free_text,
            },
            WizardStep {
                prompt: |_| wizard::AUTHOR_PROMPT.to_string(),
                validate: author_choice,
            },
        ],
        step_timeout: ctx.app.config.sessions.step_timeout(),
        timeout_notice: wizard::TIMED_OUT.to_string(),
        cancel_notice: wizard::CANCELLED.to_string(),
    }
}

/// Assembles the embed from `[title, content, footer, author]`.
fn assemble(answers: &[String], invoker: &Participant) -> Embed {
    let mut embed = Embed::new()
        .title(&answers[0])
        .description(&answers[1])
        .color(EMBED_COLOR);
    if answers[3].eq_ignore_ascii_case("yes") {
        embed = embed.author(&invoker.name, invoker.avatar_url.clone());
    }
    if !answers[2].eq_ignore_ascii_case(NO_FOOTER) {
        embed = embed.footer(&answers[2]);
    }
    embed
}

pub struct EmbedWizard;

#[async_trait]
impl CommandHandler for EmbedWizard {
    async fn handle(&self, ctx: &CommandContext, invocation: &Invocation) -> CommandResult {
        let key = SessionKey::new(
            invocation.invoker.id.clone(),
            invocation.origin.channel_id.clone(),
        );
        let spec = embed_wizard(ctx);
        let completed = ctx
            .app
            .state
            .sessions
            .run(ctx.chat.as_ref(), key, &spec)
            .await?;

        let mut transcript = completed.transcript;
        if let Some(trigger) = &invocation.message_id {
            transcript.insert(0, trigger.clone());
        }
        if let Err(e) = ctx.chat.redact(&transcript).await {
            tracing::warn!("Failed to clear embed creator messages: {}", e);
        }

        let embed = assemble(&completed.answers, &invocation.invoker);
        ctx.chat
            .send_embed(&embed, &[])
            .await
            .map_err(CommandError::platform)?;
        Ok(())
    }
}
