//! # Dispatcher
//!
//! Runs a normalized invocation: guards first, then the handler, with every failure
//! turned into its fixed reply by the error reporter.

use std::time::Instant;

use crate::application::context::CommandContext;
use crate::application::errors::{CommandError, NormalizationFailure, report};
use crate::application::guards;
use crate::application::normalizer::Invocation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    /// The invocation failed and this reply was sent to the invoker.
    Reported(String),
    /// The invocation failed without a reply (logged, or the session already spoke).
    Silent,
}

/// Sends the reporter's text for `error`, if it has one.
pub async fn report_failure(ctx: &CommandContext, error: CommandError) -> DispatchOutcome {
    match report(&error) {
        Some(text) => {
            if let Err(e) = ctx.chat.send_message(&text).await {
                tracing::error!("Failed to deliver error reply: {}", e);
            }
            DispatchOutcome::Reported(text)
        }
        None => DispatchOutcome::Silent,
    }
}

pub async fn dispatch(ctx: &CommandContext, invocation: &Invocation) -> DispatchOutcome {
    let Some(entry) = ctx.app.registry.resolve(invocation.command) else {
        let error = NormalizationFailure::UnknownCommand(invocation.command.to_string());
        return report_failure(ctx, error.into()).await;
    };

    if let Err(failure) = guards::evaluate(&entry.spec.guards, ctx, invocation, Instant::now()).await {
        tracing::info!(
            "Guard rejected '{}' for {}: {}",
            invocation.command,
            invocation.invoker.id,
            failure
        );
        return report_failure(ctx, failure.into()).await;
    }

    tracing::info!(
        "Running '{}' for {} in {} ({:?})",
        invocation.command,
        invocation.invoker.id,
        invocation.origin.channel_id,
        invocation.source
    );
    match entry.handler.handle(ctx, invocation).await {
        Ok(()) => DispatchOutcome::Completed,
        Err(error) => report_failure(ctx, error).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::normalizer::normalize_text;
    use crate::application::testing::{MockChat, alice, room, test_context};
    use crate::strings::messages;

    async fn run(ctx: &CommandContext, content: &str) -> DispatchOutcome {
        let invocation = normalize_text(
            &ctx.app.registry,
            ctx.chat.as_ref(),
            alice(),
            room(),
            Some("$trigger".into()),
            content,
        )
        .await
        .unwrap();
        dispatch(ctx, &invocation).await
    }

    #[tokio::test]
    async fn test_cooldown_blocks_second_call_in_window() {
        let chat = std::sync::Arc::new(MockChat::new());
        let ctx = test_context(chat.clone());

        assert_eq!(run(&ctx, "weather London").await, DispatchOutcome::Completed);
        let outcome = run(&ctx, "weather London").await;
        match outcome {
            DispatchOutcome::Reported(text) => assert!(text.starts_with("This command is on cooldown")),
            other => panic!("expected cooldown reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_owner_only_command_rejects_non_owner() {
        let chat = std::sync::Arc::new(MockChat::new());
        let ctx = test_context(chat.clone());

        let outcome = run(&ctx, "admin status").await;
        assert_eq!(outcome, DispatchOutcome::Reported(messages::OWNER_ONLY.to_string()));
        assert_eq!(chat.texts(), vec![messages::OWNER_ONLY]);
    }

    #[tokio::test]
    async fn test_guild_only_command_in_direct_room() {
        let chat = std::sync::Arc::new(MockChat::new());
        let ctx = test_context(chat.clone());
        let invocation = normalize_text(
            &ctx.app.registry,
            ctx.chat.as_ref(),
            alice(),
            crate::application::testing::dm(),
            None,
            "serverinfo",
        )
        .await
        .unwrap();

        assert_eq!(
            dispatch(&ctx, &invocation).await,
            DispatchOutcome::Reported(messages::GUILD_ONLY.to_string())
        );
    }
}
