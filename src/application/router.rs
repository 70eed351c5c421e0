//! # Command Router
//!
//! Entry point for every raw platform event. Replies that belong to a running
//! wizard are handed to the session engine, commands are normalized and
//! dispatched, and reactions drive pagination.

use std::sync::Arc;
use std::time::Instant;

use crate::application::context::{AppContext, CommandContext};
use crate::application::dispatcher::{DispatchOutcome, dispatch, report_failure};
use crate::application::normalizer::{Trigger, normalize_interaction, normalize_text, split_command};
use crate::application::pagination::{Navigation, NavigationOutcome};
use crate::application::session::{SessionInput, SessionKey};
use crate::domain::traits::ChatProvider;
use crate::domain::types::{IncomingMessage, ReactionEvent};
use crate::infrastructure::slash;

/// What the router did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Dispatched(DispatchOutcome),
    /// Not addressed to the bot.
    Ignored,
}

pub struct CommandRouter {
    app: Arc<AppContext>,
    trigger: Trigger,
}

impl CommandRouter {
    pub fn new(app: Arc<AppContext>, trigger: Trigger) -> Self {
        Self { app, trigger }
    }

    pub fn app(&self) -> &Arc<AppContext> {
        &self.app
    }

    /// True when `body` invokes a registered command, by prefix, mention or slash.
    fn names_command(&self, message: &IncomingMessage) -> bool {
        if let Some(content) = self.trigger.strip(&message.body) {
            let (token, _) = split_command(content);
            return self.app.registry.resolve(token).is_some();
        }
        slash::parse_interaction(&message.body, &message.sender, &message.origin)
            .is_some_and(|interaction| self.app.registry.resolve(&interaction.name).is_some())
    }

    /// Hands `message` to the sender's running wizard. Returns `false` when no
    /// wizard is waiting and for registered commands, which always go through
    /// dispatch.
    ///
    /// Must be called in event order, before anything is spawned.
    pub fn deliver_reply(&self, message: &IncomingMessage) -> bool {
        if self.names_command(message) {
            return false;
        }
        let key = SessionKey::new(message.sender.id.clone(), message.origin.channel_id.clone());
        let input = SessionInput {
            message_id: message.message_id.clone(),
            body: message.body.clone(),
        };
        if self.app.state.sessions.deliver(&key, input) {
            tracing::debug!("Message {} routed to session of {}", message.message_id, message.sender.id);
            return true;
        }
        false
    }

    /// Dispatches a prefix, mention or slash command. Session replies must already
    /// have been taken out with [`Self::deliver_reply`].
    pub async fn dispatch_message(&self, chat: Arc<dyn ChatProvider>, message: IncomingMessage) -> Routed {
        let ctx = CommandContext::new(chat, self.app.clone());

        if let Some(content) = self.trigger.strip(&message.body) {
            if content.trim().is_empty() {
                return Routed::Ignored;
            }
            tracing::info!("Router dispatching '{}' from {}", content, message.sender.id);
            let normalized = normalize_text(
                &self.app.registry,
                ctx.chat.as_ref(),
                message.sender,
                message.origin,
                Some(message.message_id),
                content,
            )
            .await;
            let outcome = match normalized {
                Ok(invocation) => dispatch(&ctx, &invocation).await,
                Err(failure) => report_failure(&ctx, failure.into()).await,
            };
            return Routed::Dispatched(outcome);
        }

        if let Some(interaction) = slash::parse_interaction(&message.body, &message.sender, &message.origin) {
            // Only registered commands exist as interactions; other slash text is chat.
            if self.app.registry.resolve(&interaction.name).is_none() {
                return Routed::Ignored;
            }
            tracing::info!("Router dispatching interaction '{}' from {}", interaction.name, message.sender.id);
            let outcome = match normalize_interaction(&self.app.registry, ctx.chat.as_ref(), interaction).await {
                Ok(invocation) => dispatch(&ctx, &invocation).await,
                Err(failure) => report_failure(&ctx, failure.into()).await,
            };
            return Routed::Dispatched(outcome);
        }

        Routed::Ignored
    }

    /// Applies a pagination control. Reactions on anything else are ignored.
    pub async fn route_reaction(&self, chat: Arc<dyn ChatProvider>, event: ReactionEvent) -> NavigationOutcome {
        let Some(navigation) = Navigation::from_key(&event.key) else {
            return NavigationOutcome::Ignored;
        };

        let outcome = {
            let mut pages = self.app.state.pages.lock().await;
            pages.navigate(&event.message_id, &event.sender.id, navigation, Instant::now())
        };

        match &outcome {
            NavigationOutcome::Render(page) => {
                if let Err(e) = chat.edit_message(&event.message_id, page).await {
                    tracing::warn!("Failed to turn page on {}: {}", event.message_id, e);
                }
            }
            NavigationOutcome::Stopped => {
                tracing::debug!("Pagination stopped on {}", event.message_id);
            }
            NavigationOutcome::Ignored | NavigationOutcome::Unchanged => {}
        }
        outcome
    }
}
