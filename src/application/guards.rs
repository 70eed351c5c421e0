//! # Guards
//!
//! Predicates evaluated before a handler runs, plus the in-memory cooldown table.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::application::context::CommandContext;
use crate::application::errors::GuardFailure;
use crate::application::normalizer::Invocation;
use crate::application::registry::{BucketKind, Guard};
use crate::domain::types::Permission;

/// Last accepted invocation per (command, bucket key).
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last: HashMap<(String, String), Instant>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Passes and records `now` when the window has elapsed, otherwise returns
    /// the time left.
    pub fn check(
        &mut self,
        command: &str,
        bucket_key: &str,
        window: Duration,
        now: Instant,
    ) -> Result<(), Duration> {
        let key = (command.to_string(), bucket_key.to_string());
        if let Some(&last) = self.last.get(&key) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < window {
                return Err(window - elapsed);
            }
        }
        self.last.insert(key, now);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }
}

pub fn bucket_key(kind: BucketKind, invocation: &Invocation) -> String {
    match kind {
        BucketKind::User => invocation.invoker.id.clone(),
        BucketKind::Channel => invocation.origin.channel_id.clone(),
        BucketKind::Guild => invocation
            .origin
            .guild_id
            .clone()
            .unwrap_or_else(|| invocation.origin.channel_id.clone()),
    }
}

async fn holds(ctx: &CommandContext, user_id: &str, permission: Permission) -> bool {
    match ctx.chat.has_permission(user_id, permission).await {
        Ok(granted) => granted,
        Err(e) => {
            tracing::warn!(
                "Permission check {} for {} failed: {}",
                permission.as_str(),
                user_id,
                e
            );
            false
        }
    }
}

/// Evaluates `guards` in order, stopping at the first failure.
pub async fn evaluate(
    guards: &[Guard],
    ctx: &CommandContext,
    invocation: &Invocation,
    now: Instant,
) -> Result<(), GuardFailure> {
    for guard in guards {
        match guard {
            Guard::OwnerOnly => {
                if !ctx.app.config.bot.owners.contains(&invocation.invoker.id) {
                    return Err(GuardFailure::OwnerOnly);
                }
            }
            Guard::RequiresPermission(permissions) => {
                for &permission in permissions {
                    if !holds(ctx, &invocation.invoker.id, permission).await {
                        return Err(GuardFailure::MissingPermission(permission));
                    }
                }
            }
            Guard::BotRequiresPermission(permissions) => {
                let own_id = match ctx.chat.own_identity().await {
                    Ok(me) => me.id,
                    Err(e) => {
                        tracing::warn!("Could not determine own identity: {}", e);
                        String::new()
                    }
                };
                for &permission in permissions {
                    if own_id.is_empty() || !holds(ctx, &own_id, permission).await {
                        return Err(GuardFailure::BotMissingPermission(permission));
                    }
                }
            }
            Guard::GuildOnly => {
                if invocation.origin.is_direct() {
                    return Err(GuardFailure::GuildOnly);
                }
            }
            Guard::Cooldown { window, bucket } => {
                let key = bucket_key(*bucket, invocation);
                let mut cooldowns = ctx.app.state.cooldowns.lock().await;
                cooldowns
                    .check(invocation.command, &key, *window, now)
                    .map_err(|remaining| GuardFailure::CooldownActive { remaining })?;
            }
        }
    }
    Ok(())
}
